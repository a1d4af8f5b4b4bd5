use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::{INCORRECT_PAGE, PageNumber};

/// Comparator shared by the ordered element collection.
pub(crate) type Comparator<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Merged, deduplicated, totally-ordered collection of loaded elements, the
/// set of loaded page indices, and the page cursor.
///
/// `data` stays sorted under the comparator and unique per comparator key;
/// merging an equal-keyed element replaces the stored one (last write wins).
pub(crate) struct OrderedStore<T> {
	cmp: Comparator<T>,
	pages: BTreeSet<PageNumber>,
	data: Vec<T>,
	current_page: PageNumber,
	before_page: PageNumber,
}

impl<T: Clone> OrderedStore<T> {
	pub fn new(cmp: Comparator<T>) -> Self {
		Self {
			cmp,
			pages: BTreeSet::new(),
			data: Vec::new(),
			current_page: INCORRECT_PAGE,
			before_page: INCORRECT_PAGE,
		}
	}

	fn compare(&self, a: &T, b: &T) -> Ordering {
		(self.cmp.as_ref())(a, b)
	}

	/// Smallest loaded page, or the sentinel when nothing is loaded.
	pub fn min_page(&self) -> PageNumber {
		self.pages.first().copied().unwrap_or(INCORRECT_PAGE)
	}

	/// Largest loaded page, or the sentinel when nothing is loaded.
	pub fn max_page(&self) -> PageNumber {
		self.pages.last().copied().unwrap_or(INCORRECT_PAGE)
	}

	/// True once min, max, and current page are all real pages.
	pub fn is_correct(&self) -> bool {
		self.min_page() != INCORRECT_PAGE && self.max_page() != INCORRECT_PAGE && self.current_page != INCORRECT_PAGE
	}

	pub fn current_page(&self) -> PageNumber {
		self.current_page
	}

	pub fn before_page(&self) -> PageNumber {
		self.before_page
	}

	/// Records `page` as current, remembering the prior value for back-jumps.
	pub fn set_current(&mut self, page: PageNumber) {
		self.before_page = self.current_page;
		self.current_page = page;
	}

	/// Adds `page` and folds its elements into the sorted collection.
	pub fn merge(&mut self, page: PageNumber, elements: Vec<T>) {
		self.pages.insert(page);
		for element in elements {
			self.insert(element);
		}
	}

	/// Inserts one element at its sorted position; an equal-keyed element is
	/// replaced in place.
	pub fn insert(&mut self, element: T) {
		match self.data.binary_search_by(|probe| self.compare(probe, &element)) {
			Ok(at) => self.data[at] = element,
			Err(at) => self.data.insert(at, element),
		}
	}

	/// Largest loaded element — the cursor for loading a page after the
	/// current one.
	pub fn pivot_forward(&self) -> Option<T> {
		self.data.last().cloned()
	}

	/// Smallest loaded element — the cursor for loading a page before the
	/// current one.
	pub fn pivot_backward(&self) -> Option<T> {
		self.data.first().cloned()
	}

	/// Removes the element equal to `element` under the comparator.
	pub fn remove(&mut self, element: &T) -> bool {
		match self.data.binary_search_by(|probe| self.compare(probe, element)) {
			Ok(at) => {
				self.data.remove(at);
				true
			}
			Err(_) => false,
		}
	}

	/// Removes and returns the first element matching `predicate`, in
	/// iteration (sorted) order.
	pub fn remove_first_matching(&mut self, predicate: impl Fn(&T) -> bool) -> Option<T> {
		let at = self.data.iter().position(predicate)?;
		Some(self.data.remove(at))
	}

	/// Atomically removes the first element matching `predicate` and inserts
	/// `element` in its place, returning the removed element. Nothing is
	/// inserted when no element matches.
	pub fn replace_first_matching(&mut self, predicate: impl Fn(&T) -> bool, element: T) -> Option<T> {
		let removed = self.remove_first_matching(predicate)?;
		self.insert(element);
		Some(removed)
	}

	/// Removes every element matching `predicate`; true when any was removed.
	pub fn remove_all_matching(&mut self, predicate: impl Fn(&T) -> bool) -> bool {
		let before = self.data.len();
		self.data.retain(|element| !predicate(element));
		self.data.len() != before
	}

	/// Empties loaded pages and data; the cursor is managed separately.
	pub fn clear_loaded(&mut self) {
		self.pages.clear();
		self.data.clear();
	}

	/// Pre-populates pages and data without touching the cursor.
	pub fn seed(&mut self, seed: BTreeMap<PageNumber, Vec<T>>) {
		for (page, elements) in seed {
			self.merge(page, elements);
		}
	}

	/// Clones the full sorted collection.
	pub fn snapshot(&self) -> Vec<T> {
		self.data.clone()
	}

	pub fn pages(&self) -> Vec<PageNumber> {
		self.pages.iter().copied().collect()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn natural() -> OrderedStore<i64> {
		OrderedStore::new(Arc::new(i64::cmp))
	}

	#[test]
	fn empty_store_reports_sentinels() {
		let store = natural();
		assert_eq!(store.min_page(), INCORRECT_PAGE);
		assert_eq!(store.max_page(), INCORRECT_PAGE);
		assert_eq!(store.current_page(), INCORRECT_PAGE);
		assert!(!store.is_correct());
		assert!(store.is_empty());
		assert_eq!(store.pivot_forward(), None);
		assert_eq!(store.pivot_backward(), None);
	}

	#[test]
	fn merge_sorts_and_deduplicates() {
		let mut store = natural();
		store.merge(1, vec![3, 1, 2]);
		store.merge(2, vec![5, 4, 3]);

		assert_eq!(store.snapshot(), vec![1, 2, 3, 4, 5]);
		assert_eq!(store.pages(), vec![1, 2]);
		assert_eq!(store.min_page(), 1);
		assert_eq!(store.max_page(), 2);
	}

	#[test]
	fn merge_is_idempotent_for_identical_elements() {
		let mut store = natural();
		store.merge(1, vec![2, 1]);
		store.merge(1, vec![2, 1]);

		assert_eq!(store.snapshot(), vec![1, 2]);
		assert_eq!(store.pages(), vec![1]);
	}

	#[test]
	fn equal_keyed_insert_replaces_last_write_wins() {
		let by_key: Comparator<(i64, &str)> = Arc::new(|a, b| a.0.cmp(&b.0));
		let mut store = OrderedStore::new(by_key);
		store.merge(1, vec![(1, "old"), (2, "two")]);
		store.merge(2, vec![(1, "new")]);

		assert_eq!(store.snapshot(), vec![(1, "new"), (2, "two")]);
	}

	#[test]
	fn pivots_follow_the_comparator() {
		let reverse: Comparator<i64> = Arc::new(|a, b| b.cmp(a));
		let mut store = OrderedStore::new(reverse);
		store.merge(1, vec![1, 3, 2]);

		assert_eq!(store.snapshot(), vec![3, 2, 1]);
		assert_eq!(store.pivot_forward(), Some(1));
		assert_eq!(store.pivot_backward(), Some(3));
	}

	#[test]
	fn set_current_records_prior_value() {
		let mut store = natural();
		assert_eq!(store.before_page(), INCORRECT_PAGE);

		store.set_current(1);
		assert_eq!(store.current_page(), 1);
		assert_eq!(store.before_page(), INCORRECT_PAGE);

		store.set_current(2);
		assert_eq!(store.current_page(), 2);
		assert_eq!(store.before_page(), 1);
	}

	#[test]
	fn remove_and_matchers() {
		let mut store = natural();
		store.merge(1, vec![1, 2, 3, 4]);

		assert!(store.remove(&3));
		assert!(!store.remove(&3));
		assert_eq!(store.remove_first_matching(|e| e % 2 == 0), Some(2));
		assert!(store.remove_all_matching(|e| *e > 0));
		assert!(!store.remove_all_matching(|e| *e > 0));
		assert!(store.is_empty());
	}

	#[test]
	fn replace_first_matching_swaps_in_place() {
		let mut store = natural();
		store.merge(1, vec![1, 2, 3]);

		assert_eq!(store.replace_first_matching(|e| *e == 2, 9), Some(2));
		assert_eq!(store.snapshot(), vec![1, 3, 9]);
		assert_eq!(store.replace_first_matching(|e| *e == 2, 8), None);
		assert_eq!(store.snapshot(), vec![1, 3, 9]);
	}

	#[test]
	fn seed_populates_without_cursor() {
		let mut store = natural();
		let mut seed = BTreeMap::new();
		seed.insert(1, vec![2, 1]);
		seed.insert(2, vec![3]);
		store.seed(seed);

		assert_eq!(store.snapshot(), vec![1, 2, 3]);
		assert_eq!(store.pages(), vec![1, 2]);
		assert_eq!(store.current_page(), INCORRECT_PAGE);
		assert!(!store.is_correct());
	}

	#[test]
	fn clear_loaded_keeps_cursor() {
		let mut store = natural();
		store.merge(1, vec![1]);
		store.set_current(1);
		store.clear_loaded();

		assert!(store.is_empty());
		assert_eq!(store.pages(), Vec::<PageNumber>::new());
		assert_eq!(store.current_page(), 1);
	}
}
