use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pagefeed_worker::{EpochClock, EpochToken, NotifyContext};
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::fetch::PageFetch;
use crate::jobs::JobTable;
use crate::sink::{NoopSink, PageSink};
use crate::store::{Comparator, OrderedStore};
use crate::{FIRST_PAGE, FetchError, INCORRECT_PAGE, PageNumber};

/// Atomic single-slot guard for one orchestration family.
///
/// Claimed with a compare-exchange so concurrent callers of the same
/// operation collapse to one winner; the rest observe the slot as taken and
/// no-op.
pub(crate) struct OpSlot {
	active: AtomicBool,
}

impl OpSlot {
	fn new() -> Self {
		Self {
			active: AtomicBool::new(false),
		}
	}

	fn try_acquire(&self) -> bool {
		self.active.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_ok()
	}

	pub(crate) fn release(&self) {
		self.active.store(false, Ordering::Release);
	}

	pub(crate) fn is_active(&self) -> bool {
		self.active.load(Ordering::Acquire)
	}
}

/// Transient page bookkeeping: in-flight and failed loads, by traversal
/// direction relative to the current page at dispatch time.
#[derive(Default)]
pub(crate) struct Tracking {
	pub(crate) loading_next: BTreeSet<PageNumber>,
	pub(crate) loading_prev: BTreeSet<PageNumber>,
	pub(crate) error_next: BTreeSet<PageNumber>,
	pub(crate) error_prev: BTreeSet<PageNumber>,
}

/// Shared controller core; every handle and every spawned load task holds an
/// `Arc` of it.
pub(crate) struct PagerCore<T> {
	pub(crate) store: Mutex<OrderedStore<T>>,
	pub(crate) track: Mutex<Tracking>,
	pub(crate) jobs: JobTable,
	pub(crate) epoch: Mutex<EpochToken>,
	pub(crate) clock: EpochClock,
	pub(crate) fetcher: Arc<dyn PageFetch<T>>,
	pub(crate) sink: Arc<dyn PageSink<T>>,
	pub(crate) notify: NotifyContext,
	pub(crate) jump_slot: OpSlot,
	pub(crate) refresh_slot: OpSlot,
	pub(crate) refresh_all_slot: OpSlot,
}

impl<T: Clone + Send + Sync + 'static> PagerCore<T> {
	pub(crate) fn notify_data(&self, snapshot: Vec<T>, error: Option<FetchError>) {
		let sink = Arc::clone(&self.sink);
		self.notify.submit(move || sink.show_data(snapshot, error));
	}

	fn notify_empty_progress(&self) {
		let empty = self.store.lock().is_empty();
		let sink = Arc::clone(&self.sink);
		self.notify.submit(move || sink.show_empty_progress(empty));
	}

	fn notify_refresh_progress(&self, show: bool) {
		let sink = Arc::clone(&self.sink);
		self.notify.submit(move || sink.show_refresh_progress(show));
	}
}

/// Builder for [`Paginator`].
pub struct PaginatorBuilder<T> {
	fetcher: Arc<dyn PageFetch<T>>,
	sink: Arc<dyn PageSink<T>>,
	comparator: Comparator<T>,
	seed: Option<BTreeMap<PageNumber, Vec<T>>>,
}

impl<T: Clone + Send + Sync + 'static> PaginatorBuilder<T> {
	/// Replaces the default no-op sink.
	pub fn sink(mut self, sink: impl PageSink<T> + 'static) -> Self {
		self.sink = Arc::new(sink);
		self
	}

	/// Pre-populates pages and data without a fetch. The cursor stays
	/// uninitialized, so the first orchestration call still jumps.
	pub fn seed(mut self, seed: BTreeMap<PageNumber, Vec<T>>) -> Self {
		self.seed = Some(seed);
		self
	}

	/// Builds the controller handle and spawns its notify context.
	pub fn build(self) -> Paginator<T> {
		let clock = EpochClock::new();
		let epoch = EpochToken::new(clock.next());
		let mut store = OrderedStore::new(self.comparator);
		if let Some(seed) = self.seed {
			store.seed(seed);
		}
		Paginator {
			core: Arc::new(PagerCore {
				store: Mutex::new(store),
				track: Mutex::new(Tracking::default()),
				jobs: JobTable::new(),
				epoch: Mutex::new(epoch),
				clock,
				fetcher: self.fetcher,
				sink: self.sink,
				notify: NotifyContext::new(),
				jump_slot: OpSlot::new(),
				refresh_slot: OpSlot::new(),
				refresh_all_slot: OpSlot::new(),
			}),
		}
	}
}

/// Sorted-set pagination controller handle.
///
/// Clones share one controller. Orchestration operations (`jump`, `refresh`,
/// `refresh_all`) suspend the caller until every load they triggered has
/// finished; incremental loads return as soon as their job is dispatched.
pub struct Paginator<T> {
	pub(crate) core: Arc<PagerCore<T>>,
}

impl<T> Clone for Paginator<T> {
	fn clone(&self) -> Self {
		Self {
			core: Arc::clone(&self.core),
		}
	}
}

impl<T: Clone + Ord + Send + Sync + 'static> Paginator<T> {
	/// Starts a builder ordering elements by their natural order.
	pub fn builder(fetcher: impl PageFetch<T> + 'static) -> PaginatorBuilder<T> {
		Self::builder_with(fetcher, T::cmp)
	}
}

impl<T: Clone + Send + Sync + 'static> Paginator<T> {
	/// Starts a builder ordering elements with `comparator`.
	pub fn builder_with(
		fetcher: impl PageFetch<T> + 'static,
		comparator: impl Fn(&T, &T) -> std::cmp::Ordering + Send + Sync + 'static,
	) -> PaginatorBuilder<T> {
		PaginatorBuilder {
			fetcher: Arc::new(fetcher),
			sink: Arc::new(NoopSink),
			comparator: Arc::new(comparator),
			seed: None,
		}
	}

	/// Jumps to `page`, discarding all previously loaded pages.
	///
	/// Adjacent targets degrade to an incremental next/prev dispatch instead
	/// of a reset. A jump already in flight makes the call a no-op. Suspends
	/// until every load the jump triggered has finished.
	pub async fn jump(&self, page: PageNumber) -> Result<()> {
		if page < FIRST_PAGE {
			return Err(Error::JumpOutOfRange(page));
		}
		let current = self.current_page();
		if page == current + 1 {
			self.dispatch_next_page();
			return Ok(());
		}
		// An adjacent backward target only degrades while a backward load is
		// actually possible; at the lower boundary the jump falls through to
		// a full reset-and-reload.
		if page == current - 1 && self.dispatch_prev_page().is_ok() {
			return Ok(());
		}
		if !self.core.jump_slot.try_acquire() {
			tracing::debug!(page, "pager.jump.ignored");
			return Ok(());
		}

		tracing::debug!(page, "pager.jump");
		self.core.notify_empty_progress();
		self.release();
		PagerCore::dispatch_load(&self.core, page, false);
		self.core.jobs.await_all().await;
		self.core.jump_slot.release();
		self.core.notify_empty_progress();
		Ok(())
	}

	/// Jumps back to the page that was current before the last cursor move.
	pub async fn jump_back(&self) -> Result<()> {
		let before = self.before_page();
		if before == INCORRECT_PAGE {
			return Err(Error::JumpOutOfRange(before));
		}
		self.jump(before).await
	}

	/// Loads the page after the largest loaded page.
	///
	/// On an uninitialized controller this degrades to `jump(FIRST_PAGE)`.
	/// Returns once the job is dispatched; completion is observable through
	/// the sink and [`Self::is_loading_next_page`].
	pub async fn load_next_page(&self) -> Result<()> {
		if self.current_page() < FIRST_PAGE {
			return self.jump(FIRST_PAGE).await;
		}
		self.dispatch_next_page();
		Ok(())
	}

	/// Loads the page before the smallest loaded page.
	///
	/// On a controller at or before the first page this degrades to
	/// `jump(FIRST_PAGE)`. Fails when the computed previous page does not lie
	/// beyond the first page.
	pub async fn load_prev_page(&self) -> Result<()> {
		if self.current_page() <= FIRST_PAGE {
			return self.jump(FIRST_PAGE).await;
		}
		self.dispatch_prev_page()
	}

	/// Reloads only the current page.
	///
	/// Degrades to `jump(FIRST_PAGE)` when uninitialized; ignored while any
	/// refresh is active.
	pub async fn refresh(&self) -> Result<()> {
		if self.current_page() < FIRST_PAGE {
			return self.jump(FIRST_PAGE).await;
		}
		if self.core.refresh_all_slot.is_active() || !self.core.refresh_slot.try_acquire() {
			tracing::debug!("pager.refresh.ignored");
			return Ok(());
		}

		tracing::debug!(page = self.current_page(), "pager.refresh");
		self.core.notify_refresh_progress(true);
		PagerCore::dispatch_load(&self.core, self.current_page(), false);
		self.core.jobs.await_all().await;
		self.core.refresh_slot.release();
		self.core.notify_refresh_progress(false);
		Ok(())
	}

	/// Reloads every loaded page, dispatched concurrently.
	///
	/// Same guard family as [`Self::refresh`]. Whichever reload completes
	/// last defines the current page.
	pub async fn refresh_all(&self) -> Result<()> {
		if self.current_page() < FIRST_PAGE {
			return self.jump(FIRST_PAGE).await;
		}
		if self.core.refresh_slot.is_active() || !self.core.refresh_all_slot.try_acquire() {
			tracing::debug!("pager.refresh_all.ignored");
			return Ok(());
		}

		tracing::debug!("pager.refresh_all");
		self.core.notify_refresh_progress(true);
		let pages = self.pages();
		for page in pages {
			PagerCore::dispatch_load(&self.core, page, false);
		}
		self.core.jobs.await_all().await;
		self.core.refresh_all_slot.release();
		self.core.notify_refresh_progress(false);
		Ok(())
	}

	/// Dispatches a silent load of `page`: state updates apply, but the sink
	/// hears nothing about the outcome.
	pub fn load_page_silently(&self, page: PageNumber) {
		PagerCore::dispatch_load(&self.core, page, true);
	}

	/// Cancels outstanding loads and resets all paging state.
	///
	/// The current page is recorded into `before_page` before being reset,
	/// and `before_page` itself survives, so a back-jump stays possible after
	/// a release+jump cycle. A jump in flight keeps its slot.
	pub fn release(&self) {
		tracing::debug!(active_jobs = self.core.jobs.len(), "pager.release");
		{
			let mut store = self.core.store.lock();
			store.set_current(INCORRECT_PAGE);
			store.clear_loaded();
		}
		{
			let mut track = self.core.track.lock();
			track.loading_next.clear();
			track.loading_prev.clear();
			track.error_next.clear();
			track.error_prev.clear();
		}
		self.core.jobs.cancel_and_clear();
		{
			let mut epoch = self.core.epoch.lock();
			epoch.cancel();
			*epoch = EpochToken::new(self.core.clock.next());
		}
		self.core.refresh_slot.release();
		self.core.refresh_all_slot.release();
	}

	/// Inserts one element and republishes the snapshot.
	pub fn add(&self, element: T) {
		let snapshot = {
			let mut store = self.core.store.lock();
			store.insert(element);
			store.snapshot()
		};
		self.core.notify_data(snapshot, None);
	}

	/// Removes the element equal to `element` under the comparator and
	/// republishes the snapshot.
	pub fn remove(&self, element: &T) {
		let snapshot = {
			let mut store = self.core.store.lock();
			store.remove(element);
			store.snapshot()
		};
		self.core.notify_data(snapshot, None);
	}

	/// Removes and returns the first element matching `predicate`,
	/// republishing the snapshot when something was removed.
	pub fn remove_first_if(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
		let (removed, snapshot) = {
			let mut store = self.core.store.lock();
			let removed = store.remove_first_matching(&predicate);
			let snapshot = removed.is_some().then(|| store.snapshot());
			(removed, snapshot)
		};
		if let Some(snapshot) = snapshot {
			self.core.notify_data(snapshot, None);
		}
		removed
	}

	/// Removes every element matching `predicate`; true when any was removed.
	pub fn remove_all_if(&self, predicate: impl Fn(&T) -> bool) -> bool {
		let (removed, snapshot) = {
			let mut store = self.core.store.lock();
			let removed = store.remove_all_matching(&predicate);
			(removed, store.snapshot())
		};
		self.core.notify_data(snapshot, None);
		removed
	}

	/// Replaces the first element matching `predicate` with `element`,
	/// returning the removed one. The swap is atomic with respect to
	/// concurrent loads.
	pub fn replace_first_if(&self, element: T, predicate: impl Fn(&T) -> bool) -> Option<T> {
		let (removed, snapshot) = {
			let mut store = self.core.store.lock();
			let removed = store.replace_first_matching(&predicate, element);
			(removed, store.snapshot())
		};
		self.core.notify_data(snapshot, None);
		removed
	}

	/// Like [`Self::replace_first_if`], but builds the replacement only when
	/// a match was actually removed.
	pub fn replace_first_with(&self, make_element: impl FnOnce() -> T, predicate: impl Fn(&T) -> bool) -> Option<T> {
		let (removed, snapshot) = {
			let mut store = self.core.store.lock();
			let removed = store.remove_first_matching(&predicate);
			if removed.is_some() {
				store.insert(make_element());
			}
			(removed, store.snapshot())
		};
		self.core.notify_data(snapshot, None);
		removed
	}

	/// Completes when every sink notification submitted so far has been
	/// delivered. Useful for orderly shutdown and deterministic assertions.
	pub async fn flush_notifications(&self) {
		self.core.notify.drain().await;
	}

	pub fn current_page(&self) -> PageNumber {
		self.core.store.lock().current_page()
	}

	pub fn before_page(&self) -> PageNumber {
		self.core.store.lock().before_page()
	}

	pub fn min_page(&self) -> PageNumber {
		self.core.store.lock().min_page()
	}

	pub fn max_page(&self) -> PageNumber {
		self.core.store.lock().max_page()
	}

	/// True once min, max, and current page are all real pages.
	pub fn is_correct_pages(&self) -> bool {
		self.core.store.lock().is_correct()
	}

	pub fn is_empty_state(&self) -> bool {
		self.core.store.lock().is_empty()
	}

	/// Sorted snapshot of the merged collection.
	pub fn data(&self) -> Vec<T> {
		self.core.store.lock().snapshot()
	}

	/// Loaded page indices, ascending.
	pub fn pages(&self) -> Vec<PageNumber> {
		self.core.store.lock().pages()
	}

	pub fn is_loading_next_page(&self) -> bool {
		!self.core.track.lock().loading_next.is_empty()
	}

	/// True while a fetch task for `page` is in flight.
	pub fn is_page_loading(&self, page: PageNumber) -> bool {
		self.core.jobs.is_active(page)
	}

	pub fn is_loading_prev_page(&self) -> bool {
		!self.core.track.lock().loading_prev.is_empty()
	}

	pub fn is_jumping(&self) -> bool {
		self.core.jump_slot.is_active()
	}

	pub fn is_refreshing_state(&self) -> bool {
		self.core.refresh_slot.is_active() || self.core.refresh_all_slot.is_active()
	}

	/// Pages whose last forward load failed, ascending.
	pub fn error_next_pages(&self) -> Vec<PageNumber> {
		self.core.track.lock().error_next.iter().copied().collect()
	}

	/// Pages whose last backward load failed, ascending.
	pub fn error_prev_pages(&self) -> Vec<PageNumber> {
		self.core.track.lock().error_prev.iter().copied().collect()
	}

	fn dispatch_next_page(&self) {
		let next = self.max_page() + 1;
		self.core.track.lock().loading_next.insert(next);
		PagerCore::dispatch_load(&self.core, next, false);
	}

	fn dispatch_prev_page(&self) -> Result<()> {
		let prev = self.min_page() - 1;
		if prev > FIRST_PAGE {
			self.core.track.lock().loading_prev.insert(prev);
			PagerCore::dispatch_load(&self.core, prev, false);
			Ok(())
		} else {
			Err(Error::PrevPageOutOfRange(prev))
		}
	}
}
