use std::collections::HashMap;
use std::future::Future;

use pagefeed_worker::{EpochToken, TaskClass, spawn};
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::PageNumber;

/// One registered page load: its cancellation token and completion latch.
struct PageJob {
	token: EpochToken,
	done: watch::Receiver<bool>,
}

impl PageJob {
	fn is_active(&self) -> bool {
		!*self.done.borrow()
	}
}

/// Registry of in-flight page loads, keyed by page number.
///
/// The table is the sole enforcement point of the one-task-per-page rule:
/// dispatching while an active job for the same page is registered is a
/// no-op. A finished job does not block re-dispatch; its entry is replaced.
pub(crate) struct JobTable {
	inner: Mutex<HashMap<PageNumber, PageJob>>,
}

impl JobTable {
	pub fn new() -> Self {
		Self {
			inner: Mutex::new(HashMap::new()),
		}
	}

	/// True when an unfinished task is registered for `page`.
	pub fn is_active(&self, page: PageNumber) -> bool {
		self.inner.lock().get(&page).is_some_and(PageJob::is_active)
	}

	/// Registers and spawns a task for `page` unless one is already active.
	///
	/// `make_task` receives the job's cancellation token, a child of `epoch`;
	/// the completion latch flips once the returned future finishes,
	/// cancelled or not.
	pub fn dispatch<F, Fut>(&self, page: PageNumber, epoch: &EpochToken, make_task: F)
	where
		F: FnOnce(EpochToken) -> Fut,
		Fut: Future<Output = ()> + Send + 'static,
	{
		let mut table = self.inner.lock();
		if table.get(&page).is_some_and(PageJob::is_active) {
			tracing::trace!(page, "jobs.dispatch.duplicate");
			return;
		}

		let token = epoch.child();
		let (done_tx, done_rx) = watch::channel(false);
		let task = make_task(token.clone());
		table.insert(page, PageJob { token, done: done_rx });
		drop(table);

		tracing::trace!(page, generation = epoch.generation(), "jobs.dispatch");
		spawn(TaskClass::Fetch, async move {
			task.await;
			let _ = done_tx.send(true);
		});
	}

	/// Suspends until every task registered at call time has finished,
	/// successfully or not.
	pub async fn await_all(&self) {
		let latches: Vec<watch::Receiver<bool>> = self.inner.lock().values().map(|job| job.done.clone()).collect();
		for mut latch in latches {
			// Err means the task wrapper is gone, which implies completion.
			let _ = latch.wait_for(|done| *done).await;
		}
	}

	/// Requests cancellation of every registered task and clears the table.
	///
	/// Cancellation is cooperative: an in-flight fetch may still return, but
	/// the task observes its token before any shared-state write and discards
	/// the result.
	pub fn cancel_and_clear(&self) {
		let mut table = self.inner.lock();
		for (page, job) in table.iter() {
			tracing::trace!(page = *page, "jobs.cancel");
			job.token.cancel();
		}
		table.clear();
	}

	pub fn len(&self) -> usize {
		self.inner.lock().len()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

	use tokio::sync::Notify;

	use super::*;

	fn root() -> EpochToken {
		EpochToken::new(1)
	}

	#[tokio::test]
	async fn dispatch_deduplicates_active_pages() {
		let table = JobTable::new();
		let epoch = root();
		let gate = Arc::new(Notify::new());
		let runs = Arc::new(AtomicUsize::new(0));

		for _ in 0..3 {
			let gate = Arc::clone(&gate);
			let runs = Arc::clone(&runs);
			table.dispatch(7, &epoch, move |_token| async move {
				runs.fetch_add(1, Ordering::SeqCst);
				gate.notified().await;
			});
		}

		assert_eq!(table.len(), 1);
		assert!(table.is_active(7));

		gate.notify_one();
		table.await_all().await;

		assert_eq!(runs.load(Ordering::SeqCst), 1);
		assert!(!table.is_active(7));
	}

	#[tokio::test]
	async fn finished_jobs_do_not_block_redispatch() {
		let table = JobTable::new();
		let epoch = root();
		let runs = Arc::new(AtomicUsize::new(0));

		for _ in 0..2 {
			let runs = Arc::clone(&runs);
			table.dispatch(3, &epoch, move |_token| async move {
				runs.fetch_add(1, Ordering::SeqCst);
			});
			table.await_all().await;
		}

		assert_eq!(runs.load(Ordering::SeqCst), 2);
	}

	#[tokio::test]
	async fn await_all_covers_every_registered_page() {
		let table = JobTable::new();
		let epoch = root();
		let runs = Arc::new(AtomicUsize::new(0));

		for page in 1..=4 {
			let runs = Arc::clone(&runs);
			table.dispatch(page, &epoch, move |_token| async move {
				tokio::task::yield_now().await;
				runs.fetch_add(1, Ordering::SeqCst);
			});
		}
		table.await_all().await;

		assert_eq!(runs.load(Ordering::SeqCst), 4);
	}

	#[tokio::test]
	async fn cancel_and_clear_cancels_registered_tokens() {
		let table = JobTable::new();
		let epoch = root();
		let cancelled = Arc::new(AtomicBool::new(false));

		let flag = Arc::clone(&cancelled);
		table.dispatch(1, &epoch, |token| async move {
			token.cancelled().await;
			flag.store(true, Ordering::SeqCst);
		});

		table.cancel_and_clear();
		assert_eq!(table.len(), 0);
		assert!(!table.is_active(1));

		// The orphaned task still runs to completion once cancelled.
		while !cancelled.load(Ordering::SeqCst) {
			tokio::task::yield_now().await;
		}
	}
}
