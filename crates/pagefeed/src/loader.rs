use std::sync::Arc;

use pagefeed_worker::EpochToken;

use crate::controller::PagerCore;
use crate::PageNumber;

impl<T: Clone + Send + Sync + 'static> PagerCore<T> {
	/// Dispatches one page load through the job table.
	///
	/// No-ops while a task for `page` is already active. The spawned task
	/// selects pivot cursors from the store, awaits the fetch callback racing
	/// its cancellation token, and merges or records the outcome. A cancelled
	/// task never touches shared state again.
	pub(crate) fn dispatch_load(core: &Arc<Self>, page: PageNumber, silent: bool) {
		let epoch = core.epoch.lock().clone();
		let task_core = Arc::clone(core);
		core.jobs.dispatch(page, &epoch, move |token| async move {
			task_core.load_page(page, silent, token).await;
		});
	}

	async fn load_page(self: Arc<Self>, page: PageNumber, silent: bool, token: EpochToken) {
		let (pivot_forward, pivot_backward) = {
			let store = self.store.lock();
			let current = store.current_page();
			let forward = if page > current { store.pivot_forward() } else { None };
			let backward = if page < current { store.pivot_backward() } else { None };
			(forward, backward)
		};
		tracing::trace!(page, silent, generation = token.generation(), "pager.load_page");

		let fetched = tokio::select! {
			() = token.cancelled() => {
				tracing::trace!(page, "pager.load_page.cancelled");
				return;
			}
			fetched = self.fetcher.fetch(page, pivot_forward, pivot_backward) => fetched,
		};

		match fetched {
			Ok(elements) => {
				let snapshot = {
					let mut store = self.store.lock();
					// Re-checked under the lock so a release racing the fetch
					// completion cannot observe a merge.
					if token.is_cancelled() {
						return;
					}
					store.merge(page, elements);
					store.set_current(page);
					store.snapshot()
				};
				{
					let mut track = self.track.lock();
					track.error_next.remove(&page);
					track.error_prev.remove(&page);
				}
				tracing::trace!(page, "pager.load_page.merged");
				if !silent {
					self.notify_data(snapshot, None);
				}
			}
			Err(error) => {
				if token.is_cancelled() {
					return;
				}
				tracing::warn!(page, %error, "pager.load_page.failed");
				let current = self.store.lock().current_page();
				if page > current {
					self.track.lock().error_next.insert(page);
				} else if page < current {
					self.track.lock().error_prev.insert(page);
				} else if !silent {
					let snapshot = self.store.lock().snapshot();
					self.notify_data(snapshot, Some(error));
				}
			}
		}

		let mut track = self.track.lock();
		track.loading_next.remove(&page);
		track.loading_prev.remove(&page);
	}
}
