use std::sync::Arc;

use crate::FetchError;

/// Consumer notification surface.
///
/// Every method defaults to a no-op so consumers implement only what they
/// render. Calls are delivered on the controller's serialized notify context,
/// in submission order, never on a fetch worker.
pub trait PageSink<T>: Send + Sync {
	/// Toggles the empty-state progress indicator around a jump. `empty`
	/// reports whether the merged collection was empty when the toggle was
	/// emitted.
	fn show_empty_progress(&self, empty: bool) {
		let _ = empty;
	}

	/// Delivers the full sorted snapshot. `error` is set only when the load
	/// that defined the current page failed.
	fn show_data(&self, data: Vec<T>, error: Option<FetchError>) {
		let _ = (data, error);
	}

	/// Toggles the refresh progress indicator around a refresh.
	fn show_refresh_progress(&self, show: bool) {
		let _ = show;
	}
}

/// Sink that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl<T> PageSink<T> for NoopSink {}

impl<T, S> PageSink<T> for Arc<S>
where
	S: PageSink<T> + ?Sized,
{
	fn show_empty_progress(&self, empty: bool) {
		(**self).show_empty_progress(empty);
	}

	fn show_data(&self, data: Vec<T>, error: Option<FetchError>) {
		(**self).show_data(data, error);
	}

	fn show_refresh_progress(&self, show: bool) {
		(**self).show_refresh_progress(show);
	}
}
