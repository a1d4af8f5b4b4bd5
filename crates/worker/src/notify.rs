use std::fmt;

use tokio::sync::{mpsc, oneshot};

use crate::{TaskClass, spawn};

type Callback = Box<dyn FnOnce() + Send>;

/// Single serialized execution context for consumer-facing callbacks.
///
/// Callbacks submitted here run on one dedicated consumer task, in submission
/// order, keeping them off the fetch workers. The consumer task exits once
/// every handle has been dropped.
#[derive(Clone)]
pub struct NotifyContext {
	tx: mpsc::UnboundedSender<Callback>,
}

impl fmt::Debug for NotifyContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("NotifyContext").finish_non_exhaustive()
	}
}

impl NotifyContext {
	/// Spawns the consumer task and returns a handle to it.
	pub fn new() -> Self {
		let (tx, mut rx) = mpsc::unbounded_channel::<Callback>();
		spawn(TaskClass::Notify, async move {
			while let Some(callback) = rx.recv().await {
				callback();
			}
			tracing::trace!("worker.notify.closed");
		});
		Self { tx }
	}

	/// Submits one callback; silently dropped after the consumer has exited.
	pub fn submit(&self, callback: impl FnOnce() + Send + 'static) {
		if self.tx.send(Box::new(callback)).is_err() {
			tracing::trace!("worker.notify.dropped");
		}
	}

	/// Completes when every callback submitted before this call has run.
	pub async fn drain(&self) {
		let (done_tx, done_rx) = oneshot::channel();
		self.submit(move || {
			let _ = done_tx.send(());
		});
		let _ = done_rx.await;
	}
}

impl Default for NotifyContext {
	fn default() -> Self {
		Self::new()
	}
}
