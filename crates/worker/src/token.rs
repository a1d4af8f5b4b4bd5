use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;

/// Monotonic generation clock for controller release cycles.
#[derive(Debug, Default, Clone)]
pub struct EpochClock {
	next: Arc<AtomicU64>,
}

impl EpochClock {
	/// Creates a new epoch clock starting at generation 1.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the next generation ID.
	pub fn next(&self) -> u64 {
		self.next.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
	}
}

/// Generation-scoped cancellation token for one release cycle.
///
/// Every task dispatched within a cycle holds a child of the cycle's root
/// token; cancelling the root (or the child directly) asks the task to stop
/// cooperatively. Children share the root's generation.
#[derive(Debug, Clone)]
pub struct EpochToken {
	generation: u64,
	cancel: CancellationToken,
}

impl EpochToken {
	/// Creates a root token for the given generation.
	pub fn new(generation: u64) -> Self {
		Self {
			generation,
			cancel: CancellationToken::new(),
		}
	}

	/// Returns generation ID.
	pub const fn generation(&self) -> u64 {
		self.generation
	}

	/// Returns true when cancellation is requested.
	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Requests cancellation.
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	/// Future resolving when cancellation is requested.
	pub async fn cancelled(&self) {
		self.cancel.cancelled().await;
	}

	/// Creates a child token in the same generation.
	pub fn child(&self) -> Self {
		Self {
			generation: self.generation,
			cancel: self.cancel.child_token(),
		}
	}
}
