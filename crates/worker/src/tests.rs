use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use super::*;

#[tokio::test]
async fn notify_runs_callbacks_in_submission_order() {
	let context = NotifyContext::new();
	let seen = Arc::new(Mutex::new(Vec::new()));

	for value in 0..8 {
		let seen = Arc::clone(&seen);
		context.submit(move || seen.lock().unwrap().push(value));
	}
	context.drain().await;

	assert_eq!(*seen.lock().unwrap(), (0..8).collect::<Vec<_>>());
}

#[tokio::test]
async fn notify_drain_waits_for_earlier_submissions() {
	let context = NotifyContext::new();
	let ran = Arc::new(AtomicBool::new(false));

	let flag = Arc::clone(&ran);
	context.submit(move || flag.store(true, Ordering::SeqCst));
	context.drain().await;

	assert!(ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn epoch_child_shares_generation_and_cancellation() {
	let clock = EpochClock::new();
	let root = EpochToken::new(clock.next());
	let child = root.child();

	assert_eq!(child.generation(), root.generation());
	assert!(!child.is_cancelled());

	root.cancel();
	assert!(child.is_cancelled());
	child.cancelled().await;
}

#[test]
fn epoch_child_cancel_leaves_root_running() {
	let root = EpochToken::new(1);
	let child = root.child();

	child.cancel();
	assert!(child.is_cancelled());
	assert!(!root.is_cancelled());
}

#[test]
fn epoch_clock_is_monotonic() {
	let clock = EpochClock::new();
	let first = clock.next();
	let second = clock.next();
	assert!(second > first);
}

#[test]
fn spawn_outside_runtime_uses_global_fallback() {
	let (tx, rx) = std::sync::mpsc::channel();
	spawn(TaskClass::Fetch, async move {
		let _ = tx.send(42);
	});
	assert_eq!(rx.recv_timeout(std::time::Duration::from_secs(5)), Ok(42));
}
