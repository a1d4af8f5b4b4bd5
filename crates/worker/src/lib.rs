//! Shared worker runtime primitives for pagefeed task execution.
//!
//! This crate provides the two execution contexts the pagination controller
//! runs on, plus the cancellation plumbing that ties task lifetimes to
//! controller release cycles:
//! * [`spawn`]: task spawning with shared classification metadata
//! * [`TaskClass`]: execution classes for scheduling and observability
//! * [`EpochClock`] / [`EpochToken`]: generation-scoped cooperative cancellation
//! * [`NotifyContext`]: the single serialized consumer-callback context

mod class;
mod notify;
mod spawn;
mod token;

#[cfg(test)]
mod tests;

pub use class::TaskClass;
pub use notify::NotifyContext;
pub use spawn::spawn;
pub use token::{EpochClock, EpochToken};
