//! Sorted-set pagination controller.
//!
//! `pagefeed` sits between a paged data source and a consumer: it loads
//! ordered pages on demand, merges them into one sorted, deduplicated
//! collection, and coordinates concurrent cancellable fetches so that at most
//! one fetch is ever in flight per page.
//!
//! * [`Paginator`]: the controller handle — jump, incremental next/prev
//!   loading, refresh, release, and direct collection edits
//! * [`PageFetch`]: the suspendable paged fetch callback, with keyset-style
//!   pivot cursors
//! * [`PageSink`]: the consumer notification surface, always invoked on one
//!   serialized notify context
//!
//! Fetch failures never cross the public boundary: they are recorded per
//! traversal direction and retried by re-issuing the same operation. Only
//! argument validation is surfaced as [`Error`].

mod controller;
mod error;
mod fetch;
mod jobs;
mod loader;
mod sink;
mod store;


pub use controller::{Paginator, PaginatorBuilder};
pub use error::{Error, FetchError, Result};
pub use fetch::PageFetch;
pub use sink::{NoopSink, PageSink};

/// Page index type used across the controller.
pub type PageNumber = i64;

/// Smallest addressable page.
pub const FIRST_PAGE: PageNumber = 1;

/// Sentinel page marking "no page loaded yet".
pub const INCORRECT_PAGE: PageNumber = -1;
