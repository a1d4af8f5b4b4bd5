use thiserror::Error;

use crate::PageNumber;

/// Argument-validation errors raised synchronously by controller operations.
///
/// Fetch failures are never reported through this type; they are recorded in
/// the per-direction error sets and, for current-page loads, surfaced once
/// through the sink.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
	/// Jump target below the first page, or a back-jump with no recorded
	/// target.
	#[error("jump to page {0} impossible")]
	JumpOutOfRange(PageNumber),
	/// Computed previous page does not lie beyond the first page.
	#[error("loading previous page {0} impossible")]
	PrevPageOutOfRange(PageNumber),
}

/// Controller result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure reported by a page fetch callback.
///
/// Carried as a display message so snapshots handed to the sink stay
/// cloneable regardless of the transport's own error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("page fetch failed: {0}")]
pub struct FetchError(String);

impl FetchError {
	/// Wraps any displayable failure.
	pub fn new(message: impl ToString) -> Self {
		Self(message.to_string())
	}

	/// Returns the failure message.
	pub fn message(&self) -> &str {
		&self.0
	}
}

impl From<String> for FetchError {
	fn from(message: String) -> Self {
		Self(message)
	}
}

impl From<&str> for FetchError {
	fn from(message: &str) -> Self {
		Self(message.to_string())
	}
}
