use std::future::Future;

use async_trait::async_trait;

use crate::{FetchError, PageNumber};

/// Paged fetch callback consumed by the controller.
///
/// Returns the elements belonging to `page`, in any order. The pivots support
/// keyset-style continuation: `pivot_forward` carries the largest loaded
/// element when scanning past it, `pivot_backward` the smallest when scanning
/// before it. Both are `None` for initial, refresh, and jump-target loads.
#[async_trait]
pub trait PageFetch<T>: Send + Sync {
	/// Fetches one page of elements.
	async fn fetch(&self, page: PageNumber, pivot_forward: Option<T>, pivot_backward: Option<T>) -> Result<Vec<T>, FetchError>;
}

#[async_trait]
impl<T, F, Fut> PageFetch<T> for F
where
	T: Send + 'static,
	F: Fn(PageNumber, Option<T>, Option<T>) -> Fut + Send + Sync,
	Fut: Future<Output = Result<Vec<T>, FetchError>> + Send + 'static,
{
	async fn fetch(&self, page: PageNumber, pivot_forward: Option<T>, pivot_backward: Option<T>) -> Result<Vec<T>, FetchError> {
		self(page, pivot_forward, pivot_backward).await
	}
}
