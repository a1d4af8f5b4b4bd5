/// Shared execution classes used for worker scheduling and observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Background page-fetch work dispatched by the pagination controller.
	Fetch,
	/// Serialized foreground work delivering consumer notifications.
	Notify,
}

impl TaskClass {
	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::Fetch => "fetch",
			Self::Notify => "notify",
		}
	}
}
