//! Optional observability helpers for outbound calls, refreshes, and webhook deliveries.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default) to emit spans named `signnow_client.operation` with the
//!   `operation` and `stage` fields, plus diagnostic events for refreshes, token clearing, and
//!   rejected webhooks.
//! - Enable `metrics` to increment the `signnow_client_operation_total` counter for every
//!   attempt/outcome, labeled by `operation` + `outcome`.

mod metrics;
mod tracing;

pub use self::{metrics::*, tracing::*};

// self
use crate::_prelude::*;

/// Emits a `tracing` event at the given level; compiles to nothing without the feature.
macro_rules! obs_event {
	($level:ident, $($arg:tt)+) => {{
		#[cfg(feature = "tracing")]
		::tracing::$level!($($arg)+);
	}};
}
pub(crate) use obs_event;

/// Operations observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Outbound API call including its optional retry.
	Request,
	/// Token refresh under the refresh lock.
	Refresh,
	/// Inbound webhook delivery.
	Webhook,
}
impl Operation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::Request => "request",
			Operation::Refresh => "refresh",
			Operation::Webhook => "webhook",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// An outbound call is being dispatched a second time after a refresh.
	Retry,
	/// A refresh found the pair already rotated by another waiter.
	Reused,
	/// A webhook delivery failed verification and was dropped.
	Rejected,
	/// Failure propagated back to the caller.
	Failure,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Success => "success",
			OperationOutcome::Retry => "retry",
			OperationOutcome::Reused => "reused",
			OperationOutcome::Rejected => "rejected",
			OperationOutcome::Failure => "failure",
		}
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
