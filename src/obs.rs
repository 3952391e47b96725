//! Optional observability helpers for invocations, token acquisition, polling, and blob transfers.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `devcenter.call` with the `call` (component) and
//!   `stage` (call site) fields, plus events for retries, token refreshes, and status changes.
//! - Enable `metrics` to increment the `devcenter_call_total` counter for every attempt/success/failure,
//!   labeled by `call` + `outcome`, and `devcenter_retry_total` labeled by `reason`.

mod metrics;
mod tracing;

pub use self::{metrics::*, tracing::*};

// self
use crate::_prelude::*;

/// Components whose calls are observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
	/// Client-credentials token acquisition.
	Token,
	/// Certification API invocation (all attempts).
	Invoke,
	/// Status polling loop.
	Poll,
	/// Blob upload or download.
	Blob,
}
impl CallKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallKind::Token => "token",
			CallKind::Invoke => "invoke",
			CallKind::Poll => "poll",
			CallKind::Blob => "blob",
		}
	}
}
impl Display for CallKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Entry to a call.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records attempt plus success/failure around `fut`, inside a `devcenter.call` span.
pub async fn observe<T, Fut>(kind: CallKind, stage: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = CallSpan::new(kind, stage);

	record_call_outcome(kind, CallOutcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => record_call_outcome(kind, CallOutcome::Success),
		Err(_) => record_call_outcome(kind, CallOutcome::Failure),
	}

	result
}
