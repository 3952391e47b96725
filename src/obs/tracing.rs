// self
use crate::{_prelude::*, obs::CallKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// A span builder used around token, invoke, poll, and blob calls.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the provided call kind + stage.
	pub fn new(kind: CallKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("devcenter.call", call = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a retry the invoker is about to perform.
pub fn log_retry(reason: &'static str, attempt: u32, max_attempts: u32, delay: Duration) {
	#[cfg(feature = "tracing")]
	tracing::warn!(reason, attempt, max_attempts, delay_ms = delay.as_millis() as u64, "retrying call");
	#[cfg(not(feature = "tracing"))]
	let _ = (reason, attempt, max_attempts, delay);
}

/// Logs a non-retryable API rejection.
pub fn log_rejection(status: u16, code: &str) {
	#[cfg(feature = "tracing")]
	tracing::debug!(status, code, "call rejected");
	#[cfg(not(feature = "tracing"))]
	let _ = (status, code);
}

/// Logs a token acquisition.
pub fn log_token_acquired(generation: u64, expires_at: Option<OffsetDateTime>) {
	#[cfg(feature = "tracing")]
	tracing::info!(generation, expires_at = ?expires_at, "access token acquired");
	#[cfg(not(feature = "tracing"))]
	let _ = (generation, expires_at);
}

/// Logs a refresh served by a token another caller already acquired.
pub fn log_token_reused(stale: u64, current: u64) {
	#[cfg(feature = "tracing")]
	tracing::debug!(stale, current, "stale token already replaced");
	#[cfg(not(feature = "tracing"))]
	let _ = (stale, current);
}

/// Logs a workflow status change observed by the poller.
pub fn log_status_change(target: &str, step: Option<&str>, state: Option<&str>) {
	#[cfg(feature = "tracing")]
	tracing::info!(target_name = target, step, state, "workflow status changed");
	#[cfg(not(feature = "tracing"))]
	let _ = (target, step, state);
}

/// Logs a throttled poll.
pub fn log_rate_limited(target: &str, pause: Duration) {
	#[cfg(feature = "tracing")]
	tracing::warn!(target_name = target, pause_ms = pause.as_millis() as u64, "rate limited");
	#[cfg(not(feature = "tracing"))]
	let _ = (target, pause);
}

/// Logs an error report that could not be fetched.
pub fn log_error_report_unavailable(url: &str, error: &dyn StdError) {
	#[cfg(feature = "tracing")]
	tracing::warn!(url, error = %error, "error report could not be downloaded");
	#[cfg(not(feature = "tracing"))]
	let _ = (url, error);
}
