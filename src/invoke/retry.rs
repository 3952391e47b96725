//! Retry policy, per-invocation budget, and the pure classification of attempt outcomes.

// crates.io
use rand::Rng;
// self
use crate::{_prelude::*, http::TransportOutcome};

/// Attempts allowed per invocation.
pub const MAX_RETRIES: u32 = 10;

/// Backoff constants shared by every invocation of an invoker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Attempts allowed per invocation.
	pub max_attempts: u32,
	/// Fixed pause after a retryable transport failure.
	pub timeout_pause: Duration,
	/// Inclusive lower bound of the randomized 500/502 backoff.
	pub gateway_backoff_min: Duration,
	/// Exclusive upper bound of the randomized 500/502 backoff.
	pub gateway_backoff_max: Duration,
}
impl RetryPolicy {
	/// Draws a pause in `[gateway_backoff_min, gateway_backoff_max)`.
	pub fn gateway_backoff(&self) -> Duration {
		let min = self.gateway_backoff_min.as_millis() as u64;
		let max = self.gateway_backoff_max.as_millis() as u64;

		if max <= min {
			return self.gateway_backoff_min;
		}

		Duration::from_millis(rand::rng().random_range(min..max))
	}

	/// Pause applied before retrying for `reason`; authorization retries never pause.
	pub fn pause_for(&self, reason: RetryReason) -> Duration {
		match reason {
			RetryReason::Timeout => self.timeout_pause,
			RetryReason::Unauthorized => Duration::ZERO,
			RetryReason::ServerError | RetryReason::BadGateway => self.gateway_backoff(),
		}
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: MAX_RETRIES,
			timeout_pause: Duration::from_secs(2),
			gateway_backoff_min: Duration::from_secs(1),
			gateway_backoff_max: Duration::from_secs(10),
		}
	}
}

/// Attempt counter scoped to one invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryBudget {
	attempt: u32,
	max_attempts: u32,
}
impl RetryBudget {
	/// Creates a budget allowing `max_attempts` sends.
	pub fn new(max_attempts: u32) -> Self {
		Self { attempt: 0, max_attempts }
	}

	/// Claims the next attempt slot; `false` once the budget is spent.
	pub fn try_begin(&mut self) -> bool {
		if self.attempt >= self.max_attempts {
			return false;
		}

		self.attempt += 1;

		true
	}

	/// Attempts claimed so far.
	pub fn attempt(&self) -> u32 {
		self.attempt
	}

	/// Attempts allowed in total.
	pub fn max_attempts(&self) -> u32 {
		self.max_attempts
	}

	/// `true` when no further attempt may be claimed.
	pub fn is_spent(&self) -> bool {
		self.attempt >= self.max_attempts
	}
}

/// Trigger of a retry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RetryReason {
	/// Transport timeout or connection failure not caused by the caller.
	Timeout,
	/// HTTP 401; the token is refreshed before the next attempt.
	Unauthorized,
	/// HTTP 500.
	ServerError,
	/// HTTP 502.
	BadGateway,
}
impl RetryReason {
	/// Returns a stable label suitable for log or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Timeout => "timeout",
			Self::Unauthorized => "unauthorized",
			Self::ServerError => "server_error",
			Self::BadGateway => "bad_gateway",
		}
	}
}

/// What the invoker does with one attempt's outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
	/// Decode and return the response (success or rejection).
	Complete,
	/// Retry for the given reason if the budget allows.
	Retry(RetryReason),
	/// Return the transport error.
	Abort,
	/// Return [`Error::Cancelled`].
	Cancel,
}

/// Maps an outcome to a [`Verdict`]; the retry decision depends on nothing else.
pub fn classify(outcome: &TransportOutcome) -> Verdict {
	match outcome {
		TransportOutcome::Response(response) => classify_status(response.status()),
		TransportOutcome::Retryable(_) => Verdict::Retry(RetryReason::Timeout),
		TransportOutcome::Fatal(_) => Verdict::Abort,
		TransportOutcome::Cancelled => Verdict::Cancel,
	}
}

/// Status half of [`classify`].
pub fn classify_status(status: StatusCode) -> Verdict {
	match status {
		StatusCode::UNAUTHORIZED => Verdict::Retry(RetryReason::Unauthorized),
		StatusCode::INTERNAL_SERVER_ERROR => Verdict::Retry(RetryReason::ServerError),
		StatusCode::BAD_GATEWAY => Verdict::Retry(RetryReason::BadGateway),
		_ => Verdict::Complete,
	}
}
