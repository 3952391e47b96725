//! Resilient invocation of certification API calls.
//!
//! [`ResilientHttpInvoker::invoke`] renders a [`RequestIntent`] once, then sends a fresh clone with the
//! current bearer token on every attempt. Timeouts pause for a fixed interval, 401 refreshes the token
//! and retries at once, 500/502 back off for a random interval, and any other status is decoded and
//! returned. Caller cancellation interrupts sends and pauses alike.

pub mod retry;

pub use retry::*;

// self
use crate::{
	_prelude::*,
	auth::{Credentials, TokenProvider},
	decode::{ApiResponseDecoder, ErrorDetails, InvocationResult},
	http::{ApiTransport, RequestIntent, TransportOutcome, clone_request},
	obs::{self, CallKind},
};

/// Per-invoker settings.
#[derive(Clone, Debug, Default)]
pub struct InvokerConfig {
	/// Backoff constants and attempt limit.
	pub retry: RetryPolicy,
	/// Fixed pause before every invocation; spaces out bursts of calls.
	pub request_delay: Duration,
	/// Sent as `MS-CorrelationId` on every request when set.
	pub correlation_id: Option<String>,
}
impl InvokerConfig {
	/// Sets a freshly generated correlation id.
	pub fn with_new_correlation_id(mut self) -> Self {
		self.correlation_id = Some(new_correlation_id());

		self
	}
}

/// Generates a random correlation id.
pub fn new_correlation_id() -> String {
	uuid::Uuid::new_v4().to_string()
}

/// Retry/backoff engine wrapping an [`ApiTransport`] and a [`TokenProvider`].
pub struct ResilientHttpInvoker<T>
where
	T: ?Sized + ApiTransport,
{
	transport: Arc<T>,
	tokens: Arc<TokenProvider<T>>,
	config: InvokerConfig,
	cancel: CancellationToken,
}
impl<T> ResilientHttpInvoker<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates an invoker that authenticates with `credentials` over `transport`.
	pub fn new(credentials: Credentials, transport: Arc<T>) -> Self {
		let tokens = Arc::new(TokenProvider::new(Arc::new(credentials), transport.clone()));

		Self::with_token_provider(tokens, transport)
	}

	/// Creates an invoker sharing an existing provider.
	pub fn with_token_provider(tokens: Arc<TokenProvider<T>>, transport: Arc<T>) -> Self {
		Self { transport, tokens, config: InvokerConfig::default(), cancel: CancellationToken::new() }
	}

	/// Replaces the configuration.
	pub fn with_config(mut self, config: InvokerConfig) -> Self {
		self.config = config;

		self
	}

	/// Ties every invocation to `cancel`.
	pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
		self.cancel = cancel;

		self
	}

	/// Token provider used for every attempt.
	pub fn tokens(&self) -> &Arc<TokenProvider<T>> {
		&self.tokens
	}

	/// Shared transport.
	pub fn transport(&self) -> &Arc<T> {
		&self.transport
	}

	/// Active configuration.
	pub fn config(&self) -> &InvokerConfig {
		&self.config
	}

	/// Cancellation token observed by every invocation.
	pub fn cancellation(&self) -> &CancellationToken {
		&self.cancel
	}

	/// Executes `intent` with retries.
	///
	/// Returns `Ok(Failure)` for remote rejections, including the last rejection when the budget runs
	/// out; `Err` only for local problems, fatal transport failures, cancellation, or a budget spent
	/// without any response.
	pub async fn invoke(&self, intent: &RequestIntent) -> Result<InvocationResult> {
		obs::observe(CallKind::Invoke, "invoke", self.run(intent)).await
	}

	async fn run(&self, intent: &RequestIntent) -> Result<InvocationResult> {
		if intent.method != Method::GET && intent.method != Method::POST {
			return Err(Error::UnsupportedMethod { method: intent.method.to_string() });
		}
		if !self.config.request_delay.is_zero() {
			self.pause(self.config.request_delay).await?;
		}

		let template = intent.render(self.config.correlation_id.as_deref())?;
		let policy = &self.config.retry;
		let mut token = self.cancellable(self.tokens.token()).await?;
		let mut budget = RetryBudget::new(policy.max_attempts);
		let mut last_failure: Option<ErrorDetails> = None;

		while budget.try_begin() {
			let mut request = clone_request(&template);

			request.headers_mut().insert(header::AUTHORIZATION, token.authorization()?);

			let outcome = tokio::select! {
				biased;
				_ = self.cancel.cancelled() => TransportOutcome::Cancelled,
				outcome = self.transport.send(request) => outcome,
			};
			let reason = match retry::classify(&outcome) {
				Verdict::Retry(reason) => reason,
				Verdict::Complete | Verdict::Abort | Verdict::Cancel => return finish(outcome),
			};

			if let TransportOutcome::Response(response) = &outcome {
				last_failure = Some(ApiResponseDecoder::error(response.status(), response.body()));
			}
			if budget.is_spent() {
				break;
			}

			let pause = policy.pause_for(reason);

			obs::log_retry(reason.as_str(), budget.attempt(), budget.max_attempts(), pause);
			obs::record_retry(reason.as_str());

			if reason == RetryReason::Unauthorized {
				token = self.cancellable(self.tokens.refresh(&token)).await?;
			} else {
				self.pause(pause).await?;
			}
		}

		match last_failure {
			Some(details) => Ok(InvocationResult::Failure(details)),
			None => Err(Error::RetriesExhausted { attempts: budget.attempt() }),
		}
	}

	async fn pause(&self, duration: Duration) -> Result<()> {
		tokio::select! {
			biased;
			_ = self.cancel.cancelled() => Err(Error::Cancelled),
			_ = tokio::time::sleep(duration) => Ok(()),
		}
	}

	async fn cancellable<F, V>(&self, fut: F) -> Result<V>
	where
		F: Future<Output = Result<V>>,
	{
		tokio::select! {
			biased;
			_ = self.cancel.cancelled() => Err(Error::Cancelled),
			value = fut => value,
		}
	}
}
impl<T> Debug for ResilientHttpInvoker<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ResilientHttpInvoker")
			.field("tokens", &self.tokens)
			.field("config", &self.config)
			.field("cancelled", &self.cancel.is_cancelled())
			.finish()
	}
}

fn finish(outcome: TransportOutcome) -> Result<InvocationResult> {
	match outcome {
		TransportOutcome::Response(response) => {
			let result = ApiResponseDecoder::decode(response.status(), response.into_body());

			if let InvocationResult::Failure(details) = &result {
				obs::log_rejection(details.http_status, &details.code);
			}

			Ok(result)
		},
		TransportOutcome::Retryable(e) | TransportOutcome::Fatal(e) => Err(e.into()),
		TransportOutcome::Cancelled => Err(Error::Cancelled),
	}
}
