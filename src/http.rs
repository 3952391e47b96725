//! Transport seam for certification API, identity, and token requests.
//!
//! [`ApiTransport`] is the crate's only dependency on an HTTP stack. It takes a fully buffered
//! [`HttpRequest`] and resolves to a tagged [`TransportOutcome`], so the retry decision in the invoker is
//! a pure function of the tag instead of error-type inspection. [`ReqwestTransport`] is the default
//! implementation; tests substitute scripted fakes.

pub mod clone;
pub mod intent;

pub use clone::*;
pub use intent::*;

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`ApiTransport::send`].
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = TransportOutcome> + 'a + Send>>;

/// Tagged result of one send attempt.
#[derive(Debug)]
pub enum TransportOutcome {
	/// A response arrived (any status).
	Response(HttpResponse),
	/// Timeout or connection failure that was not caused by the caller; safe to retry.
	Retryable(TransportError),
	/// Failure that retrying cannot fix (malformed request, protocol error).
	Fatal(TransportError),
	/// Caller-initiated cancellation observed by the transport.
	Cancelled,
}
impl TransportOutcome {
	/// Short label used in logs and metrics.
	pub const fn as_str(&self) -> &'static str {
		match self {
			Self::Response(_) => "response",
			Self::Retryable(_) => "retryable",
			Self::Fatal(_) => "fatal",
			Self::Cancelled => "cancelled",
		}
	}
}

/// HTTP transport shared by the token provider, invoker, and API client.
///
/// Implementations must be `Send + Sync + 'static` so one transport can back several providers and
/// invokers behind an [`Arc`].
pub trait ApiTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` once and classifies the result.
	fn send(&self, request: HttpRequest) -> TransportFuture<'_>;
}
impl<T> ApiTransport for Arc<T>
where
	T: ?Sized + ApiTransport,
{
	fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
		(**self).send(request)
	}
}

/// Thin wrapper around [`ReqwestClient`] so timeout and classification live in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client whose requests time out after `timeout`.
	pub fn with_timeout(timeout: Duration) -> Result<Self> {
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.build()
			.map_err(crate::error::ConfigError::from)?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiTransport for ReqwestTransport {
	fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let request = match reqwest::Request::try_from(request) {
				Ok(request) => request,
				Err(e) => return TransportOutcome::Fatal(TransportError::network(e)),
			};
			let response = match client.execute(request).await {
				Ok(response) => response,
				Err(e) => return classify_reqwest_error(e),
			};
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = match response.bytes().await {
				Ok(body) => body.to_vec(),
				Err(e) => return classify_reqwest_error(e),
			};
			let mut response = HttpResponse::new(body);

			*response.status_mut() = status;
			*response.headers_mut() = headers;

			TransportOutcome::Response(response)
		})
	}
}

/// Timeouts and connection failures are retryable; everything else reqwest reports is fatal.
#[cfg(feature = "reqwest")]
pub fn classify_reqwest_error(e: ReqwestError) -> TransportOutcome {
	if e.is_builder() || e.is_redirect() || e.is_decode() {
		TransportOutcome::Fatal(TransportError::network(e))
	} else if e.is_timeout() {
		TransportOutcome::Retryable(TransportError::timeout(e))
	} else if e.is_connect() || e.is_request() || e.is_body() {
		TransportOutcome::Retryable(TransportError::network(e))
	} else {
		TransportOutcome::Fatal(TransportError::network(e))
	}
}
