//! Resilient client for the hardware-certification (Dev Center) API: client-credentials tokens, retrying
//! invocations with structured error decoding, status polling, and package blob transfers.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod blob;
#[cfg(feature = "cli")] pub mod cli;
pub mod decode;
pub mod error;
pub mod http;
pub mod invoke;
pub mod obs;
pub mod poll;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and fakes for unit tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// std
	use std::collections::VecDeque;
	// self
	use crate::{
		auth::Credentials,
		error::TransportError,
		http::{ApiTransport, TransportFuture, TransportOutcome},
		invoke::RetryPolicy,
	};

	/// Scripted transport that answers token requests with numbered tokens and API requests from a
	/// queue of canned outcomes.
	#[derive(Debug, Default)]
	pub struct ScriptedTransport {
		api: Mutex<VecDeque<ScriptedReply>>,
		sent: Mutex<Vec<HttpRequest>>,
		tokens_issued: Mutex<u32>,
	}
	impl ScriptedTransport {
		/// Builds a transport that replays `replies` for API calls in order.
		pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
			Self { api: Mutex::new(replies.into_iter().collect()), ..Default::default() }
		}

		/// API requests observed so far (token requests excluded).
		pub fn sent(&self) -> Vec<HttpRequest> {
			self.sent.lock().iter().map(crate::http::clone_request).collect()
		}

		/// Number of token POSTs served.
		pub fn tokens_issued(&self) -> u32 {
			*self.tokens_issued.lock()
		}
	}
	impl ApiTransport for ScriptedTransport {
		fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
			let outcome = if request.uri().path().ends_with("/oauth2/token") {
				let mut issued = self.tokens_issued.lock();

				*issued += 1;

				TransportOutcome::Response(json_response(
					200,
					&format!(
						"{{\"access_token\":\"token-{issued}\",\"token_type\":\"Bearer\",\"expires_in\":\"3599\"}}"
					),
				))
			} else {
				self.sent.lock().push(crate::http::clone_request(&request));

				match self.api.lock().pop_front() {
					Some(ScriptedReply::Status(status, body)) =>
						TransportOutcome::Response(json_response(status, &body)),
					Some(ScriptedReply::Timeout) => TransportOutcome::Retryable(
						TransportError::timeout(std::io::Error::from(std::io::ErrorKind::TimedOut)),
					),
					Some(ScriptedReply::Fatal) | None => TransportOutcome::Fatal(
						TransportError::network(std::io::Error::from(
							std::io::ErrorKind::ConnectionRefused,
						)),
					),
				}
			};

			Box::pin(async move { outcome })
		}
	}

	/// One canned answer for [`ScriptedTransport`].
	#[derive(Clone, Debug)]
	pub enum ScriptedReply {
		/// HTTP response with the given status and body.
		Status(u16, String),
		/// Retryable transport timeout.
		Timeout,
		/// Non-retryable transport failure.
		Fatal,
	}
	impl ScriptedReply {
		/// Shorthand for a status-only reply with an empty body.
		pub fn status(status: u16) -> Self {
			Self::Status(status, String::new())
		}

		/// Shorthand for a reply carrying a JSON body.
		pub fn json(status: u16, body: impl Into<String>) -> Self {
			Self::Status(status, body.into())
		}
	}

	/// Builds a buffered response with the given status and body.
	pub fn json_response(status: u16, body: &str) -> HttpResponse {
		let mut response = HttpResponse::new(body.as_bytes().to_vec());

		*response.status_mut() =
			StatusCode::from_u16(status).expect("Scripted status codes must be valid.");
		response
			.headers_mut()
			.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

		response
	}

	/// Credentials pointing at an unreachable placeholder host; pair with a fake transport.
	pub fn test_credentials() -> Credentials {
		Credentials::new(
			"client-under-test",
			"secret-under-test",
			"tenant-under-test",
			Url::parse("https://devcenter.invalid/").expect("Static test URL should parse."),
		)
		.with_authority(
			Url::parse("https://login.invalid/").expect("Static authority URL should parse."),
		)
	}

	/// Retry policy with the production shape but millisecond pauses.
	pub fn fast_retry_policy() -> RetryPolicy {
		RetryPolicy {
			timeout_pause: Duration::from_millis(1),
			gateway_backoff_min: Duration::from_millis(1),
			gateway_backoff_max: Duration::from_millis(3),
			..RetryPolicy::default()
		}
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		path::{Path, PathBuf},
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use oauth2::{
		HttpRequest, HttpResponse,
		http::{HeaderValue, Method, StatusCode, header},
	};
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use tokio_util::sync::CancellationToken;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use tokio_util::sync::CancellationToken;
pub use url;
#[cfg(test)] use httpmock as _;
