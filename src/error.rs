//! Crate-level error types shared by the token provider, invoker, poller, and blob client.

// self
use crate::{_prelude::*, decode::ErrorDetails};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Remote rejections normally travel as values ([`ErrorDetails`] inside an `InvocationResult` or
/// `ApiResponse`); [`Error::Api`] exists for callers that prefer `?` over matching.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Token acquisition failed.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Transport failure that was not retried (or not retryable).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Blob storage transfer failed.
	#[error(transparent)]
	Blob(#[from] BlobError),

	/// Remote service rejected the request.
	#[error("{0}")]
	Api(ErrorDetails),
	/// Caller asked for an HTTP verb the invoker does not implement.
	#[error("HTTP method {method} is not supported; only GET and POST are.")]
	UnsupportedMethod {
		/// Rejected verb.
		method: String,
	},
	/// Every attempt failed before a response was received.
	#[error("Gave up after {attempts} attempts without receiving a response.")]
	RetriesExhausted {
		/// Attempts consumed.
		attempts: u32,
	},
	/// Success body did not match the expected shape.
	#[error("Response body (HTTP {status}) could not be decoded.")]
	Decode {
		/// Structured parsing failure, including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status of the decoded response.
		status: u16,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be encoded.")]
	Encode(#[source] serde_json::Error),
	/// Caller cancelled the operation.
	#[error("Operation was cancelled.")]
	Cancelled,
	/// A polling deadline elapsed before a terminal state was observed.
	#[error("Gave up waiting after {waited:?}.")]
	DeadlineExceeded {
		/// Time spent waiting.
		waited: Duration,
	},
}
impl Error {
	/// Returns the remote rejection carried by this error, if any.
	pub fn api_details(&self) -> Option<&ErrorDetails> {
		match self {
			Self::Api(details) => Some(details),
			_ => None,
		}
	}
}
impl From<ErrorDetails> for Error {
	fn from(details: ErrorDetails) -> Self {
		Self::Api(details)
	}
}

/// Identity-endpoint failures raised while acquiring a token.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// Identity endpoint answered with a non-success status.
	#[error("Identity endpoint rejected the client credentials (HTTP {status}): {message}.")]
	Rejected {
		/// HTTP status returned by the identity endpoint.
		status: u16,
		/// Provider-supplied description or a body preview.
		message: String,
	},
	/// Token response was not valid JSON or had the wrong shape.
	#[error("Identity endpoint returned a malformed token response.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Token response parsed but lacked a required field.
	#[error("Token response is missing `{field}`.")]
	MissingField {
		/// Name of the absent field.
		field: &'static str,
	},
	/// Token lifetime does not fit the calendar.
	#[error("Token response carries an out-of-range `expires_in` of {seconds} seconds.")]
	InvalidExpiry {
		/// Reported lifetime.
		seconds: u64,
	},
	/// Identity endpoint could not be reached.
	#[error("Identity endpoint could not be reached.")]
	Transport(#[source] TransportError),
	/// Acquisition was cancelled by the caller.
	#[error("Token acquisition was cancelled.")]
	Cancelled,
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// URL could not be parsed or joined.
	#[error("`{value}` is not a valid URL.")]
	InvalidUrl {
		/// Offending input.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// URL cannot carry path segments (e.g. `mailto:`).
	#[error("`{url}` cannot be used as an API base URL.")]
	CannotBeABase {
		/// Offending URL.
		url: Url,
	},
	/// Credentials file could not be read.
	#[error("Credentials file `{}` could not be read.", path.display())]
	CredentialsRead {
		/// File path.
		path: PathBuf,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Credentials file content is not a JSON array of credentials.
	#[error("Credentials file `{}` is malformed.", path.display())]
	CredentialsParse {
		/// File path.
		path: PathBuf,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Required environment variable is unset or empty.
	#[error("Environment variable `{name}` is not set.")]
	MissingEnv {
		/// Variable name.
		name: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}

	/// Builds an [`ConfigError::InvalidUrl`] for `value`.
	pub fn invalid_url(value: impl Into<String>, source: url::ParseError) -> Self {
		Self::InvalidUrl { value: value.into(), source }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, timeout, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Request did not complete within the configured timeout.
	#[error("Request timed out.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the service.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error("HTTP request could not be built.")]
	Request(#[from] oauth2::http::Error),
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the service.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}

/// Blob storage failures.
#[derive(Debug, ThisError)]
pub enum BlobError {
	/// Storage answered an operation with a non-success status.
	#[error("Blob storage returned HTTP {status} for {operation}.")]
	Status {
		/// Storage operation label (`download`, `put block`, ...).
		operation: &'static str,
		/// HTTP status returned by storage.
		status: u16,
		/// Response body text, usually an XML error document.
		body: String,
	},
	/// Local file could not be read or written.
	#[error("Local file `{}` could not be accessed.", path.display())]
	File {
		/// File path.
		path: PathBuf,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Transfer did not complete at the transport level.
	#[error(transparent)]
	Transport(#[from] TransportError),
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for BlobError {
	fn from(e: ReqwestError) -> Self {
		Self::Transport(e.into())
	}
}
