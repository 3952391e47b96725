//! Maps raw HTTP responses into uniform success-or-structured-error results.
//!
//! Non-success bodies are decoded in three tiers: the service's structured envelope
//! (`{"error":{"code","message","validationErrors",...}}`), the generic gateway shape
//! (`{"statusCode","message"}`), and finally a synthesized record built from the status line and the raw
//! body text. Whatever the body claims, [`ErrorDetails::http_status`] is always the transport status so
//! callers can branch on 429 and 502 reliably.

// crates.io
use serde::de::DeserializeOwned;
use serde_json::Value;
// self
use crate::{_prelude::*, api::Page};

const MESSAGE_PREVIEW_LIMIT: usize = 2_048;

/// Outcome of one logical invocation after retries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvocationResult {
	/// 2xx response with its raw body.
	Success {
		/// Transport status.
		status: StatusCode,
		/// Raw response body.
		body: Vec<u8>,
	},
	/// Remote rejection decoded from a non-success response.
	Failure(ErrorDetails),
}
impl InvocationResult {
	/// Returns `true` for [`InvocationResult::Success`].
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Success { .. })
	}

	/// Decodes a single entity; an entity without an id yields an empty success.
	pub fn into_entity<T>(self) -> Result<ApiResponse<Vec<T>>>
	where
		T: DeserializeOwned + Entity,
	{
		match self {
			Self::Success { status, body } =>
				ApiResponseDecoder::entity(status, &body).map(ApiResponse::Success),
			Self::Failure(details) => Ok(ApiResponse::Failure(details)),
		}
	}

	/// Decodes a `{value, links}` collection envelope.
	pub fn into_list<T>(self) -> Result<ApiResponse<Vec<T>>>
	where
		T: DeserializeOwned,
	{
		match self {
			Self::Success { status, body } =>
				ApiResponseDecoder::list(status, &body).map(ApiResponse::Success),
			Self::Failure(details) => Ok(ApiResponse::Failure(details)),
		}
	}

	/// Discards the body of a successful call.
	pub fn into_acknowledgement(self) -> ApiResponse<()> {
		match self {
			Self::Success { .. } => ApiResponse::Success(()),
			Self::Failure(details) => ApiResponse::Failure(details),
		}
	}
}

/// Typed result of a certification API call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiResponse<T> {
	/// Decoded payload.
	Success(T),
	/// Remote rejection.
	Failure(ErrorDetails),
}
impl<T> ApiResponse<T> {
	/// Converts a rejection into [`Error::Api`].
	pub fn into_result(self) -> Result<T> {
		match self {
			Self::Success(value) => Ok(value),
			Self::Failure(details) => Err(Error::Api(details)),
		}
	}

	/// Returns the rejection, if any.
	pub fn failure(&self) -> Option<&ErrorDetails> {
		match self {
			Self::Success(_) => None,
			Self::Failure(details) => Some(details),
		}
	}

	/// Returns `true` when the service throttled the call.
	pub fn is_rate_limited(&self) -> bool {
		self.failure().is_some_and(ErrorDetails::is_rate_limited)
	}

	/// Maps the success payload.
	pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
		match self {
			Self::Success(value) => ApiResponse::Success(f(value)),
			Self::Failure(details) => ApiResponse::Failure(details),
		}
	}
}

/// Structured description of a remote rejection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetails {
	/// Service error code (e.g. `entityNotFound`) or a synthesized status line.
	pub code: String,
	/// Human-readable message.
	pub message: String,
	/// Transport status of the failing response.
	pub http_status: u16,
	/// Field-level validation failures.
	pub validation_errors: Vec<ValidationError>,
	/// Opaque server trace information, rendered as JSON text.
	pub trace: Option<String>,
}
impl ErrorDetails {
	/// Returns `true` for HTTP 429 responses.
	pub fn is_rate_limited(&self) -> bool {
		self.http_status == StatusCode::TOO_MANY_REQUESTS.as_u16()
	}

	/// Returns `true` when the service code equals `code`.
	pub fn has_code(&self, code: &str) -> bool {
		self.code == code
	}
}
impl Display for ErrorDetails {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{} (HTTP {}): {}", self.code, self.http_status, self.message)
	}
}

/// One field-level validation failure.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationError {
	/// Field or property the failure refers to.
	pub target: Option<String>,
	/// Description of the failure.
	pub message: Option<String>,
}

/// Entities whose identifier decides whether a 200 response carried a payload.
pub trait Entity {
	/// Identifier field, if present.
	fn entity_id(&self) -> Option<&str>;
}

/// Stateless decoder for certification API responses.
#[derive(Clone, Copy, Debug, Default)]
pub struct ApiResponseDecoder;
impl ApiResponseDecoder {
	/// Classifies a raw response by status.
	pub fn decode(status: StatusCode, body: Vec<u8>) -> InvocationResult {
		if status.is_success() {
			InvocationResult::Success { status, body }
		} else {
			InvocationResult::Failure(Self::error(status, &body))
		}
	}

	/// Decodes a non-success body into [`ErrorDetails`]; never fails.
	pub fn error(status: StatusCode, body: &[u8]) -> ErrorDetails {
		let http_status = status.as_u16();

		match serde_json::from_slice::<ErrorEnvelope>(body) {
			Ok(ErrorEnvelope { error: Some(error), .. }) => ErrorDetails {
				code: error.code.unwrap_or_else(|| status_line(status)),
				message: error.message.unwrap_or_default(),
				http_status,
				validation_errors: error.validation_errors.unwrap_or_default(),
				trace: error.trace.filter(|v| !v.is_null()).map(|v| match v {
					Value::String(s) => s,
					other => other.to_string(),
				}),
			},
			Ok(ErrorEnvelope { error: None, status_code, message })
				if status_code.is_some() || message.is_some() =>
				ErrorDetails {
					code: status_code
						.and_then(|v| match v {
							Value::String(s) => Some(s),
							Value::Number(n) => Some(n.to_string()),
							_ => None,
						})
						.unwrap_or_else(|| status_line(status)),
					message: message.unwrap_or_default(),
					http_status,
					..Default::default()
				},
			_ => ErrorDetails {
				code: status_line(status),
				message: body_preview(status, body),
				http_status,
				..Default::default()
			},
		}
	}

	/// Decodes a single entity, returning an empty vector for blank bodies or id-less entities.
	pub fn entity<T>(status: StatusCode, body: &[u8]) -> Result<Vec<T>>
	where
		T: DeserializeOwned + Entity,
	{
		if is_blank(body) {
			return Ok(Vec::new());
		}

		let entity = parse::<T>(status, body)?;
		let has_id = entity.entity_id().is_some_and(|id| !id.trim().is_empty());

		Ok(if has_id { vec![entity] } else { Vec::new() })
	}

	/// Decodes the `value` array of a collection envelope.
	pub fn list<T>(status: StatusCode, body: &[u8]) -> Result<Vec<T>>
	where
		T: DeserializeOwned,
	{
		if is_blank(body) {
			return Ok(Vec::new());
		}

		Ok(parse::<Page<T>>(status, body)?.value)
	}
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
	#[serde(default)]
	error: Option<ErrorBody>,
	#[serde(default, rename = "statusCode")]
	status_code: Option<Value>,
	#[serde(default)]
	message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
	#[serde(default)]
	code: Option<String>,
	#[serde(default)]
	message: Option<String>,
	#[serde(default)]
	validation_errors: Option<Vec<ValidationError>>,
	#[serde(default)]
	trace: Option<Value>,
}

fn parse<T>(status: StatusCode, body: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| Error::Decode { source, status: status.as_u16() })
}

fn is_blank(body: &[u8]) -> bool {
	body.iter().all(u8::is_ascii_whitespace)
}

fn status_line(status: StatusCode) -> String {
	match status.canonical_reason() {
		Some(reason) => format!("{} {reason}", status.as_u16()),
		None => status.as_u16().to_string(),
	}
}

fn body_preview(status: StatusCode, body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);
	let text = text.trim();

	if text.is_empty() {
		return status.canonical_reason().unwrap_or("Unknown status").to_owned();
	}
	if text.chars().count() <= MESSAGE_PREVIEW_LIMIT {
		return text.to_owned();
	}

	let mut preview = text.chars().take(MESSAGE_PREVIEW_LIMIT).collect::<String>();

	preview.push_str("...");

	preview
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Debug, Deserialize)]
	struct Widget {
		id: Option<String>,
		name: String,
	}
	impl Entity for Widget {
		fn entity_id(&self) -> Option<&str> {
			self.id.as_deref()
		}
	}

	#[test]
	fn structured_envelope_keeps_transport_status() {
		let body = br#"{
			"error": {
				"code": "invalidInput",
				"message": "Submission name is required.",
				"validationErrors": [{ "target": "name", "message": "Required" }],
				"httpErrorCode": 500,
				"trace": { "requestId": "abc" }
			},
			"statusCode": 500
		}"#;
		let details = ApiResponseDecoder::error(StatusCode::BAD_REQUEST, body);

		assert_eq!(details.code, "invalidInput");
		assert_eq!(details.message, "Submission name is required.");
		assert_eq!(details.http_status, 400);
		assert_eq!(details.validation_errors.len(), 1);
		assert_eq!(details.validation_errors[0].target.as_deref(), Some("name"));
		assert_eq!(details.trace.as_deref(), Some("{\"requestId\":\"abc\"}"));
	}

	#[test]
	fn generic_shape_uses_status_code_and_message() {
		let details = ApiResponseDecoder::error(
			StatusCode::TOO_MANY_REQUESTS,
			br#"{"statusCode":429,"message":"Rate limit is exceeded."}"#,
		);

		assert_eq!(details.code, "429");
		assert_eq!(details.message, "Rate limit is exceeded.");
		assert!(details.is_rate_limited());
	}

	#[test]
	fn malformed_body_is_synthesized_from_status_line() {
		let details =
			ApiResponseDecoder::error(StatusCode::BAD_REQUEST, b"<html>upstream exploded</html>");

		assert_eq!(details.code, "400 Bad Request");
		assert_eq!(details.message, "<html>upstream exploded</html>");
		assert_eq!(details.http_status, 400);
		assert!(details.validation_errors.is_empty());
	}

	#[test]
	fn empty_error_body_falls_back_to_reason_phrase() {
		let details = ApiResponseDecoder::error(StatusCode::BAD_GATEWAY, b"");

		assert_eq!(details.code, "502 Bad Gateway");
		assert_eq!(details.message, "Bad Gateway");
	}

	#[test]
	fn entity_without_id_is_an_empty_success() {
		let decoded =
			ApiResponseDecoder::entity::<Widget>(StatusCode::OK, br#"{"id":"","name":"ghost"}"#)
				.expect("Entity body should parse.");

		assert!(decoded.is_empty());

		let decoded = ApiResponseDecoder::entity::<Widget>(StatusCode::OK, b"  ")
			.expect("Blank body should decode as no entity.");

		assert!(decoded.is_empty());

		let decoded =
			ApiResponseDecoder::entity::<Widget>(StatusCode::OK, br#"{"id":"7","name":"gear"}"#)
				.expect("Entity body should parse.");

		assert_eq!(decoded.len(), 1);
		assert_eq!(decoded[0].name, "gear");
	}

	#[test]
	fn list_reads_value_array() {
		let decoded = ApiResponseDecoder::list::<Widget>(
			StatusCode::OK,
			br#"{"value":[{"id":"1","name":"a"},{"id":"2","name":"b"}],"links":[{"href":"next","rel":"next_link","method":"GET"}]}"#,
		)
		.expect("Collection body should parse.");

		assert_eq!(decoded.iter().map(|w| w.name.as_str()).collect::<Vec<_>>(), ["a", "b"]);
	}

	#[test]
	fn decode_errors_carry_the_json_path() {
		let err = ApiResponseDecoder::list::<Widget>(StatusCode::OK, br#"{"value":[{"id":"1"}]}"#)
			.expect_err("Missing name should fail.");

		match err {
			Error::Decode { source, status } => {
				assert_eq!(status, 200);
				assert_eq!(source.path().to_string(), "value[0]");
			},
			other => panic!("Unexpected error: {other:?}"),
		}
	}

	#[test]
	fn decode_splits_on_status() {
		assert!(ApiResponseDecoder::decode(StatusCode::CREATED, b"{}".to_vec()).is_success());

		match ApiResponseDecoder::decode(StatusCode::NOT_FOUND, b"{}".to_vec()) {
			InvocationResult::Failure(details) => {
				assert_eq!(details.code, "404 Not Found");
				assert_eq!(details.http_status, 404);
			},
			other => panic!("Unexpected result: {other:?}"),
		}
	}
}
