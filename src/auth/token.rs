//! Bearer token models and the identity endpoint's token response.

// self
use crate::{
	_prelude::*,
	error::{AuthError, TransportError},
};

/// Tokens this close to expiry are treated as expired.
const EXPIRY_LEEWAY: time::Duration = time::Duration::seconds(60);

/// Redacted secret wrapper keeping tokens and client keys out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl From<&str> for TokenSecret {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl From<String> for TokenSecret {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// The provider's current bearer token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessToken {
	/// Token value; callers must avoid logging it.
	pub secret: TokenSecret,
	/// Token type reported by the identity endpoint (normally `Bearer`).
	pub token_type: String,
	/// Instant the token was received.
	pub acquired_at: OffsetDateTime,
	/// Expiry instant when the endpoint reported one.
	pub expires_at: Option<OffsetDateTime>,
	generation: u64,
}
impl AccessToken {
	/// Builds a token; `generation` distinguishes successive acquisitions.
	pub fn new(
		secret: TokenSecret,
		token_type: impl Into<String>,
		acquired_at: OffsetDateTime,
		expires_at: Option<OffsetDateTime>,
		generation: u64,
	) -> Self {
		Self { secret, token_type: token_type.into(), acquired_at, expires_at, generation }
	}

	/// Monotonic acquisition counter assigned by the provider.
	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// `true` once `now` is within a minute of the reported expiry.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| {
			expires_at.checked_sub(EXPIRY_LEEWAY).is_none_or(|edge| edge <= now)
		})
	}

	/// `Authorization` header value for this token.
	pub fn authorization(&self) -> Result<HeaderValue, TransportError> {
		let mut value = HeaderValue::try_from(format!("Bearer {}", self.secret.expose()))
			.map_err(|e| TransportError::Request(e.into()))?;

		value.set_sensitive(true);

		Ok(value)
	}
}

/// Token response returned by the identity endpoint.
///
/// `expires_in` and `expires_on` arrive as strings from the v1 endpoint and as numbers elsewhere, so
/// both encodings are accepted.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
	/// Token value.
	#[serde(default)]
	pub access_token: Option<String>,
	/// Token type.
	#[serde(default)]
	pub token_type: Option<String>,
	/// Lifetime in seconds.
	#[serde(default)]
	pub expires_in: Option<Seconds>,
	/// Absolute expiry as a Unix timestamp.
	#[serde(default)]
	pub expires_on: Option<Seconds>,
}
impl TokenResponse {
	/// Parses `body`, reporting the failing JSON path on shape mismatches.
	pub fn parse(body: &[u8]) -> Result<Self, AuthError> {
		let mut deserializer = serde_json::Deserializer::from_slice(body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| AuthError::MalformedResponse { source })
	}

	/// Validates required fields and converts into an [`AccessToken`].
	pub fn into_access_token(
		self,
		acquired_at: OffsetDateTime,
		generation: u64,
	) -> Result<AccessToken, AuthError> {
		let secret = self
			.access_token
			.filter(|token| !token.trim().is_empty())
			.ok_or(AuthError::MissingField { field: "access_token" })?;
		let token_type = self
			.token_type
			.filter(|kind| !kind.trim().is_empty())
			.ok_or(AuthError::MissingField { field: "token_type" })?;
		let expires_at = match (self.expires_in, self.expires_on) {
			(Some(Seconds(secs)), _) => Some(
				i64::try_from(secs)
					.ok()
					.and_then(|secs| acquired_at.checked_add(time::Duration::seconds(secs)))
					.ok_or(AuthError::InvalidExpiry { seconds: secs })?,
			),
			(None, Some(Seconds(at))) => i64::try_from(at)
				.ok()
				.and_then(|at| OffsetDateTime::from_unix_timestamp(at).ok()),
			(None, None) => None,
		};

		Ok(AccessToken::new(TokenSecret::new(secret), token_type, acquired_at, expires_at, generation))
	}
}

/// Unsigned seconds accepted as a JSON number or a numeric string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Seconds(pub u64);
impl<'de> Deserialize<'de> for Seconds {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Raw {
			Number(u64),
			Text(String),
		}

		match Raw::deserialize(deserializer)? {
			Raw::Number(secs) => Ok(Self(secs)),
			Raw::Text(text) => text.trim().parse().map(Self).map_err(serde::de::Error::custom),
		}
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::time::Duration as StdDuration;
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn string_expiry_fields_are_accepted() {
		let now = datetime!(2025-01-01 00:00 UTC);
		let token = TokenResponse::parse(
			br#"{"token_type":"Bearer","expires_in":"3599","ext_expires_in":"3599","expires_on":"1735693199","resource":"https://manage.devcenter.microsoft.com","access_token":"eyJ0"}"#,
		)
		.expect("Token response should parse.")
		.into_access_token(now, 1)
		.expect("Token response should validate.");

		assert_eq!(token.secret.expose(), "eyJ0");
		assert_eq!(token.expires_at, Some(now + StdDuration::from_secs(3599)));
		assert!(!token.is_expired_at(now));
		assert!(token.is_expired_at(now + StdDuration::from_secs(3540)));
	}

	#[test]
	fn oversized_lifetime_is_rejected() {
		let now = datetime!(2025-01-01 00:00 UTC);
		let err = TokenResponse::parse(
			br#"{"access_token":"t","token_type":"Bearer","expires_in":"999999999999"}"#,
		)
		.expect("Token response should parse.")
		.into_access_token(now, 1)
		.expect_err("A lifetime past the calendar range must fail.");

		assert!(matches!(err, AuthError::InvalidExpiry { seconds: 999_999_999_999 }));

		let err = TokenResponse::parse(
			br#"{"access_token":"t","token_type":"Bearer","expires_in":18446744073709551615}"#,
		)
		.expect("Token response should parse.")
		.into_access_token(now, 1)
		.expect_err("A lifetime past i64 must fail.");

		assert!(matches!(err, AuthError::InvalidExpiry { .. }));
	}

	#[test]
	fn expires_on_is_used_when_expires_in_is_absent() {
		let now = datetime!(2025-01-01 00:00 UTC);
		let token = TokenResponse::parse(
			br#"{"access_token":"t","token_type":"Bearer","expires_on":1735693200}"#,
		)
		.expect("Token response should parse.")
		.into_access_token(now, 1)
		.expect("Token response should validate.");

		assert_eq!(token.expires_at, Some(datetime!(2025-01-01 01:00 UTC)));
	}

	#[test]
	fn missing_or_empty_fields_are_rejected() {
		let now = OffsetDateTime::now_utc();
		let err = TokenResponse::parse(br#"{"token_type":"Bearer"}"#)
			.expect("Token response should parse.")
			.into_access_token(now, 1)
			.expect_err("Missing access_token must fail.");

		assert!(matches!(err, AuthError::MissingField { field: "access_token" }));

		let err = TokenResponse::parse(br#"{"access_token":" ","token_type":"Bearer"}"#)
			.expect("Token response should parse.")
			.into_access_token(now, 1)
			.expect_err("Blank access_token must fail.");

		assert!(matches!(err, AuthError::MissingField { field: "access_token" }));

		let err = TokenResponse::parse(br#"{"access_token":"t"}"#)
			.expect("Token response should parse.")
			.into_access_token(now, 1)
			.expect_err("Missing token_type must fail.");

		assert!(matches!(err, AuthError::MissingField { field: "token_type" }));
	}

	#[test]
	fn malformed_json_reports_path() {
		let err = TokenResponse::parse(br#"{"access_token":"t","expires_in":"soon"}"#)
			.expect_err("Non-numeric expires_in must fail.");

		match err {
			AuthError::MalformedResponse { source } =>
				assert_eq!(source.path().to_string(), "expires_in"),
			other => panic!("Unexpected error: {other:?}"),
		}
	}

	#[test]
	fn authorization_header_is_sensitive() {
		let token = AccessToken::new(
			TokenSecret::new("abc"),
			"Bearer",
			OffsetDateTime::now_utc(),
			None,
			3,
		);
		let value = token.authorization().expect("Header should build.");

		assert_eq!(value, "Bearer abc");
		assert!(value.is_sensitive());
		assert_eq!(token.generation(), 3);
	}
}
