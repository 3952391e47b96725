//! Client-credentials token provider with a single cached token and single-flight refresh.
//!
//! The provider owns exactly one current [`AccessToken`]. Readers take the cached value without
//! waiting; acquisition and refresh serialize on an async mutex so concurrent callers that all saw the
//! same stale token piggy-back on one identity round-trip instead of stampeding the endpoint.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, Credentials, TokenResponse},
	error::{AuthError, TransportError},
	http::{ApiTransport, TransportOutcome},
	obs::{self, CallKind},
};

const BODY_PREVIEW_LIMIT: usize = 256;

/// Acquires, caches, and invalidates the bearer token for one set of credentials.
pub struct TokenProvider<T>
where
	T: ?Sized + ApiTransport,
{
	credentials: Arc<Credentials>,
	transport: Arc<T>,
	slot: RwLock<Option<AccessToken>>,
	refresh_guard: AsyncMutex<()>,
	generations: AtomicU64,
}
impl<T> TokenProvider<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates an empty provider; the first [`TokenProvider::token`] call acquires.
	pub fn new(credentials: Arc<Credentials>, transport: Arc<T>) -> Self {
		Self {
			credentials,
			transport,
			slot: RwLock::new(None),
			refresh_guard: AsyncMutex::new(()),
			generations: AtomicU64::new(0),
		}
	}

	/// Credentials this provider authenticates with.
	pub fn credentials(&self) -> &Credentials {
		&self.credentials
	}

	/// Returns the cached token without contacting the identity endpoint.
	pub fn current(&self) -> Option<AccessToken> {
		self.slot.read().clone()
	}

	/// Returns the cached token, acquiring one when the slot is empty or the token has expired.
	pub async fn token(&self) -> Result<AccessToken> {
		if let Some(token) = self.fresh() {
			return Ok(token);
		}

		let _singleflight = self.refresh_guard.lock().await;

		if let Some(token) = self.fresh() {
			return Ok(token);
		}

		self.acquire_locked().await
	}

	/// Drops the cached token.
	pub fn invalidate(&self) {
		*self.slot.write() = None;
	}

	/// Performs the client-credentials exchange unconditionally and replaces the cached token.
	pub async fn acquire(&self) -> Result<AccessToken> {
		let _singleflight = self.refresh_guard.lock().await;

		self.acquire_locked().await
	}

	/// Replaces `stale` after an authorization failure.
	///
	/// When another caller already swapped `stale` out, its replacement is returned without a second
	/// exchange.
	pub async fn refresh(&self, stale: &AccessToken) -> Result<AccessToken> {
		let _singleflight = self.refresh_guard.lock().await;
		let current = self.current();

		if let Some(current) = current.filter(|token| token.generation() != stale.generation()) {
			obs::log_token_reused(stale.generation(), current.generation());

			return Ok(current);
		}

		self.invalidate();
		self.acquire_locked().await
	}

	fn fresh(&self) -> Option<AccessToken> {
		let now = OffsetDateTime::now_utc();

		self.current().filter(|token| !token.is_expired_at(now))
	}

	async fn acquire_locked(&self) -> Result<AccessToken> {
		obs::observe(CallKind::Token, "acquire", self.exchange()).await
	}

	async fn exchange(&self) -> Result<AccessToken> {
		let request = self.build_request()?;
		let response = match self.transport.send(request).await {
			TransportOutcome::Response(response) => response,
			TransportOutcome::Retryable(e) | TransportOutcome::Fatal(e) =>
				return Err(AuthError::Transport(e).into()),
			TransportOutcome::Cancelled => return Err(AuthError::Cancelled.into()),
		};
		let status = response.status();

		if !status.is_success() {
			return Err(AuthError::Rejected {
				status: status.as_u16(),
				message: describe_rejection(response.body()),
			}
			.into());
		}

		let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
		let token = TokenResponse::parse(response.body())?
			.into_access_token(OffsetDateTime::now_utc(), generation)?;

		*self.slot.write() = Some(token.clone());

		obs::log_token_acquired(generation, token.expires_at);

		Ok(token)
	}

	fn build_request(&self) -> Result<HttpRequest> {
		let credentials = &self.credentials;
		let endpoint = credentials.token_endpoint()?;
		let form = form_urlencoded::Serializer::new(String::new())
			.append_pair("grant_type", "client_credentials")
			.append_pair("client_id", &credentials.client_id)
			.append_pair("client_secret", credentials.client_secret.expose())
			.append_pair("resource", credentials.resource())
			.finish();
		let request = oauth2::http::Request::builder()
			.method(Method::POST)
			.uri(endpoint.as_str())
			.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
			.header(header::ACCEPT, "application/json")
			.body(form.into_bytes())
			.map_err(TransportError::from)?;

		Ok(request)
	}
}
impl<T> Debug for TokenProvider<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenProvider")
			.field("client_id", &self.credentials.client_id)
			.field("tenant_id", &self.credentials.tenant_id)
			.field("cached", &self.slot.read().is_some())
			.finish()
	}
}

#[derive(Deserialize)]
struct IdentityErrorBody {
	#[serde(default)]
	error: Option<String>,
	#[serde(default)]
	error_description: Option<String>,
}

fn describe_rejection(body: &[u8]) -> String {
	if let Ok(IdentityErrorBody { error, error_description }) = serde_json::from_slice(body) {
		match (error, error_description) {
			(Some(error), Some(description)) => return format!("{error}: {description}"),
			(Some(error), None) => return error,
			(None, Some(description)) => return description,
			(None, None) => {},
		}
	}

	let text = String::from_utf8_lossy(body);
	let text = text.trim();

	if text.is_empty() {
		return "empty response body".into();
	}

	text.chars().take(BODY_PREVIEW_LIMIT).collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::{ScriptedTransport, json_response, test_credentials};

	fn provider() -> (Arc<ScriptedTransport>, TokenProvider<ScriptedTransport>) {
		let transport = Arc::new(ScriptedTransport::default());
		let provider = TokenProvider::new(Arc::new(test_credentials()), transport.clone());

		(transport, provider)
	}

	#[tokio::test]
	async fn token_is_cached_until_invalidated() {
		let (transport, provider) = provider();
		let first = provider.token().await.expect("First token should be acquired.");
		let second = provider.token().await.expect("Cached token should be returned.");

		assert_eq!(first, second);
		assert_eq!(transport.tokens_issued(), 1);

		provider.invalidate();

		assert!(provider.current().is_none());

		let third = provider.token().await.expect("Token should be re-acquired.");

		assert_ne!(third.secret, first.secret);
		assert_eq!(transport.tokens_issued(), 2);
	}

	#[tokio::test]
	async fn concurrent_refreshes_share_one_exchange() {
		let (transport, provider) = provider();
		let provider = Arc::new(provider);
		let stale = provider.token().await.expect("Initial token should be acquired.");
		let refreshers = (0..8)
			.map(|_| {
				let provider = provider.clone();
				let stale = stale.clone();

				tokio::spawn(async move { provider.refresh(&stale).await })
			})
			.collect::<Vec<_>>();
		let mut secrets = Vec::new();

		for refresher in refreshers {
			let token = refresher
				.await
				.expect("Refresh task should not panic.")
				.expect("Refresh should succeed.");

			secrets.push(token.secret.expose().to_owned());
		}

		assert_eq!(transport.tokens_issued(), 2);
		assert!(secrets.iter().all(|secret| secret == "token-2"));
	}

	#[test]
	fn rejection_prefers_identity_error_fields() {
		let message = describe_rejection(
			br#"{"error":"invalid_client","error_description":"AADSTS7000215: Invalid client secret."}"#,
		);

		assert_eq!(message, "invalid_client: AADSTS7000215: Invalid client secret.");
		assert_eq!(describe_rejection(b""), "empty response body");
		assert_eq!(describe_rejection(b"nope"), "nope");
	}

	#[tokio::test]
	async fn rejected_exchange_surfaces_auth_error() {
		struct Rejecting;
		impl ApiTransport for Rejecting {
			fn send(&self, _: HttpRequest) -> crate::http::TransportFuture<'_> {
				Box::pin(async {
					TransportOutcome::Response(json_response(
						401,
						r#"{"error":"unauthorized_client"}"#,
					))
				})
			}
		}

		let provider = TokenProvider::new(Arc::new(test_credentials()), Arc::new(Rejecting));
		let err = provider.token().await.expect_err("Rejected exchange must fail.");

		assert!(matches!(err, Error::Auth(AuthError::Rejected { status: 401, .. })));
		assert!(provider.current().is_none());
	}
}
