//! Logical description of an API call, rendered into a buffered request per invocation.

// self
use crate::{_prelude::*, error::TransportError};

/// Header carrying the per-run correlation id.
pub const CORRELATION_HEADER: &str = "MS-CorrelationId";

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Method, URI, and optional JSON body of one logical API call.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestIntent {
	/// HTTP verb; the invoker accepts GET and POST only.
	pub method: Method,
	/// Absolute request URI.
	pub uri: Url,
	/// Optional JSON body.
	pub body: Option<serde_json::Value>,
}
impl RequestIntent {
	/// Creates an intent without a body.
	pub fn new(method: Method, uri: Url) -> Self {
		Self { method, uri, body: None }
	}

	/// GET `uri`.
	pub fn get(uri: Url) -> Self {
		Self::new(Method::GET, uri)
	}

	/// POST `uri` with `body`.
	pub fn post(uri: Url, body: serde_json::Value) -> Self {
		Self { body: Some(body), ..Self::new(Method::POST, uri) }
	}

	/// POST `uri` with `body` serialized to JSON.
	pub fn post_json<B>(uri: Url, body: &B) -> Result<Self>
	where
		B: ?Sized + Serialize,
	{
		let body = serde_json::to_value(body).map_err(Error::Encode)?;

		Ok(Self::post(uri, body))
	}

	/// Builds the buffered request sent (as a fresh clone) on every attempt.
	pub fn render(&self, correlation_id: Option<&str>) -> Result<HttpRequest> {
		let mut builder = oauth2::http::Request::builder()
			.method(self.method.clone())
			.uri(self.uri.as_str())
			.header(header::ACCEPT, "application/json");

		if let Some(id) = correlation_id {
			builder = builder.header(CORRELATION_HEADER, id);
		}

		let body = match &self.body {
			Some(body) => {
				builder = builder.header(header::CONTENT_TYPE, JSON_CONTENT_TYPE);

				serde_json::to_vec(body).map_err(Error::Encode)?
			},
			None => Vec::new(),
		};

		Ok(builder.body(body).map_err(TransportError::from)?)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn uri() -> Url {
		Url::parse("https://devcenter.invalid/hardware/products").expect("Static URL should parse.")
	}

	#[test]
	fn render_attaches_json_headers_and_body() {
		let intent = RequestIntent::post(uri(), serde_json::json!({ "productName": "Widget" }));
		let request = intent.render(Some("corr-1")).expect("Intent should render.");

		assert_eq!(request.method(), Method::POST);
		assert_eq!(request.uri().to_string(), "https://devcenter.invalid/hardware/products");
		assert_eq!(request.headers()[header::CONTENT_TYPE], JSON_CONTENT_TYPE);
		assert_eq!(request.headers()[CORRELATION_HEADER], "corr-1");
		assert_eq!(
			serde_json::from_slice::<serde_json::Value>(request.body())
				.expect("Body should be JSON."),
			serde_json::json!({ "productName": "Widget" })
		);
	}

	#[test]
	fn get_renders_without_body_or_content_type() {
		let request = RequestIntent::get(uri()).render(None).expect("Intent should render.");

		assert!(request.body().is_empty());
		assert!(request.headers().get(header::CONTENT_TYPE).is_none());
		assert!(request.headers().get(CORRELATION_HEADER).is_none());
	}
}
