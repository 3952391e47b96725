//! Typed operations of the hardware-certification API.
//!
//! [`DevCenterClient`] turns each operation into a [`RequestIntent`], runs it through the
//! [`ResilientHttpInvoker`], and decodes the result into an [`ApiResponse`]. Rejections (including 429)
//! come back as [`ApiResponse::Failure`] so callers can branch on them without unwinding.

pub mod audience;
pub mod common;
pub mod metadata;
pub mod product;
pub mod shipping_label;
pub mod submission;

pub use audience::*;
pub use common::*;
pub use metadata::*;
pub use product::*;
pub use shipping_label::*;
pub use submission::*;

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	decode::{ApiResponse, Entity},
	error::ConfigError,
	http::{ApiTransport, RequestIntent},
	invoke::ResilientHttpInvoker,
};

const HARDWARE: &str = "hardware";
const PRODUCTS: &str = "products";
const SUBMISSIONS: &str = "submissions";
const SHIPPING_LABELS: &str = "shippingLabels";

/// Client for the product, submission, shipping-label, and audience resources.
pub struct DevCenterClient<T>
where
	T: ?Sized + ApiTransport,
{
	invoker: ResilientHttpInvoker<T>,
	base: Url,
}
impl<T> DevCenterClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Wraps `invoker`, resolving the API base from its credentials.
	pub fn new(invoker: ResilientHttpInvoker<T>) -> Result<Self> {
		let base = invoker.tokens().credentials().api_base()?;

		if base.cannot_be_a_base() {
			return Err(ConfigError::CannotBeABase { url: base }.into());
		}

		Ok(Self { invoker, base })
	}

	/// Invoker running every call.
	pub fn invoker(&self) -> &ResilientHttpInvoker<T> {
		&self.invoker
	}

	/// Resolved API base.
	pub fn base(&self) -> &Url {
		&self.base
	}

	/// `POST /hardware/products`.
	pub async fn new_product(&self, product: &NewProduct) -> Result<ApiResponse<Vec<Product>>> {
		let uri = self.endpoint(&[HARDWARE, PRODUCTS])?;

		self.invoker.invoke(&RequestIntent::post_json(uri, product)?).await?.into_entity()
	}

	/// `GET /hardware/products[/{product}]`.
	pub async fn get_products(&self, product_id: Option<&str>) -> Result<ApiResponse<Vec<Product>>> {
		match product_id {
			Some(id) => self.get_entity(&[HARDWARE, PRODUCTS, id]).await,
			None => self.get_list(&[HARDWARE, PRODUCTS]).await,
		}
	}

	/// `POST /hardware/products/{product}/submissions`.
	pub async fn new_submission(
		&self,
		product_id: &str,
		submission: &NewSubmission,
	) -> Result<ApiResponse<Vec<Submission>>> {
		let uri = self.endpoint(&[HARDWARE, PRODUCTS, product_id, SUBMISSIONS])?;

		self.invoker.invoke(&RequestIntent::post_json(uri, submission)?).await?.into_entity()
	}

	/// `GET /hardware/products/{product}/submissions[/{submission}]`.
	pub async fn get_submissions(
		&self,
		product_id: &str,
		submission_id: Option<&str>,
	) -> Result<ApiResponse<Vec<Submission>>> {
		match submission_id {
			Some(id) => self.get_entity(&[HARDWARE, PRODUCTS, product_id, SUBMISSIONS, id]).await,
			None => self.get_list(&[HARDWARE, PRODUCTS, product_id, SUBMISSIONS]).await,
		}
	}

	/// `GET /hardware/products/{product}/submissions/{submission}`.
	pub async fn get_submission(
		&self,
		product_id: &str,
		submission_id: &str,
	) -> Result<ApiResponse<Vec<Submission>>> {
		self.get_submissions(product_id, Some(submission_id)).await
	}

	/// `POST /hardware/products/{product}/submissions/{submission}/commit`.
	pub async fn commit_submission(
		&self,
		product_id: &str,
		submission_id: &str,
	) -> Result<ApiResponse<()>> {
		self.post_action(&[HARDWARE, PRODUCTS, product_id, SUBMISSIONS, submission_id, "commit"]).await
	}

	/// `POST /hardware/products/{product}/submissions/{submission}/createMetadata`.
	pub async fn create_metadata(
		&self,
		product_id: &str,
		submission_id: &str,
	) -> Result<ApiResponse<()>> {
		self.post_action(&[
			HARDWARE,
			PRODUCTS,
			product_id,
			SUBMISSIONS,
			submission_id,
			"createMetadata",
		])
		.await
	}

	/// Maps a partner's submission onto the local product/submission ids it was shared as.
	pub async fn get_partner_submission(
		&self,
		publisher_id: &str,
		product_id: &str,
		submission_id: &str,
	) -> Result<ApiResponse<Vec<Submission>>> {
		self.get_entity(&[
			HARDWARE,
			PRODUCTS,
			"relations",
			"sourcepubliser",
			publisher_id,
			"sourceproduct",
			product_id,
			"sourcesubmission",
			submission_id,
		])
		.await
	}

	/// `POST /hardware/products/{product}/submissions/{submission}/shippingLabels`.
	pub async fn new_shipping_label(
		&self,
		product_id: &str,
		submission_id: &str,
		label: &NewShippingLabel,
	) -> Result<ApiResponse<Vec<ShippingLabel>>> {
		let uri =
			self.endpoint(&[HARDWARE, PRODUCTS, product_id, SUBMISSIONS, submission_id, SHIPPING_LABELS])?;

		self.invoker.invoke(&RequestIntent::post_json(uri, label)?).await?.into_entity()
	}

	/// `GET .../shippingLabels[/{label}]?includeTargetingInfo=true`.
	pub async fn get_shipping_labels(
		&self,
		product_id: &str,
		submission_id: &str,
		label_id: Option<&str>,
	) -> Result<ApiResponse<Vec<ShippingLabel>>> {
		let mut segments =
			vec![HARDWARE, PRODUCTS, product_id, SUBMISSIONS, submission_id, SHIPPING_LABELS];

		segments.extend(label_id);

		let mut uri = self.endpoint(&segments)?;

		uri.query_pairs_mut().append_pair("includeTargetingInfo", "true");

		let result = self.invoker.invoke(&RequestIntent::get(uri)).await?;

		if label_id.is_some() { result.into_entity() } else { result.into_list() }
	}

	/// `GET /hardware/audiences`.
	pub async fn get_audiences(&self) -> Result<ApiResponse<Vec<Audience>>> {
		self.get_list(&[HARDWARE, "audiences"]).await
	}

	/// Absolute URL of `segments` below the API base; each segment is percent-encoded.
	pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
		let mut url = self.base.clone();

		url.path_segments_mut()
			.map_err(|_| ConfigError::CannotBeABase { url: self.base.clone() })?
			.pop_if_empty()
			.extend(segments);

		Ok(url)
	}

	async fn get_entity<E>(&self, segments: &[&str]) -> Result<ApiResponse<Vec<E>>>
	where
		E: DeserializeOwned + Entity,
	{
		let uri = self.endpoint(segments)?;

		self.invoker.invoke(&RequestIntent::get(uri)).await?.into_entity()
	}

	async fn get_list<E>(&self, segments: &[&str]) -> Result<ApiResponse<Vec<E>>>
	where
		E: DeserializeOwned,
	{
		let uri = self.endpoint(segments)?;

		self.invoker.invoke(&RequestIntent::get(uri)).await?.into_list()
	}

	async fn post_action(&self, segments: &[&str]) -> Result<ApiResponse<()>> {
		let uri = self.endpoint(segments)?;
		let intent = RequestIntent::post(uri, serde_json::json!({}));

		Ok(self.invoker.invoke(&intent).await?.into_acknowledgement())
	}
}
impl<T> Debug for DevCenterClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DevCenterClient")
			.field("base", &self.base.as_str())
			.field("invoker", &self.invoker)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::{ScriptedReply, ScriptedTransport, fast_retry_policy, test_credentials};
	use crate::{auth::Credentials, invoke::InvokerConfig};

	fn build(
		credentials: Credentials,
		replies: Vec<ScriptedReply>,
	) -> (Arc<ScriptedTransport>, DevCenterClient<ScriptedTransport>) {
		let transport = Arc::new(ScriptedTransport::new(replies));
		let invoker = ResilientHttpInvoker::new(credentials, transport.clone())
			.with_config(InvokerConfig { retry: fast_retry_policy(), ..Default::default() });
		let client = DevCenterClient::new(invoker).expect("Client should build.");

		(transport, client)
	}

	#[test]
	fn endpoints_respect_prefix_and_escape_segments() {
		let (_, client) = build(test_credentials().with_url_prefix("v2.0/my/"), Vec::new());

		assert_eq!(
			client.endpoint(&[HARDWARE, PRODUCTS, "a/b c"]).expect("Endpoint should build.").as_str(),
			"https://devcenter.invalid/v2.0/my/hardware/products/a%2Fb%20c"
		);

		let (_, client) = build(test_credentials(), Vec::new());

		assert_eq!(
			client.endpoint(&[HARDWARE, "audiences"]).expect("Endpoint should build.").as_str(),
			"https://devcenter.invalid/hardware/audiences"
		);
	}

	#[tokio::test]
	async fn submission_lookup_decodes_single_entity() {
		let (transport, client) = build(
			test_credentials(),
			vec![ScriptedReply::json(200, r#"{"id":"9","productId":"1","name":"Driver"}"#)],
		);
		let submissions = client
			.get_submission("1", "9")
			.await
			.expect("Call should complete.")
			.into_result()
			.expect("Call should succeed.");

		assert_eq!(submissions.len(), 1);
		assert_eq!(submissions[0].display_name(), "Driver");
		assert_eq!(
			transport.sent()[0].uri().to_string(),
			"https://devcenter.invalid/hardware/products/1/submissions/9"
		);
	}

	#[tokio::test]
	async fn commit_posts_empty_object() {
		let (transport, client) = build(test_credentials(), vec![ScriptedReply::status(202)]);
		let response = client.commit_submission("1", "9").await.expect("Commit should complete.");

		assert_eq!(response, ApiResponse::Success(()));

		let sent = transport.sent();

		assert_eq!(sent[0].method(), Method::POST);
		assert_eq!(sent[0].body().as_slice(), b"{}");
		assert!(sent[0].uri().path().ends_with("/submissions/9/commit"));
	}

	#[tokio::test]
	async fn shipping_label_list_requests_targeting() {
		let (transport, client) = build(
			test_credentials(),
			vec![ScriptedReply::json(200, r#"{"value":[{"id":"3"},{"id":"4"}],"links":[]}"#)],
		);
		let labels = client
			.get_shipping_labels("1", "9", None)
			.await
			.expect("Call should complete.")
			.into_result()
			.expect("Call should succeed.");

		assert_eq!(labels.len(), 2);
		assert_eq!(transport.sent()[0].uri().query(), Some("includeTargetingInfo=true"));
	}

	#[tokio::test]
	async fn rate_limit_surfaces_as_failure_value() {
		let (_, client) = build(
			test_credentials(),
			vec![ScriptedReply::json(429, r#"{"statusCode":429,"message":"Rate limit is exceeded."}"#)],
		);
		let response = client.get_audiences().await.expect("Call should complete.");

		assert!(response.is_rate_limited());
		assert_eq!(response.failure().map(|details| details.message.as_str()), Some("Rate limit is exceeded."));
	}
}
