//! Shared fixtures for the integration suites.

#![allow(dead_code)]

// std
use std::{path::PathBuf, sync::Arc, time::Duration};
// crates.io
use httpmock::{Mock, prelude::*};
// self
use devcenter_manager::{
	api::DevCenterClient,
	auth::Credentials,
	http::ReqwestTransport,
	invoke::{InvokerConfig, ResilientHttpInvoker, RetryPolicy},
	url::Url,
};

pub const TENANT: &str = "tenant-it";
pub const TOKEN: &str = "it-token";
pub const CORRELATION_ID: &str = "corr-it";

pub fn url(value: &str) -> Url {
	Url::parse(value).expect("Mock server URL should parse.")
}

/// Credentials whose API base and identity authority both point at `server`.
pub fn credentials(server: &MockServer) -> Credentials {
	Credentials::new("client-it", "secret-it", TENANT, url(&server.base_url()))
		.with_authority(url(&server.base_url()))
}

pub fn token_path() -> String {
	format!("/{TENANT}/oauth2/token")
}

/// Production retry shape with millisecond pauses.
pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
	RetryPolicy {
		max_attempts,
		timeout_pause: Duration::from_millis(5),
		gateway_backoff_min: Duration::from_millis(1),
		gateway_backoff_max: Duration::from_millis(5),
	}
}

pub async fn mock_token(server: &MockServer) -> Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST)
				.path(token_path())
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200).header("content-type", "application/json").body(format!(
				"{{\"token_type\":\"Bearer\",\"expires_in\":\"3599\",\"access_token\":\"{TOKEN}\"}}"
			));
		})
		.await
}

pub fn transport() -> Arc<ReqwestTransport> {
	Arc::new(
		ReqwestTransport::with_timeout(Duration::from_secs(10))
			.expect("Reqwest transport should build."),
	)
}

pub fn invoker(credentials: Credentials, retry: RetryPolicy) -> ResilientHttpInvoker<ReqwestTransport> {
	ResilientHttpInvoker::new(credentials, transport()).with_config(InvokerConfig {
		retry,
		correlation_id: Some(CORRELATION_ID.into()),
		..Default::default()
	})
}

pub fn client(server: &MockServer) -> DevCenterClient<ReqwestTransport> {
	DevCenterClient::new(invoker(credentials(server), fast_retry(3)))
		.expect("Client should build for the mock server.")
}

pub fn scratch_path(label: &str) -> PathBuf {
	std::env::temp_dir().join(format!("sdcm-it-{label}-{}", uuid::Uuid::new_v4()))
}
