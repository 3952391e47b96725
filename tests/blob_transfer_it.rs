mod common;

// crates.io
use httpmock::prelude::*;
// self
use common::*;
use devcenter_manager::{
	blob::{AzureBlobClient, BlobTransfer, NoProgress, STORAGE_VERSION},
	error::{BlobError, Error},
};

#[tokio::test]
async fn upload_puts_blocks_then_commits_the_list() {
	let server = MockServer::start_async().await;
	let blocks = server
		.mock_async(|when, then| {
			when.method(PUT)
				.path("/packages/driver.hlkx")
				.query_param("comp", "block")
				.query_param_exists("blockid")
				.header("x-ms-version", STORAGE_VERSION);
			then.status(201);
		})
		.await;
	let list = server
		.mock_async(|when, then| {
			when.method(PUT)
				.path("/packages/driver.hlkx")
				.query_param("comp", "blocklist")
				.header("x-ms-version", STORAGE_VERSION)
				.body_includes("<BlockList>");
			then.status(201);
		})
		.await;
	let source = scratch_path("upload");

	tokio::fs::write(&source, b"0123456789").await.expect("Scratch file should be writable.");

	let report = AzureBlobClient::default()
		.with_block_size(4)
		.upload(&source, &url(&server.url("/packages/driver.hlkx?sig=abc")), &NoProgress)
		.await
		.expect("Upload should succeed.");

	tokio::fs::remove_file(&source).await.expect("Scratch file should be removable.");

	assert_eq!(report.bytes, 10);
	assert_eq!(report.sha256, "84d89877f0d4041efb6bf91a16f0248f2fd573e6af05c19f96bedb9f882f7882");

	blocks.assert_calls_async(3).await;
	list.assert_calls_async(1).await;
}

#[tokio::test]
async fn download_writes_the_exact_bytes() {
	let server = MockServer::start_async().await;
	let blob = server
		.mock_async(|when, then| {
			when.method(GET).path("/signed/driver.zip").header("x-ms-version", STORAGE_VERSION);
			then.status(200).body("signed-package-bytes");
		})
		.await;
	let destination = scratch_path("download");
	let report = AzureBlobClient::default()
		.download(&url(&server.url("/signed/driver.zip")), &destination, &NoProgress)
		.await
		.expect("Download should succeed.");
	let written = tokio::fs::read(&destination).await.expect("Downloaded file should exist.");

	tokio::fs::remove_file(&destination).await.expect("Scratch file should be removable.");

	assert_eq!(written, b"signed-package-bytes");
	assert_eq!(report.bytes, 20);
	assert_eq!(report.sha256, "4d9c5af680d7cd7d1781c5c0f9f306828fbba5b65e61f3c6f3a611c1496a1392");

	blob.assert_calls_async(1).await;
}

#[tokio::test]
async fn failed_download_leaves_no_file() {
	let server = MockServer::start_async().await;
	let _blob = server
		.mock_async(|when, then| {
			when.method(GET).path("/signed/expired.zip");
			then.status(404).body("<Error><Code>BlobNotFound</Code></Error>");
		})
		.await;
	let destination = scratch_path("missing");
	let err = AzureBlobClient::default()
		.download(&url(&server.url("/signed/expired.zip")), &destination, &NoProgress)
		.await
		.expect_err("A 404 should fail the download.");

	match err {
		Error::Blob(BlobError::Status { status, body, .. }) => {
			assert_eq!(status, 404);
			assert!(body.contains("BlobNotFound"));
		},
		other => panic!("Unexpected error: {other:?}."),
	}
	assert!(!destination.exists());
}

#[tokio::test]
async fn text_blobs_are_returned_whole() {
	let server = MockServer::start_async().await;
	let _report = server
		.mock_async(|when, then| {
			when.method(GET).path("/reports/errors.txt");
			then.status(200).body("Driver failed signing: missing catalog.");
		})
		.await;
	let text = AzureBlobClient::default()
		.download_text(&url(&server.url("/reports/errors.txt")))
		.await
		.expect("Text download should succeed.");

	assert_eq!(text, "Driver failed signing: missing catalog.");
}
