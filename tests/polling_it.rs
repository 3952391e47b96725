mod common;

// std
use std::{sync::Arc, time::Duration};
// crates.io
use httpmock::prelude::*;
use parking_lot::Mutex;
// self
use common::*;
use devcenter_manager::{
	CancellationToken,
	api::WorkflowStatus,
	blob::AzureBlobClient,
	error::Error,
	poll::{PollConfig, PollObserver, PollOutcome, PollingWaiter, ShippingLabelTarget, SubmissionTarget},
};

const SUBMISSION_PATH: &str = "/hardware/products/14/submissions/9";

#[derive(Debug, Default)]
struct RecordingObserver {
	changes: Mutex<Vec<(String, String, Option<String>)>>,
}
impl PollObserver for RecordingObserver {
	fn status_changed(&self, _: &str, status: &WorkflowStatus, error_report: Option<&str>) {
		self.changes.lock().push((
			status.step().to_owned(),
			status.state().to_owned(),
			error_report.map(str::to_owned),
		));
	}
}

fn fast_poll(deadline: Option<Duration>) -> PollConfig {
	PollConfig {
		interval: Duration::from_millis(10),
		rate_limit_pause: Duration::from_millis(10),
		deadline,
	}
}

fn waiter(observer: Arc<RecordingObserver>, deadline: Option<Duration>) -> PollingWaiter<AzureBlobClient> {
	PollingWaiter::new(Arc::new(AzureBlobClient::default()))
		.with_config(fast_poll(deadline))
		.with_observer(observer)
}

#[tokio::test]
async fn signed_submission_is_ready() {
	let server = MockServer::start_async().await;
	let _token = mock_token(&server).await;
	let submission = server
		.mock_async(|when, then| {
			when.method(GET).path(SUBMISSION_PATH);
			then.status(200).header("content-type", "application/json").body(
				r#"{"id":"9","productId":"14","workflowStatus":{"currentStep":"finalizeIngestion","state":"completed"},"downloads":{"items":[{"type":"signedPackage","url":"https://blob.invalid/signed"}],"messages":[]}}"#,
			);
		})
		.await;
	let client = client(&server);
	let observer = Arc::new(RecordingObserver::default());
	let outcome = waiter(observer.clone(), None)
		.wait(&SubmissionTarget::new(&client, "14", "9", false), &CancellationToken::new())
		.await
		.expect("Wait should finish.");

	assert!(matches!(outcome, PollOutcome::Ready(_)));
	assert_eq!(
		observer.changes.lock().as_slice(),
		&[("finalizeIngestion".to_owned(), "completed".to_owned(), None)]
	);

	submission.assert_calls_async(1).await;
}

#[tokio::test]
async fn failed_submission_carries_the_error_report() {
	let server = MockServer::start_async().await;
	let _token = mock_token(&server).await;
	let report_url = server.url("/reports/9.txt");
	let _submission = server
		.mock_async(|when, then| {
			when.method(GET).path(SUBMISSION_PATH);
			then.status(200).header("content-type", "application/json").body(format!(
				r#"{{"id":"9","workflowStatus":{{"currentStep":"preProcessing","state":"failed","messages":["Catalog invalid"],"errorReport":"{report_url}"}}}}"#
			));
		})
		.await;
	let report = server
		.mock_async(|when, then| {
			when.method(GET).path("/reports/9.txt");
			then.status(200).body("INF parse error at line 12");
		})
		.await;
	let client = client(&server);
	let observer = Arc::new(RecordingObserver::default());
	let outcome = waiter(observer.clone(), None)
		.wait(&SubmissionTarget::new(&client, "14", "9", false), &CancellationToken::new())
		.await
		.expect("Wait should finish.");

	assert!(outcome.is_failed());
	assert_eq!(
		observer.changes.lock()[0].2.as_deref(),
		Some("INF parse error at line 12")
	);

	report.assert_calls_async(1).await;
}

#[tokio::test]
async fn rejection_ends_the_wait() {
	let server = MockServer::start_async().await;
	let _token = mock_token(&server).await;
	let _submission = server
		.mock_async(|when, then| {
			when.method(GET).path(SUBMISSION_PATH);
			then.status(404)
				.header("content-type", "application/json")
				.body(r#"{"error":{"code":"entityNotFound","message":"Submission not found"}}"#);
		})
		.await;
	let client = client(&server);
	let err = waiter(Arc::new(RecordingObserver::default()), None)
		.wait(&SubmissionTarget::new(&client, "14", "9", false), &CancellationToken::new())
		.await
		.expect_err("A 404 should end the wait.");

	assert!(matches!(err, Error::Api(ref details) if details.code == "entityNotFound"));
}

#[tokio::test]
async fn pending_label_hits_the_deadline() {
	let server = MockServer::start_async().await;
	let _token = mock_token(&server).await;
	let label = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/hardware/products/14/submissions/9/shippingLabels/3")
				.query_param("includeTargetingInfo", "true");
			then.status(200).header("content-type", "application/json").body(
				r#"{"id":"3","workflowStatus":{"currentStep":"preProcessShippingLabel","state":"inProgress"}}"#,
			);
		})
		.await;
	let client = client(&server);
	let observer = Arc::new(RecordingObserver::default());
	let err = waiter(observer.clone(), Some(Duration::from_millis(80)))
		.wait(&ShippingLabelTarget::new(&client, "14", "9", "3"), &CancellationToken::new())
		.await
		.expect_err("A label that never progresses should time out.");

	assert!(matches!(err, Error::DeadlineExceeded { .. }));
	assert_eq!(observer.changes.lock().len(), 1);

	assert!(label.calls_async().await >= 1);
}

#[tokio::test]
async fn cancellation_stops_the_wait() {
	let server = MockServer::start_async().await;
	let _token = mock_token(&server).await;
	let _submission = server
		.mock_async(|when, then| {
			when.method(GET).path(SUBMISSION_PATH);
			then.status(200).header("content-type", "application/json").body(
				r#"{"id":"9","workflowStatus":{"currentStep":"preProcessing","state":"inProgress"}}"#,
			);
		})
		.await;
	let client = client(&server);
	let cancel = CancellationToken::new();

	tokio::spawn({
		let cancel = cancel.clone();

		async move {
			tokio::time::sleep(Duration::from_millis(50)).await;
			cancel.cancel();
		}
	});

	let err = waiter(Arc::new(RecordingObserver::default()), None)
		.wait(&SubmissionTarget::new(&client, "14", "9", false), &cancel)
		.await
		.expect_err("Cancellation should end the wait.");

	assert!(matches!(err, Error::Cancelled));
}
