//! Poll targets for submissions and shipping labels, and their terminal predicates.

// self
use crate::{
	_prelude::*,
	api::{DevCenterClient, DownloadKind, ShippingLabel, Submission, WorkflowStatus},
	http::ApiTransport,
	poll::{PollFuture, PollTarget, TargetVerdict},
};

/// Step at which a Windows Update label is handed to approval.
pub const STEP_MICROSOFT_APPROVAL: &str = "microsoftApproval";
/// Final step of a label shared with another partner.
pub const STEP_FINALIZE_SHARING: &str = "finalizeSharing";

const STATE_COMPLETED: &str = "completed";

/// Submission predicate.
///
/// Failed state wins; otherwise a signed package makes the submission ready, or, when
/// `wait_for_metadata` is set, a signed package together with driver metadata.
pub fn submission_verdict(submission: &Submission, wait_for_metadata: bool) -> TargetVerdict {
	let Some(status) = &submission.workflow_status else {
		return TargetVerdict::Pending;
	};

	if status.is_failed() {
		return TargetVerdict::Failed;
	}
	if !submission.has_download(DownloadKind::SignedPackage) {
		return TargetVerdict::Pending;
	}
	if !wait_for_metadata {
		return TargetVerdict::Ready;
	}

	if submission.has_download(DownloadKind::DriverMetadata) {
		TargetVerdict::ReadyWithExtra
	} else {
		TargetVerdict::Pending
	}
}

/// Shipping-label predicate.
pub fn shipping_label_verdict(label: &ShippingLabel) -> TargetVerdict {
	let Some(status) = &label.workflow_status else {
		return TargetVerdict::Pending;
	};

	if status.is_failed() {
		TargetVerdict::Failed
	} else if status.step() == STEP_MICROSOFT_APPROVAL {
		TargetVerdict::Ready
	} else if status.step() == STEP_FINALIZE_SHARING && status.state() == STATE_COMPLETED {
		TargetVerdict::ReadyWithExtra
	} else {
		TargetVerdict::Pending
	}
}

/// Waits for a submission to be signed.
pub struct SubmissionTarget<'a, T>
where
	T: ?Sized + ApiTransport,
{
	client: &'a DevCenterClient<T>,
	product_id: String,
	submission_id: String,
	wait_for_metadata: bool,
}
impl<'a, T> SubmissionTarget<'a, T>
where
	T: ?Sized + ApiTransport,
{
	/// Polls `product_id/submission_id`; `wait_for_metadata` also waits for driver metadata.
	pub fn new(
		client: &'a DevCenterClient<T>,
		product_id: impl Into<String>,
		submission_id: impl Into<String>,
		wait_for_metadata: bool,
	) -> Self {
		Self {
			client,
			product_id: product_id.into(),
			submission_id: submission_id.into(),
			wait_for_metadata,
		}
	}
}
impl<T> PollTarget for SubmissionTarget<'_, T>
where
	T: ?Sized + ApiTransport,
{
	type Entity = Submission;

	fn describe(&self) -> String {
		format!("submission {}/{}", self.product_id, self.submission_id)
	}

	fn fetch(&self) -> PollFuture<'_, Submission> {
		Box::pin(self.client.get_submission(&self.product_id, &self.submission_id))
	}

	fn status<'a>(&self, entity: &'a Submission) -> Option<&'a WorkflowStatus> {
		entity.workflow_status.as_ref()
	}

	fn verdict(&self, entity: &Submission) -> TargetVerdict {
		submission_verdict(entity, self.wait_for_metadata)
	}
}

/// Waits for a shipping label to reach approval (or, when shared, completion).
pub struct ShippingLabelTarget<'a, T>
where
	T: ?Sized + ApiTransport,
{
	client: &'a DevCenterClient<T>,
	product_id: String,
	submission_id: String,
	label_id: String,
}
impl<'a, T> ShippingLabelTarget<'a, T>
where
	T: ?Sized + ApiTransport,
{
	/// Polls label `label_id` of `product_id/submission_id`.
	pub fn new(
		client: &'a DevCenterClient<T>,
		product_id: impl Into<String>,
		submission_id: impl Into<String>,
		label_id: impl Into<String>,
	) -> Self {
		Self {
			client,
			product_id: product_id.into(),
			submission_id: submission_id.into(),
			label_id: label_id.into(),
		}
	}
}
impl<T> PollTarget for ShippingLabelTarget<'_, T>
where
	T: ?Sized + ApiTransport,
{
	type Entity = ShippingLabel;

	fn describe(&self) -> String {
		format!("shipping label {}/{}/{}", self.product_id, self.submission_id, self.label_id)
	}

	fn fetch(&self) -> PollFuture<'_, ShippingLabel> {
		Box::pin(self.client.get_shipping_labels(
			&self.product_id,
			&self.submission_id,
			Some(&self.label_id),
		))
	}

	fn status<'a>(&self, entity: &'a ShippingLabel) -> Option<&'a WorkflowStatus> {
		entity.workflow_status.as_ref()
	}

	fn verdict(&self, entity: &ShippingLabel) -> TargetVerdict {
		shipping_label_verdict(entity)
	}
}
