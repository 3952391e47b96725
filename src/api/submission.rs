//! Driver submissions.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	api::{DownloadItem, DownloadKind, Downloads, Link, WorkflowStatus},
	decode::Entity,
};

/// Submission as returned by the service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Submission {
	/// Submission id.
	pub id: Option<String>,
	/// Owning product id.
	pub product_id: Option<String>,
	/// Display name.
	pub name: Option<String>,
	/// Submission type (`initial` or `derived`).
	#[serde(rename = "type")]
	pub kind: Option<String>,
	/// Commit status.
	pub commit_status: Option<String>,
	/// Creator.
	pub created_by: Option<String>,
	/// Creation timestamp as sent by the service.
	pub created_date_time: Option<String>,
	/// Hypermedia links.
	pub links: Vec<Link>,
	/// Processing status; absent while the service is still materializing it.
	pub workflow_status: Option<WorkflowStatus>,
	/// Attached artifacts.
	pub downloads: Option<Downloads>,
}
impl Submission {
	/// Display name with an empty default.
	pub fn display_name(&self) -> &str {
		self.name.as_deref().unwrap_or_default()
	}

	/// First attached artifact of `kind`.
	pub fn download(&self, kind: DownloadKind) -> Option<&DownloadItem> {
		self.downloads.as_ref().and_then(|downloads| downloads.find(kind))
	}

	/// `true` when an artifact of `kind` is attached.
	pub fn has_download(&self, kind: DownloadKind) -> bool {
		self.download(kind).is_some()
	}
}
impl Entity for Submission {
	fn entity_id(&self) -> Option<&str> {
		self.id.as_deref()
	}
}

/// Body of a create-submission call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewSubmission {
	/// Display name.
	pub name: String,
	/// Submission type (`initial` or `derived`).
	#[serde(rename = "type")]
	pub kind: String,
	/// Unrecognized fields, forwarded verbatim.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}
impl NewSubmission {
	/// Creates a submission body.
	pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
		Self { name: name.into(), kind: kind.into(), extra: BTreeMap::new() }
	}
}
