//! Shapes shared by every certification resource: collection envelopes, links, workflow status, and
//! download listings.

// self
use crate::{_prelude::*, error::ConfigError};

/// `{value, links}` collection envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
	/// Entities on this page.
	#[serde(default = "Vec::new")]
	pub value: Vec<T>,
	/// Navigation links.
	#[serde(default)]
	pub links: Vec<Link>,
}

/// Hypermedia link attached to an entity or page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
	/// Target URL.
	pub href: String,
	/// Relation name.
	pub rel: String,
	/// HTTP verb to use.
	pub method: String,
}

/// Processing status the service reports for submissions and shipping labels.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkflowStatus {
	/// Workflow step currently executing (e.g. `microsoftApproval`).
	pub current_step: Option<String>,
	/// State of the current step (e.g. `inProgress`, `completed`, `failed`).
	pub state: Option<String>,
	/// Free-form status messages.
	pub messages: Vec<String>,
	/// Pre-signed URL of a text error report, present on failures.
	pub error_report: Option<String>,
}
impl WorkflowStatus {
	/// Step name with an empty default.
	pub fn step(&self) -> &str {
		self.current_step.as_deref().unwrap_or_default()
	}

	/// State name with an empty default.
	pub fn state(&self) -> &str {
		self.state.as_deref().unwrap_or_default()
	}

	/// `true` when the current step failed.
	pub fn is_failed(&self) -> bool {
		self.state().eq_ignore_ascii_case("failed")
	}

	/// Error report URL when one is attached.
	pub fn error_report_url(&self) -> Option<&str> {
		self.error_report.as_deref().map(str::trim).filter(|url| !url.is_empty())
	}
}

/// Artifacts attached to a submission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Downloads {
	/// Downloadable artifacts.
	pub items: Vec<DownloadItem>,
	/// Messages about the artifacts.
	pub messages: Vec<String>,
}
impl Downloads {
	/// First artifact of `kind`.
	pub fn find(&self, kind: DownloadKind) -> Option<&DownloadItem> {
		self.items.iter().find(|item| item.is(kind))
	}

	/// `true` when an artifact of `kind` is attached.
	pub fn has(&self, kind: DownloadKind) -> bool {
		self.find(kind).is_some()
	}
}

/// One downloadable artifact.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadItem {
	/// Artifact type as reported by the service.
	#[serde(rename = "type")]
	pub kind: String,
	/// Pre-signed blob URL.
	pub url: String,
}
impl DownloadItem {
	/// Case-insensitive match against a known artifact type.
	pub fn is(&self, kind: DownloadKind) -> bool {
		self.kind.eq_ignore_ascii_case(kind.as_str())
	}

	/// Parses [`DownloadItem::url`].
	pub fn parsed_url(&self) -> Result<Url> {
		Url::parse(&self.url).map_err(|e| ConfigError::invalid_url(&self.url, e).into())
	}
}

/// Artifact types the service attaches to submissions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DownloadKind {
	/// Package uploaded by the partner.
	InitialPackage,
	/// Package signed by the service.
	SignedPackage,
	/// Certification report.
	CertificationReport,
	/// Driver metadata JSON.
	DriverMetadata,
	/// Package derived from another submission.
	DerivedPackage,
}
impl DownloadKind {
	/// Wire name of the artifact type.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::InitialPackage => "initialPackage",
			Self::SignedPackage => "signedPackage",
			Self::CertificationReport => "certificationReport",
			Self::DriverMetadata => "driverMetadata",
			Self::DerivedPackage => "derivedPackage",
		}
	}
}
impl Display for DownloadKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
