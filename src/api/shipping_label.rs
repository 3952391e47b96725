//! Shipping labels: publication of a signed submission to Windows Update or to another partner.

// crates.io
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
// self
use crate::{
	_prelude::*,
	api::{Link, WorkflowStatus},
	decode::Entity,
};

/// Destination used when a label shares the driver with another partner.
pub const DESTINATION_ANOTHER_PARTNER: &str = "anotherPartner";

/// Shipping label as returned by the service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShippingLabel {
	/// Label id.
	pub id: Option<String>,
	/// Owning product id.
	pub product_id: Option<String>,
	/// Owning submission id.
	pub submission_id: Option<String>,
	/// Publication settings.
	pub publishing_specifications: Option<PublishingSpecifications>,
	/// Targeting, present when requested with `includeTargetingInfo`.
	pub targeting: Option<Targeting>,
	/// Processing status.
	pub workflow_status: Option<WorkflowStatus>,
	/// Hypermedia links.
	pub links: Vec<Link>,
	/// Display name.
	pub name: Option<String>,
	/// `windowsUpdate` or `anotherPartner`.
	pub destination: Option<String>,
}
impl Entity for ShippingLabel {
	fn entity_id(&self) -> Option<&str> {
		self.id.as_deref()
	}
}

/// Body of a create-shipping-label call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewShippingLabel {
	/// Publication settings.
	pub publishing_specifications: PublishingSpecifications,
	/// Devices the driver is offered to.
	pub targeting: Targeting,
	/// Display name.
	pub name: String,
	/// `windowsUpdate` or `anotherPartner`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub destination: Option<String>,
	/// Receiving partner, set when sharing.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub recipient_specifications: Option<RecipientSpecifications>,
	/// Unrecognized fields, forwarded verbatim.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}
impl NewShippingLabel {
	/// Replaces the hardware-id targeting list.
	pub fn with_hardware_ids(mut self, hardware_ids: Vec<HardwareId>) -> Self {
		self.targeting.hardware_ids = hardware_ids;

		self
	}

	/// Sets the go-live date.
	pub fn with_go_live(mut self, at: OffsetDateTime) -> Result<Self, time::error::Format> {
		self.publishing_specifications.go_live_date = Some(at.format(&Rfc3339)?);

		Ok(self)
	}

	/// Shares the driver with `publisher_id` instead of publishing to Windows Update.
	pub fn shared_with(mut self, publisher_id: impl Into<String>) -> Self {
		self.destination = Some(DESTINATION_ANOTHER_PARTNER.into());
		self.recipient_specifications = Some(RecipientSpecifications {
			enforce_chid_targeting: false,
			receiver_publisher_id: publisher_id.into(),
		});

		self
	}
}

/// Publication settings of a label.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PublishingSpecifications {
	/// RFC 3339 timestamp after which the driver is offered.
	pub go_live_date: Option<String>,
	/// Accounts that can see the label.
	pub visible_to_accounts: Vec<String>,
	/// Install during OS upgrade.
	#[serde(rename = "isAutoInstallDuringOSUpgrade")]
	pub is_auto_install_during_os_upgrade: bool,
	/// Install on applicable systems.
	pub is_auto_install_on_applicable_systems: bool,
	/// Disclosure restricted.
	pub is_disclosure_restricted: bool,
	/// Publish to Windows 10 S.
	#[serde(rename = "publishToWindows10s")]
	pub publish_to_windows_10s: bool,
	/// Justification reviewed before approval.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub additional_info_for_ms_approval: Option<AdditionalInfoForMsApproval>,
}

/// Justification reviewed before approval.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdditionalInfoForMsApproval {
	/// Contact at the approving side.
	pub microsoft_contact: Option<String>,
	/// Validations performed.
	pub validations_performed: Option<String>,
	/// Affected OEMs.
	pub affected_oems: Vec<String>,
	/// Install requires a reboot.
	pub is_reboot_required: bool,
	/// Co-engineered driver.
	pub is_co_engineered: bool,
	/// Targets unreleased hardware.
	pub is_for_unreleased_hardware: bool,
	/// Ships UI software.
	pub has_ui_software: bool,
	/// Business justification.
	pub business_justification: Option<String>,
}

/// Devices a label targets.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Targeting {
	/// Hardware ids.
	pub hardware_ids: Vec<HardwareId>,
	/// Computer hardware ids.
	pub chids: Vec<Chid>,
	/// Audiences the label is restricted to.
	pub restricted_to_audiences: Vec<String>,
}

/// One targeted hardware id, addressed by bundle, INF and OS.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HardwareId {
	/// Bundle id.
	pub bundle_id: String,
	/// INF file id.
	pub inf_id: String,
	/// Operating system code.
	pub operating_system_code: String,
	/// PnP id, lower-cased.
	pub pnp_string: String,
}

/// Computer hardware id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Chid {
	/// Distribution state.
	pub distribution_state: Option<String>,
	/// CHID GUID.
	pub chid: String,
}

/// Receiving partner of a shared label.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecipientSpecifications {
	/// Require CHID targeting on the receiving side.
	pub enforce_chid_targeting: bool,
	/// Publisher id of the receiving partner.
	pub receiver_publisher_id: String,
}
