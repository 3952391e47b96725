//! Hardware products.

// crates.io
use serde_json::Value;
// self
use crate::{_prelude::*, decode::Entity};

/// Product as returned by the service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Product {
	/// Product id.
	pub id: Option<String>,
	/// Id shared across partners.
	pub shared_product_id: Option<String>,
	/// Display name.
	pub product_name: Option<String>,
	/// Product type.
	pub product_type: Option<String>,
	/// Firmware version.
	#[serde(rename = "firmwareVersionid")]
	pub firmware_version: Option<String>,
	/// Device type.
	pub device_type: Option<String>,
	/// Test-signed product.
	pub is_test_sign: bool,
	/// Flight-signed product.
	pub is_flight_sign: bool,
	/// Requested signature families.
	pub requested_signatures: Vec<String>,
	/// Creator.
	pub created_by: Option<String>,
	/// Last updater.
	pub updated_by: Option<String>,
	/// Creation timestamp as sent by the service.
	pub created_date_time: Option<String>,
	/// Update timestamp as sent by the service.
	pub updated_date_time: Option<String>,
	/// Announcement timestamp as sent by the service.
	pub announcement_date: Option<String>,
	/// Device metadata ids.
	pub device_metadata_ids: Vec<String>,
	/// Marketing names.
	pub marketing_names: Vec<String>,
	/// Test harness.
	pub test_harness: Option<String>,
	/// Selected product types keyed by OS family.
	pub selected_product_types: BTreeMap<String, String>,
}
impl Entity for Product {
	fn entity_id(&self) -> Option<&str> {
		self.id.as_deref()
	}
}

/// Body of a create-product call.
///
/// Fields the service accepts but this type does not name are carried through [`NewProduct::extra`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
	/// Display name.
	pub product_name: String,
	/// Device type.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub device_type: Option<String>,
	/// Requested signature families.
	#[serde(default)]
	pub requested_signatures: Vec<String>,
	/// Announcement timestamp.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub announcement_date: Option<String>,
	/// Device metadata ids.
	#[serde(default)]
	pub device_metadata_ids: Vec<String>,
	/// Firmware version.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub firmware_version: Option<String>,
	/// Test-signed product.
	#[serde(default)]
	pub is_test_sign: bool,
	/// Flight-signed product.
	#[serde(default)]
	pub is_flight_sign: bool,
	/// Marketing names.
	#[serde(default)]
	pub marketing_names: Vec<String>,
	/// Selected product types keyed by OS family.
	#[serde(default)]
	pub selected_product_types: BTreeMap<String, String>,
	/// Test harness.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub test_harness: Option<String>,
	/// Unrecognized fields, forwarded verbatim.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}
