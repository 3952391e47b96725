//! Driver metadata published with a signed submission, and the hardware ids derived from it.

// self
use crate::{_prelude::*, api::HardwareId};

/// `driverMetadata` document: bundles, their INFs, and the PnP ids each INF declares per OS.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DriverMetadata {
	/// Bundles keyed by bundle id.
	pub bundle_info_map: BTreeMap<String, BundleInfo>,
}
impl DriverMetadata {
	/// Parses a metadata document.
	pub fn parse(text: &str) -> Result<Self> {
		let deserializer = &mut serde_json::Deserializer::from_str(text);

		serde_path_to_error::deserialize(deserializer)
			.map_err(|source| Error::Decode { source, status: StatusCode::OK.as_u16() })
	}

	/// Every `(bundle, inf, os, pnp)` combination, PnP ids lower-cased.
	pub fn hardware_ids(&self) -> Vec<HardwareId> {
		self.bundle_info_map
			.iter()
			.flat_map(|(bundle_id, bundle)| {
				bundle.inf_info_map.iter().flat_map(move |(inf_id, inf)| {
					inf.os_pnp_info_map.iter().flat_map(move |(os_code, pnps)| {
						pnps.keys().map(move |pnp| HardwareId {
							bundle_id: bundle_id.clone(),
							inf_id: inf_id.clone(),
							operating_system_code: os_code.clone(),
							pnp_string: pnp.to_lowercase(),
						})
					})
				})
			})
			.collect()
	}
}

/// One bundle of a driver submission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct BundleInfo {
	/// Supported locales.
	pub locales: Option<String>,
	/// INFs keyed by INF id.
	pub inf_info_map: BTreeMap<String, InfInfo>,
}

/// One INF of a bundle.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct InfInfo {
	/// Driver package family id.
	pub driver_package_family_id: Option<String>,
	/// INF class.
	pub inf_class: Option<String>,
	/// Driver version.
	pub driver_version: Option<String>,
	/// Driver date as sent by the service.
	pub driver_date: Option<String>,
	/// Extension id.
	pub extension_id: Option<String>,
	/// Provider.
	pub provider: Option<String>,
	/// Class GUID.
	pub class_guid: Option<String>,
	/// Computer hardware ids required for installation.
	pub installation_computer_hardware_ids: Vec<serde_json::Value>,
	/// PnP ids keyed by OS code, then by PnP id.
	#[serde(rename = "OSPnPInfoMap")]
	pub os_pnp_info_map: BTreeMap<String, BTreeMap<String, PnpInfo>>,
}

/// Description of one PnP id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct PnpInfo {
	/// Manufacturer.
	pub manufacturer: Option<String>,
	/// Device description.
	pub device_description: Option<String>,
	/// Feature score.
	pub feature_score: Option<String>,
}
