//! Audiences a shipping label can be restricted to.

// self
use crate::{_prelude::*, api::Link, decode::Entity};

/// Audience as returned by the service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Audience {
	/// Audience id.
	pub id: Option<String>,
	/// Display name.
	pub name: Option<String>,
	/// Description.
	pub description: Option<String>,
	/// Name used in targeting.
	pub audience_name: Option<String>,
	/// Hypermedia links.
	pub links: Vec<Link>,
}
impl Entity for Audience {
	fn entity_id(&self) -> Option<&str> {
		self.id.as_deref()
	}
}
