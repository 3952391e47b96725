//! Client credentials for one certification API server, loaded from a JSON file or the environment.

// std
use std::io::ErrorKind;
// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};

/// Identity authority used when the credentials do not override it.
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com/";
/// Token audience used when the credentials do not override it.
pub const DEFAULT_RESOURCE: &str = "https://manage.devcenter.microsoft.com";
/// Client id shipped in the sample `authconfig.json`; treated as "not configured".
pub const PLACEHOLDER_CLIENT_ID: &str = "guid";

/// Environment variable holding the client id.
pub const ENV_CLIENT_ID: &str = "SDCM_CLIENT_ID";
/// Environment variable holding the client secret.
pub const ENV_CLIENT_SECRET: &str = "SDCM_CLIENT_SECRET";
/// Environment variable holding the tenant id.
pub const ENV_TENANT_ID: &str = "SDCM_TENANT_ID";
/// Environment variable holding the API base URL.
pub const ENV_URL: &str = "SDCM_URL";
/// Environment variable holding the API path prefix.
pub const ENV_URL_PREFIX: &str = "SDCM_URL_PREFIX";
/// Environment variable overriding the identity authority.
pub const ENV_AUTHORITY: &str = "SDCM_AUTHORITY";
/// Environment variable overriding the token audience.
pub const ENV_RESOURCE: &str = "SDCM_RESOURCE";

/// Client credentials and endpoints for one server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
	/// Application (client) id.
	pub client_id: String,
	/// Client secret.
	#[serde(rename = "key")]
	pub client_secret: TokenSecret,
	/// Directory (tenant) id.
	pub tenant_id: String,
	/// API base URL.
	pub url: Url,
	/// Path prefix resolved against [`Credentials::url`].
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub url_prefix: Option<String>,
	/// Identity authority; defaults to [`DEFAULT_AUTHORITY`].
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub authority: Option<Url>,
	/// Token audience; defaults to [`DEFAULT_RESOURCE`].
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub resource: Option<String>,
}
impl Credentials {
	/// Creates credentials with default authority, resource, and no prefix.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<TokenSecret>,
		tenant_id: impl Into<String>,
		url: Url,
	) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			tenant_id: tenant_id.into(),
			url,
			url_prefix: None,
			authority: None,
			resource: None,
		}
	}

	/// Sets the path prefix.
	pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.url_prefix = Some(prefix.into());

		self
	}

	/// Overrides the identity authority.
	pub fn with_authority(mut self, authority: Url) -> Self {
		self.authority = Some(authority);

		self
	}

	/// Overrides the token audience.
	pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
		self.resource = Some(resource.into());

		self
	}

	/// `true` for the unedited sample entry.
	pub fn is_placeholder(&self) -> bool {
		self.client_id.trim().eq_ignore_ascii_case(PLACEHOLDER_CLIENT_ID)
	}

	/// Token audience sent with the client-credentials grant.
	pub fn resource(&self) -> &str {
		self.resource.as_deref().unwrap_or(DEFAULT_RESOURCE)
	}

	/// `{authority}/{tenant}/oauth2/token`.
	pub fn token_endpoint(&self) -> Result<Url> {
		let mut authority = match &self.authority {
			Some(authority) => authority.clone(),
			None => Url::parse(DEFAULT_AUTHORITY)
				.map_err(|e| ConfigError::invalid_url(DEFAULT_AUTHORITY, e))?,
		};

		if !authority.path().ends_with('/') {
			let path = format!("{}/", authority.path());

			authority.set_path(&path);
		}

		let relative = format!("{}/oauth2/token", self.tenant_id.trim());

		authority.join(&relative).map_err(|e| ConfigError::invalid_url(relative, e).into())
	}

	/// API base: [`Credentials::url`] with the prefix resolved against it.
	pub fn api_base(&self) -> Result<Url> {
		match self.url_prefix.as_deref().map(str::trim).filter(|prefix| !prefix.is_empty()) {
			Some(prefix) =>
				self.url.join(prefix).map_err(|e| ConfigError::invalid_url(prefix, e).into()),
			None => Ok(self.url.clone()),
		}
	}

	/// Reads credentials from the `SDCM_*` environment variables.
	pub fn from_env() -> Result<Option<Self>> {
		Self::from_env_with(|name| std::env::var(name).ok())
	}

	/// Reads credentials through `lookup`.
	///
	/// Returns `Ok(None)` when the client id is unset; any other required variable missing is an
	/// error.
	pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>> {
		let read = |name: &str| lookup(name).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
		let Some(client_id) = read(ENV_CLIENT_ID) else {
			return Ok(None);
		};
		let require =
			|name: &'static str| read(name).ok_or(ConfigError::MissingEnv { name });
		let client_secret = require(ENV_CLIENT_SECRET)?;
		let tenant_id = require(ENV_TENANT_ID)?;
		let raw_url = require(ENV_URL)?;
		let url = Url::parse(&raw_url).map_err(|e| ConfigError::invalid_url(&raw_url, e))?;
		let mut credentials = Self::new(client_id, client_secret, tenant_id, url);

		credentials.url_prefix = read(ENV_URL_PREFIX);
		credentials.resource = read(ENV_RESOURCE);

		if let Some(raw) = read(ENV_AUTHORITY) {
			credentials.authority =
				Some(Url::parse(&raw).map_err(|e| ConfigError::invalid_url(&raw, e))?);
		}

		Ok(Some(credentials))
	}

	/// Reads the JSON array stored at `path`; a missing file yields an empty list.
	pub fn from_file(path: &Path) -> Result<Vec<Self>> {
		let raw = match std::fs::read(path) {
			Ok(raw) => raw,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
			Err(source) =>
				return Err(ConfigError::CredentialsRead { path: path.to_owned(), source }.into()),
		};
		let mut deserializer = serde_json::Deserializer::from_slice(&raw);

		serde_path_to_error::deserialize(&mut deserializer).map_err(|source| {
			ConfigError::CredentialsParse { path: path.to_owned(), source }.into()
		})
	}
}

/// Where credentials are looked up.
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CredentialSource {
	/// Environment variables only.
	#[cfg_attr(feature = "cli", value(name = "envonly"))]
	EnvOnly,
	/// Credentials file only.
	#[cfg_attr(feature = "cli", value(name = "fileonly"))]
	FileOnly,
	/// Environment first, then the credentials file.
	#[default]
	#[cfg_attr(feature = "cli", value(name = "envthenfile"))]
	EnvThenFile,
}

/// Loads every configured server entry from `source`; placeholder-only configurations yield an
/// empty list.
pub fn load_credentials(source: CredentialSource, file: &Path) -> Result<Vec<Credentials>> {
	load_credentials_with(source, file, |name| std::env::var(name).ok())
}

/// [`load_credentials`] with an injectable environment lookup.
pub fn load_credentials_with(
	source: CredentialSource,
	file: &Path,
	lookup: impl Fn(&str) -> Option<String>,
) -> Result<Vec<Credentials>> {
	let from_env = || Credentials::from_env_with(&lookup).map(|c| c.into_iter().collect::<Vec<_>>());
	let entries = match source {
		CredentialSource::EnvOnly => from_env()?,
		CredentialSource::FileOnly => Credentials::from_file(file)?,
		CredentialSource::EnvThenFile => {
			let entries = from_env()?;

			if entries.is_empty() { Credentials::from_file(file)? } else { entries }
		},
	};

	if entries.first().is_some_and(Credentials::is_placeholder) {
		return Ok(Vec::new());
	}

	Ok(entries)
}
