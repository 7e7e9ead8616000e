// self
use crate::{
	_prelude::*,
	auth::{Secret, Subdomain},
	config::{ProviderConfig, ProviderEndpoints},
	error::ConfigError,
};

/// Builder for [`ProviderConfig`] values.
#[derive(Debug)]
pub struct ProviderConfigBuilder {
	/// Region label (`us`, `eu`).
	pub region: String,
	/// Account subdomain.
	pub subdomain: Option<String>,
	/// API client identifier.
	pub client_id: Option<String>,
	/// API client secret.
	pub client_secret: Option<Secret>,
	/// Username to use instead of prompting.
	pub username: Option<String>,
	/// Override for the region-derived API base.
	pub api_base: Option<Url>,
}
impl ProviderConfigBuilder {
	/// Creates a new builder seeded with the provided region.
	pub fn new(region: impl Into<String>) -> Self {
		Self {
			region: region.into(),
			subdomain: None,
			client_id: None,
			client_secret: None,
			username: None,
			api_base: None,
		}
	}

	/// Sets the account subdomain.
	pub fn subdomain(mut self, subdomain: impl Into<String>) -> Self {
		self.subdomain = Some(subdomain.into());

		self
	}

	/// Sets the API client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = Some(client_id.into());

		self
	}

	/// Sets the API client secret.
	pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
		self.client_secret = Some(Secret::new(client_secret));

		self
	}

	/// Pre-fills the username so the flow does not prompt for it.
	pub fn username(mut self, username: impl Into<String>) -> Self {
		self.username = Some(username.into());

		self
	}

	/// Overrides the API base URL (tests, private deployments).
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = Some(url);

		self
	}

	/// Consumes the builder and validates the resulting config.
	pub fn build(self) -> Result<ProviderConfig, ConfigError> {
		let region = self.region.trim().to_owned();

		if region.is_empty() {
			return Err(ConfigError::MissingField { field: "region" });
		}

		let subdomain = self
			.subdomain
			.filter(|value| !value.is_empty())
			.ok_or(ConfigError::MissingField { field: "subdomain" })?;
		let subdomain = Subdomain::new(subdomain)?;
		let client_id = self
			.client_id
			.filter(|value| !value.trim().is_empty())
			.ok_or(ConfigError::MissingField { field: "client_id" })?;
		let client_secret = self
			.client_secret
			.filter(|value| !value.is_empty())
			.ok_or(ConfigError::MissingField { field: "client_secret" })?;
		let base = match self.api_base {
			Some(base) => base,
			None => ProviderEndpoints::default_base(&region)?,
		};
		let endpoints = ProviderEndpoints::from_base(&base)?;
		let username = self.username.filter(|value| !value.trim().is_empty());

		Ok(ProviderConfig { region, subdomain, client_id, client_secret, username, endpoints })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::IdentifierError;

	fn complete() -> ProviderConfigBuilder {
		ProviderConfig::builder("us").subdomain("acme").client_id("id").client_secret("secret")
	}

	#[test]
	fn builds_with_region_default_base() {
		let config = complete().build().expect("Complete builder should succeed.");

		assert_eq!(config.subdomain.as_ref(), "acme");
		assert_eq!(config.endpoints.saml_assertion.as_str(), "https://api.us.onelogin.com/api/1/saml_assertion");
		assert!(config.username.is_none());
	}

	#[test]
	fn missing_fields_are_named() {
		let err = ProviderConfig::builder("us")
			.subdomain("acme")
			.client_secret("secret")
			.build()
			.expect_err("Missing client id should fail.");

		assert!(matches!(err, ConfigError::MissingField { field: "client_id" }));

		let err = complete().client_secret("").build().expect_err("Empty secret should fail.");

		assert!(matches!(err, ConfigError::MissingField { field: "client_secret" }));

		let err = ProviderConfig::builder(" ").build().expect_err("Blank region should fail.");

		assert!(matches!(err, ConfigError::MissingField { field: "region" }));
	}

	#[test]
	fn subdomain_is_validated() {
		let err = complete().subdomain("ac me").build().expect_err("Whitespace should fail.");

		assert!(matches!(
			err,
			ConfigError::Identifier(IdentifierError::ContainsWhitespace { kind: "Subdomain" })
		));
	}

	#[test]
	fn blank_username_means_prompt() {
		let config = complete().username("  ").build().expect("Builder should succeed.");

		assert!(config.username.is_none());
	}
}
