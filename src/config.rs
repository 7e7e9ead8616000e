//! Validated, immutable settings for one credential flow.
//!
//! Nothing here reads files: callers assemble [`ProviderConfig`], [`AppConfig`], and
//! [`FlowConfig`] in code (the binary fills them from flags and environment variables) and the
//! builders reject empty identifiers, insecure endpoints, and durations STS would refuse.

/// Builder API for assembling provider settings.
pub mod builder;

pub use builder::*;

// crates.io
use url::Host;
// self
use crate::{
	_prelude::*,
	auth::{AppId, Secret, Subdomain},
	error::ConfigError,
};

/// Device type that supports push delivery out of the box.
pub const PUSH_DEVICE_ONELOGIN_PROTECT: &str = "OneLogin Protect";

/// Identity-provider account settings.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
	/// Region label used to derive the default API host (`us`, `eu`).
	pub region: String,
	/// Account subdomain sent with every assertion request.
	pub subdomain: Subdomain,
	/// API client identifier for the client-credentials grant.
	pub client_id: String,
	/// API client secret for the client-credentials grant.
	pub client_secret: Secret,
	/// Username to use instead of prompting.
	pub username: Option<String>,
	/// Resolved identity-provider endpoints.
	pub endpoints: ProviderEndpoints,
}
impl ProviderConfig {
	/// Creates a new builder for the provided region.
	pub fn builder(region: impl Into<String>) -> ProviderConfigBuilder {
		ProviderConfigBuilder::new(region)
	}
}

/// Endpoint set exposed by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Client-credentials token endpoint.
	pub token: Url,
	/// SAML assertion endpoint.
	pub saml_assertion: Url,
	/// MFA verify-factor endpoint.
	pub verify_factor: Url,
}
impl ProviderEndpoints {
	/// Derives every endpoint from an API base URL.
	pub fn from_base(base: &Url) -> Result<Self, ConfigError> {
		validate_endpoint("api", base)?;

		let join = |endpoint: &'static str, path: &str| {
			base.join(path).map_err(|source| ConfigError::InvalidEndpoint { endpoint, source })
		};

		Ok(Self {
			token: join("token", "auth/oauth2/v2/token")?,
			saml_assertion: join("saml_assertion", "api/1/saml_assertion")?,
			verify_factor: join("verify_factor", "api/1/saml_assertion/verify_factor")?,
		})
	}

	/// Default API base for a region label.
	pub fn default_base(region: &str) -> Result<Url, ConfigError> {
		Url::parse(&format!("https://api.{region}.onelogin.com/"))
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "api", source })
	}
}

/// Target application inside the identity provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
	/// Application identifier.
	pub id: AppId,
	/// Role to pick when the assertion grants several.
	pub preferred_role_arn: Option<String>,
}
impl AppConfig {
	/// Creates an app config without a role preference.
	pub fn new(id: AppId) -> Self {
		Self { id, preferred_role_arn: None }
	}

	/// Sets the role ARN to pick from multi-role assertions.
	pub fn with_preferred_role_arn(mut self, arn: impl Into<String>) -> Self {
		self.preferred_role_arn = Some(arn.into());

		self
	}
}

/// Push-first MFA policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PushPolicy {
	/// Device types that receive push notifications.
	pub device_types: Vec<String>,
	/// Delay between polls.
	pub interval: Duration,
	/// Overall budget before falling back to OTP entry.
	pub timeout: Duration,
}
impl PushPolicy {
	/// Returns `true` when `device_type` supports push delivery.
	pub fn supports(&self, device_type: &str) -> bool {
		self.device_types.iter().any(|kind| kind == device_type)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if !self.interval.is_positive() || self.interval > self.timeout {
			return Err(ConfigError::InvalidPushSchedule);
		}

		Ok(())
	}
}
impl Default for PushPolicy {
	fn default() -> Self {
		Self {
			device_types: vec![PUSH_DEVICE_ONELOGIN_PROTECT.into()],
			interval: Duration::seconds(1),
			timeout: Duration::seconds(30),
		}
	}
}

/// Per-invocation flow settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowConfig {
	/// Session duration requested from STS.
	pub duration_seconds: i32,
	/// Duration retried once when the role rejects the requested one.
	pub fallback_duration_seconds: i32,
	/// Push/OTP policy.
	pub push: PushPolicy,
}
impl FlowConfig {
	/// Shortest session STS issues.
	pub const MIN_DURATION_SECONDS: i32 = 900;
	/// Longest session STS issues.
	pub const MAX_DURATION_SECONDS: i32 = 43_200;
	/// Duration retried after a duration-exceeded rejection.
	pub const FALLBACK_DURATION_SECONDS: i32 = 3_600;

	/// Validates and stores the requested session duration.
	pub fn new(duration_seconds: i32) -> Result<Self, ConfigError> {
		validate_duration(duration_seconds)?;

		Ok(Self {
			duration_seconds,
			fallback_duration_seconds: Self::FALLBACK_DURATION_SECONDS,
			push: PushPolicy::default(),
		})
	}

	/// Replaces the push policy after validating its schedule.
	pub fn with_push_policy(mut self, push: PushPolicy) -> Result<Self, ConfigError> {
		push.validate()?;

		self.push = push;

		Ok(self)
	}
}
impl Default for FlowConfig {
	fn default() -> Self {
		Self {
			duration_seconds: Self::FALLBACK_DURATION_SECONDS,
			fallback_duration_seconds: Self::FALLBACK_DURATION_SECONDS,
			push: PushPolicy::default(),
		}
	}
}

fn validate_duration(seconds: i32) -> Result<(), ConfigError> {
	let (min, max) = (FlowConfig::MIN_DURATION_SECONDS, FlowConfig::MAX_DURATION_SECONDS);

	if !(min..=max).contains(&seconds) {
		return Err(ConfigError::DurationOutOfRange { seconds, min, max });
	}

	Ok(())
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ConfigError> {
	let loopback = match url.host() {
		Some(Host::Domain(domain)) => domain == "localhost",
		Some(Host::Ipv4(ip)) => ip.is_loopback(),
		Some(Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	};

	if url.scheme() == "https" || (url.scheme() == "http" && loopback) {
		Ok(())
	} else {
		Err(ConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	}
}
