//! Error taxonomy shared by the identity session, MFA verifier, router, and exchanger.

// self
use crate::{_prelude::*, auth::IdentifierError, obs::Stage, saml::AssertionParseError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Every variant is fatal for the flow that produced it. The two self-healing conditions
/// (push timeout and an over-long session duration) never surface here.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Missing or invalid provider/app configuration.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Client credentials or the username/password pair were rejected, or the identity
	/// provider could not be reached.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// The identity provider answered with a payload the crate cannot interpret.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),
	/// The identity provider issued an MFA challenge without any device to answer it.
	#[error("Identity provider returned no MFA device for this user.")]
	NoDevice,
	/// OTP rejected, push denied, or push hard-failed.
	#[error(transparent)]
	MfaVerification(#[from] MfaError),
	/// The verified assertion does not carry a usable role binding.
	#[error(transparent)]
	AssertionParse(#[from] AssertionParseError),
	/// The cloud provider refused the role assumption.
	#[error(transparent)]
	RoleAssumption(#[from] RoleAssumptionError),
	/// Interactive input could not be read.
	#[error(transparent)]
	Terminal(#[from] crate::terminal::TerminalError),
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// An endpoint URL could not be parsed or joined.
	#[error("The {endpoint} endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoints must use HTTPS outside of loopback hosts.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// A required setting was left empty.
	#[error("The `{field}` setting is required.")]
	MissingField {
		/// Name of the missing setting.
		field: &'static str,
	},
	/// A typed identifier failed validation.
	#[error(transparent)]
	Identifier(#[from] IdentifierError),
	/// Requested session duration is outside what STS accepts.
	#[error("Session duration must be between {min} and {max} seconds, got {seconds}.")]
	DurationOutOfRange {
		/// Requested duration in seconds.
		seconds: i32,
		/// Smallest accepted duration.
		min: i32,
		/// Largest accepted duration.
		max: i32,
	},
	/// Push polling needs a positive interval and a budget at least as long.
	#[error("Push polling interval must be positive and no longer than the push timeout.")]
	InvalidPushSchedule,
	/// The preferred role is not among the roles the assertion grants.
	#[error("The assertion does not grant the preferred role {role_arn}.")]
	RoleNotGranted {
		/// Configured role ARN.
		role_arn: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Authentication failures at the token or assertion stage.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// Client ID/secret were rejected by the token endpoint.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider-supplied reason string.
		reason: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Username/password pair was rejected.
	#[error("Identity provider rejected the user credentials: {reason}.")]
	InvalidCredentials {
		/// Provider-supplied reason string.
		reason: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// The identity provider could not be reached.
	#[error(transparent)]
	Transport(#[from] TransportError),
}

/// Malformed or unexpected identity-provider responses.
#[derive(Debug, ThisError)]
pub enum ProtocolError {
	/// Response body could not be decoded.
	#[error("Identity provider returned malformed JSON.")]
	Json {
		/// Structured parsing failure including the offending JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Response decoded but does not match any expected shape.
	#[error("Identity provider returned an unexpected response: {message}.")]
	Unexpected {
		/// Summary of what was wrong.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint response omitted `expires_in`.
	#[error("Token endpoint response is missing expires_in.")]
	MissingExpiresIn,
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Token endpoint returned a non-positive duration.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
	/// MFA verification was accepted but carried no assertion.
	#[error("MFA verification was accepted without a SAML assertion.")]
	MissingAssertion,
}

/// MFA verification failures.
#[derive(Debug, ThisError)]
pub enum MfaError {
	/// The identity provider rejected the factor.
	#[error("MFA verification via {factor} was rejected: {message}.")]
	Rejected {
		/// `push` or `otp`.
		factor: &'static str,
		/// Provider-supplied message.
		message: String,
	},
	/// The verify-factor call could not be completed.
	#[error(transparent)]
	Transport(#[from] TransportError),
}

/// Failures reported by the cloud role-assumption endpoint.
#[derive(Debug, ThisError)]
pub enum RoleAssumptionError {
	/// The requested session duration exceeds the role's maximum.
	#[error("Requested session duration of {duration_seconds} seconds exceeds the role maximum: {message}.")]
	DurationExceeded {
		/// Duration that was requested.
		duration_seconds: i32,
		/// Provider-supplied message.
		message: String,
	},
	/// Any other rejection.
	#[error("Role assumption was rejected ({}): {message}.", .code.as_deref().unwrap_or("unknown"))]
	Rejected {
		/// Provider error code, when available.
		code: Option<String>,
		/// Provider-supplied message.
		message: String,
	},
	/// The endpoint could not be reached or answered garbage.
	#[error("Role assumption endpoint could not be reached.")]
	Transport {
		/// Underlying SDK or network failure.
		#[source]
		source: BoxError,
	},
	/// The endpoint answered without credentials.
	#[error("Role assumption succeeded without returning credentials.")]
	MissingCredentials,
	/// Expiration instant is not representable.
	#[error("Credential expiration {seconds} is out of range.")]
	InvalidExpiration {
		/// Raw unix timestamp.
		seconds: i64,
	},
}
impl RoleAssumptionError {
	/// Wraps an SDK or transport failure.
	pub fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport { source: Box::new(src) }
	}

	/// Returns `true` when the rejection is the self-healing duration condition.
	pub fn is_duration_exceeded(&self) -> bool {
		matches!(self, Self::DurationExceeded { .. })
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the identity provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the identity provider.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Error returned by the flow orchestrator, annotated with the failing stage.
#[derive(Debug, ThisError)]
#[error("Credential flow failed during the {stage} stage.")]
pub struct FlowError {
	/// Stage at which the flow stopped.
	pub stage: Stage,
	/// First error encountered.
	#[source]
	pub source: Error,
}
impl FlowError {
	/// Annotates `source` with `stage`.
	pub fn new(stage: Stage, source: impl Into<Error>) -> Self {
		Self { stage, source: source.into() }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn flow_error_names_stage() {
		let err = FlowError::new(Stage::DeviceSelection, Error::NoDevice);

		assert_eq!(err.stage, Stage::DeviceSelection);
		assert_eq!(err.to_string(), "Credential flow failed during the device_selection stage.");
		assert!(matches!(err.source, Error::NoDevice));
		assert_eq!(
			StdError::source(&err).map(ToString::to_string).as_deref(),
			Some("Identity provider returned no MFA device for this user.")
		);
	}

	#[test]
	fn rejected_role_assumption_renders_unknown_code() {
		let err = RoleAssumptionError::Rejected { code: None, message: "denied".into() };

		assert_eq!(err.to_string(), "Role assumption was rejected (unknown): denied.");
		assert!(!err.is_duration_exceeded());
	}
}
