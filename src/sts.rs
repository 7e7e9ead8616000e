//! Credential exchange: verified SAML assertion in, temporary AWS credentials out.
//!
//! [`RoleAssumer`] is the seam to the cloud endpoint. [`CredentialExchanger`] layers the
//! duration negotiation on top: a role that caps sessions below the requested length is
//! retried once with the fallback duration, and the downgrade is reported alongside the
//! credentials instead of failing the flow.

#[cfg(feature = "sts")] mod aws;
#[cfg(feature = "sts")] pub use aws::*;

// self
use crate::{
	_prelude::*,
	BoxFuture,
	auth::Secret,
	error::RoleAssumptionError,
	saml::{RoleBinding, SamlAssertion, VerifiedAssertion},
};

/// STS error code carrying the duration-exceeded condition.
pub const VALIDATION_ERROR_CODE: &str = "ValidationError";

/// Temporary cloud credentials. Ownership passes to the caller; nothing is cached.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudCredentials {
	/// Access key identifier.
	pub access_key_id: String,
	/// Secret access key.
	pub secret_access_key: Secret,
	/// Session token bound to the key pair.
	pub session_token: Secret,
	/// Instant the credentials stop working.
	#[serde(with = "time::serde::rfc3339")]
	pub expiration: OffsetDateTime,
}
impl CloudCredentials {
	/// Returns `true` once `instant` reaches the expiration.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expiration
	}
}
impl Debug for CloudCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CloudCredentials")
			.field("access_key_id", &self.access_key_id)
			.field("secret_access_key", &"<redacted>")
			.field("session_token", &"<redacted>")
			.field("expiration", &self.expiration)
			.finish()
	}
}

/// Federated role-assumption capability.
pub trait RoleAssumer: Send + Sync {
	/// Performs one `AssumeRoleWithSAML` call.
	fn assume_role<'a>(
		&'a self,
		binding: &'a RoleBinding,
		assertion: &'a SamlAssertion,
		duration_seconds: i32,
	) -> BoxFuture<'a, Result<CloudCredentials, RoleAssumptionError>>;
}

/// Informational record of a session shortened by the role's maximum.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DurationDowngrade {
	/// Duration the caller asked for.
	pub requested_seconds: i32,
	/// Duration the credentials were issued with.
	pub granted_seconds: i32,
	/// Provider message explaining the first rejection.
	pub reason: String,
}

/// Successful exchange.
#[derive(Clone, Debug)]
pub struct Exchange {
	/// Credentials from whichever attempt succeeded.
	pub credentials: CloudCredentials,
	/// Set when the first attempt was rejected for its duration.
	pub downgrade: Option<DurationDowngrade>,
}

/// Exchanges verified assertions for credentials, negotiating the session duration.
#[derive(Clone, Copy)]
pub struct CredentialExchanger<'a> {
	assumer: &'a dyn RoleAssumer,
	fallback_duration_seconds: i32,
}
impl<'a> CredentialExchanger<'a> {
	/// Wraps `assumer`; `fallback_duration_seconds` is used for the single retry.
	pub fn new(assumer: &'a dyn RoleAssumer, fallback_duration_seconds: i32) -> Self {
		Self { assumer, fallback_duration_seconds }
	}

	/// Spends `assertion` on at most two role-assumption attempts.
	pub async fn assume_role(
		&self,
		binding: &RoleBinding,
		assertion: VerifiedAssertion,
		duration_seconds: i32,
	) -> Result<Exchange, RoleAssumptionError> {
		let assertion = assertion.into_payload();

		match self.assumer.assume_role(binding, &assertion, duration_seconds).await {
			Ok(credentials) => Ok(Exchange { credentials, downgrade: None }),
			Err(RoleAssumptionError::DurationExceeded { message, .. }) => {
				let granted_seconds = self.fallback_duration_seconds;

				tracing::warn!(
					requested_seconds = duration_seconds,
					granted_seconds,
					"Requested session duration exceeds the role maximum, retrying with the fallback duration."
				);

				let credentials =
					self.assumer.assume_role(binding, &assertion, granted_seconds).await?;

				Ok(Exchange {
					credentials,
					downgrade: Some(DurationDowngrade {
						requested_seconds: duration_seconds,
						granted_seconds,
						reason: message,
					}),
				})
			},
			Err(e) => Err(e),
		}
	}
}
impl Debug for CredentialExchanger<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialExchanger")
			.field("fallback_duration_seconds", &self.fallback_duration_seconds)
			.finish_non_exhaustive()
	}
}

/// Classifies a structured STS rejection.
pub fn classify_rejection(
	code: Option<&str>,
	message: &str,
	duration_seconds: i32,
) -> RoleAssumptionError {
	if code == Some(VALIDATION_ERROR_CODE) && message.contains("DurationSeconds") {
		return RoleAssumptionError::DurationExceeded {
			duration_seconds,
			message: message.to_owned(),
		};
	}

	RoleAssumptionError::Rejected { code: code.map(str::to_owned), message: message.to_owned() }
}
