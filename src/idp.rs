//! Identity-provider session: access token, SAML assertion request, and factor verification.
//!
//! [`IdentityProvider`] is the seam the flow drives; [`OneLoginClient`] speaks the OneLogin
//! v1 assertion API over HTTPS. Requests and responses are expressed in domain types here and
//! translated to the wire shape inside the client.

pub mod onelogin;

mod wire;

pub use onelogin::*;

// self
use crate::{
	_prelude::*,
	BoxFuture,
	auth::{AccessToken, AppId, DeviceId, Secret, Subdomain},
	saml::SamlAssertion,
};

/// Identity-provider capability consumed by the flow orchestrator.
pub trait IdentityProvider: Send + Sync {
	/// Exchanges API client credentials for a bearer access token.
	fn acquire_token<'a>(
		&'a self,
		client_id: &'a str,
		client_secret: &'a Secret,
	) -> BoxFuture<'a, Result<AccessToken>>;

	/// Submits the user's credentials. The request (and its password) is consumed.
	fn request_assertion<'a>(
		&'a self,
		token: &'a AccessToken,
		request: AssertionRequest,
	) -> BoxFuture<'a, Result<AssertionResponse>>;

	/// Verifies one MFA factor, or polls a pending push when `do_not_notify` is set.
	fn verify_factor<'a>(
		&'a self,
		token: &'a AccessToken,
		request: VerifyFactorRequest<'a>,
	) -> BoxFuture<'a, Result<VerifyFactorResponse>>;
}

/// User credentials submitted for one application.
#[derive(Debug)]
pub struct AssertionRequest {
	/// Username or email address.
	pub username: String,
	/// Password; wiped once the request is dropped.
	pub password: Secret,
	/// Target application.
	pub app_id: AppId,
	/// Account subdomain.
	pub subdomain: Subdomain,
}

/// Outcome of an assertion request.
#[derive(Debug)]
pub enum AssertionResponse {
	/// MFA is required before an assertion is released.
	MfaRequired(MfaChallenge),
	/// The user has no MFA enrolled and the assertion was issued directly.
	Assertion(SamlAssertion),
}

/// Pending MFA challenge.
#[derive(Clone, Debug)]
pub struct MfaChallenge {
	/// Opaque token tying verify calls to this challenge.
	pub state_token: StateToken,
	/// Devices enrolled for the user, in provider order.
	pub devices: Vec<Device>,
}

/// Opaque MFA challenge token.
#[derive(Clone, PartialEq, Eq)]
pub struct StateToken(Secret);
impl StateToken {
	/// Wraps a provider-issued token.
	pub fn new(value: impl Into<String>) -> Self {
		Self(Secret::new(value))
	}

	/// Returns the raw token.
	pub fn expose(&self) -> &str {
		self.0.expose()
	}
}
impl Debug for StateToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("StateToken(<redacted>)")
	}
}

/// Enrolled MFA device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Device {
	/// Provider-assigned device identifier.
	pub id: DeviceId,
	/// Device type, e.g. `OneLogin Protect` or `Google Authenticator`.
	pub device_type: String,
}
impl Device {
	/// Creates a device entry.
	pub fn new(id: impl Into<DeviceId>, device_type: impl Into<String>) -> Self {
		Self { id: id.into(), device_type: device_type.into() }
	}

	/// Label shown in the device menu.
	pub fn label(&self) -> String {
		format!("{} - {}", self.id, self.device_type)
	}
}

/// One verify-factor call.
#[derive(Clone, Copy, Debug)]
pub struct VerifyFactorRequest<'a> {
	/// Target application.
	pub app_id: &'a AppId,
	/// Device answering the challenge.
	pub device_id: &'a DeviceId,
	/// Challenge token.
	pub state_token: &'a StateToken,
	/// One-time code, when verifying by OTP.
	pub otp_token: Option<&'a Secret>,
	/// `false` sends a push notification; `true` only polls its status.
	pub do_not_notify: bool,
}

/// Verification status reported by the identity provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MfaStatus {
	/// Push sent and not answered yet.
	Pending,
	/// Factor accepted; the response carries the assertion.
	Accepted,
	/// Factor refused.
	Rejected,
}

/// Result of one verify-factor call.
#[derive(Clone, Debug)]
pub struct VerifyFactorResponse {
	/// Verification status.
	pub status: MfaStatus,
	/// Provider-supplied message, suitable for display.
	pub message: String,
	/// Assertion released by an accepted factor.
	pub assertion: Option<SamlAssertion>,
}
impl VerifyFactorResponse {
	/// Pending push.
	pub fn pending(message: impl Into<String>) -> Self {
		Self { status: MfaStatus::Pending, message: message.into(), assertion: None }
	}

	/// Accepted factor carrying `assertion`.
	pub fn accepted(message: impl Into<String>, assertion: SamlAssertion) -> Self {
		Self { status: MfaStatus::Accepted, message: message.into(), assertion: Some(assertion) }
	}

	/// Refused factor.
	pub fn rejected(message: impl Into<String>) -> Self {
		Self { status: MfaStatus::Rejected, message: message.into(), assertion: None }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn device_label_and_redaction() {
		let device = Device::new(1234_u64, "OneLogin Protect");

		assert_eq!(device.label(), "1234 - OneLogin Protect");
		assert_eq!(format!("{:?}", StateToken::new("st-1")), "StateToken(<redacted>)");
	}
}
