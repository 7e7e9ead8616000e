//! Observability helpers for the credential flow.
//!
//! # Feature Flags
//!
//! - Spans named `onelogin_sts.flow` carry the `stage` field for every step of the flow.
//! - Enable `metrics` to increment the `onelogin_sts_stage_total` counter for every
//!   attempt/success/failure, labeled by `stage` + `outcome`.

mod metrics;
mod tracing;

pub use self::{metrics::*, tracing::*};

// self
use crate::_prelude::*;

/// Steps of the credential flow, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
	/// Client-credentials access token.
	AccessToken,
	/// Username/password exchange for an assertion or MFA challenge.
	SamlAssertion,
	/// Picking the MFA device.
	DeviceSelection,
	/// Push/OTP verification.
	MfaVerification,
	/// Extracting the role binding from the verified assertion.
	RoleRouting,
	/// STS exchange.
	RoleAssumption,
}
impl Stage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Stage::AccessToken => "access_token",
			Stage::SamlAssertion => "saml_assertion",
			Stage::DeviceSelection => "device_selection",
			Stage::MfaVerification => "mfa_verification",
			Stage::RoleRouting => "role_routing",
			Stage::RoleAssumption => "role_assumption",
		}
	}
}
impl Display for Stage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageOutcome {
	/// Entry to a stage.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl StageOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StageOutcome::Attempt => "attempt",
			StageOutcome::Success => "success",
			StageOutcome::Failure => "failure",
		}
	}
}
impl Display for StageOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
