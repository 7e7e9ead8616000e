//! MFA verification as an explicit state machine.
//!
//! ```text
//! Unstarted -> AwaitingChallenge -> PushPending --accepted--> Accepted
//!                     |                 |------rejected--> Rejected
//!                     |                 `--budget spent--> TimedOut -> OtpPending
//!                     `--no push support------------------------------> OtpPending
//! OtpPending --accepted--> Accepted
//!            `--anything else--> Rejected
//! ```
//!
//! Push polling reads time only through [`Clock`], so the budget and the OTP fallback run
//! under test without waiting.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, AppId, Secret},
	clock::Clock,
	config::PushPolicy,
	error::{MfaError, ProtocolError},
	idp::{Device, IdentityProvider, MfaStatus, StateToken, VerifyFactorRequest, VerifyFactorResponse},
	saml::VerifiedAssertion,
	terminal::{self, Terminal},
};

/// Prompt shown when a one-time code is needed.
pub const OTP_PROMPT: &str = "Please enter the OTP from your MFA device";

/// Position of one challenge in the verification state machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MfaState {
	/// Nothing sent yet.
	Unstarted,
	/// Challenge and device known, no factor attempted.
	AwaitingChallenge,
	/// Push sent; polling until `deadline`.
	PushPending {
		/// Instant the push budget runs out.
		deadline: OffsetDateTime,
	},
	/// Waiting for a one-time code.
	OtpPending,
	/// Factor accepted (terminal).
	Accepted,
	/// Factor refused (terminal).
	Rejected,
	/// Push budget spent while pending; falls back to [`MfaState::OtpPending`].
	TimedOut,
}
impl MfaState {
	/// Returns `true` for states that end verification.
	pub fn is_terminal(&self) -> bool {
		matches!(self, Self::Accepted | Self::Rejected)
	}
}

/// Drives one MFA challenge to a verified assertion.
pub struct MfaVerifier<'a> {
	identity_provider: &'a dyn IdentityProvider,
	terminal: &'a dyn Terminal,
	clock: &'a dyn Clock,
	policy: &'a PushPolicy,
	app_id: &'a AppId,
	history: Vec<MfaState>,
}
impl<'a> MfaVerifier<'a> {
	/// Creates a verifier in [`MfaState::Unstarted`].
	pub fn new(
		identity_provider: &'a dyn IdentityProvider,
		terminal: &'a dyn Terminal,
		clock: &'a dyn Clock,
		policy: &'a PushPolicy,
		app_id: &'a AppId,
	) -> Self {
		Self {
			identity_provider,
			terminal,
			clock,
			policy,
			app_id,
			history: vec![MfaState::Unstarted],
		}
	}

	/// Current state.
	pub fn state(&self) -> &MfaState {
		self.history.last().unwrap_or(&MfaState::Unstarted)
	}

	/// Every state visited so far, oldest first.
	pub fn history(&self) -> &[MfaState] {
		&self.history
	}

	/// Verifies `device` against the challenge identified by `state_token`.
	///
	/// Push-capable devices get a push first; a push still pending when the budget runs out
	/// falls back to a single OTP attempt. Transport and protocol errors abort at once.
	pub async fn verify(
		&mut self,
		token: &AccessToken,
		state_token: &StateToken,
		device: &Device,
	) -> Result<VerifiedAssertion> {
		self.transition(MfaState::AwaitingChallenge);

		let pushed = if self.policy.supports(&device.device_type) {
			self.push(token, state_token, device).await?
		} else {
			None
		};

		match pushed {
			Some(assertion) => Ok(assertion),
			None => self.otp(token, state_token, device).await,
		}
	}

	async fn push(
		&mut self,
		token: &AccessToken,
		state_token: &StateToken,
		device: &Device,
	) -> Result<Option<VerifiedAssertion>> {
		let identity_provider = self.identity_provider;
		let clock = self.clock;
		let deadline = clock.now() + self.policy.timeout;
		let mut request = VerifyFactorRequest {
			app_id: self.app_id,
			device_id: &device.id,
			state_token,
			otp_token: None,
			do_not_notify: false,
		};

		self.transition(MfaState::PushPending { deadline });

		let mut response = {
			let _busy = terminal::busy(self.terminal);

			identity_provider.verify_factor(token, request).await?
		};

		tracing::info!(device = %device.label(), "{}", response.message);

		request.do_not_notify = true;

		{
			let _busy = terminal::busy(self.terminal);

			while response.status == MfaStatus::Pending && clock.now() < deadline {
				clock.sleep(self.policy.interval).await;

				response = identity_provider.verify_factor(token, request).await?;
			}
		}

		match response.status {
			MfaStatus::Pending => {
				self.transition(MfaState::TimedOut);

				tracing::warn!(
					timeout_seconds = self.policy.timeout.whole_seconds(),
					"Push verification timed out, falling back to manual OTP entry."
				);

				Ok(None)
			},
			MfaStatus::Accepted => self.accept(response).map(Some),
			MfaStatus::Rejected => Err(self.reject("push", response)),
		}
	}

	async fn otp(
		&mut self,
		token: &AccessToken,
		state_token: &StateToken,
		device: &Device,
	) -> Result<VerifiedAssertion> {
		self.transition(MfaState::OtpPending);

		let otp = Secret::new(self.terminal.read_line(OTP_PROMPT)?);
		let request = VerifyFactorRequest {
			app_id: self.app_id,
			device_id: &device.id,
			state_token,
			otp_token: Some(&otp),
			do_not_notify: false,
		};
		let response = {
			let _busy = terminal::busy(self.terminal);

			self.identity_provider.verify_factor(token, request).await?
		};

		match response.status {
			MfaStatus::Accepted => self.accept(response),
			MfaStatus::Pending | MfaStatus::Rejected => Err(self.reject("otp", response)),
		}
	}

	fn accept(&mut self, response: VerifyFactorResponse) -> Result<VerifiedAssertion> {
		let assertion = response.assertion.ok_or(ProtocolError::MissingAssertion)?;

		self.transition(MfaState::Accepted);

		Ok(VerifiedAssertion::new(assertion))
	}

	fn reject(&mut self, factor: &'static str, response: VerifyFactorResponse) -> Error {
		self.transition(MfaState::Rejected);

		MfaError::Rejected { factor, message: response.message }.into()
	}

	fn transition(&mut self, next: MfaState) {
		tracing::debug!(from = ?self.state(), to = ?next, "MFA state transition.");

		self.history.push(next);
	}
}
impl Debug for MfaVerifier<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MfaVerifier")
			.field("state", self.state())
			.field("policy", self.policy)
			.finish_non_exhaustive()
	}
}
