//! Credential acquisition: the orchestrated path from client credentials to STS keys.
//!
//! [`Broker::acquire_credentials`] runs the stages strictly in order and stops at the first
//! failure, returning it as a [`FlowError`] tagged with the stage. Only two repetitions
//! exist: the push-poll loop inside MFA verification and the single duration fallback inside
//! the credential exchange.

// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	error::{ConfigError, FlowError},
	flows::{Broker, MfaVerifier, device, run_stage},
	idp::{AssertionRequest, AssertionResponse},
	obs::Stage,
	saml::{self, RoleBinding, VerifiedAssertion},
	sts::{CloudCredentials, CredentialExchanger, Exchange},
	terminal,
};

/// Prompt used when the username is not configured.
pub const USERNAME_PROMPT: &str = "OneLogin username";
/// Prompt used for the password.
pub const PASSWORD_PROMPT: &str = "OneLogin password";

impl Broker {
	/// Runs the whole flow and returns the credentials.
	pub async fn acquire_credentials(&self) -> Result<CloudCredentials, FlowError> {
		Ok(self.exchange_credentials().await?.credentials)
	}

	/// Runs the whole flow and returns the credentials with any duration downgrade notice.
	pub async fn exchange_credentials(&self) -> Result<Exchange, FlowError> {
		let token = run_stage(Stage::AccessToken, self.access_token()).await?;
		let response = run_stage(Stage::SamlAssertion, self.assertion(&token)).await?;
		let assertion = match response {
			AssertionResponse::Assertion(assertion) => {
				tracing::info!("No MFA challenge issued, using the assertion directly.");

				VerifiedAssertion::new(assertion)
			},
			AssertionResponse::MfaRequired(challenge) => {
				let device = run_stage(Stage::DeviceSelection, async {
					device::select_device(self.terminal.as_ref(), &challenge.devices)
				})
				.await?;
				let mut verifier = MfaVerifier::new(
					self.identity_provider.as_ref(),
					self.terminal.as_ref(),
					self.clock.as_ref(),
					&self.flow.push,
					&self.app.id,
				);

				run_stage(
					Stage::MfaVerification,
					verifier.verify(&token, &challenge.state_token, &device),
				)
				.await?
			},
		};

		drop(token);

		let binding = run_stage(Stage::RoleRouting, async { self.route(&assertion) }).await?;

		tracing::info!(role_arn = %binding.role_arn, "Assuming role.");

		run_stage(Stage::RoleAssumption, async {
			let _busy = terminal::busy(self.terminal.as_ref());

			CredentialExchanger::new(self.role_assumer.as_ref(), self.flow.fallback_duration_seconds)
				.assume_role(&binding, assertion, self.flow.duration_seconds)
				.await
		})
		.await
	}

	async fn access_token(&self) -> Result<AccessToken> {
		let _busy = terminal::busy(self.terminal.as_ref());

		self.identity_provider
			.acquire_token(&self.provider.client_id, &self.provider.client_secret)
			.await
	}

	async fn assertion(&self, token: &AccessToken) -> Result<AssertionResponse> {
		let request = self.assertion_request()?;
		let _busy = terminal::busy(self.terminal.as_ref());

		self.identity_provider.request_assertion(token, request).await
	}

	fn assertion_request(&self) -> Result<AssertionRequest> {
		let username = match &self.provider.username {
			Some(username) => username.clone(),
			None => self.terminal.read_line(USERNAME_PROMPT)?,
		};

		if username.trim().is_empty() {
			return Err(ConfigError::MissingField { field: "username" }.into());
		}

		let password = self.terminal.read_secret(PASSWORD_PROMPT)?;

		Ok(AssertionRequest {
			username,
			password,
			app_id: self.app.id.clone(),
			subdomain: self.provider.subdomain.clone(),
		})
	}

	fn route(&self, assertion: &VerifiedAssertion) -> Result<RoleBinding> {
		let mut bindings = saml::extract_role_bindings(assertion.payload())?;

		if bindings.len() == 1 {
			return Ok(bindings.remove(0));
		}
		if let Some(preferred) = &self.app.preferred_role_arn {
			return bindings
				.into_iter()
				.find(|binding| &binding.role_arn == preferred)
				.ok_or_else(|| ConfigError::RoleNotGranted { role_arn: preferred.clone() }.into());
		}

		let labels: Vec<String> = bindings.iter().map(|binding| binding.role_arn.clone()).collect();
		let index = device::choose_index(self.terminal.as_ref(), "Choose a role", &labels)?;

		Ok(bindings.swap_remove(index))
	}
}
