//! End-to-end credential flow powered by the broker facade.

pub mod device;
pub mod mfa;

mod credentials;

pub use credentials::*;
pub use device::*;
pub use mfa::*;

// self
use crate::{
	_prelude::*,
	clock::{Clock, SystemClock},
	config::{AppConfig, FlowConfig, ProviderConfig},
	error::FlowError,
	idp::{IdentityProvider, OneLoginClient},
	obs::{self, Stage, StageOutcome, StageSpan},
	sts::RoleAssumer,
	terminal::Terminal,
};

/// Sequences the identity session, device selection, MFA, role routing, and the credential
/// exchange for one provider/app pair.
///
/// Collaborators sit behind trait objects so the same broker drives the real OneLogin and
/// STS endpoints from the binary and scripted fakes under test. Nothing is cached between
/// calls: every [`Broker::acquire_credentials`] owns its token, challenge, and device choice.
#[derive(Clone)]
pub struct Broker {
	/// Identity-provider account settings.
	pub provider: ProviderConfig,
	/// Target application.
	pub app: AppConfig,
	/// Session duration and MFA policy.
	pub flow: FlowConfig,
	/// Identity-provider session used for token, assertion, and verify calls.
	pub identity_provider: Arc<dyn IdentityProvider>,
	/// Cloud role-assumption endpoint.
	pub role_assumer: Arc<dyn RoleAssumer>,
	/// Prompt and busy-indicator capability.
	pub terminal: Arc<dyn Terminal>,
	/// Time source for the push budget.
	pub clock: Arc<dyn Clock>,
}
impl Broker {
	/// Creates a broker from explicit collaborators, using the wall clock.
	pub fn new(
		provider: ProviderConfig,
		app: AppConfig,
		flow: FlowConfig,
		identity_provider: Arc<dyn IdentityProvider>,
		role_assumer: Arc<dyn RoleAssumer>,
		terminal: Arc<dyn Terminal>,
	) -> Self {
		Self {
			provider,
			app,
			flow,
			identity_provider,
			role_assumer,
			terminal,
			clock: Arc::new(SystemClock),
		}
	}

	/// Creates a broker that talks to OneLogin over the default HTTP stack.
	pub fn onelogin(
		provider: ProviderConfig,
		app: AppConfig,
		flow: FlowConfig,
		role_assumer: Arc<dyn RoleAssumer>,
		terminal: Arc<dyn Terminal>,
	) -> Result<Self> {
		let identity_provider = Arc::new(OneLoginClient::from_config(&provider)?);

		Ok(Self::new(provider, app, flow, identity_provider, role_assumer, terminal))
	}

	/// Replaces the clock.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}
}
impl Debug for Broker {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("provider", &self.provider)
			.field("app", &self.app)
			.field("flow", &self.flow)
			.finish_non_exhaustive()
	}
}

/// Runs one stage under its span, recording attempt/success/failure and tagging errors with
/// the stage.
async fn run_stage<T, E, Fut>(stage: Stage, fut: Fut) -> Result<T, FlowError>
where
	Fut: Future<Output = Result<T, E>>,
	E: Into<Error>,
{
	let span = StageSpan::new(stage);

	obs::record_stage_outcome(stage, StageOutcome::Attempt);

	let result = span.instrument(fut).await.map_err(|e| FlowError::new(stage, e));

	match &result {
		Ok(_) => obs::record_stage_outcome(stage, StageOutcome::Success),
		Err(e) => {
			tracing::debug!(stage = stage.as_str(), error = %e.source, "Stage failed.");

			obs::record_stage_outcome(stage, StageOutcome::Failure);
		},
	}

	result
}
