// crates.io
use aws_sdk_sts::{
	Client,
	config::{BehaviorVersion, Region},
	error::{ProvideErrorMetadata, SdkError},
	operation::assume_role_with_saml::AssumeRoleWithSAMLError,
};
// self
use crate::{
	_prelude::*,
	BoxFuture,
	auth::Secret,
	error::RoleAssumptionError,
	saml::{RoleBinding, SamlAssertion},
	sts::{CloudCredentials, RoleAssumer, classify_rejection},
};

/// Region used when the caller does not pick one.
pub const DEFAULT_STS_REGION: &str = "us-east-1";

/// [`RoleAssumer`] backed by AWS STS `AssumeRoleWithSAML`.
///
/// The call is authorized by the SAML assertion itself, so the client is built without a
/// credentials provider and never reads local AWS profiles.
#[derive(Clone, Debug)]
pub struct StsRoleAssumer {
	client: Client,
}
impl StsRoleAssumer {
	/// Builds a client for `region`, optionally pointed at a custom endpoint.
	pub fn new(region: impl Into<String>, endpoint: Option<&Url>) -> Self {
		let mut builder = aws_sdk_sts::Config::builder()
			.behavior_version(BehaviorVersion::latest())
			.region(Region::new(region.into()));

		if let Some(endpoint) = endpoint {
			builder = builder.endpoint_url(endpoint.as_str());
		}

		Self { client: Client::from_conf(builder.build()) }
	}

	/// Wraps a preconfigured SDK client.
	pub fn with_client(client: Client) -> Self {
		Self { client }
	}
}
impl Default for StsRoleAssumer {
	fn default() -> Self {
		Self::new(DEFAULT_STS_REGION, None)
	}
}
impl RoleAssumer for StsRoleAssumer {
	fn assume_role<'a>(
		&'a self,
		binding: &'a RoleBinding,
		assertion: &'a SamlAssertion,
		duration_seconds: i32,
	) -> BoxFuture<'a, Result<CloudCredentials, RoleAssumptionError>> {
		Box::pin(async move {
			tracing::debug!(
				role_arn = %binding.role_arn,
				principal_arn = %binding.identity_provider_arn,
				duration_seconds,
				"Calling AssumeRoleWithSAML."
			);

			let output = self
				.client
				.assume_role_with_saml()
				.role_arn(&binding.role_arn)
				.principal_arn(&binding.identity_provider_arn)
				.saml_assertion(assertion.as_str())
				.duration_seconds(duration_seconds)
				.send()
				.await
				.map_err(|e| map_sdk_error(e, duration_seconds))?;
			let credentials = output.credentials().ok_or(RoleAssumptionError::MissingCredentials)?;
			let seconds = credentials.expiration().secs();
			let expiration = OffsetDateTime::from_unix_timestamp(seconds)
				.map_err(|_| RoleAssumptionError::InvalidExpiration { seconds })?;

			Ok(CloudCredentials {
				access_key_id: credentials.access_key_id().to_owned(),
				secret_access_key: Secret::new(credentials.secret_access_key()),
				session_token: Secret::new(credentials.session_token()),
				expiration,
			})
		})
	}
}

fn map_sdk_error<R>(
	err: SdkError<AssumeRoleWithSAMLError, R>,
	duration_seconds: i32,
) -> RoleAssumptionError
where
	R: 'static + Debug + Send + Sync,
{
	match err {
		SdkError::ServiceError(context) => {
			let err = context.into_err();

			classify_rejection(err.code(), err.message().unwrap_or_default(), duration_seconds)
		},
		other => RoleAssumptionError::transport(other),
	}
}
