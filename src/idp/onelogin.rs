//! OneLogin implementation of [`IdentityProvider`].

// crates.io
use reqwest::{StatusCode, header::AUTHORIZATION};
// self
use super::wire::{
	AssertionData, Envelope, SamlAssertionBody, VerifyFactorBody, decode, status_message,
};
use crate::{
	_prelude::*,
	BoxFuture,
	auth::{AccessToken, Secret},
	config::{ProviderConfig, ProviderEndpoints},
	error::{AuthError, MfaError, ProtocolError, TransportError},
	http::ReqwestHttpClient,
	idp::{
		AssertionRequest, AssertionResponse, Device, IdentityProvider, MfaChallenge, StateToken,
		VerifyFactorRequest, VerifyFactorResponse,
	},
	oauth::ClientCredentialsFacade,
	saml::SamlAssertion,
};

/// HTTP client for the OneLogin token and SAML assertion endpoints.
#[derive(Clone, Debug)]
pub struct OneLoginClient {
	endpoints: ProviderEndpoints,
	http_client: ReqwestHttpClient,
}
impl OneLoginClient {
	/// Creates a client for `endpoints` using the shared HTTP client.
	pub fn new(endpoints: ProviderEndpoints, http_client: ReqwestHttpClient) -> Self {
		Self { endpoints, http_client }
	}

	/// Creates a client with the default HTTP stack for `config`.
	pub fn from_config(config: &ProviderConfig) -> Result<Self> {
		Ok(Self::new(config.endpoints.clone(), ReqwestHttpClient::new()?))
	}

	/// Resolved endpoints.
	pub fn endpoints(&self) -> &ProviderEndpoints {
		&self.endpoints
	}

	async fn post_json<B>(
		&self,
		url: &Url,
		token: &AccessToken,
		body: &B,
	) -> Result<(StatusCode, Vec<u8>), TransportError>
	where
		B: Serialize + Sync,
	{
		let response = self
			.http_client
			.post(url.clone())
			.header(AUTHORIZATION, token.authorization())
			.json(body)
			.send()
			.await?;
		let status = response.status();
		let body = response.bytes().await?.to_vec();

		tracing::debug!(endpoint = url.path(), status = status.as_u16(), "Identity provider answered.");

		Ok((status, body))
	}

	async fn assertion(
		&self,
		token: &AccessToken,
		request: AssertionRequest,
	) -> Result<AssertionResponse> {
		let body = SamlAssertionBody {
			username_or_email: &request.username,
			password: request.password.expose(),
			app_id: &request.app_id,
			subdomain: &request.subdomain,
		};
		let (status, bytes) = self
			.post_json(&self.endpoints.saml_assertion, token, &body)
			.await
			.map_err(AuthError::from)?;
		let code = status.as_u16();

		drop(request);

		if status.is_client_error() {
			return Err(AuthError::InvalidCredentials {
				reason: status_message(&bytes),
				status: Some(code),
			}
			.into());
		}
		if !status.is_success() {
			return Err(ProtocolError::Unexpected {
				message: status_message(&bytes),
				status: Some(code),
			}
			.into());
		}

		let envelope: Envelope<AssertionData> = decode(&bytes, code)?;

		if envelope.status.error {
			return Err(AuthError::InvalidCredentials {
				reason: envelope.status.message,
				status: Some(code),
			}
			.into());
		}

		match envelope.data {
			Some(AssertionData::Assertion(payload)) =>
				Ok(AssertionResponse::Assertion(SamlAssertion::new(payload))),
			Some(AssertionData::Challenges(challenges)) => {
				let challenge = challenges.into_iter().next().ok_or_else(|| {
					ProtocolError::Unexpected {
						message: "MFA challenge list is empty".into(),
						status: Some(code),
					}
				})?;

				Ok(AssertionResponse::MfaRequired(MfaChallenge {
					state_token: StateToken::new(challenge.state_token),
					devices: challenge
						.devices
						.into_iter()
						.map(|device| Device::new(device.device_id, device.device_type))
						.collect(),
				}))
			},
			None => Err(ProtocolError::Unexpected {
				message: "assertion response carries no data".into(),
				status: Some(code),
			}
			.into()),
		}
	}

	async fn verify(
		&self,
		token: &AccessToken,
		request: VerifyFactorRequest<'_>,
	) -> Result<VerifyFactorResponse> {
		let body = VerifyFactorBody {
			app_id: request.app_id,
			device_id: request.device_id,
			state_token: request.state_token.expose(),
			otp_token: request.otp_token.map(Secret::expose).unwrap_or_default(),
			do_not_notify: request.do_not_notify,
		};
		let (status, bytes) = self
			.post_json(&self.endpoints.verify_factor, token, &body)
			.await
			.map_err(MfaError::from)?;
		let code = status.as_u16();

		// A refused factor comes back as 401 with the usual status envelope.
		if status.is_client_error() {
			return Ok(VerifyFactorResponse::rejected(status_message(&bytes)));
		}
		if !status.is_success() {
			return Err(ProtocolError::Unexpected {
				message: status_message(&bytes),
				status: Some(code),
			}
			.into());
		}

		let Envelope { status, data } = decode::<Envelope<String>>(&bytes, code)?;

		if status.error {
			return Ok(VerifyFactorResponse::rejected(status.message));
		}
		if status.is("pending") {
			return Ok(VerifyFactorResponse::pending(status.message));
		}
		if status.is("success") {
			let assertion = data.ok_or(ProtocolError::MissingAssertion)?;

			return Ok(VerifyFactorResponse::accepted(status.message, SamlAssertion::new(assertion)));
		}

		Ok(VerifyFactorResponse::rejected(status.message))
	}
}
impl IdentityProvider for OneLoginClient {
	fn acquire_token<'a>(
		&'a self,
		client_id: &'a str,
		client_secret: &'a Secret,
	) -> BoxFuture<'a, Result<AccessToken>> {
		Box::pin(async move {
			let facade = ClientCredentialsFacade::new(
				&self.endpoints.token,
				client_id,
				client_secret,
				self.http_client.clone(),
			)?;

			facade.exchange().await
		})
	}

	fn request_assertion<'a>(
		&'a self,
		token: &'a AccessToken,
		request: AssertionRequest,
	) -> BoxFuture<'a, Result<AssertionResponse>> {
		Box::pin(self.assertion(token, request))
	}

	fn verify_factor<'a>(
		&'a self,
		token: &'a AccessToken,
		request: VerifyFactorRequest<'a>,
	) -> BoxFuture<'a, Result<VerifyFactorResponse>> {
		Box::pin(self.verify(token, request))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn client_uses_configured_endpoints() {
		let config = ProviderConfig::builder("eu")
			.subdomain("acme")
			.client_id("client")
			.client_secret("secret")
			.build()
			.expect("Provider config should build.");
		let client = OneLoginClient::from_config(&config).expect("Client should build.");

		assert_eq!(
			client.endpoints().saml_assertion.as_str(),
			"https://api.eu.onelogin.com/api/1/saml_assertion"
		);
	}
}
