//! Client-credentials exchange built on the `oauth2` crate.

pub use oauth2;

// crates.io
use oauth2::{
	ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError, RequestTokenError,
	TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, Secret},
	error::{AuthError, ConfigError, ProtocolError, TransportError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot, body_preview},
};

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Client-credentials grant against the identity provider's token endpoint.
///
/// The client authenticates with HTTP Basic, which is what the OneLogin v2 token endpoint
/// expects for API credentials.
pub struct ClientCredentialsFacade {
	oauth_client: ConfiguredBasicClient,
	http_client: ReqwestHttpClient,
	token_url: Url,
}
impl ClientCredentialsFacade {
	/// Configures the facade for `token_url`.
	pub fn new(
		token_url: &Url,
		client_id: &str,
		client_secret: &Secret,
		http_client: ReqwestHttpClient,
	) -> Result<Self> {
		let token_uri = TokenUrl::new(token_url.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "token", source })?;
		let oauth_client = BasicClient::new(ClientId::new(client_id.to_owned()))
			.set_client_secret(ClientSecret::new(client_secret.expose().to_owned()))
			.set_token_uri(token_uri);

		Ok(Self { oauth_client, http_client, token_url: token_url.clone() })
	}

	/// Performs the `client_credentials` grant.
	pub async fn exchange(&self) -> Result<AccessToken> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.instrumented(meta.clone());
		let response = self
			.oauth_client
			.exchange_client_credentials()
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;

		map_token_response(response)
	}
}
impl Debug for ClientCredentialsFacade {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientCredentialsFacade")
			.field("token_url", &self.token_url.as_str())
			.finish()
	}
}

fn map_token_response(response: BasicTokenResponse) -> Result<AccessToken> {
	let expires_in = response.expires_in().ok_or(ProtocolError::MissingExpiresIn)?.as_secs();
	let expires_in = i64::try_from(expires_in).map_err(|_| ProtocolError::ExpiresInOutOfRange)?;

	if expires_in <= 0 {
		return Err(ProtocolError::NonPositiveExpiresIn.into());
	}

	Ok(AccessToken::new(
		response.access_token().secret().to_owned(),
		OffsetDateTime::now_utc(),
		Duration::seconds(expires_in),
	))
}

fn map_request_error(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> Error {
	let status = meta.and_then(|value| value.status);

	match err {
		RequestTokenError::ServerResponse(response) => map_server_response_error(response, status),
		RequestTokenError::Request(error) => map_transport_error(error, status),
		// Non-OAuth error bodies (the provider's own status envelope) land here too.
		RequestTokenError::Parse(source, body) => match status {
			Some(code) if is_client_rejection(code) => AuthError::InvalidClient {
				reason: body_preview(&body),
				status,
			}
			.into(),
			_ => ProtocolError::Json { source, status }.into(),
		},
		RequestTokenError::Other(message) =>
			ProtocolError::Unexpected { message, status }.into(),
	}
}

fn map_server_response_error(response: BasicErrorResponse, status: Option<u16>) -> Error {
	let reason = match response.error_description() {
		Some(description) => description.clone(),
		None => response.error().as_ref().to_owned(),
	};

	match status {
		Some(code) if code >= 500 => ProtocolError::Unexpected { message: reason, status }.into(),
		_ => AuthError::InvalidClient { reason, status }.into(),
	}
}

fn map_transport_error(err: HttpClientError<ReqwestError>, status: Option<u16>) -> Error {
	match err {
		HttpClientError::Reqwest(inner) => {
			if inner.is_builder() {
				return ConfigError::from(*inner).into();
			}

			AuthError::from(TransportError::from(*inner)).into()
		},
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => AuthError::from(TransportError::Io(inner)).into(),
		HttpClientError::Other(message) => ProtocolError::Unexpected {
			message: format!("HTTP client error occurred while calling the token endpoint: {message}"),
			status,
		}
		.into(),
		_ => ProtocolError::Unexpected {
			message: "HTTP client error occurred while calling the token endpoint".into(),
			status,
		}
		.into(),
	}
}

fn is_client_rejection(status: u16) -> bool {
	matches!(status, 400 | 401 | 403)
}
