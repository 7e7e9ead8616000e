#![allow(dead_code)]

// std
use std::{collections::VecDeque, sync::Arc};
// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use httpmock::{Mock, prelude::*};
use parking_lot::Mutex;
use time::{Duration, OffsetDateTime};
// self
use onelogin_sts::{
	BoxFuture,
	auth::{AppId, Secret},
	config::{AppConfig, FlowConfig, ProviderConfig},
	error::RoleAssumptionError,
	flows::Broker,
	idp::OneLoginClient,
	saml::{ROLE_ATTRIBUTE, RoleBinding, SamlAssertion},
	sts::{CloudCredentials, RoleAssumer, VALIDATION_ERROR_CODE, classify_rejection},
	terminal::ScriptedTerminal,
	url::Url,
};

pub const CLIENT_ID: &str = "api-client";
pub const CLIENT_SECRET: &str = "api-secret";
pub const ACCESS_TOKEN: &str = "ol-access-token";
pub const APP_ID: &str = "123456";
pub const PROVIDER_ARN: &str = "arn:aws:iam::111111111111:saml-provider/Idp";
pub const ROLE_ARN: &str = "arn:aws:iam::111111111111:role/MyRole";
pub const OTHER_ROLE_ARN: &str = "arn:aws:iam::111111111111:role/ReadOnly";

/// Base64 SAML response granting one role per `role_arns` entry through [`PROVIDER_ARN`].
pub fn assertion_payload(role_arns: &[&str]) -> String {
	let values: String = role_arns
		.iter()
		.map(|role| format!("<saml2:AttributeValue>{PROVIDER_ARN},{role}</saml2:AttributeValue>"))
		.collect();
	let xml = format!(
		"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
		 <saml2p:Response xmlns:saml2p=\"urn:oasis:names:tc:SAML:2.0:protocol\">\
		 <saml2:Assertion xmlns:saml2=\"urn:oasis:names:tc:SAML:2.0:assertion\">\
		 <saml2:AttributeStatement>\
		 <saml2:Attribute Name=\"{ROLE_ATTRIBUTE}\" NameFormat=\"urn:oasis:names:tc:SAML:2.0:attrname-format:uri\">\
		 {values}</saml2:Attribute>\
		 </saml2:AttributeStatement></saml2:Assertion></saml2p:Response>"
	);

	STANDARD.encode(xml)
}

pub fn provider_config(server: &MockServer, username: Option<&str>) -> ProviderConfig {
	let base = Url::parse(&server.base_url()).expect("Mock server base URL should parse.");
	let builder = ProviderConfig::builder("us")
		.subdomain("acme")
		.client_id(CLIENT_ID)
		.client_secret(CLIENT_SECRET)
		.api_base(base);
	let builder = match username {
		Some(username) => builder.username(username),
		None => builder,
	};

	builder.build().expect("Provider config should build against the mock server.")
}

pub fn app() -> AppConfig {
	AppConfig::new(AppId::new(APP_ID).expect("App fixture should be valid."))
}

pub fn client(server: &MockServer) -> OneLoginClient {
	OneLoginClient::from_config(&provider_config(server, None)).expect("Client should build.")
}

pub fn broker(
	server: &MockServer,
	app: AppConfig,
	flow: FlowConfig,
	assumer: Arc<ScriptedAssumer>,
	terminal: Arc<ScriptedTerminal>,
) -> Broker {
	Broker::onelogin(provider_config(server, Some("alice@example.com")), app, flow, assumer, terminal)
		.expect("Broker should build against the mock server.")
}

pub async fn mock_token(server: &MockServer) -> Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/oauth2/v2/token");
			then.status(200).header("content-type", "application/json").body(format!(
				"{{\"access_token\":\"{ACCESS_TOKEN}\",\"token_type\":\"bearer\",\"expires_in\":36000}}"
			));
		})
		.await
}

pub fn envelope(kind: &str, message: &str, data: &str) -> String {
	format!(
		"{{\"status\":{{\"error\":false,\"code\":200,\"type\":\"{kind}\",\"message\":\"{message}\"}},\"data\":{data}}}"
	)
}

pub fn challenge_body(devices: &[(u64, &str)]) -> String {
	let devices: Vec<String> = devices
		.iter()
		.map(|(id, kind)| format!("{{\"device_id\":{id},\"device_type\":\"{kind}\"}}"))
		.collect();
	let data = format!(
		"[{{\"state_token\":\"st-1\",\"devices\":[{}],\"callback_url\":\"https://api.us.onelogin.com/api/1/saml_assertion/verify_factor\",\"user\":{{\"id\":1,\"username\":\"alice\"}}}}]",
		devices.join(",")
	);

	envelope("success", "MFA is required for this user", &data)
}

pub fn duration_exceeded(duration_seconds: i32) -> RoleAssumptionError {
	classify_rejection(
		Some(VALIDATION_ERROR_CODE),
		"The requested DurationSeconds exceeds the MaxSessionDuration set for this role.",
		duration_seconds,
	)
}

#[derive(Clone, Debug)]
pub struct AssumeCall {
	pub binding: RoleBinding,
	pub assertion: String,
	pub duration_seconds: i32,
}

/// Role assumer that replays scripted outcomes, then approves every request.
#[derive(Default)]
pub struct ScriptedAssumer {
	outcomes: Mutex<VecDeque<RoleAssumptionError>>,
	calls: Mutex<Vec<AssumeCall>>,
}
impl ScriptedAssumer {
	pub fn failing_with(errors: Vec<RoleAssumptionError>) -> Self {
		Self { outcomes: Mutex::new(errors.into()), calls: Mutex::default() }
	}

	pub fn calls(&self) -> Vec<AssumeCall> {
		self.calls.lock().clone()
	}
}
impl RoleAssumer for ScriptedAssumer {
	fn assume_role<'a>(
		&'a self,
		binding: &'a RoleBinding,
		assertion: &'a SamlAssertion,
		duration_seconds: i32,
	) -> BoxFuture<'a, Result<CloudCredentials, RoleAssumptionError>> {
		self.calls.lock().push(AssumeCall {
			binding: binding.clone(),
			assertion: assertion.as_str().to_owned(),
			duration_seconds,
		});

		let outcome = match self.outcomes.lock().pop_front() {
			Some(err) => Err(err),
			None => Ok(CloudCredentials {
				access_key_id: "ASIAEXAMPLE".into(),
				secret_access_key: Secret::new("secret-access-key"),
				session_token: Secret::new("session-token"),
				expiration: OffsetDateTime::now_utc() + Duration::seconds(duration_seconds.into()),
			}),
		};

		Box::pin(async move { outcome })
	}
}
