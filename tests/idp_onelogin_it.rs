mod common;

// crates.io
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime};
// self
use common::*;
use onelogin_sts::{
	auth::{AccessToken, AppId, DeviceId, Secret, Subdomain},
	config::ProviderEndpoints,
	error::{AuthError, Error, MfaError, ProtocolError},
	http::ReqwestHttpClient,
	idp::{
		AssertionRequest, AssertionResponse, IdentityProvider, MfaStatus, OneLoginClient,
		StateToken, VerifyFactorRequest,
	},
	url::Url,
};

fn token() -> AccessToken {
	AccessToken::new(ACCESS_TOKEN, OffsetDateTime::now_utc(), Duration::hours(10))
}

fn assertion_request() -> AssertionRequest {
	AssertionRequest {
		username: "alice@example.com".into(),
		password: Secret::new("hunter2"),
		app_id: AppId::new(APP_ID).expect("App fixture should be valid."),
		subdomain: Subdomain::new("acme").expect("Subdomain fixture should be valid."),
	}
}

#[tokio::test]
async fn acquire_token_uses_client_credentials_grant() {
	let server = MockServer::start_async().await;
	let mock = mock_token(&server).await;
	let token = client(&server)
		.acquire_token(CLIENT_ID, &Secret::new(CLIENT_SECRET))
		.await
		.expect("Token request should succeed.");

	mock.assert_async().await;

	assert_eq!(token.secret.expose(), ACCESS_TOKEN);
	assert!(!token.is_expired_at(OffsetDateTime::now_utc() + Duration::hours(9)));
}

#[tokio::test]
async fn acquire_token_maps_rejected_client() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/oauth2/v2/token");
			then.status(401).header("content-type", "application/json").body(
				"{\"status\":{\"error\":true,\"code\":401,\"type\":\"Unauthorized\",\"message\":\"Authentication Failure\"}}",
			);
		})
		.await;
	let err = client(&server)
		.acquire_token(CLIENT_ID, &Secret::new("wrong"))
		.await
		.expect_err("Rejected client credentials must fail.");

	assert!(matches!(err, Error::Auth(AuthError::InvalidClient { status: Some(401), .. })));
}

#[tokio::test]
async fn request_assertion_returns_mfa_challenge() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/1/saml_assertion")
				.header("authorization", format!("bearer:{ACCESS_TOKEN}"))
				.header("content-type", "application/json");
			then.status(200)
				.header("content-type", "application/json")
				.body(challenge_body(&[(111, "OneLogin Protect"), (222, "Google Authenticator")]));
		})
		.await;
	let response = client(&server)
		.request_assertion(&token(), assertion_request())
		.await
		.expect("Assertion request should succeed.");

	mock.assert_async().await;

	let AssertionResponse::MfaRequired(challenge) = response else {
		panic!("Expected an MFA challenge.");
	};

	assert_eq!(challenge.state_token.expose(), "st-1");
	assert_eq!(challenge.devices.len(), 2);
	assert_eq!(challenge.devices[1].id, DeviceId::from(222_u64));
	assert_eq!(challenge.devices[1].device_type, "Google Authenticator");
}

#[tokio::test]
async fn request_assertion_passes_through_direct_assertion() {
	let server = MockServer::start_async().await;
	let payload = assertion_payload(&[ROLE_ARN]);
	let body = envelope("success", "Success", &format!("\"{payload}\""));
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/1/saml_assertion");
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await;
	let response = client(&server)
		.request_assertion(&token(), assertion_request())
		.await
		.expect("Assertion request should succeed.");

	assert!(matches!(response, AssertionResponse::Assertion(ref assertion) if assertion.as_str() == payload));
}

#[tokio::test]
async fn request_assertion_maps_bad_password() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/1/saml_assertion");
			then.status(401).header("content-type", "application/json").body(
				"{\"status\":{\"error\":true,\"code\":401,\"type\":\"Unauthorized\",\"message\":\"Authentication Failed: Invalid user credentials\"}}",
			);
		})
		.await;
	let err = client(&server)
		.request_assertion(&token(), assertion_request())
		.await
		.expect_err("Rejected password must fail.");

	assert!(matches!(
		err,
		Error::Auth(AuthError::InvalidCredentials { ref reason, status: Some(401) })
			if reason == "Authentication Failed: Invalid user credentials"
	));
}

#[tokio::test]
async fn request_assertion_reports_malformed_payload_path() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/1/saml_assertion");
			then.status(200)
				.header("content-type", "application/json")
				.body(envelope("success", "MFA is required for this user", "[{\"devices\":[]}]"));
		})
		.await;
	let err = client(&server)
		.request_assertion(&token(), assertion_request())
		.await
		.expect_err("Challenge without a state token must fail.");

	assert!(matches!(err, Error::Protocol(ProtocolError::Json { status: Some(200), .. })));
}

#[tokio::test]
async fn verify_factor_maps_statuses() {
	let server = MockServer::start_async().await;
	let app_id = AppId::new(APP_ID).expect("App fixture should be valid.");
	let device_id = DeviceId::from(111_u64);
	let state_token = StateToken::new("st-1");
	let otp = Secret::new("123456");
	let request = |otp_token| VerifyFactorRequest {
		app_id: &app_id,
		device_id: &device_id,
		state_token: &state_token,
		otp_token,
		do_not_notify: false,
	};
	let client = client(&server);
	let token = token();
	let mut pending = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/1/saml_assertion/verify_factor");
			then.status(200).header("content-type", "application/json").body(envelope(
				"pending",
				"Authentication pending on OL Protect",
				"null",
			));
		})
		.await;
	let response = client.verify_factor(&token, request(None)).await.expect("Poll should succeed.");

	assert_eq!(response.status, MfaStatus::Pending);
	assert_eq!(response.message, "Authentication pending on OL Protect");

	pending.delete_async().await;

	let mut accepted = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/1/saml_assertion/verify_factor");
			then.status(200)
				.header("content-type", "application/json")
				.body(envelope("success", "Success", "\"PHNhbWw+\""));
		})
		.await;
	let response =
		client.verify_factor(&token, request(Some(&otp))).await.expect("OTP should be accepted.");

	assert_eq!(response.status, MfaStatus::Accepted);
	assert_eq!(response.assertion.map(|assertion| assertion.as_str().to_owned()).as_deref(), Some("PHNhbWw+"));

	accepted.delete_async().await;

	let _rejected = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/1/saml_assertion/verify_factor");
			then.status(401).header("content-type", "application/json").body(
				"{\"status\":{\"error\":true,\"code\":401,\"type\":\"Unauthorized\",\"message\":\"Failed authentication with this factor\"}}",
			);
		})
		.await;
	let response =
		client.verify_factor(&token, request(Some(&otp))).await.expect("Rejection is a status.");

	assert_eq!(response.status, MfaStatus::Rejected);
	assert_eq!(response.message, "Failed authentication with this factor");
}

#[tokio::test]
async fn verify_factor_classifies_error_flag_and_empty_success() {
	let server = MockServer::start_async().await;
	let app_id = AppId::new(APP_ID).expect("App fixture should be valid.");
	let device_id = DeviceId::from(111_u64);
	let state_token = StateToken::new("st-1");
	let request = VerifyFactorRequest {
		app_id: &app_id,
		device_id: &device_id,
		state_token: &state_token,
		otp_token: None,
		do_not_notify: true,
	};
	let client = client(&server);
	let token = token();
	let mut flagged = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/1/saml_assertion/verify_factor");
			then.status(200).header("content-type", "application/json").body(
				"{\"status\":{\"error\":true,\"code\":200,\"type\":\"pending\",\"message\":\"Push notification was denied\"},\"data\":null}",
			);
		})
		.await;
	let response = client.verify_factor(&token, request).await.expect("Error flag is a status.");

	assert_eq!(response.status, MfaStatus::Rejected);
	assert_eq!(response.message, "Push notification was denied");

	flagged.delete_async().await;

	let _empty = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/1/saml_assertion/verify_factor");
			then.status(200)
				.header("content-type", "application/json")
				.body(envelope("success", "Success", "null"));
		})
		.await;
	let err = client
		.verify_factor(&token, request)
		.await
		.expect_err("Success without an assertion must fail.");

	assert!(matches!(err, Error::Protocol(ProtocolError::MissingAssertion)));
}

#[tokio::test]
async fn verify_factor_transport_failure_is_an_mfa_error() {
	let unreachable = Url::parse("http://127.0.0.1:1/").expect("Loopback URL should parse.");
	let client = OneLoginClient::new(
		ProviderEndpoints::from_base(&unreachable).expect("Loopback endpoints should resolve."),
		ReqwestHttpClient::new().expect("Default client should build."),
	);
	let app_id = AppId::new(APP_ID).expect("App fixture should be valid.");
	let device_id = DeviceId::from(111_u64);
	let state_token = StateToken::new("st-1");
	let err = client
		.verify_factor(
			&token(),
			VerifyFactorRequest {
				app_id: &app_id,
				device_id: &device_id,
				state_token: &state_token,
				otp_token: None,
				do_not_notify: true,
			},
		)
		.await
		.expect_err("Unreachable endpoint must fail.");

	assert!(matches!(err, Error::MfaVerification(MfaError::Transport(_))));
}
