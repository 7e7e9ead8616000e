//! JSON bodies exchanged with the OneLogin v1 assertion API.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, error::ProtocolError, http::body_preview};

#[derive(Debug, Serialize)]
pub(super) struct SamlAssertionBody<'a> {
	pub username_or_email: &'a str,
	pub password: &'a str,
	pub app_id: &'a str,
	pub subdomain: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct VerifyFactorBody<'a> {
	pub app_id: &'a str,
	pub device_id: &'a str,
	pub state_token: &'a str,
	pub otp_token: &'a str,
	pub do_not_notify: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct Envelope<T> {
	pub status: Status,
	pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Status {
	#[serde(default)]
	pub error: bool,
	#[serde(rename = "type", default)]
	pub kind: String,
	#[serde(default)]
	pub message: String,
}
impl Status {
	pub fn is(&self, kind: &str) -> bool {
		self.kind.eq_ignore_ascii_case(kind)
	}
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum AssertionData {
	Assertion(String),
	Challenges(Vec<Challenge>),
}

#[derive(Debug, Deserialize)]
pub(super) struct Challenge {
	pub state_token: String,
	#[serde(default)]
	pub devices: Vec<DeviceEntry>,
}

#[derive(Debug, Deserialize)]
pub(super) struct DeviceEntry {
	pub device_id: u64,
	pub device_type: String,
}

#[derive(Debug, Deserialize)]
struct StatusOnly {
	status: Status,
}

pub(super) fn decode<T>(body: &[u8], status: u16) -> Result<T, ProtocolError>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| ProtocolError::Json { source, status: Some(status) })
}

/// Best-effort human-readable reason from an error body.
pub(super) fn status_message(body: &[u8]) -> String {
	serde_json::from_slice::<StatusOnly>(body)
		.ok()
		.map(|envelope| envelope.status.message)
		.filter(|message| !message.trim().is_empty())
		.unwrap_or_else(|| body_preview(body))
}
