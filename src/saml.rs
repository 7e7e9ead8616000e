//! SAML assertion payloads and role routing.
//!
//! The identity provider hands back the SAML response as base64. The AWS role binding sits
//! in the `https://aws.amazon.com/SAML/Attributes/Role` attribute, one
//! `provider-arn,role-arn` pair per `AttributeValue`.

// std
use std::mem;
// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use quick_xml::{
	Reader,
	events::{BytesStart, Event},
};
// self
use crate::_prelude::*;

/// SAML attribute carrying the AWS role bindings.
pub const ROLE_ATTRIBUTE: &str = "https://aws.amazon.com/SAML/Attributes/Role";

const SAML_PROVIDER_MARKER: &str = ":saml-provider/";

/// Base64-encoded SAML response as returned by the identity provider.
#[derive(Clone, PartialEq, Eq)]
pub struct SamlAssertion(String);
impl SamlAssertion {
	/// Wraps a base64 payload.
	pub fn new(payload: impl Into<String>) -> Self {
		Self(payload.into())
	}

	/// Returns the base64 payload exactly as issued.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Decodes the payload into the SAML response XML.
	pub fn decode_xml(&self) -> Result<String, AssertionParseError> {
		let compact: String = self.0.chars().filter(|c| !c.is_ascii_whitespace()).collect();
		let bytes = STANDARD.decode(compact)?;

		Ok(String::from_utf8(bytes)?)
	}
}
impl Debug for SamlAssertion {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "SamlAssertion(<{} bytes>)", self.0.len())
	}
}

/// Assertion released by a completed MFA challenge (or issued directly when the user has no
/// MFA enrolled).
///
/// The type is deliberately not `Clone`: the credential exchanger takes it by value, so a
/// verified assertion can be spent at most once.
#[derive(Debug, PartialEq, Eq)]
pub struct VerifiedAssertion(SamlAssertion);
impl VerifiedAssertion {
	pub(crate) fn new(assertion: SamlAssertion) -> Self {
		Self(assertion)
	}

	/// Borrows the underlying payload.
	pub fn payload(&self) -> &SamlAssertion {
		&self.0
	}

	/// Consumes the verified assertion.
	pub fn into_payload(self) -> SamlAssertion {
		self.0
	}
}

/// Trusted identity provider and role named by one role attribute value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleBinding {
	/// ARN of the SAML identity provider registered in IAM.
	pub identity_provider_arn: String,
	/// ARN of the role to assume.
	pub role_arn: String,
}
impl RoleBinding {
	/// Parses a `provider-arn,role-arn` pair.
	///
	/// Members are recognized by content so `role-arn,provider-arn` is accepted as well; when
	/// neither member looks like a SAML provider the pair is read as provider first.
	pub fn parse(value: &str) -> Result<Self, AssertionParseError> {
		let parts: Vec<&str> = value.split(',').map(str::trim).collect();
		let malformed = || AssertionParseError::MalformedRoleBinding {
			value: value.to_owned(),
			parts: parts.len(),
		};
		let [first, second] = parts.as_slice() else {
			return Err(malformed());
		};

		if first.is_empty() || second.is_empty() {
			return Err(malformed());
		}

		let (provider, role) =
			if second.contains(SAML_PROVIDER_MARKER) && !first.contains(SAML_PROVIDER_MARKER) {
				(second, first)
			} else {
				(first, second)
			};

		Ok(Self { identity_provider_arn: (*provider).to_owned(), role_arn: (*role).to_owned() })
	}
}
impl FromStr for RoleBinding {
	type Err = AssertionParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}
impl Display for RoleBinding {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{} via {}", self.role_arn, self.identity_provider_arn)
	}
}

/// Failures raised while routing a SAML assertion.
#[derive(Debug, ThisError)]
pub enum AssertionParseError {
	/// Payload is not base64.
	#[error("SAML assertion is not valid base64.")]
	Base64(#[from] base64::DecodeError),
	/// Decoded payload is not UTF-8.
	#[error("SAML assertion is not valid UTF-8.")]
	Utf8(#[from] std::string::FromUtf8Error),
	/// Decoded payload is not well-formed XML.
	#[error("SAML assertion is not well-formed XML.")]
	Xml(#[from] quick_xml::Error),
	/// No role attribute value was found.
	#[error("SAML assertion does not contain the {ROLE_ATTRIBUTE} attribute.")]
	MissingRoleAttribute,
	/// A role attribute value is not a provider/role pair.
	#[error("Role binding `{value}` must be a provider ARN and a role ARN separated by one comma, found {parts} part(s).")]
	MalformedRoleBinding {
		/// Raw attribute value.
		value: String,
		/// Number of comma-separated parts found.
		parts: usize,
	},
	/// Several role bindings were found where exactly one was expected.
	#[error("SAML assertion grants {count} roles; pick one explicitly.")]
	AmbiguousRoleBinding {
		/// Number of bindings found.
		count: usize,
	},
}
impl From<quick_xml::events::attributes::AttrError> for AssertionParseError {
	fn from(e: quick_xml::events::attributes::AttrError) -> Self {
		Self::Xml(e.into())
	}
}

/// Extracts the single role binding carried by `assertion`.
pub fn extract_role_binding(assertion: &SamlAssertion) -> Result<RoleBinding, AssertionParseError> {
	let mut bindings = extract_role_bindings(assertion)?;

	match bindings.len() {
		1 => Ok(bindings.remove(0)),
		count => Err(AssertionParseError::AmbiguousRoleBinding { count }),
	}
}

/// Extracts every role binding carried by `assertion`, in document order.
pub fn extract_role_bindings(
	assertion: &SamlAssertion,
) -> Result<Vec<RoleBinding>, AssertionParseError> {
	let xml = assertion.decode_xml()?;
	let values = role_attribute_values(&xml)?;

	if values.is_empty() {
		return Err(AssertionParseError::MissingRoleAttribute);
	}

	values.iter().map(|value| RoleBinding::parse(value)).collect()
}

fn role_attribute_values(xml: &str) -> Result<Vec<String>, AssertionParseError> {
	let mut reader = Reader::from_str(xml);

	reader.config_mut().trim_text(true);

	let mut values = Vec::new();
	let mut in_role_attribute = false;
	let mut in_value = false;
	let mut current = String::new();

	loop {
		match reader.read_event()? {
			Event::Start(e) => match e.local_name().as_ref() {
				b"Attribute" => in_role_attribute = is_role_attribute(&e)?,
				b"AttributeValue" if in_role_attribute => {
					in_value = true;
					current.clear();
				},
				_ => {},
			},
			Event::Text(text) if in_value => current.push_str(&text.unescape()?),
			Event::CData(data) if in_value =>
				current.push_str(&String::from_utf8_lossy(&data.into_inner())),
			Event::End(e) => match e.local_name().as_ref() {
				b"AttributeValue" if in_value => {
					in_value = false;
					values.push(mem::take(&mut current));
				},
				b"Attribute" => in_role_attribute = false,
				_ => {},
			},
			Event::Eof => break,
			_ => {},
		}
	}

	Ok(values)
}

fn is_role_attribute(element: &BytesStart) -> Result<bool, AssertionParseError> {
	for attr in element.attributes() {
		let attr = attr?;

		if attr.key.local_name().as_ref() == b"Name" {
			return Ok(attr.unescape_value()? == ROLE_ATTRIBUTE);
		}
	}

	Ok(false)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const PROVIDER: &str = "arn:aws:iam::111111111111:saml-provider/Idp";
	const ROLE: &str = "arn:aws:iam::111111111111:role/MyRole";

	fn assertion_with(values: &[&str]) -> SamlAssertion {
		let values: String = values
			.iter()
			.map(|value| format!("<saml:AttributeValue xsi:type=\"xs:string\">{value}</saml:AttributeValue>"))
			.collect();
		let xml = format!(
			"<samlp:Response xmlns:samlp=\"urn:oasis:names:tc:SAML:2.0:protocol\" \
			 xmlns:saml=\"urn:oasis:names:tc:SAML:2.0:assertion\" \
			 xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">\
			 <saml:Assertion><saml:AttributeStatement>\
			 <saml:Attribute Name=\"https://aws.amazon.com/SAML/Attributes/RoleSessionName\">\
			 <saml:AttributeValue>alice@example.com</saml:AttributeValue></saml:Attribute>\
			 <saml:Attribute Name=\"{ROLE_ATTRIBUTE}\">{values}</saml:Attribute>\
			 </saml:AttributeStatement></saml:Assertion></samlp:Response>"
		);

		SamlAssertion::new(STANDARD.encode(xml))
	}

	#[test]
	fn extracts_provider_and_role_pair() {
		let assertion = assertion_with(&[&format!("{PROVIDER},{ROLE}")]);
		let binding = extract_role_binding(&assertion).expect("Binding should parse.");

		assert_eq!(binding.identity_provider_arn, PROVIDER);
		assert_eq!(binding.role_arn, ROLE);
	}

	#[test]
	fn accepts_role_first_ordering() {
		let assertion = assertion_with(&[&format!("{ROLE},{PROVIDER}")]);
		let binding = extract_role_binding(&assertion).expect("Binding should parse.");

		assert_eq!(binding.identity_provider_arn, PROVIDER);
		assert_eq!(binding.role_arn, ROLE);
	}

	#[test]
	fn missing_comma_is_malformed() {
		let assertion = assertion_with(&[PROVIDER]);
		let err = extract_role_binding(&assertion).expect_err("Single ARN must be rejected.");

		assert!(matches!(err, AssertionParseError::MalformedRoleBinding { parts: 1, .. }));
	}

	#[test]
	fn extra_members_are_malformed() {
		let err = RoleBinding::parse(&format!("{PROVIDER},{ROLE},{ROLE}"))
			.expect_err("Three members must be rejected.");

		assert!(matches!(err, AssertionParseError::MalformedRoleBinding { parts: 3, .. }));
		assert!(RoleBinding::parse(&format!("{PROVIDER},")).is_err());
	}

	#[test]
	fn missing_attribute_is_reported() {
		let assertion = assertion_with(&[]);

		assert!(matches!(
			extract_role_binding(&assertion),
			Err(AssertionParseError::MissingRoleAttribute)
		));
	}

	#[test]
	fn multiple_roles_are_listed_in_order() {
		let other = "arn:aws:iam::222222222222:role/Other";
		let assertion = assertion_with(&[&format!("{PROVIDER},{ROLE}"), &format!("{PROVIDER},{other}")]);
		let bindings = extract_role_bindings(&assertion).expect("Bindings should parse.");

		assert_eq!(bindings.len(), 2);
		assert_eq!(bindings[1].role_arn, other);
		assert!(matches!(
			extract_role_binding(&assertion),
			Err(AssertionParseError::AmbiguousRoleBinding { count: 2 })
		));
	}

	#[test]
	fn invalid_payloads_are_rejected() {
		assert!(matches!(
			extract_role_bindings(&SamlAssertion::new("%%%")),
			Err(AssertionParseError::Base64(_))
		));

		let broken = SamlAssertion::new(STANDARD.encode("<Response><Attribute></Response>"));

		assert!(matches!(extract_role_bindings(&broken), Err(AssertionParseError::Xml(_))));
	}

	#[test]
	fn debug_hides_payload() {
		let assertion = SamlAssertion::new("c2VjcmV0");

		assert_eq!(format!("{assertion:?}"), "SamlAssertion(<8 bytes>)");
	}
}
