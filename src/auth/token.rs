//! Bearer access token issued by the identity provider.

// self
use crate::{_prelude::*, auth::Secret};

/// Opaque bearer token scoped to one identity-provider account.
///
/// The token lives only for the duration of one flow and is never persisted.
#[derive(Clone)]
pub struct AccessToken {
	/// Token secret; callers must avoid logging it.
	pub secret: Secret,
	/// Instant the token was received.
	pub issued_at: OffsetDateTime,
	/// Instant after which the provider will refuse the token.
	pub expires_at: OffsetDateTime,
}
impl AccessToken {
	/// Builds a token that expires `expires_in` after `issued_at`.
	pub fn new(secret: impl Into<String>, issued_at: OffsetDateTime, expires_in: Duration) -> Self {
		Self { secret: Secret::new(secret), issued_at, expires_at: issued_at + expires_in }
	}

	/// Returns `true` once `instant` reaches the expiry.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Renders the `Authorization` header value expected by the assertion API.
	pub fn authorization(&self) -> String {
		format!("bearer:{}", self.secret.expose())
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("secret", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
