//! Trade identity-provider credentials plus an MFA challenge for short-lived AWS credentials.
//!
//! The crate walks the OneLogin SAML federation flow end to end: a client-credentials access
//! token, a SAML assertion request, push-first MFA verification with an OTP fallback, role
//! routing out of the verified assertion, and an STS exchange that negotiates the session
//! duration. Terminal I/O and time are injected so every stage runs under test without a TTY
//! or a wall clock.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod idp;
pub mod oauth;
pub mod obs;
pub mod saml;
pub mod sts;
pub mod terminal;

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

/// Boxed, `Send` future returned by the crate's object-safe async seams.
pub type BoxFuture<'a, T> = _prelude::Pin<Box<dyn _prelude::Future<Output = T> + 'a + Send>>;

pub use reqwest;
pub use url;
#[cfg(feature = "cli")] use {clap as _, color_eyre as _, tracing_subscriber as _};
#[cfg(test)] use httpmock as _;
