//! Identity-provider identifiers, redacted secrets, and the bearer access token.

pub mod id;
pub mod secret;
pub mod token;

pub use id::*;
pub use secret::*;
pub use token::*;
