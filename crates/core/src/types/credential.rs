//! Bearer credential type.
//!
//! An opaque token issued by the auth endpoint and attached to every request
//! made on behalf of a session.

use core::fmt;

use secrecy::{ExposeSecret, SecretString};

/// Opaque bearer token authorizing requests for one session.
///
/// The token is held in a [`SecretString`] so it never shows up in `Debug`
/// output or tracing fields by accident. Call [`Credential::expose`] only at
/// the point the value must leave the process (the `Authorization` header or
/// the persisted store).
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    /// Wrap a token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// Expose the raw token.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Whether the token is empty (never valid as a credential).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for Credential {}

impl From<String> for Credential {
    fn from(token: String) -> Self {
        Self::new(token)
    }
}
