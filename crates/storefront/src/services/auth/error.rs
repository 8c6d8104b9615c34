//! Authentication error types.

use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] emporium_core::EmailError),

    /// A required form field was left empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The service accepted the login but returned no token.
    #[error("login returned an empty credential")]
    EmptyCredential,

    /// Account creation failed; login was not attempted.
    #[error("registration failed: {0}")]
    Registration(#[source] GatewayError),

    /// Login failed.
    #[error("login failed: {0}")]
    Login(#[source] GatewayError),
}

impl AuthError {
    /// Whether the error was caught before any request was sent.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidEmail(_) | Self::MissingField(_))
    }

    /// The underlying gateway error, if the service was involved.
    #[must_use]
    pub const fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            Self::Registration(e) | Self::Login(e) => Some(e),
            _ => None,
        }
    }
}
