//! Session-related types.
//!
//! The authenticated identity and its bearer credential always travel
//! together: a [`Session`] cannot be built with only one of them.

use emporium_core::Credential;

use super::user::User;

/// An authenticated identity together with its bearer credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The signed-in user.
    pub user: User,
    /// Credential attached to outbound requests.
    pub credential: Credential,
}

/// Authentication state observed by consumers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No user is signed in.
    #[default]
    Unauthenticated,
    /// A user is signed in.
    Authenticated(Session),
}

impl SessionState {
    /// The active session, if any.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            Self::Unauthenticated => None,
        }
    }

    /// Whether a user is signed in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Persisted storage keys. Cart and session keys never overlap.
pub mod keys {
    /// Key for the bearer credential (raw string).
    pub const CREDENTIAL: &str = "token";

    /// Key for the signed-in user (serialized [`super::User`]).
    pub const IDENTITY: &str = "user";

    /// Key for the cart (serialized list of [`crate::models::CartItem`]).
    pub const CART: &str = "cart";
}
