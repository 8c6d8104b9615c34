//! User and authentication endpoints.

use tracing::instrument;

use emporium_core::Email;

use super::{ApiRequest, Gateway, GatewayError};
use crate::models::{AuthResponse, LoginRequest, NewUser, User};

impl Gateway {
    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Rejected`] if the email is already taken or
    /// the service rejects a field.
    #[instrument(skip(self, user), fields(email = %user.email))]
    pub async fn create_user(&self, user: &NewUser) -> Result<User, GatewayError> {
        self.fetch(ApiRequest::post("/users").json(user)?).await
    }

    /// Exchange email and password for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the endpoint is
    /// unavailable.
    #[instrument(skip(self, login), fields(email = %login.email))]
    pub async fn login(&self, login: &LoginRequest) -> Result<AuthResponse, GatewayError> {
        self.fetch(ApiRequest::post("/auth/login").json(login)?)
            .await
    }

    /// Look up a user by email.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Rejected`] with 404 if no user has that email.
    #[instrument(skip(self))]
    pub async fn user_by_email(&self, email: &Email) -> Result<User, GatewayError> {
        let path = format!("/users/email/{}", urlencoding::encode(email.as_str()));
        self.fetch(ApiRequest::get(path)).await
    }
}
