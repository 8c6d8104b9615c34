//! Authentication service.
//!
//! Drives the session through login, registration, and logout against the
//! remote user service. The resulting state lives in [`SessionStore`].

mod error;

pub use error::AuthError;

use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument};

use emporium_core::{Credential, Email};

use crate::config::StorefrontConfig;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::gateway::Gateway;
use crate::models::{AuthResponse, LoginRequest, NewUser, Session, User};
use crate::session::SessionStore;

/// Registration form input.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub password: SecretString,
}

/// Authentication service.
///
/// Handles login, registration, and logout. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AuthService {
    gateway: Gateway,
    session: SessionStore,
    #[cfg(feature = "dev-auth-fallback")]
    dev_auth_fallback: bool,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    #[cfg_attr(not(feature = "dev-auth-fallback"), allow(unused_variables))]
    pub fn new(gateway: Gateway, session: SessionStore, config: &StorefrontConfig) -> Self {
        Self {
            gateway,
            session,
            #[cfg(feature = "dev-auth-fallback")]
            dev_auth_fallback: config.dev_auth_fallback,
        }
    }

    /// Login with email and password.
    ///
    /// On success the session becomes authenticated and is persisted.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` or `AuthError::MissingField` before
    /// any request if the form is incomplete, and `AuthError::Login` if the
    /// service rejects the credentials. The prior session is left as it was.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        self.login_with(LoginRequest {
            email,
            password: SecretString::from(password),
        })
        .await
    }

    /// Register a new user, then log in with the same email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Registration` if the account cannot be created
    /// (login is not attempted), and `AuthError::Login` if the account was
    /// created but the follow-up login failed.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: Registration) -> Result<User, AuthError> {
        let email = Email::parse(&registration.email)?;
        let name = registration.name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingField("name"));
        }
        validate_password(registration.password.expose_secret())?;

        let phone = registration
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        let created = self
            .gateway
            .create_user(&NewUser {
                email: email.clone(),
                name: name.to_string(),
                phone,
                password: registration.password.clone(),
            })
            .await
            .map_err(AuthError::Registration)?;
        info!(user_id = %created.id, "User registered");

        self.login_with(LoginRequest {
            email,
            password: registration.password,
        })
        .await
    }

    /// End the session. Always succeeds, signed in or not.
    pub fn logout(&self) {
        if self.session.clear() {
            info!("User logged out");
        }
        clear_sentry_user();
    }

    async fn login_with(&self, request: LoginRequest) -> Result<User, AuthError> {
        let session = self.authenticate(&request).await?;
        let user = session.user.clone();

        self.session.establish(session);
        set_sentry_user(&user.id, Some(user.email.as_str()));
        info!(user_id = %user.id, "User logged in");

        Ok(user)
    }

    async fn authenticate(&self, request: &LoginRequest) -> Result<Session, AuthError> {
        match self.gateway.login(request).await {
            Ok(response) => session_from(response),
            #[cfg(feature = "dev-auth-fallback")]
            Err(e) if self.dev_auth_fallback && e.is_endpoint_missing() => {
                self.dev_session(&request.email, &e).await
            }
            Err(e) => Err(AuthError::Login(e)),
        }
    }

    /// Sign in by email lookup alone while the login endpoint is missing.
    ///
    /// The password is not checked and the credential is not a real token.
    #[cfg(feature = "dev-auth-fallback")]
    async fn dev_session(
        &self,
        email: &Email,
        cause: &crate::gateway::GatewayError,
    ) -> Result<Session, AuthError> {
        tracing::warn!(error = %cause, "Login endpoint unavailable, using development credential");

        let user = self
            .gateway
            .user_by_email(email)
            .await
            .map_err(AuthError::Login)?;
        let token = format!(
            "dev-{}-{}",
            user.id,
            chrono::Utc::now().timestamp_millis()
        );

        Ok(Session {
            user,
            credential: Credential::new(token),
        })
    }
}

fn session_from(response: AuthResponse) -> Result<Session, AuthError> {
    let credential = Credential::new(response.token);
    if credential.is_empty() {
        return Err(AuthError::EmptyCredential);
    }
    Ok(Session {
        user: response.user,
        credential,
    })
}

const fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.is_empty() {
        return Err(AuthError::MissingField("password"));
    }
    Ok(())
}
