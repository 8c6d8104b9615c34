//! Unified error handling with Sentry integration.
//!
//! Every module has its own `thiserror` enum; [`StorefrontError`] rolls them
//! up for the front end and classifies each failure into an [`ErrorKind`]
//! that decides what the user sees and whether a retry makes sense.

use thiserror::Error;

use crate::config::ConfigError;
use crate::gateway::GatewayError;
use crate::services::auth::AuthError;
use crate::services::catalog::CatalogError;
use crate::services::checkout::CheckoutError;
use crate::services::orders::OrdersError;
use crate::store::StoreError;

/// How a failure should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input was rejected before any request was sent.
    Validation,
    /// The service understood the request and declined it.
    Rejected,
    /// The session was rejected; the user must sign in again.
    AuthExpired,
    /// The service could not be reached or answered with a server error.
    Transport,
}

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Orders error: {0}")]
    Orders(#[from] OrdersError),
}

impl StorefrontError {
    /// Classify the failure.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Validation,
            Self::Store(_) => ErrorKind::Transport,
            Self::Gateway(e) => gateway_kind(e),
            Self::Auth(e) => match e {
                AuthError::InvalidEmail(_) | AuthError::MissingField(_) => ErrorKind::Validation,
                AuthError::EmptyCredential => ErrorKind::Rejected,
                // A 401 from the login endpoint means bad credentials.
                AuthError::Login(GatewayError::Unauthorized { .. }) => ErrorKind::Rejected,
                AuthError::Registration(e) | AuthError::Login(e) => gateway_kind(e),
            },
            Self::Checkout(e) => match e {
                CheckoutError::NotAuthenticated | CheckoutError::EmptyCart => {
                    ErrorKind::Validation
                }
                CheckoutError::Gateway(e) => gateway_kind(e),
            },
            Self::Catalog(e) => match e {
                CatalogError::InvalidProductId(_) | CatalogError::Validation(_) => {
                    ErrorKind::Validation
                }
                CatalogError::Gateway(e) => gateway_kind(e),
            },
            Self::Orders(e) => match e {
                OrdersError::NotAuthenticated => ErrorKind::Validation,
                OrdersError::Gateway(e) => gateway_kind(e),
            },
        }
    }

    /// Whether trying the same operation again later could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    /// A message safe to show the user.
    ///
    /// Validation messages and service rejection messages are shown as-is;
    /// transport and internal details are not.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::AuthExpired => "Your session has expired. Please log in again.".to_string(),
            ErrorKind::Transport => {
                "The store is unavailable right now. Please try again.".to_string()
            }
            ErrorKind::Validation => match self {
                Self::Auth(e) => e.to_string(),
                Self::Checkout(e) => e.to_string(),
                Self::Catalog(CatalogError::Validation(e)) => e.to_string(),
                Self::Catalog(CatalogError::InvalidProductId(_)) => "Product not found".to_string(),
                Self::Orders(e) => e.to_string(),
                _ => "Invalid configuration".to_string(),
            },
            ErrorKind::Rejected => match self.gateway_error() {
                Some(GatewayError::Rejected { message, .. }) => message.clone(),
                Some(GatewayError::Unauthorized { .. }) => "Invalid email or password".to_string(),
                _ => "The request was declined".to_string(),
            },
        }
    }

    /// Log the error and send it to Sentry if it points at a service
    /// problem rather than user input.
    pub fn report(&self) {
        if self.kind() == ErrorKind::Transport {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Storefront error"
            );
        } else {
            tracing::debug!(error = %self, kind = ?self.kind(), "Storefront error");
        }
    }

    fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            Self::Gateway(e)
            | Self::Checkout(CheckoutError::Gateway(e))
            | Self::Catalog(CatalogError::Gateway(e))
            | Self::Orders(OrdersError::Gateway(e)) => Some(e),
            Self::Auth(e) => e.gateway_error(),
            _ => None,
        }
    }
}

fn gateway_kind(err: &GatewayError) -> ErrorKind {
    match err {
        GatewayError::Unauthorized { .. } => ErrorKind::AuthExpired,
        GatewayError::Rejected { status, .. } if !status.is_server_error() => ErrorKind::Rejected,
        _ => ErrorKind::Transport,
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use reqwest::StatusCode;

    use super::*;
    use crate::models::ProductValidationError;

    fn rejected(status: StatusCode, message: &str) -> GatewayError {
        GatewayError::Rejected {
            status,
            message: message.to_string(),
            field_errors: BTreeMap::new(),
        }
    }

    #[test]
    fn test_kinds() {
        let validation: StorefrontError = CheckoutError::EmptyCart.into();
        assert_eq!(validation.kind(), ErrorKind::Validation);

        let rejected_order: StorefrontError =
            CheckoutError::Gateway(rejected(StatusCode::CONFLICT, "Out of stock")).into();
        assert_eq!(rejected_order.kind(), ErrorKind::Rejected);

        let expired: StorefrontError = OrdersError::Gateway(GatewayError::Unauthorized {
            message: String::new(),
        })
        .into();
        assert_eq!(expired.kind(), ErrorKind::AuthExpired);

        let down: StorefrontError = GatewayError::Transport("refused".to_string()).into();
        assert_eq!(down.kind(), ErrorKind::Transport);
        assert!(down.is_retryable());

        let server: StorefrontError =
            CatalogError::Gateway(rejected(StatusCode::BAD_GATEWAY, "upstream")).into();
        assert_eq!(server.kind(), ErrorKind::Transport);
    }

    #[test]
    fn test_bad_login_is_not_expiry() {
        let err: StorefrontError = AuthError::Login(GatewayError::Unauthorized {
            message: "Bad credentials".to_string(),
        })
        .into();
        assert_eq!(err.kind(), ErrorKind::Rejected);
        assert_eq!(err.user_message(), "Invalid email or password");
    }

    #[test]
    fn test_user_messages() {
        let err: StorefrontError = AuthError::Registration(rejected(
            StatusCode::CONFLICT,
            "Email already registered",
        ))
        .into();
        assert_eq!(err.user_message(), "Email already registered");

        let err: StorefrontError =
            CatalogError::Validation(ProductValidationError::PriceTooLow).into();
        assert_eq!(err.user_message(), "price must be at least 0.01");

        let err: StorefrontError = GatewayError::Transport("tcp connect error: 10.0.0.1".to_string()).into();
        assert!(!err.user_message().contains("10.0.0.1"));
    }
}
