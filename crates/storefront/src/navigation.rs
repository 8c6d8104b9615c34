//! Navigation targets and the auth-expiry hook.
//!
//! The gateway never navigates. The root composition subscribes to its
//! events and hands a [`Route`] to whatever [`Navigator`] the front end
//! installed.

use std::fmt;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use emporium_core::ProductId;

use crate::gateway::{Gateway, GatewayEvent};

/// A place in the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Products,
    Product(ProductId),
    Cart,
    Checkout,
    Orders,
    Login,
    Register,
    AdminProducts,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => f.write_str("/"),
            Self::Products => f.write_str("/products"),
            Self::Product(id) => write!(f, "/products/{id}"),
            Self::Cart => f.write_str("/cart"),
            Self::Checkout => f.write_str("/checkout"),
            Self::Orders => f.write_str("/orders"),
            Self::Login => f.write_str("/login"),
            Self::Register => f.write_str("/register"),
            Self::AdminProducts => f.write_str("/admin/products"),
        }
    }
}

impl Route {
    /// Whether the route needs a signed-in user.
    #[must_use]
    pub const fn requires_auth(self) -> bool {
        matches!(self, Self::Checkout | Self::Orders | Self::AdminProducts)
    }
}

/// Moves the user between routes.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

impl<F> Navigator for F
where
    F: Fn(Route) + Send + Sync,
{
    fn navigate(&self, route: Route) {
        self(route);
    }
}

/// Send the user to [`Route::Login`] whenever the gateway reports an
/// expired session.
///
/// The task ends when every gateway handle has been dropped.
pub fn forward_auth_expiry(gateway: &Gateway, navigator: Arc<dyn Navigator>) -> JoinHandle<()> {
    let mut events = gateway.subscribe();

    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(GatewayEvent::AuthExpired { path }) => {
                    info!(path, "Session expired, sending user to login");
                    navigator.navigate(Route::Login);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Navigation hook fell behind gateway events");
                }
                Err(RecvError::Closed) => {
                    debug!("Gateway closed, navigation hook stopping");
                    break;
                }
            }
        }
    })
}
