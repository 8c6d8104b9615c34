//! Root composition: owns every piece of client state.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use crate::cart::CartManager;
use crate::config::StorefrontConfig;
use crate::error::StorefrontError;
use crate::gateway::{Gateway, HttpTransport, Transport};
use crate::navigation::{Navigator, forward_auth_expiry};
use crate::services::auth::AuthService;
use crate::services::catalog::Catalog;
use crate::services::checkout::Checkout;
use crate::services::orders::OrderHistory;
use crate::session::SessionStore;
use crate::store::{FileStore, KeyValueStore};

/// The storefront client.
///
/// This struct is cheaply cloneable via `Arc`. Every handle it gives out
/// shares the same session, cart, and gateway.
#[derive(Debug, Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

#[derive(Debug)]
struct StorefrontInner {
    config: StorefrontConfig,
    session: SessionStore,
    cart: CartManager,
    gateway: Gateway,
    auth: AuthService,
    checkout: Checkout,
    catalog: Catalog,
    orders: OrderHistory,
}

impl Storefront {
    /// Open the persisted state file and connect over HTTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the state file's directory cannot be created or
    /// the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, StorefrontError> {
        let store = Arc::new(FileStore::open(&config.state_path)?);
        let transport = Arc::new(HttpTransport::new(&config)?);
        Ok(Self::with_parts(config, store, transport))
    }

    /// Assemble the storefront from an explicit store and transport.
    #[must_use]
    pub fn with_parts(
        config: StorefrontConfig,
        store: Arc<dyn KeyValueStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let session = SessionStore::restore(Arc::clone(&store));
        let cart = CartManager::restore(store);
        let gateway = Gateway::new(transport, session.clone());

        let auth = AuthService::new(gateway.clone(), session.clone(), &config);
        let checkout = Checkout::new(gateway.clone(), session.clone(), cart.clone());
        let catalog = Catalog::new(gateway.clone());
        let orders = OrderHistory::new(gateway.clone(), session.clone());

        info!(
            api_base_url = %config.api_base_url,
            authenticated = session.is_authenticated(),
            cart_lines = cart.items().len(),
            "Storefront ready"
        );

        Self {
            inner: Arc::new(StorefrontInner {
                config,
                session,
                cart,
                gateway,
                auth,
                checkout,
                catalog,
                orders,
            }),
        }
    }

    /// Route the user to login whenever the session expires.
    ///
    /// Must be called from within a tokio runtime.
    pub fn install_navigator(&self, navigator: Arc<dyn Navigator>) -> JoinHandle<()> {
        forward_auth_expiry(&self.inner.gateway, navigator)
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    #[must_use]
    pub fn cart(&self) -> &CartManager {
        &self.inner.cart
    }

    #[must_use]
    pub fn gateway(&self) -> &Gateway {
        &self.inner.gateway
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    #[must_use]
    pub fn checkout(&self) -> &Checkout {
        &self.inner.checkout
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn orders(&self) -> &OrderHistory {
        &self.inner.orders
    }
}
