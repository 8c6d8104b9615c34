//! Checkout: turns the cart into an order.

use thiserror::Error;
use tracing::{info, instrument, warn};

use emporium_core::ProductId;

use crate::cart::CartManager;
use crate::error::add_breadcrumb;
use crate::gateway::{Gateway, GatewayError};
use crate::models::{CreateOrderRequest, Order};
use crate::session::SessionStore;

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Orders need a signed-in user.
    #[error("sign in to place an order")]
    NotAuthenticated,

    /// Nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// The order service declined or could not be reached.
    #[error("order failed: {0}")]
    Gateway(#[from] GatewayError),
}

/// Places orders from the current cart.
#[derive(Debug, Clone)]
pub struct Checkout {
    gateway: Gateway,
    session: SessionStore,
    cart: CartManager,
}

impl Checkout {
    #[must_use]
    pub const fn new(gateway: Gateway, session: SessionStore, cart: CartManager) -> Self {
        Self {
            gateway,
            session,
            cart,
        }
    }

    /// Submit the cart as an order for the signed-in user.
    ///
    /// The submitted lines leave the cart only once the order is accepted;
    /// any failure leaves the cart exactly as it was. Lines added while the
    /// order is in flight are kept for the next checkout.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NotAuthenticated` or `CheckoutError::EmptyCart`
    /// without sending anything, or the gateway error if the order fails.
    #[instrument(skip(self))]
    pub async fn place_order(&self) -> Result<Order, CheckoutError> {
        let user = self.session.user().ok_or(CheckoutError::NotAuthenticated)?;
        let items = self.cart.items();
        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let request = CreateOrderRequest::from_cart(user.id, &items);
        let order = self.gateway.create_order(&request).await.inspect_err(|e| {
            warn!(error = %e, "Order placement failed");
        })?;

        self.cart.remove_ordered(&items);
        add_breadcrumb("checkout", "Order placed", None);
        info!(order_id = %order.id, total = %order.total_amount, "Order placed");

        Ok(order)
    }

    /// Check every cart line against current inventory.
    ///
    /// Returns the products that cannot be supplied in the requested
    /// quantity, in cart order. An empty result means everything is in
    /// stock.
    ///
    /// # Errors
    ///
    /// Returns the first gateway error encountered.
    #[instrument(skip(self))]
    pub async fn verify_stock(&self) -> Result<Vec<ProductId>, CheckoutError> {
        let mut unavailable = Vec::new();
        for item in self.cart.items() {
            if !self
                .gateway
                .check_inventory(item.product_id, item.quantity)
                .await?
            {
                unavailable.push(item.product_id);
            }
        }
        Ok(unavailable)
    }
}
