//! Order history for the signed-in user.

use thiserror::Error;
use tracing::{debug, instrument};

use crate::gateway::{Gateway, GatewayError};
use crate::models::Order;
use crate::models::order::sort_most_recent_first;
use crate::session::SessionStore;

/// Errors that can occur while reading order history.
#[derive(Debug, Error)]
pub enum OrdersError {
    /// Order history needs a signed-in user.
    #[error("sign in to see your orders")]
    NotAuthenticated,

    /// The order service declined or could not be reached.
    #[error("could not load orders: {0}")]
    Gateway(#[from] GatewayError),
}

/// Reads the current user's orders.
#[derive(Debug, Clone)]
pub struct OrderHistory {
    gateway: Gateway,
    session: SessionStore,
}

impl OrderHistory {
    #[must_use]
    pub const fn new(gateway: Gateway, session: SessionStore) -> Self {
        Self { gateway, session }
    }

    /// Orders placed by the signed-in user, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `OrdersError::NotAuthenticated` without sending anything if
    /// nobody is signed in, or the gateway error if the request fails.
    #[instrument(skip(self))]
    pub async fn mine(&self) -> Result<Vec<Order>, OrdersError> {
        let user = self.session.user().ok_or(OrdersError::NotAuthenticated)?;
        let mut orders = self.gateway.orders_for_user(user.id).await?;
        sort_most_recent_first(&mut orders);
        debug!(count = orders.len(), "Loaded order history");
        Ok(orders)
    }
}
