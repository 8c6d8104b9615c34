//! Order endpoints.

use tracing::instrument;

use emporium_core::UserId;

use super::{ApiRequest, Gateway, GatewayError};
use crate::models::{CreateOrderRequest, Order};

impl Gateway {
    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Rejected`] if the service declines the order
    /// (for example, insufficient inventory).
    #[instrument(skip(self, order), fields(user_id = %order.user_id, lines = order.items.len()))]
    pub async fn create_order(&self, order: &CreateOrderRequest) -> Result<Order, GatewayError> {
        self.fetch(ApiRequest::post("/orders").json(order)?).await
    }

    /// All orders placed by a user, in service order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body does not decode.
    #[instrument(skip(self))]
    pub async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, GatewayError> {
        self.fetch(ApiRequest::get(format!("/orders/user/{user_id}")))
            .await
    }
}
