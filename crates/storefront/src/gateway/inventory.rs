//! Inventory endpoint.

use tracing::instrument;

use emporium_core::ProductId;

use super::{ApiRequest, Gateway, GatewayError};

impl Gateway {
    /// Whether `quantity` units of a product are in stock.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a boolean.
    #[instrument(skip(self))]
    pub async fn check_inventory(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<bool, GatewayError> {
        self.fetch(
            ApiRequest::get("/inventory/check")
                .query("productId", product_id)
                .query("quantity", quantity),
        )
        .await
    }
}
