//! Catalog endpoints.

use tracing::instrument;

use emporium_core::ProductId;

use super::{ApiRequest, Gateway, GatewayError};
use crate::models::{Product, ProductCreate, ProductUpdate};

impl Gateway {
    /// List products, optionally restricted to one category.
    ///
    /// An empty category is treated as no filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body does not decode.
    #[instrument(skip(self))]
    pub async fn list_products(&self, category: Option<&str>) -> Result<Vec<Product>, GatewayError> {
        let mut request = ApiRequest::get("/products");
        if let Some(category) = category.map(str::trim).filter(|c| !c.is_empty()) {
            request = request.query("category", category);
        }
        self.fetch(request).await
    }

    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Rejected`] with 404 if the product does not
    /// exist.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, GatewayError> {
        self.fetch(ApiRequest::get(format!("/products/{id}"))).await
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_product(&self, product: &ProductCreate) -> Result<Product, GatewayError> {
        self.fetch(ApiRequest::post("/products").json(product)?).await
    }

    /// Apply a partial update to a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    #[instrument(skip(self, update))]
    pub async fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, GatewayError> {
        self.fetch(ApiRequest::put(format!("/products/{id}")).json(update)?)
            .await
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), GatewayError> {
        self.send_empty(ApiRequest::delete(format!("/products/{id}")))
            .await
    }
}
