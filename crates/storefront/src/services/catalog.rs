//! Catalog browsing and admin product management.

use thiserror::Error;
use tracing::{info, instrument};

use emporium_core::ProductId;

use crate::gateway::{Gateway, GatewayError};
use crate::models::{Product, ProductCreate, ProductUpdate, ProductValidationError};

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A product id that is not a number.
    #[error("invalid product id: {0:?}")]
    InvalidProductId(String),

    /// The product form failed client-side validation.
    #[error(transparent)]
    Validation(#[from] ProductValidationError),

    /// The catalog service declined or could not be reached.
    #[error("catalog request failed: {0}")]
    Gateway(#[from] GatewayError),
}

/// Catalog operations with input checked before any request is sent.
#[derive(Debug, Clone)]
pub struct Catalog {
    gateway: Gateway,
}

impl Catalog {
    #[must_use]
    pub const fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// List products, optionally filtered by category.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Gateway` if the request fails.
    pub async fn products(&self, category: Option<&str>) -> Result<Vec<Product>, CatalogError> {
        Ok(self.gateway.list_products(category).await?)
    }

    /// Look up a product by an id as typed or routed (e.g. `"42"`).
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidProductId` without sending anything if
    /// `id` is not numeric.
    pub async fn product(&self, id: &str) -> Result<Product, CatalogError> {
        let id = parse_product_id(id)?;
        Ok(self.gateway.get_product(id).await?)
    }

    /// Validate and create a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` before any request if the form is
    /// invalid.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_product(&self, product: ProductCreate) -> Result<Product, CatalogError> {
        let product = ProductCreate {
            name: product.name.trim().to_string(),
            description: product.description.trim().to_string(),
            category: product.category.trim().to_string(),
            ..product
        };
        product.validate()?;

        let created = self.gateway.create_product(&product).await?;
        info!(product_id = %created.id, "Product created");
        Ok(created)
    }

    /// Validate and apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` before any request if no field is
    /// set or a set field is invalid.
    #[instrument(skip(self, update))]
    pub async fn update_product(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, CatalogError> {
        let trim = |s: Option<String>| s.map(|s| s.trim().to_string());
        let update = ProductUpdate {
            name: trim(update.name),
            description: trim(update.description),
            category: trim(update.category),
            price: update.price,
        };
        update.validate()?;

        let updated = self.gateway.update_product(id, &update).await?;
        info!(product_id = %updated.id, "Product updated");
        Ok(updated)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Gateway` if the request fails.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), CatalogError> {
        self.gateway.delete_product(id).await?;
        info!(product_id = %id, "Product deleted");
        Ok(())
    }
}

/// Parse a product id from user or route input.
///
/// # Errors
///
/// Returns `CatalogError::InvalidProductId` if `raw` is not an integer.
pub fn parse_product_id(raw: &str) -> Result<ProductId, CatalogError> {
    raw.parse()
        .map_err(|_| CatalogError::InvalidProductId(raw.to_string()))
}
