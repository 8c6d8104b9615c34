//! Catalog product types and client-side validation for the admin forms.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use emporium_core::{Price, ProductId};

use super::null_as_default;

/// Minimum product name length (characters).
pub const NAME_MIN_CHARS: usize = 2;
/// Maximum product name length (characters).
pub const NAME_MAX_CHARS: usize = 200;
/// Maximum description length (characters).
pub const DESCRIPTION_MAX_CHARS: usize = 1000;
/// Maximum category length (characters).
pub const CATEGORY_MAX_CHARS: usize = 100;

/// A product as listed by the catalog service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub price: Price,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default = "default_active", deserialize_with = "active_or_default")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

const fn default_active() -> bool {
    true
}

fn active_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_else(default_active))
}

/// Body of `POST /products`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductCreate {
    pub name: String,
    pub description: String,
    #[serde(serialize_with = "price_as_number")]
    pub price: Price,
    pub category: String,
}

/// Body of `PUT /products/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "optional_price_as_number"
    )]
    pub price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Reasons a product form is rejected before it is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductValidationError {
    #[error("name must be between {min} and {max} characters")]
    NameLength { min: usize, max: usize },
    #[error("description must be at most {max} characters")]
    DescriptionTooLong { max: usize },
    #[error("price must be at least 0.01")]
    PriceTooLow,
    #[error("category is required")]
    CategoryRequired,
    #[error("category must be at most {max} characters")]
    CategoryTooLong { max: usize },
    #[error("nothing to update")]
    EmptyUpdate,
}

impl ProductCreate {
    /// Check the form the same way the catalog service will.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProductValidationError`] found.
    pub fn validate(&self) -> Result<(), ProductValidationError> {
        validate_name(&self.name)?;
        validate_description(&self.description)?;
        validate_price(self.price)?;
        validate_category(&self.category)
    }
}

impl ProductUpdate {
    /// Validate the fields that are present.
    ///
    /// # Errors
    ///
    /// Returns [`ProductValidationError::EmptyUpdate`] when no field is set,
    /// otherwise the first field-level error found.
    pub fn validate(&self) -> Result<(), ProductValidationError> {
        if self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.category.is_none()
        {
            return Err(ProductValidationError::EmptyUpdate);
        }
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(category) = &self.category {
            validate_category(category)?;
        }
        Ok(())
    }
}

impl From<&Product> for ProductCreate {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            category: product.category.clone(),
        }
    }
}

fn validate_name(name: &str) -> Result<(), ProductValidationError> {
    let len = name.trim().chars().count();
    if (NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
        Ok(())
    } else {
        Err(ProductValidationError::NameLength {
            min: NAME_MIN_CHARS,
            max: NAME_MAX_CHARS,
        })
    }
}

fn validate_description(description: &str) -> Result<(), ProductValidationError> {
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(ProductValidationError::DescriptionTooLong {
            max: DESCRIPTION_MAX_CHARS,
        });
    }
    Ok(())
}

fn validate_price(price: Price) -> Result<(), ProductValidationError> {
    if price >= Price::from_cents(1) {
        Ok(())
    } else {
        Err(ProductValidationError::PriceTooLow)
    }
}

fn validate_category(category: &str) -> Result<(), ProductValidationError> {
    let category = category.trim();
    if category.is_empty() {
        return Err(ProductValidationError::CategoryRequired);
    }
    if category.chars().count() > CATEGORY_MAX_CHARS {
        return Err(ProductValidationError::CategoryTooLong {
            max: CATEGORY_MAX_CHARS,
        });
    }
    Ok(())
}

// The catalog service expects prices as JSON numbers.
fn price_as_number<S: Serializer>(price: &Price, serializer: S) -> Result<S::Ok, S::Error> {
    rust_decimal::serde::float::serialize(&price.amount(), serializer)
}

fn optional_price_as_number<S: Serializer>(
    price: &Option<Price>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match price {
        Some(price) => price_as_number(price, serializer),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> ProductCreate {
        ProductCreate {
            name: "Widget".to_string(),
            description: "A fine widget".to_string(),
            price: Price::from_cents(999),
            category: "tools".to_string(),
        }
    }

    #[test]
    fn test_valid_form() {
        assert_eq!(form().validate(), Ok(()));
    }

    #[test]
    fn test_name_bounds() {
        let mut f = form();
        f.name = "W".to_string();
        assert!(matches!(
            f.validate(),
            Err(ProductValidationError::NameLength { .. })
        ));
        f.name = "x".repeat(NAME_MAX_CHARS + 1);
        assert!(f.validate().is_err());
    }

    #[test]
    fn test_price_minimum_is_one_cent() {
        let mut f = form();
        f.price = Price::ZERO;
        assert_eq!(f.validate(), Err(ProductValidationError::PriceTooLow));
        f.price = "0.001".parse().unwrap();
        assert_eq!(f.validate(), Err(ProductValidationError::PriceTooLow));
        f.price = "0.01".parse().unwrap();
        assert_eq!(f.validate(), Ok(()));

        let update = ProductUpdate {
            price: Some("0.009".parse().unwrap()),
            ..ProductUpdate::default()
        };
        assert_eq!(update.validate(), Err(ProductValidationError::PriceTooLow));
    }

    #[test]
    fn test_category_required() {
        let mut f = form();
        f.category = "  ".to_string();
        assert_eq!(f.validate(), Err(ProductValidationError::CategoryRequired));
    }

    #[test]
    fn test_price_serialized_as_number() {
        let json = serde_json::to_value(form()).unwrap();
        assert_eq!(json["price"], serde_json::json!(9.99));
    }

    #[test]
    fn test_update_serializes_only_present_fields() {
        let update = ProductUpdate {
            price: Some(Price::from_cents(1250)),
            ..ProductUpdate::default()
        };
        assert_eq!(update.validate(), Ok(()));
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({"price": 12.5})
        );
    }

    #[test]
    fn test_empty_update_rejected() {
        assert_eq!(
            ProductUpdate::default().validate(),
            Err(ProductValidationError::EmptyUpdate)
        );
    }

    #[test]
    fn test_product_defaults() {
        let product: Product =
            serde_json::from_str(r#"{"id":1,"name":"Widget","price":9.99}"#).unwrap();
        assert!(product.active);
        assert_eq!(product.price, Price::from_cents(999));
        assert!(product.description.is_empty());
    }

    #[test]
    fn test_product_null_fields_use_defaults() {
        let products: Vec<Product> = serde_json::from_str(
            r#"[{"id":1,"name":"Widget","description":null,"price":9.99,"category":null,"active":null}]"#,
        )
        .unwrap();
        assert_eq!(products.len(), 1);
        assert!(products[0].description.is_empty());
        assert!(products[0].category.is_empty());
        assert!(products[0].active);
    }
}
