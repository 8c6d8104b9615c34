//! Cart line item.

use serde::{Deserialize, Serialize};

use emporium_core::{Price, ProductId};

/// One product line in the local cart.
///
/// `name` and `unit_price` are snapshots taken when the product was added;
/// later catalog changes do not alter them. Earlier releases persisted the
/// price under `price`, which is still accepted on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(alias = "price")]
    pub unit_price: Price,
    pub quantity: u32,
}

impl CartItem {
    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}
