//! Domain models exchanged with the remote service and persisted locally.
//!
//! Wire shapes use camelCase field names to match the remote service's JSON.
//! Optional fields may arrive either absent or as an explicit `null`.

pub mod cart;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use cart::CartItem;
pub use order::{CreateOrderRequest, Order, OrderItemRequest, OrderLine};
pub use product::{Product, ProductCreate, ProductUpdate, ProductValidationError};
pub use session::{Session, SessionState};
pub use user::{AuthResponse, LoginRequest, NewUser, User};

use serde::{Deserialize, Deserializer};

/// Deserialize a field, mapping an explicit `null` to the type's default.
///
/// Pair with `#[serde(default)]` so an absent field is covered too.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
