//! Order projections returned by the order service.
//!
//! Orders are read-only on the client: totals, unit prices, and subtotals
//! are whatever the server echoed back.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use emporium_core::{OrderId, OrderStatus, Price, ProductId, UserId};

use super::cart::CartItem;
use super::null_as_default;

/// An order as returned by `POST /orders` and `GET /orders/user/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_amount: Price,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<OrderLine>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
}

/// One priced line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Price,
    pub subtotal: Price,
}

/// Body of `POST /orders`. The server prices the lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub user_id: UserId,
    pub items: Vec<OrderItemRequest>,
}

/// One requested line of a new order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl CreateOrderRequest {
    /// Build an order request from the current cart lines.
    #[must_use]
    pub fn from_cart(user_id: UserId, items: &[CartItem]) -> Self {
        Self {
            user_id,
            items: items
                .iter()
                .map(|item| OrderItemRequest {
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect(),
        }
    }
}

impl Order {
    /// Parse `createdAt`, accepting RFC 3339 or a zone-less ISO date-time
    /// (interpreted as UTC).
    #[must_use]
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// Sort orders newest first. Orders without a parseable timestamp keep
/// their relative order at the end.
pub fn sort_most_recent_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| match (a.created_at_utc(), b.created_at_utc()) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}
