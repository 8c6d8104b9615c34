//! Order status.
//!
//! The order service owns the set of statuses and may add new ones at any
//! time, so the client keeps the value as an opaque string instead of a
//! closed enum. Only the two statuses the client presents specially get
//! helpers.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Server-defined order status (e.g. `PENDING`, `CONFIRMED`, `CANCELLED`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct OrderStatus(String);

impl OrderStatus {
    /// Status of an order that has been accepted but not yet confirmed.
    pub const PENDING: &'static str = "PENDING";
    /// Status of an order whose payment and inventory reservation succeeded.
    pub const CONFIRMED: &'static str = "CONFIRMED";

    /// Wrap a raw status string.
    #[must_use]
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    /// The raw status string as sent by the server.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the order is still pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.0.eq_ignore_ascii_case(Self::PENDING)
    }

    /// Whether the order has been confirmed.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.0.eq_ignore_ascii_case(Self::CONFIRMED)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
