//! Storefront operations built on the gateway and local state.
//!
//! # Services
//!
//! - `auth` - Login, registration, logout
//! - `checkout` - Order placement and stock checks
//! - `catalog` - Product browsing and admin product management
//! - `orders` - Order history

pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod orders;
