//! Emporium storefront client library.
//!
//! Client-side state and service access for the Emporium shop: a persisted
//! key-value store, the session and cart managers, and the gateway to the
//! remote catalog, inventory, order, and user services.
//!
//! Everything hangs off [`Storefront`], the root composition.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod navigation;
pub mod scope;
pub mod services;
pub mod session;
pub mod state;
pub mod store;

pub use state::Storefront;
