//! Tote Core - Shared types library.
//!
//! This crate provides the domain types used across all Tote components:
//! - `storefront` - Cart/wishlist engines, catalog cache and checkout
//! - `integration-tests` - Cross-crate behavior tests
//!
//! # Architecture
//!
//! The core crate contains only types and their invariants - no I/O, no
//! async, no HTTP clients. This keeps it lightweight and lets the cart model
//! be tested exhaustively without a runtime.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, cart/wishlist state, products, orders

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
