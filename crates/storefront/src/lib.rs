//! Tote storefront library.
//!
//! Client-side state for a shop front: a product catalog merged from a
//! bundled list and the remote API, an optimistic cart and wishlist kept in
//! step with the remote stores, and checkout assembly.
//!
//! # Modules
//!
//! - [`storefront`] - The context that ties everything to a shopper identity
//! - [`cart`], [`wishlist`] - Optimistic engines with fire-and-forget sync
//! - [`catalog`] - Local/remote catalog merge and lookup
//! - [`checkout`] - Order draft assembly and submission
//! - [`remote`] - Store traits plus HTTP and in-memory backends

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod notice;
pub mod remote;
pub mod services;
pub mod session;
pub mod storefront;
pub mod sync;
pub mod wishlist;

pub use config::StorefrontConfig;
pub use error::{Result, StoreError};
pub use notice::{Notice, NoticeLevel};
pub use session::{Identity, Session, SessionEvent};
pub use storefront::Storefront;
