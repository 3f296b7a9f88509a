//! Core types for Tote.
//!
//! This module provides type-safe wrappers for the storefront's domain
//! concepts: identifiers, money, the cart and wishlist models, products and
//! order drafts.

pub mod address;
pub mod cart;
pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod wishlist;

pub use address::{AddressError, AddressForm, ShippingAddress};
pub use cart::{CartLine, CartState, Quantity, Size, SizeError};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{EmptyOrder, OrderDraft, OrderLine};
pub use price::{CurrencyCode, Price, UnknownCurrency};
pub use product::Product;
pub use wishlist::WishlistState;
