//! Account services that sit beside the cart and wishlist engines.
//!
//! # Services
//!
//! - `password_reset` - Issue and verify hashed password reset tokens

pub mod password_reset;
