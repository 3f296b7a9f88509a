//! Integration tests for Tote.
//!
//! Everything here runs against [`MemoryBackend`], so no network or API
//! server is needed:
//!
//! ```bash
//! cargo test -p tote-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_engine` - Optimistic cart behavior through the storefront
//! - `checkout` - Order assembly and submission
//! - `session_transitions` - Login, logout and mount reloads
//!
//! This library holds the shared fixtures.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use rust_decimal::Decimal;
use tote_core::{AddressForm, Product, Size};
use tote_storefront::remote::MemoryBackend;
use tote_storefront::{Session, SessionEvent, Storefront, StorefrontConfig};

/// Token used for the default shopper.
pub const TOKEN: &str = "integration-shopper";

/// Config pointing at an unused local URL with a 5.00 delivery fee.
///
/// # Panics
///
/// Panics if the fixed values fail to parse.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn config() -> StorefrontConfig {
    StorefrontConfig::from_lookup(|key| match key {
        "TOTE_API_URL" => Some("http://127.0.0.1:9".to_string()),
        "TOTE_DELIVERY_FEE" => Some("5".to_string()),
        _ => None,
    })
    .unwrap()
}

/// Parse a size label.
///
/// # Panics
///
/// Panics on a blank label.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn size(label: &str) -> Size {
    Size::parse(label).unwrap()
}

/// Bundled products: a tee at 10.00 and a cap at 7.50.
#[must_use]
pub fn local_products() -> Vec<Product> {
    vec![
        Product::new("tee", "Linen Tee", Decimal::new(1000, 2))
            .with_sizes([size("S"), size("M"), size("L")]),
        Product::new("cap", "Canvas Cap", Decimal::new(750, 2)).with_sizes([size("OS")]),
    ]
}

/// Products served by the remote list, overlapping the local tee.
#[must_use]
pub fn remote_products() -> Vec<Product> {
    vec![
        Product::new("tee", "Remote Tee", Decimal::new(9900, 2)),
        Product::new("hoodie", "Fleece Hoodie", Decimal::new(4500, 2))
            .with_sizes([size("M"), size("XL")]),
    ]
}

/// A fully filled shipping form.
#[must_use]
pub fn address_form() -> AddressForm {
    AddressForm {
        first_name: "Grace".into(),
        last_name: "Hopper".into(),
        email: "grace@navy.example".into(),
        street: "1 Compiler Row".into(),
        city: "Arlington".into(),
        state: "VA".into(),
        zipcode: "22201".into(),
        country: "US".into(),
        phone: "555-0100".into(),
    }
}

/// A backend seeded with [`remote_products`].
#[must_use]
pub fn backend() -> MemoryBackend {
    let backend = MemoryBackend::new();
    backend.set_products(remote_products());
    backend
}

/// A storefront over `backend` with the local products bundled in.
#[must_use]
pub fn storefront(backend: &MemoryBackend) -> Storefront {
    Storefront::new(config(), Arc::new(backend.clone()), local_products())
}

/// The login event for [`TOKEN`].
#[must_use]
pub fn login() -> SessionEvent {
    SessionEvent::LoggedIn(Session::new(TOKEN))
}
