//! Checkout assembly and submission against the merged catalog.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use tote_core::{AddressForm, CartState, ProductId};
use tote_integration_tests::{TOKEN, address_form, backend, login, size, storefront};
use tote_storefront::NoticeLevel;
use tote_storefront::catalog::ProductCatalog;
use tote_storefront::checkout::build_draft;
use tote_storefront::remote::MemoryOp;

#[tokio::test]
async fn test_order_uses_merged_catalog_order() {
    let backend = backend();
    let mut remote = CartState::new();
    remote.set_quantity(&ProductId::new("hoodie"), &size("XL"), 1);
    remote.set_quantity(&ProductId::new("tee"), &size("S"), 2);
    remote.set_quantity(&ProductId::new("cap"), &size("OS"), 1);
    backend.set_cart(TOKEN, remote);

    let mut shop = storefront(&backend);
    shop.handle(login()).await;

    let notice = shop.place_order(&address_form()).await;
    assert_eq!(notice.level, NoticeLevel::Success);
    assert_eq!(shop.cart_count(), 0);

    let orders = backend.orders();
    assert_eq!(orders.len(), 1);
    let draft = &orders[0].1;
    let ids: Vec<_> = draft.lines().iter().map(|l| l.product.id.as_str()).collect();
    assert_eq!(ids, vec!["tee", "cap", "hoodie"]);
    // 2 x 10.00 + 7.50 + 45.00 + 5.00 delivery
    assert_eq!(draft.subtotal(), Decimal::new(7250, 2));
    assert_eq!(draft.total(), Decimal::new(7750, 2));
    assert_eq!(draft.address().full_name(), "Grace Hopper");
}

#[tokio::test]
async fn test_rejected_order_keeps_cart_for_retry() {
    let backend = backend();
    let mut shop = storefront(&backend);
    shop.handle(login()).await;
    shop.add_to_cart(&ProductId::new("tee"), "M");
    backend.fail(MemoryOp::PlaceOrder);

    let notice = shop.place_order(&address_form()).await;
    assert_eq!(notice.message, "An error occurred. Please try again.");
    assert_eq!(shop.cart_count(), 1);

    backend.recover(MemoryOp::PlaceOrder);
    let notice = shop.place_order(&address_form()).await;
    assert_eq!(notice.level, NoticeLevel::Success);
    assert_eq!(backend.orders().len(), 1);
}

#[tokio::test]
async fn test_empty_cart_checkout() {
    let backend = backend();
    let mut shop = storefront(&backend);
    shop.handle(login()).await;

    let notice = shop.place_order(&address_form()).await;
    assert_eq!(notice.message, "Your cart is empty.");
    assert!(backend.orders().is_empty());
}

#[tokio::test]
async fn test_incomplete_address_is_rejected() {
    let backend = backend();
    let mut shop = storefront(&backend);
    shop.handle(login()).await;
    shop.add_to_cart(&ProductId::new("tee"), "M");

    let form = AddressForm {
        zipcode: String::new(),
        phone: String::new(),
        ..address_form()
    };
    let notice = shop.place_order(&form).await;
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.contains("zipcode, phone"));
    assert_eq!(shop.cart_count(), 1);
}

#[test]
fn test_draft_serializes_for_submission() {
    let catalog = ProductCatalog::from_products(tote_integration_tests::local_products());
    let mut cart = CartState::new();
    cart.set_quantity(&ProductId::new("cap"), &size("OS"), 3);

    let draft = build_draft(
        &cart,
        &catalog,
        address_form().validate().unwrap(),
        Decimal::new(5, 0),
    )
    .unwrap();

    let json = serde_json::to_value(&draft).unwrap();
    assert_eq!(json["lines"].as_array().map(Vec::len), Some(1));
    assert_eq!(draft.total(), Decimal::new(2750, 2));
}
