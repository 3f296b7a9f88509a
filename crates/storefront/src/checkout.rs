//! Checkout assembly and order submission.

use rust_decimal::Decimal;
use tracing::instrument;

use tote_core::{AddressForm, CartState, OrderDraft, OrderId, OrderLine, ShippingAddress};

use crate::cart::CartEngine;
use crate::catalog::ProductCatalog;
use crate::error::{Result, StoreError, add_breadcrumb};
use crate::remote::OrderStore;
use crate::session::Identity;

/// Fold the cart into an order draft.
///
/// Lines follow catalog order, and sizes of one product are sorted. Cart
/// entries whose product is no longer in the catalog are dropped. The cart
/// itself is not modified.
///
/// # Errors
///
/// Returns `StoreError::EmptyCart` if no line could be produced.
pub fn build_draft(
    cart: &CartState,
    catalog: &ProductCatalog,
    address: ShippingAddress,
    delivery_fee: Decimal,
) -> Result<OrderDraft> {
    let mut lines = Vec::new();
    for product in catalog.products() {
        let Some(sizes) = cart.sizes(&product.id) else {
            continue;
        };
        let mut sizes: Vec<_> = sizes.iter().collect();
        sizes.sort_unstable_by(|a, b| a.0.cmp(b.0));
        lines.extend(sizes.into_iter().map(|(size, &quantity)| OrderLine {
            product: product.clone(),
            size: size.clone(),
            quantity,
        }));
    }

    OrderDraft::try_new(lines, address, delivery_fee).map_err(|_| StoreError::EmptyCart)
}

/// Validate, assemble and submit an order.
///
/// On success the local cart is emptied. On any failure the cart is left as
/// it was so the shopper can retry.
///
/// # Errors
///
/// Returns `StoreError::Unauthenticated` for guests,
/// `StoreError::InvalidAddress` for a bad form, `StoreError::EmptyCart` when
/// nothing is orderable, and `StoreError::Checkout` when submission fails.
#[instrument(skip_all, fields(items = cart.count()))]
pub async fn place_order(
    identity: &Identity,
    cart: &mut CartEngine,
    catalog: &ProductCatalog,
    form: &AddressForm,
    delivery_fee: Decimal,
    orders: &dyn OrderStore,
) -> Result<OrderId> {
    let session = identity.session()?;
    let address = form.validate()?;
    let draft = build_draft(cart.state(), catalog, address, delivery_fee)?;

    let order_id = orders
        .place_order(session, &draft)
        .await
        .map_err(StoreError::Checkout)?;

    add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order_id.as_str())]));
    tracing::info!(
        order_id = %order_id,
        lines = draft.lines().len(),
        total = %draft.total(),
        "Order placed"
    );
    cart.reset();
    Ok(order_id)
}
