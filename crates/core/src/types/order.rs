//! Immutable order snapshot assembled at checkout.

use rust_decimal::Decimal;
use serde::Serialize;

use super::address::ShippingAddress;
use super::cart::{Quantity, Size};
use super::product::Product;

/// Returned when an order would contain no lines.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("an order needs at least one line")]
pub struct EmptyOrder;

/// One purchased `(product, size)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    /// Product fields as they were when the order was drafted.
    pub product: Product,
    pub size: Size,
    pub quantity: Quantity,
}

impl OrderLine {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity.get())
    }
}

/// A finished order payload ready for submission.
///
/// Totals are computed once at construction; the draft cannot be edited
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDraft {
    lines: Vec<OrderLine>,
    address: ShippingAddress,
    subtotal: Decimal,
    delivery_fee: Decimal,
    total: Decimal,
}

impl OrderDraft {
    /// Freeze lines and address into a draft.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyOrder`] if `lines` is empty.
    pub fn try_new(
        lines: Vec<OrderLine>,
        address: ShippingAddress,
        delivery_fee: Decimal,
    ) -> Result<Self, EmptyOrder> {
        if lines.is_empty() {
            return Err(EmptyOrder);
        }
        let subtotal: Decimal = lines.iter().map(OrderLine::line_total).sum();
        Ok(Self {
            lines,
            address,
            subtotal,
            delivery_fee,
            total: subtotal + delivery_fee,
        })
    }

    #[must_use]
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    #[must_use]
    pub const fn address(&self) -> &ShippingAddress {
        &self.address
    }

    /// Sum of line totals, before delivery.
    #[must_use]
    pub const fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    #[must_use]
    pub const fn delivery_fee(&self) -> Decimal {
        self.delivery_fee
    }

    /// Subtotal plus delivery fee.
    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.total
    }

    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity.get())).sum()
    }
}
