//! Cart state: what the shopper currently wants to buy.
//!
//! A [`CartState`] maps each product to the sizes selected for it and the
//! quantity of each size. The map is kept normalized at all times:
//!
//! - no `(product, size)` pair ever holds a zero quantity, the pair is removed
//!   instead;
//! - no product ever maps to an empty size map, the product is removed
//!   instead.
//!
//! All mutation goes through [`CartState::increment`] and
//! [`CartState::set_quantity`], which maintain both rules.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// Errors that can occur when parsing a [`Size`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SizeError {
    /// No size was selected.
    #[error("size cannot be empty")]
    Empty,
}

/// A size variant label such as `"M"` or `"XL"`.
///
/// Sizes are opaque labels; the only constraint is that a size must be
/// selected (non-blank) before an item can go into the cart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Size(String);

impl Size {
    /// Parse a size label, rejecting blank input.
    ///
    /// # Errors
    ///
    /// Returns `SizeError::Empty` if the label is empty or whitespace.
    pub fn parse(label: &str) -> Result<Self, SizeError> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return Err(SizeError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the size label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Size {
    type Err = SizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Size {
    type Error = SizeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Size> for String {
    fn from(size: Size) -> Self {
        size.0
    }
}

/// A strictly positive item quantity.
pub type Quantity = NonZeroU32;

/// One flattened cart entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub size: Size,
    pub quantity: Quantity,
}

/// The shopper's cart: `product -> size -> quantity`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartState {
    items: HashMap<ProductId, HashMap<Size, Quantity>>,
}

impl CartState {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cart from raw remote data, dropping zero quantities and
    /// products left without sizes.
    #[must_use]
    pub fn from_raw(raw: HashMap<ProductId, HashMap<Size, u32>>) -> Self {
        let items = raw
            .into_iter()
            .filter_map(|(product_id, sizes)| {
                let sizes: HashMap<Size, Quantity> = sizes
                    .into_iter()
                    .filter_map(|(size, qty)| Quantity::new(qty).map(|q| (size, q)))
                    .collect();
                (!sizes.is_empty()).then_some((product_id, sizes))
            })
            .collect();
        Self { items }
    }

    /// Add one unit of `(product_id, size)` and return the new quantity.
    ///
    /// Saturates at `u32::MAX` rather than wrapping.
    pub fn increment(&mut self, product_id: &ProductId, size: &Size) -> Quantity {
        let sizes = self.items.entry(product_id.clone()).or_default();
        let next = sizes
            .get(size)
            .map_or(Quantity::MIN, |q| q.saturating_add(1));
        sizes.insert(size.clone(), next);
        next
    }

    /// Remove one unit of `(product_id, size)` and return the new quantity.
    ///
    /// Returns `None` when the pair is not in the cart; nothing changes in
    /// that case. A quantity of one drops the pair and yields `Some(0)`.
    pub fn decrement(&mut self, product_id: &ProductId, size: &Size) -> Option<u32> {
        let current = self.quantity(product_id, size)?;
        let next = current.get() - 1;
        self.set_quantity(product_id, size, next);
        Some(next)
    }

    /// Overwrite the quantity of `(product_id, size)`.
    ///
    /// Zero removes the pair, and the product too once it has no sizes left.
    /// Setting zero on an absent pair is a no-op.
    pub fn set_quantity(&mut self, product_id: &ProductId, size: &Size, quantity: u32) {
        match Quantity::new(quantity) {
            Some(qty) => {
                self.items
                    .entry(product_id.clone())
                    .or_default()
                    .insert(size.clone(), qty);
            }
            None => {
                if let Entry::Occupied(mut entry) = self.items.entry(product_id.clone()) {
                    entry.get_mut().remove(size);
                    if entry.get().is_empty() {
                        entry.remove();
                    }
                }
            }
        }
    }

    /// Quantity currently held for `(product_id, size)`.
    #[must_use]
    pub fn quantity(&self, product_id: &ProductId, size: &Size) -> Option<Quantity> {
        self.items.get(product_id)?.get(size).copied()
    }

    /// Sizes held for a product.
    #[must_use]
    pub fn sizes(&self, product_id: &ProductId) -> Option<&HashMap<Size, Quantity>> {
        self.items.get(product_id)
    }

    /// Total number of units across every entry.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.items
            .values()
            .flat_map(HashMap::values)
            .map(|q| u64::from(q.get()))
            .sum()
    }

    /// Iterate over every `(product, size, quantity)` entry in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = (&ProductId, &Size, Quantity)> {
        self.items
            .iter()
            .flat_map(|(id, sizes)| sizes.iter().map(move |(size, qty)| (id, size, *qty)))
    }

    /// Flattened entries sorted by product then size.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        let mut lines: Vec<CartLine> = self
            .entries()
            .map(|(product_id, size, quantity)| CartLine {
                product_id: product_id.clone(),
                size: size.clone(),
                quantity,
            })
            .collect();
        lines.sort_by(|a, b| (&a.product_id, &a.size).cmp(&(&b.product_id, &b.size)));
        lines
    }

    /// Number of distinct products in the cart.
    #[must_use]
    pub fn product_count(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}
