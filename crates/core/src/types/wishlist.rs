//! Wishlist state: a set of saved products.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// The shopper's wishlist. Each product appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WishlistState {
    items: HashSet<ProductId>,
}

impl WishlistState {
    /// Create an empty wishlist.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a product. Returns `false` if it was already present.
    pub fn insert(&mut self, product_id: ProductId) -> bool {
        self.items.insert(product_id)
    }

    /// Remove a product. Returns `false` if it was not present.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        self.items.remove(product_id)
    }

    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.items.contains(product_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProductId> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl FromIterator<ProductId> for WishlistState {
    fn from_iter<I: IntoIterator<Item = ProductId>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
