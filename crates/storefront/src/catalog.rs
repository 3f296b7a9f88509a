//! Product catalog: bundled products merged with the remote product list.
//!
//! The merged catalog is rebuilt wholesale on every refresh, never patched.
//! Merging concatenates `[local..., remote...]` and keeps the first product
//! seen for each id, so curated local entries win over remote duplicates and
//! the relative order of both lists is preserved.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::instrument;

use tote_core::{Product, ProductId};

use crate::error::{Result, StoreError};
use crate::remote::ProductStore;

/// An ordered, deduplicated product list with an id index.
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    products: Vec<Product>,
    index: HashMap<ProductId, usize>,
}

impl ProductCatalog {
    /// Build a catalog, keeping the first occurrence of each id.
    #[must_use]
    pub fn from_products(products: impl IntoIterator<Item = Product>) -> Self {
        let mut catalog = Self::default();
        for product in products {
            if catalog.index.contains_key(&product.id) {
                continue;
            }
            catalog
                .index
                .insert(product.id.clone(), catalog.products.len());
            catalog.products.push(product);
        }
        catalog
    }

    /// Merge the local list with a remote list, local entries first.
    #[must_use]
    pub fn merge(local: &[Product], remote: Vec<Product>) -> Self {
        Self::from_products(local.iter().cloned().chain(remote))
    }

    #[must_use]
    pub fn by_id(&self, product_id: &ProductId) -> Option<&Product> {
        self.index
            .get(product_id)
            .and_then(|&i| self.products.get(i))
    }

    /// Unit price of a product, `None` when it is not in the catalog.
    #[must_use]
    pub fn price_of(&self, product_id: &ProductId) -> Option<Decimal> {
        self.by_id(product_id).map(|p| p.price)
    }

    /// Products in catalog order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Where the current catalog came from after a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    /// Local list merged with this many remote products.
    Merged { remote: usize },
    /// The remote list was empty; only local products are shown.
    LocalOnly,
}

/// Holds the current catalog and rebuilds it from the product store.
pub struct CatalogCache {
    local: Vec<Product>,
    current: ProductCatalog,
    store: Arc<dyn ProductStore>,
}

impl CatalogCache {
    /// Start with a local-only catalog until the first refresh.
    #[must_use]
    pub fn new(local: Vec<Product>, store: Arc<dyn ProductStore>) -> Self {
        let current = ProductCatalog::from_products(local.iter().cloned());
        Self {
            local,
            current,
            store,
        }
    }

    /// The catalog as of the last refresh.
    #[must_use]
    pub const fn catalog(&self) -> &ProductCatalog {
        &self.current
    }

    /// Fetch the remote list and rebuild the catalog.
    ///
    /// On failure the catalog falls back to the local list, so it is never
    /// left empty when local products exist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::CatalogUnavailable` when the fetch failed. The
    /// error is non-fatal: the local-only catalog is already in place.
    #[instrument(skip(self), fields(local = self.local.len()))]
    pub async fn refresh(&mut self) -> Result<CatalogSource> {
        match self.store.fetch_products().await {
            Ok(remote) if !remote.is_empty() => {
                let fetched = remote.len();
                self.current = ProductCatalog::merge(&self.local, remote);
                tracing::debug!(fetched, merged = self.current.len(), "Catalog refreshed");
                Ok(CatalogSource::Merged { remote: fetched })
            }
            Ok(_) => {
                self.current = ProductCatalog::from_products(self.local.iter().cloned());
                Ok(CatalogSource::LocalOnly)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Product fetch failed, falling back to local products");
                self.current = ProductCatalog::from_products(self.local.iter().cloned());
                Err(StoreError::CatalogUnavailable(e))
            }
        }
    }
}
