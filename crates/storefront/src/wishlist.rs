//! Wishlist engine: a set of saved product ids with optimistic remote sync.

use std::sync::Arc;

use tracing::instrument;

use tote_core::{Product, ProductId, WishlistState};

use crate::catalog::ProductCatalog;
use crate::error::{Result, StoreError, add_breadcrumb};
use crate::remote::WishlistStore;
use crate::session::Identity;
use crate::sync::{SyncDispatcher, SyncEffect, SyncHandle};

/// Result of [`WishlistEngine::toggle`].
#[derive(Debug)]
pub enum Toggled {
    Added(SyncHandle),
    Removed(SyncHandle),
}

impl Toggled {
    #[must_use]
    pub const fn is_added(&self) -> bool {
        matches!(self, Self::Added(_))
    }

    /// The in-flight remote write.
    #[must_use]
    pub fn into_handle(self) -> SyncHandle {
        match self {
            Self::Added(handle) | Self::Removed(handle) => handle,
        }
    }
}

pub struct WishlistEngine {
    state: WishlistState,
    store: Arc<dyn WishlistStore>,
    dispatcher: SyncDispatcher,
}

impl WishlistEngine {
    #[must_use]
    pub fn new(store: Arc<dyn WishlistStore>, dispatcher: SyncDispatcher) -> Self {
        Self {
            state: WishlistState::new(),
            store,
            dispatcher,
        }
    }

    /// Save a product.
    ///
    /// Returns `Ok(None)` without a remote call when the product is already
    /// saved.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unauthenticated` for guests.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn add(&mut self, identity: &Identity, product_id: &ProductId) -> Result<Option<SyncHandle>> {
        let session = identity.session()?.clone();
        if !self.state.insert(product_id.clone()) {
            return Ok(None);
        }

        add_breadcrumb("wishlist", "Saved product", Some(&[("product_id", product_id.as_str())]));
        let store = Arc::clone(&self.store);
        let id = product_id.clone();
        let handle = self.dispatcher.dispatch(
            SyncEffect::WishlistAdd {
                product_id: product_id.clone(),
            },
            async move { store.add_to_wishlist(&session, &id).await },
        );
        Ok(Some(handle))
    }

    /// Forget a product.
    ///
    /// Removing an id that is not saved still issues the remote delete.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unauthenticated` for guests.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn remove(&mut self, identity: &Identity, product_id: &ProductId) -> Result<SyncHandle> {
        let session = identity.session()?.clone();
        self.state.remove(product_id);

        let store = Arc::clone(&self.store);
        let id = product_id.clone();
        Ok(self.dispatcher.dispatch(
            SyncEffect::WishlistRemove {
                product_id: product_id.clone(),
            },
            async move { store.remove_from_wishlist(&session, &id).await },
        ))
    }

    /// Add the product if absent, remove it otherwise.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unauthenticated` for guests.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn toggle(&mut self, identity: &Identity, product_id: &ProductId) -> Result<Toggled> {
        match self.add(identity, product_id)? {
            Some(handle) => Ok(Toggled::Added(handle)),
            None => self.remove(identity, product_id).map(Toggled::Removed),
        }
    }

    /// Replace the local wishlist with the remote one.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::RemoteSync` when the fetch fails; the local set
    /// is left untouched.
    #[instrument(skip(self, identity), fields(authenticated = identity.is_authenticated()))]
    pub async fn reload(&mut self, identity: &Identity) -> Result<()> {
        let Identity::Shopper(session) = identity else {
            self.reset();
            return Ok(());
        };

        match self.store.fetch_wishlist(session).await {
            Ok(ids) => {
                self.state = ids.into_iter().collect();
                tracing::debug!(saved = self.state.len(), "Wishlist reloaded");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Wishlist reload failed, keeping local wishlist");
                Err(StoreError::RemoteSync(e))
            }
        }
    }

    pub fn reset(&mut self) {
        self.state.clear();
    }

    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.state.contains(product_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    #[must_use]
    pub const fn state(&self) -> &WishlistState {
        &self.state
    }

    /// Saved products that exist in `catalog`, in catalog order.
    #[must_use]
    pub fn products<'c>(&self, catalog: &'c ProductCatalog) -> Vec<&'c Product> {
        catalog
            .products()
            .iter()
            .filter(|p| self.state.contains(&p.id))
            .collect()
    }
}
