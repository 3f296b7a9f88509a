//! Cart engine: optimistic local cart with fire-and-forget remote sync.
//!
//! Mutations apply to the local [`CartState`] synchronously, so the UI sees
//! them immediately, and then spawn a remote write carrying the new
//! *absolute* quantity of the touched entry. The remote outcome never rolls
//! back the local change; the next [`CartEngine::reload`] heals any drift.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::instrument;

use tote_core::{CartLine, CartState, ProductId, Quantity, Size};

use crate::catalog::ProductCatalog;
use crate::error::{Result, StoreError, add_breadcrumb};
use crate::remote::CartStore;
use crate::session::{Identity, Session};
use crate::sync::{SyncDispatcher, SyncEffect, SyncHandle};

/// Owns the shopper's cart and keeps it in step with the remote store.
pub struct CartEngine {
    state: CartState,
    store: Arc<dyn CartStore>,
    dispatcher: SyncDispatcher,
}

impl CartEngine {
    /// Create an engine with an empty cart.
    #[must_use]
    pub fn new(store: Arc<dyn CartStore>, dispatcher: SyncDispatcher) -> Self {
        Self {
            state: CartState::new(),
            store,
            dispatcher,
        }
    }

    /// Add one unit of `(product_id, size)`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unauthenticated` for guests and
    /// `StoreError::MissingSize` when `size` is blank. The cart is not
    /// touched in either case.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn add_item(
        &mut self,
        identity: &Identity,
        product_id: &ProductId,
        size: &str,
    ) -> Result<SyncHandle> {
        let session = identity.session()?;
        let size = Size::parse(size).map_err(|_| StoreError::MissingSize)?;

        let quantity = self.state.increment(product_id, &size);
        add_breadcrumb(
            "cart",
            "Added item",
            Some(&[("product_id", product_id.as_str()), ("size", size.as_str())]),
        );
        Ok(self.sync(session, product_id.clone(), size, quantity.get()))
    }

    /// Overwrite the quantity of `(product_id, size)`; zero removes it.
    ///
    /// There is no upper bound. Setting zero on an entry that is not in the
    /// cart changes nothing locally but still syncs, which is harmless since
    /// the remote write is an idempotent delete.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unauthenticated` for guests and
    /// `StoreError::MissingSize` when `size` is blank.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn set_quantity(
        &mut self,
        identity: &Identity,
        product_id: &ProductId,
        size: &str,
        quantity: u32,
    ) -> Result<SyncHandle> {
        let session = identity.session()?;
        let size = Size::parse(size).map_err(|_| StoreError::MissingSize)?;

        self.state.set_quantity(product_id, &size, quantity);
        Ok(self.sync(session, product_id.clone(), size, quantity))
    }

    /// Remove `(product_id, size)` entirely.
    ///
    /// # Errors
    ///
    /// Same as [`set_quantity`](Self::set_quantity).
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn remove_item(
        &mut self,
        identity: &Identity,
        product_id: &ProductId,
        size: &str,
    ) -> Result<SyncHandle> {
        self.set_quantity(identity, product_id, size, 0)
    }

    /// Remove one unit of `(product_id, size)`.
    ///
    /// Returns `Ok(None)` without any remote call when the entry is not in
    /// the cart.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unauthenticated` for guests and
    /// `StoreError::MissingSize` when `size` is blank.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn decrement(
        &mut self,
        identity: &Identity,
        product_id: &ProductId,
        size: &str,
    ) -> Result<Option<SyncHandle>> {
        let session = identity.session()?;
        let size = Size::parse(size).map_err(|_| StoreError::MissingSize)?;

        Ok(self
            .state
            .decrement(product_id, &size)
            .map(|quantity| self.sync(session, product_id.clone(), size, quantity)))
    }

    /// Replace the local cart with the remote one.
    ///
    /// Guests get an empty cart without any remote call.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::RemoteSync` when the fetch fails; the local cart
    /// keeps its last known value in that case.
    #[instrument(skip(self, identity), fields(authenticated = identity.is_authenticated()))]
    pub async fn reload(&mut self, identity: &Identity) -> Result<()> {
        let Identity::Shopper(session) = identity else {
            self.reset();
            return Ok(());
        };

        match self.store.fetch_cart(session).await {
            Ok(remote) => {
                tracing::debug!(count = remote.count(), "Cart reloaded");
                self.state = remote;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cart reload failed, keeping local cart");
                Err(StoreError::RemoteSync(e))
            }
        }
    }

    /// Empty the local cart. The remote store is not touched.
    pub fn reset(&mut self) {
        self.state.clear();
    }

    /// Total number of units in the cart.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.state.count()
    }

    /// Sum of unit price times quantity over every entry.
    ///
    /// Entries whose product is not in `catalog` contribute nothing.
    #[must_use]
    pub fn amount(&self, catalog: &ProductCatalog) -> Decimal {
        self.state
            .entries()
            .filter_map(|(product_id, _, quantity)| {
                catalog
                    .price_of(product_id)
                    .map(|price| price * Decimal::from(quantity.get()))
            })
            .sum()
    }

    #[must_use]
    pub const fn state(&self) -> &CartState {
        &self.state
    }

    #[must_use]
    pub fn quantity(&self, product_id: &ProductId, size: &Size) -> Option<Quantity> {
        self.state.quantity(product_id, size)
    }

    /// Flattened entries for rendering, sorted by product then size.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.state.lines()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    fn sync(&self, session: &Session, product_id: ProductId, size: Size, quantity: u32) -> SyncHandle {
        let effect = SyncEffect::CartEntry {
            product_id: product_id.clone(),
            size: size.clone(),
            quantity,
        };
        let store = Arc::clone(&self.store);
        let session = session.clone();
        self.dispatcher.dispatch(effect, async move {
            store
                .put_cart_entry(&session, &product_id, &size, quantity)
                .await
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::remote::{MemoryBackend, MemoryOp, RemoteError};
    use tote_core::Product;

    fn shopper() -> Identity {
        Identity::Shopper(Session::new("tok"))
    }

    fn pid(s: &str) -> ProductId {
        ProductId::new(s)
    }

    fn size(s: &str) -> Size {
        Size::parse(s).unwrap()
    }

    fn engine(backend: &MemoryBackend) -> CartEngine {
        CartEngine::new(Arc::new(backend.clone()), SyncDispatcher::detached())
    }

    #[tokio::test]
    async fn test_add_requires_session() {
        let backend = MemoryBackend::new();
        let mut cart = engine(&backend);

        let err = cart.add_item(&Identity::Guest, &pid("a"), "M").unwrap_err();
        assert!(matches!(err, StoreError::Unauthenticated));
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_add_requires_size() {
        let backend = MemoryBackend::new();
        let mut cart = engine(&backend);

        let err = cart.add_item(&shopper(), &pid("a"), "").unwrap_err();
        assert!(matches!(err, StoreError::MissingSize));
        assert!(cart.is_empty());
        assert_eq!(backend.cart_writes(), 0);
    }

    #[tokio::test]
    async fn test_add_syncs_absolute_quantity() {
        let backend = MemoryBackend::new();
        let mut cart = engine(&backend);

        cart.add_item(&shopper(), &pid("a"), "M").unwrap().settled().await.unwrap();
        let handle = cart.add_item(&shopper(), &pid("a"), "M").unwrap();
        assert_eq!(
            handle.effect(),
            &SyncEffect::CartEntry {
                product_id: pid("a"),
                size: size("M"),
                quantity: 2,
            }
        );
        handle.settled().await.unwrap();

        assert_eq!(cart.count(), 2);
        assert_eq!(backend.cart("tok").count(), 2);
    }

    #[tokio::test]
    async fn test_remote_failure_keeps_local_change() {
        let backend = MemoryBackend::new();
        backend.fail(MemoryOp::PutCartEntry);
        let mut cart = engine(&backend);

        let handle = cart.add_item(&shopper(), &pid("a"), "L").unwrap();
        assert!(matches!(
            handle.settled().await,
            Err(RemoteError::Unavailable(_))
        ));
        assert_eq!(cart.quantity(&pid("a"), &size("L")).unwrap().get(), 1);
        assert!(backend.cart("tok").is_empty());
    }

    #[tokio::test]
    async fn test_set_zero_is_idempotent() {
        let backend = MemoryBackend::new();
        let mut cart = engine(&backend);
        cart.set_quantity(&shopper(), &pid("a"), "M", 3).unwrap();
        cart.set_quantity(&shopper(), &pid("b"), "S", 1).unwrap();

        cart.remove_item(&shopper(), &pid("a"), "M").unwrap();
        assert_eq!(cart.count(), 1);
        cart.remove_item(&shopper(), &pid("a"), "M").unwrap();
        assert_eq!(cart.count(), 1);
        assert!(cart.state().sizes(&pid("a")).is_none());
    }

    #[tokio::test]
    async fn test_decrement_absent_entry_is_silent() {
        let backend = MemoryBackend::new();
        let mut cart = engine(&backend);
        assert!(cart.decrement(&shopper(), &pid("a"), "M").unwrap().is_none());

        cart.set_quantity(&shopper(), &pid("a"), "M", 1).unwrap().settled().await.unwrap();
        let handle = cart.decrement(&shopper(), &pid("a"), "M").unwrap().unwrap();
        handle.settled().await.unwrap();
        assert!(cart.is_empty());
        assert!(backend.cart("tok").is_empty());
    }

    #[tokio::test]
    async fn test_reload_replaces_state() {
        let backend = MemoryBackend::new();
        let mut remote = CartState::new();
        remote.set_quantity(&pid("x"), &size("XL"), 4);
        backend.set_cart("tok", remote.clone());

        let mut cart = engine(&backend);
        cart.set_quantity(&shopper(), &pid("local"), "M", 1).unwrap();
        cart.reload(&shopper()).await.unwrap();
        assert_eq!(cart.state(), &remote);
    }

    #[tokio::test]
    async fn test_reload_failure_keeps_state() {
        let backend = MemoryBackend::new();
        let mut cart = engine(&backend);
        cart.set_quantity(&shopper(), &pid("a"), "M", 2).unwrap();
        let before = cart.state().clone();

        backend.fail(MemoryOp::FetchCart);
        let err = cart.reload(&shopper()).await.unwrap_err();
        assert!(matches!(err, StoreError::RemoteSync(_)));
        assert_eq!(cart.state(), &before);
    }

    #[tokio::test]
    async fn test_reload_as_guest_clears() {
        let backend = MemoryBackend::new();
        let mut cart = engine(&backend);
        cart.set_quantity(&shopper(), &pid("a"), "M", 2).unwrap();
        cart.reload(&Identity::Guest).await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_amount_ignores_unknown_products() {
        let backend = MemoryBackend::new();
        let mut cart = engine(&backend);
        cart.set_quantity(&shopper(), &pid("known"), "M", 3).unwrap();
        cart.set_quantity(&shopper(), &pid("gone"), "M", 5).unwrap();

        let catalog =
            ProductCatalog::from_products([Product::new("known", "Tee", Decimal::new(1250, 2))]);
        assert_eq!(cart.amount(&catalog), Decimal::new(3750, 2));
        assert_eq!(cart.count(), 8);
    }

    #[tokio::test]
    async fn test_reset_does_not_touch_remote() {
        let backend = MemoryBackend::new();
        let mut cart = engine(&backend);
        cart.add_item(&shopper(), &pid("a"), "M").unwrap().settled().await.unwrap();

        cart.reset();
        assert!(cart.is_empty());
        assert_eq!(backend.cart("tok").count(), 1);
    }
}
