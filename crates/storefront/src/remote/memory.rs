//! In-process implementation of every remote store.
//!
//! Data is keyed by session token. Individual operations can be made to fail
//! on demand so callers can observe how the engines behave when the network
//! misbehaves.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use tote_core::{CartState, OrderDraft, OrderId, Product, ProductId, Size, WishlistState};

use super::{CartStore, OrderStore, ProductStore, RemoteError, WishlistStore};
use crate::session::Session;

/// Operations that can be switched into failure mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryOp {
    FetchCart,
    PutCartEntry,
    FetchWishlist,
    AddToWishlist,
    RemoveFromWishlist,
    FetchProducts,
    PlaceOrder,
}

/// Shared in-memory backend. Clones see the same data.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    carts: HashMap<String, CartState>,
    wishlists: HashMap<String, WishlistState>,
    products: Vec<Product>,
    orders: Vec<(OrderId, OrderDraft)>,
    failing: HashSet<MemoryOp>,
    cart_writes: usize,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the remote product list.
    pub fn set_products(&self, products: Vec<Product>) {
        self.inner.lock().products = products;
    }

    /// Seed the stored cart for a token.
    pub fn set_cart(&self, token: &str, cart: CartState) {
        self.inner.lock().carts.insert(token.to_string(), cart);
    }

    /// Seed the stored wishlist for a token.
    pub fn set_wishlist(&self, token: &str, wishlist: WishlistState) {
        self.inner
            .lock()
            .wishlists
            .insert(token.to_string(), wishlist);
    }

    /// Make `op` fail until [`recover`](Self::recover) is called.
    pub fn fail(&self, op: MemoryOp) {
        self.inner.lock().failing.insert(op);
    }

    pub fn recover(&self, op: MemoryOp) {
        self.inner.lock().failing.remove(&op);
    }

    /// Stored cart for a token (empty if never written).
    #[must_use]
    pub fn cart(&self, token: &str) -> CartState {
        self.inner.lock().carts.get(token).cloned().unwrap_or_default()
    }

    /// Stored wishlist for a token (empty if never written).
    #[must_use]
    pub fn wishlist(&self, token: &str) -> WishlistState {
        self.inner
            .lock()
            .wishlists
            .get(token)
            .cloned()
            .unwrap_or_default()
    }

    /// Orders accepted so far, oldest first.
    #[must_use]
    pub fn orders(&self) -> Vec<(OrderId, OrderDraft)> {
        self.inner.lock().orders.clone()
    }

    /// Number of successful cart entry writes.
    #[must_use]
    pub fn cart_writes(&self) -> usize {
        self.inner.lock().cart_writes
    }

    fn check(&self, op: MemoryOp) -> Result<(), RemoteError> {
        if self.inner.lock().failing.contains(&op) {
            return Err(RemoteError::Unavailable(format!("{op:?} is failing")));
        }
        Ok(())
    }
}

#[async_trait]
impl CartStore for MemoryBackend {
    async fn fetch_cart(&self, session: &Session) -> Result<CartState, RemoteError> {
        self.check(MemoryOp::FetchCart)?;
        Ok(self.cart(session.token()))
    }

    async fn put_cart_entry(
        &self,
        session: &Session,
        product_id: &ProductId,
        size: &Size,
        quantity: u32,
    ) -> Result<(), RemoteError> {
        self.check(MemoryOp::PutCartEntry)?;
        let mut inner = self.inner.lock();
        inner
            .carts
            .entry(session.token().to_string())
            .or_default()
            .set_quantity(product_id, size, quantity);
        inner.cart_writes += 1;
        Ok(())
    }
}

#[async_trait]
impl WishlistStore for MemoryBackend {
    async fn fetch_wishlist(&self, session: &Session) -> Result<Vec<ProductId>, RemoteError> {
        self.check(MemoryOp::FetchWishlist)?;
        Ok(self.wishlist(session.token()).iter().cloned().collect())
    }

    async fn add_to_wishlist(
        &self,
        session: &Session,
        product_id: &ProductId,
    ) -> Result<(), RemoteError> {
        self.check(MemoryOp::AddToWishlist)?;
        self.inner
            .lock()
            .wishlists
            .entry(session.token().to_string())
            .or_default()
            .insert(product_id.clone());
        Ok(())
    }

    async fn remove_from_wishlist(
        &self,
        session: &Session,
        product_id: &ProductId,
    ) -> Result<(), RemoteError> {
        self.check(MemoryOp::RemoveFromWishlist)?;
        if let Some(list) = self.inner.lock().wishlists.get_mut(session.token()) {
            list.remove(product_id);
        }
        Ok(())
    }
}

#[async_trait]
impl ProductStore for MemoryBackend {
    async fn fetch_products(&self) -> Result<Vec<Product>, RemoteError> {
        self.check(MemoryOp::FetchProducts)?;
        Ok(self.inner.lock().products.clone())
    }
}

#[async_trait]
impl OrderStore for MemoryBackend {
    async fn place_order(
        &self,
        _session: &Session,
        draft: &OrderDraft,
    ) -> Result<OrderId, RemoteError> {
        self.check(MemoryOp::PlaceOrder)?;
        let order_id = OrderId::new(uuid::Uuid::new_v4().to_string());
        self.inner
            .lock()
            .orders
            .push((order_id.clone(), draft.clone()));
        Ok(order_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_zero_deletes_entry() {
        let backend = MemoryBackend::new();
        let session = Session::new("t1");
        let id = ProductId::new("a");
        let size = Size::parse("M").unwrap();

        backend.put_cart_entry(&session, &id, &size, 3).await.unwrap();
        assert_eq!(backend.cart("t1").count(), 3);

        backend.put_cart_entry(&session, &id, &size, 0).await.unwrap();
        assert!(backend.cart("t1").is_empty());
        assert_eq!(backend.cart_writes(), 2);
    }

    #[tokio::test]
    async fn test_failure_injection_and_recovery() {
        let backend = MemoryBackend::new();
        backend.fail(MemoryOp::FetchProducts);
        assert!(matches!(
            backend.fetch_products().await,
            Err(RemoteError::Unavailable(_))
        ));
        backend.recover(MemoryOp::FetchProducts);
        assert!(backend.fetch_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_data_is_isolated_per_token() {
        let backend = MemoryBackend::new();
        backend
            .add_to_wishlist(&Session::new("alice"), &ProductId::new("a"))
            .await
            .unwrap();
        let bob = backend.fetch_wishlist(&Session::new("bob")).await.unwrap();
        assert!(bob.is_empty());
    }
}
