//! The storefront context: one place that owns identity, catalog, cart and
//! wishlist, and turns every outcome into a [`Notice`] for the UI.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::instrument;

use tote_core::{AddressForm, Price, Product, ProductId};

use crate::cart::CartEngine;
use crate::catalog::{CatalogCache, CatalogSource, ProductCatalog};
use crate::checkout;
use crate::config::StorefrontConfig;
use crate::error::{StoreError, clear_sentry_user, set_sentry_user};
use crate::notice::Notice;
use crate::remote::{CartStore, OrderStore, ProductStore, WishlistStore};
use crate::session::{Identity, SessionEvent};
use crate::sync::{SyncDispatcher, SyncFailure, SyncHandle};
use crate::wishlist::{Toggled, WishlistEngine};

/// Shopper-facing state container.
pub struct Storefront {
    config: StorefrontConfig,
    identity: Identity,
    catalog: CatalogCache,
    cart: CartEngine,
    wishlist: WishlistEngine,
    orders: Arc<dyn OrderStore>,
    in_flight: Vec<SyncHandle>,
    failures: mpsc::UnboundedReceiver<SyncFailure>,
}

impl Storefront {
    /// Wire a storefront over a backend implementing every store.
    ///
    /// Starts as a guest with a local-only catalog; send
    /// [`SessionEvent::Mounted`] or [`SessionEvent::LoggedIn`] to load data.
    #[must_use]
    pub fn new<B>(config: StorefrontConfig, backend: Arc<B>, local_products: Vec<Product>) -> Self
    where
        B: CartStore + WishlistStore + ProductStore + OrderStore + 'static,
    {
        let (dispatcher, failures) = SyncDispatcher::reporting();
        let carts: Arc<dyn CartStore> = backend.clone();
        let wishlists: Arc<dyn WishlistStore> = backend.clone();
        let products: Arc<dyn ProductStore> = backend.clone();
        let orders: Arc<dyn OrderStore> = backend;

        Self {
            config,
            identity: Identity::Guest,
            catalog: CatalogCache::new(local_products, products),
            cart: CartEngine::new(carts, dispatcher.clone()),
            wishlist: WishlistEngine::new(wishlists, dispatcher),
            orders,
            in_flight: Vec::new(),
            failures,
        }
    }

    /// Apply an identity transition and reload everything it invalidates.
    #[instrument(skip_all, fields(event = event_name(&event)))]
    pub async fn handle(&mut self, event: SessionEvent) -> Vec<Notice> {
        let mut notices = Vec::new();

        match event {
            SessionEvent::Mounted => {}
            SessionEvent::LoggedIn(session) => {
                if let Some(user_id) = session.user_id() {
                    set_sentry_user(user_id);
                }
                let same_shopper = matches!(
                    &self.identity,
                    Identity::Shopper(current) if current.token() == session.token()
                );
                // Another shopper's data must not survive a failed reload.
                if !same_shopper {
                    self.cart.reset();
                    self.wishlist.reset();
                }
                self.identity = Identity::Shopper(session);
            }
            SessionEvent::LoggedOut => {
                clear_sentry_user();
                self.identity = Identity::Guest;
                self.cart.reset();
                self.wishlist.reset();
            }
        }

        match self.catalog.refresh().await {
            Ok(CatalogSource::Merged { remote }) => {
                tracing::info!(remote, total = self.catalog.catalog().len(), "Catalog loaded");
            }
            Ok(CatalogSource::LocalOnly) => {
                tracing::info!("Remote catalog empty, showing local products");
            }
            Err(e) => notices.push(surface(&e)),
        }

        if self.identity.is_authenticated() {
            if let Err(e) = self.cart.reload(&self.identity).await {
                notices.push(surface(&e));
            }
            if let Err(e) = self.wishlist.reload(&self.identity).await {
                notices.push(surface(&e));
            }
        }

        notices
    }

    pub fn add_to_cart(&mut self, product_id: &ProductId, size: &str) -> Notice {
        match self.cart.add_item(&self.identity, product_id, size) {
            Ok(handle) => {
                self.track(handle);
                Notice::success("Item Added To The Cart")
            }
            Err(e) => surface(&e),
        }
    }

    /// Set a cart entry's quantity. Success is silent.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        size: &str,
        quantity: u32,
    ) -> Option<Notice> {
        match self.cart.set_quantity(&self.identity, product_id, size, quantity) {
            Ok(handle) => {
                self.track(handle);
                None
            }
            Err(e) => Some(surface(&e)),
        }
    }

    /// Remove one unit. Success, or nothing to remove, is silent.
    pub fn decrement(&mut self, product_id: &ProductId, size: &str) -> Option<Notice> {
        match self.cart.decrement(&self.identity, product_id, size) {
            Ok(handle) => {
                if let Some(handle) = handle {
                    self.track(handle);
                }
                None
            }
            Err(e) => Some(surface(&e)),
        }
    }

    pub fn remove_from_cart(&mut self, product_id: &ProductId, size: &str) -> Option<Notice> {
        self.update_quantity(product_id, size, 0)
    }

    pub fn toggle_wishlist(&mut self, product_id: &ProductId) -> Notice {
        match self.wishlist.toggle(&self.identity, product_id) {
            Ok(toggled) => {
                let notice = if toggled.is_added() {
                    Notice::success("Item added to wishlist!")
                } else {
                    Notice::info("Item removed from wishlist.")
                };
                self.track(toggled.into_handle());
                notice
            }
            Err(e) => surface(&e),
        }
    }

    /// Check out the current cart against `form`.
    pub async fn place_order(&mut self, form: &AddressForm) -> Notice {
        let result = checkout::place_order(
            &self.identity,
            &mut self.cart,
            self.catalog.catalog(),
            form,
            self.config.delivery_fee,
            self.orders.as_ref(),
        )
        .await;

        match result {
            Ok(_) => Notice::success("Order Placed Successfully!"),
            Err(e) => surface(&e),
        }
    }

    /// Wait for every in-flight remote write to settle.
    ///
    /// Failures are still reported through
    /// [`pending_notices`](Self::pending_notices).
    pub async fn flush(&mut self) {
        for handle in std::mem::take(&mut self.in_flight) {
            // Outcome already logged and forwarded by the dispatcher.
            let _ = handle.settled().await;
        }
    }

    /// Notices for remote writes that failed since the last call.
    pub fn pending_notices(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok(failure) = self.failures.try_recv() {
            tracing::debug!(effect = %failure.effect, "Surfacing sync failure");
            notices.push(failure.error.notice());
        }
        notices
    }

    #[must_use]
    pub fn cart_count(&self) -> u64 {
        self.cart.count()
    }

    /// Cart value before delivery.
    #[must_use]
    pub fn cart_amount(&self) -> Decimal {
        self.cart.amount(self.catalog.catalog())
    }

    /// Cart value plus delivery, or zero for an empty cart.
    #[must_use]
    pub fn cart_total(&self) -> Decimal {
        let amount = self.cart_amount();
        if amount.is_zero() {
            Decimal::ZERO
        } else {
            amount + self.config.delivery_fee
        }
    }

    /// An amount in the configured currency.
    #[must_use]
    pub const fn price(&self, amount: Decimal) -> Price {
        Price::new(amount, self.config.currency)
    }

    #[must_use]
    pub const fn catalog(&self) -> &ProductCatalog {
        self.catalog.catalog()
    }

    #[must_use]
    pub const fn cart(&self) -> &CartEngine {
        &self.cart
    }

    #[must_use]
    pub const fn wishlist(&self) -> &WishlistEngine {
        &self.wishlist
    }

    /// Saved products in catalog order.
    #[must_use]
    pub fn wishlist_products(&self) -> Vec<&Product> {
        self.wishlist.products(self.catalog.catalog())
    }

    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    #[must_use]
    pub const fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    fn track(&mut self, handle: SyncHandle) {
        self.in_flight.retain(|h| !h.is_finished());
        self.in_flight.push(handle);
    }
}

/// Report remote errors and map any error to its notice.
fn surface(error: &StoreError) -> Notice {
    error.report();
    error.notice()
}

const fn event_name(event: &SessionEvent) -> &'static str {
    match event {
        SessionEvent::Mounted => "mounted",
        SessionEvent::LoggedIn(_) => "logged_in",
        SessionEvent::LoggedOut => "logged_out",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::notice::NoticeLevel;
    use crate::remote::{MemoryBackend, MemoryOp};
    use crate::session::Session;
    use tote_core::{CartState, Size};

    fn config() -> StorefrontConfig {
        StorefrontConfig::from_lookup(|key| {
            (key == "TOTE_API_URL").then(|| "http://localhost:4000".to_string())
        })
        .unwrap()
    }

    fn tee() -> Product {
        Product::new("tee", "Tee", Decimal::new(1000, 2))
    }

    fn storefront(backend: &MemoryBackend) -> Storefront {
        Storefront::new(config(), Arc::new(backend.clone()), vec![tee()])
    }

    #[tokio::test]
    async fn test_guest_add_asks_for_login() {
        let backend = MemoryBackend::new();
        let mut shop = storefront(&backend);
        shop.handle(SessionEvent::Mounted).await;

        let notice = shop.add_to_cart(&ProductId::new("tee"), "M");
        assert!(notice.login_required);
        assert_eq!(shop.cart_count(), 0);
    }

    #[tokio::test]
    async fn test_relogin_same_token_keeps_state_on_failed_reload() {
        let backend = MemoryBackend::new();
        let mut shop = storefront(&backend);
        shop.handle(SessionEvent::LoggedIn(Session::new("tok"))).await;
        shop.add_to_cart(&ProductId::new("tee"), "M");
        shop.flush().await;

        backend.fail(MemoryOp::FetchCart);
        shop.handle(SessionEvent::LoggedIn(Session::new("tok"))).await;
        assert_eq!(shop.cart_count(), 1);
    }

    #[tokio::test]
    async fn test_account_switch_clears_state_before_reload() {
        let backend = MemoryBackend::new();
        let mut shop = storefront(&backend);
        shop.handle(SessionEvent::LoggedIn(Session::new("tok"))).await;
        shop.add_to_cart(&ProductId::new("tee"), "M");
        shop.toggle_wishlist(&ProductId::new("tee"));
        shop.flush().await;

        backend.fail(MemoryOp::FetchCart);
        backend.fail(MemoryOp::FetchWishlist);
        let notices = shop.handle(SessionEvent::LoggedIn(Session::new("other"))).await;
        assert_eq!(notices.len(), 2);
        assert_eq!(shop.cart_count(), 0);
        assert!(shop.wishlist().is_empty());
    }

    #[tokio::test]
    async fn test_login_loads_remote_cart() {
        let backend = MemoryBackend::new();
        let mut remote = CartState::new();
        remote.set_quantity(&ProductId::new("tee"), &Size::parse("L").unwrap(), 2);
        backend.set_cart("tok", remote);
        let mut shop = storefront(&backend);

        let notices = shop.handle(SessionEvent::LoggedIn(Session::new("tok"))).await;
        assert!(notices.is_empty());
        assert_eq!(shop.cart_count(), 2);
        assert_eq!(shop.cart_amount(), Decimal::new(2000, 2));
        assert_eq!(shop.cart_total(), Decimal::new(3000, 2));
        assert_eq!(shop.price(shop.cart_total()).display(), "$30.00");
    }

    #[tokio::test]
    async fn test_empty_cart_total_is_zero() {
        let shop = storefront(&MemoryBackend::new());
        assert_eq!(shop.cart_total(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_logout_clears_local_state_only() {
        let backend = MemoryBackend::new();
        let mut shop = storefront(&backend);
        shop.handle(SessionEvent::LoggedIn(Session::new("tok"))).await;
        shop.add_to_cart(&ProductId::new("tee"), "M");
        shop.toggle_wishlist(&ProductId::new("tee"));
        shop.flush().await;

        shop.handle(SessionEvent::LoggedOut).await;
        assert!(!shop.identity().is_authenticated());
        assert_eq!(shop.cart_count(), 0);
        assert!(shop.wishlist().is_empty());
        assert_eq!(backend.cart("tok").count(), 1);
    }

    #[tokio::test]
    async fn test_failed_write_surfaces_later() {
        let backend = MemoryBackend::new();
        let mut shop = storefront(&backend);
        shop.handle(SessionEvent::LoggedIn(Session::new("tok"))).await;
        backend.fail(MemoryOp::PutCartEntry);

        let notice = shop.add_to_cart(&ProductId::new("tee"), "M");
        assert_eq!(notice.level, NoticeLevel::Success);
        shop.flush().await;

        let pending = shop.pending_notices();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].level, NoticeLevel::Error);
        assert_eq!(shop.cart_count(), 1);
    }

    #[tokio::test]
    async fn test_catalog_failure_notice() {
        let backend = MemoryBackend::new();
        backend.fail(MemoryOp::FetchProducts);
        let mut shop = storefront(&backend);

        let notices = shop.handle(SessionEvent::Mounted).await;
        assert_eq!(
            notices,
            vec![Notice::error("Network error, falling back to local products.")]
        );
        assert_eq!(shop.catalog().len(), 1);
    }

    #[tokio::test]
    async fn test_checkout_notice() {
        let backend = MemoryBackend::new();
        let mut shop = storefront(&backend);
        shop.handle(SessionEvent::LoggedIn(Session::new("tok"))).await;
        shop.add_to_cart(&ProductId::new("tee"), "M");

        let form = AddressForm {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            street: "1 Loop".into(),
            city: "London".into(),
            state: "LDN".into(),
            zipcode: "N1".into(),
            country: "UK".into(),
            phone: "0123".into(),
        };
        let notice = shop.place_order(&form).await;
        assert_eq!(notice, Notice::success("Order Placed Successfully!"));
        assert_eq!(shop.cart_count(), 0);
        assert_eq!(backend.orders().len(), 1);
    }
}
