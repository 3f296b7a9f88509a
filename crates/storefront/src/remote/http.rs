//! JSON-over-HTTP implementation of the remote stores.
//!
//! Speaks the storefront API: every response is an envelope with a
//! `success` flag and an optional `message`, authenticated calls carry the
//! session token in a `token` header.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, instrument};

use tote_core::{
    CartState, OrderDraft, OrderId, OrderLine, Product, ProductId, ShippingAddress, Size,
};

use super::{CartStore, OrderStore, ProductStore, RemoteError, WishlistStore};
use crate::config::StorefrontConfig;
use crate::session::Session;

/// Maximum characters of a response body kept in errors and logs.
const BODY_SNIPPET_LEN: usize = 200;

// =============================================================================
// HttpBackend
// =============================================================================

/// Client for the storefront API.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct HttpBackend {
    inner: Arc<HttpBackendInner>,
}

struct HttpBackendInner {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpBackendInner {
                client,
                base_url: config.api_url.as_str().trim_end_matches('/').to_string(),
            }),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// POST a JSON body and decode the envelope.
    async fn post<B, R>(
        &self,
        path: &str,
        session: Option<&Session>,
        body: &B,
    ) -> Result<R, RemoteError>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned + Envelope,
    {
        let mut request = self.inner.client.post(self.endpoint(path)).json(body);
        if let Some(session) = session {
            request = request.header("token", session.token());
        }
        decode(request.send().await?).await
    }

    /// GET and decode the envelope.
    async fn get<R>(&self, path: &str) -> Result<R, RemoteError>
    where
        R: DeserializeOwned + Envelope,
    {
        decode(self.inner.client.get(self.endpoint(path)).send().await?).await
    }
}

/// Check status, then hand the body to [`parse_envelope`].
async fn decode<R>(response: reqwest::Response) -> Result<R, RemoteError>
where
    R: DeserializeOwned + Envelope,
{
    let status = response.status();
    // Read as text first for better error diagnostics
    let text = response.text().await?;

    if !status.is_success() {
        tracing::error!(
            status = %status,
            body = %snippet(&text),
            "Storefront API returned non-success status"
        );
        return Err(RemoteError::Status {
            status: status.as_u16(),
            body: snippet(&text),
        });
    }

    parse_envelope(&text)
}

/// Parse a response body and enforce the `success` flag.
fn parse_envelope<R>(text: &str) -> Result<R, RemoteError>
where
    R: DeserializeOwned + Envelope,
{
    let parsed: R = serde_json::from_str(text).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %snippet(text),
            "Failed to parse storefront API response"
        );
        RemoteError::Parse(e)
    })?;

    if !parsed.success() {
        let message = parsed
            .message()
            .unwrap_or("request was not successful")
            .to_string();
        debug!(message = %message, "Storefront API rejected request");
        return Err(RemoteError::Rejected(message));
    }

    Ok(parsed)
}

fn snippet(text: &str) -> String {
    text.chars().take(BODY_SNIPPET_LEN).collect()
}

// =============================================================================
// Wire Types
// =============================================================================

/// Common accessors of every response envelope.
trait Envelope {
    fn success(&self) -> bool;
    fn message(&self) -> Option<&str>;
}

macro_rules! envelope {
    ($name:ident { $($field:tt)* }) => {
        #[derive(Debug, Deserialize)]
        struct $name {
            success: bool,
            #[serde(default)]
            message: Option<String>,
            $($field)*
        }

        impl Envelope for $name {
            fn success(&self) -> bool {
                self.success
            }

            fn message(&self) -> Option<&str> {
                self.message.as_deref()
            }
        }
    };
}

envelope!(Ack {});

envelope!(CartResponse {
    #[serde(rename = "cartData", default)]
    cart_data: HashMap<String, HashMap<String, serde_json::Value>>,
});

envelope!(WishlistResponse {
    #[serde(default)]
    wishlist: Vec<String>,
});

envelope!(ProductsResponse {
    #[serde(default)]
    products: Vec<ProductPayload>,
});

envelope!(OrderResponse {
    #[serde(rename = "orderId", alias = "_id", default)]
    order_id: Option<String>,
});

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CartEntryRequest<'a> {
    item_id: &'a str,
    size: &'a str,
    item_quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemRequest<'a> {
    item_id: &'a str,
}

/// Product as served by the product list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductPayload {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
    #[serde(rename = "image", default)]
    images: Vec<String>,
    #[serde(default)]
    category: String,
    #[serde(default)]
    sub_category: String,
    #[serde(default)]
    sizes: Vec<String>,
    #[serde(default)]
    bestseller: bool,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    date: Option<i64>,
}

impl From<ProductPayload> for Product {
    fn from(payload: ProductPayload) -> Self {
        Self {
            id: ProductId::new(payload.id),
            name: payload.name,
            description: payload.description,
            price: payload.price,
            images: payload.images,
            category: payload.category,
            sub_category: payload.sub_category,
            sizes: payload
                .sizes
                .iter()
                .filter_map(|s| Size::parse(s).ok())
                .collect(),
            bestseller: payload.bestseller,
            date: payload.date.and_then(DateTime::<Utc>::from_timestamp_millis),
        }
    }
}

impl From<&Product> for ProductPayload {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            images: product.images.clone(),
            category: product.category.clone(),
            sub_category: product.sub_category.clone(),
            sizes: product.sizes.iter().map(ToString::to_string).collect(),
            bestseller: product.bestseller,
            date: product.date.map(|d| d.timestamp_millis()),
        }
    }
}

/// One order line: the product snapshot flattened with size and quantity.
#[derive(Debug, Serialize)]
struct OrderItemPayload {
    #[serde(flatten)]
    product: ProductPayload,
    size: String,
    quantity: u32,
}

impl From<&OrderLine> for OrderItemPayload {
    fn from(line: &OrderLine) -> Self {
        Self {
            product: ProductPayload::from(&line.product),
            size: line.size.to_string(),
            quantity: line.quantity.get(),
        }
    }
}

#[derive(Debug, Serialize)]
struct OrderRequest<'a> {
    address: &'a ShippingAddress,
    items: Vec<OrderItemPayload>,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
}

/// Normalize the raw nested cart map.
///
/// Blank sizes and quantities that are not positive integers are dropped
/// entry by entry, so one bad value never fails the whole cart.
fn cart_from_wire(raw: HashMap<String, HashMap<String, serde_json::Value>>) -> CartState {
    let typed = raw
        .into_iter()
        .map(|(product_id, sizes)| {
            let sizes = sizes
                .into_iter()
                .filter_map(|(size, qty)| {
                    let size = Size::parse(&size).ok()?;
                    let qty = qty.as_u64().and_then(|q| u32::try_from(q).ok())?;
                    Some((size, qty))
                })
                .collect();
            (ProductId::new(product_id), sizes)
        })
        .collect();
    CartState::from_raw(typed)
}

// =============================================================================
// Store Implementations
// =============================================================================

#[async_trait]
impl CartStore for HttpBackend {
    #[instrument(skip(self, session))]
    async fn fetch_cart(&self, session: &Session) -> Result<CartState, RemoteError> {
        let response: CartResponse = self
            .post("/api/user/get-cart", Some(session), &serde_json::json!({}))
            .await?;
        Ok(cart_from_wire(response.cart_data))
    }

    #[instrument(skip(self, session), fields(product_id = %product_id, size = %size))]
    async fn put_cart_entry(
        &self,
        session: &Session,
        product_id: &ProductId,
        size: &Size,
        quantity: u32,
    ) -> Result<(), RemoteError> {
        let body = CartEntryRequest {
            item_id: product_id.as_str(),
            size: size.as_str(),
            item_quantity: quantity,
        };
        let _: Ack = self
            .post("/api/user/add-to-cart", Some(session), &body)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl WishlistStore for HttpBackend {
    #[instrument(skip(self, session))]
    async fn fetch_wishlist(&self, session: &Session) -> Result<Vec<ProductId>, RemoteError> {
        let response: WishlistResponse = self
            .post("/api/user/get-wishlist", Some(session), &serde_json::json!({}))
            .await?;
        Ok(response.wishlist.into_iter().map(ProductId::new).collect())
    }

    #[instrument(skip(self, session), fields(product_id = %product_id))]
    async fn add_to_wishlist(
        &self,
        session: &Session,
        product_id: &ProductId,
    ) -> Result<(), RemoteError> {
        let body = ItemRequest {
            item_id: product_id.as_str(),
        };
        let _: Ack = self
            .post("/api/user/add-to-wishlist", Some(session), &body)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, session), fields(product_id = %product_id))]
    async fn remove_from_wishlist(
        &self,
        session: &Session,
        product_id: &ProductId,
    ) -> Result<(), RemoteError> {
        let body = ItemRequest {
            item_id: product_id.as_str(),
        };
        let _: Ack = self
            .post("/api/user/remove-from-wishlist", Some(session), &body)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ProductStore for HttpBackend {
    #[instrument(skip(self))]
    async fn fetch_products(&self) -> Result<Vec<Product>, RemoteError> {
        let response: ProductsResponse = self.get("/api/product/list").await?;
        debug!(count = response.products.len(), "Fetched remote products");
        Ok(response.products.into_iter().map(Product::from).collect())
    }
}

#[async_trait]
impl OrderStore for HttpBackend {
    #[instrument(skip(self, session, draft), fields(lines = draft.lines().len()))]
    async fn place_order(
        &self,
        session: &Session,
        draft: &OrderDraft,
    ) -> Result<OrderId, RemoteError> {
        let body = OrderRequest {
            address: draft.address(),
            items: draft.lines().iter().map(OrderItemPayload::from).collect(),
            amount: draft.total(),
        };
        let response: OrderResponse = self
            .post("/api/order/place", Some(session), &body)
            .await?;
        response
            .order_id
            .map(OrderId::new)
            .ok_or(RemoteError::MissingField("orderId"))
    }
}
