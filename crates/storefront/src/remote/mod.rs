//! Remote collaborators: cart, wishlist, product and order stores.
//!
//! # Architecture
//!
//! - The remote stores are the source of truth; engines only hold a local
//!   optimistic copy.
//! - Each store is an object-safe async trait so engines can hold
//!   `Arc<dyn CartStore>` and move clones into spawned sync tasks.
//! - Cart writes carry absolute quantities, making them idempotent.
//!
//! # Implementations
//!
//! - [`HttpBackend`] - JSON over HTTP against the storefront API
//! - [`MemoryBackend`] - in-process store with failure injection, for tests
//!   and offline runs

mod http;
mod memory;

pub use http::HttpBackend;
pub use memory::{MemoryBackend, MemoryOp};

use async_trait::async_trait;
use thiserror::Error;

use tote_core::{CartState, OrderDraft, OrderId, Product, ProductId, Size};

use crate::session::Session;

/// Errors that can occur when talking to a remote store.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Status code.
        status: u16,
        /// First bytes of the response body.
        body: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The response envelope carried `success: false`.
    #[error("Rejected by remote: {0}")]
    Rejected(String),

    /// A required field was absent from an otherwise successful response.
    #[error("Missing field in response: {0}")]
    MissingField(&'static str),

    /// The store could not be reached or the call never completed.
    #[error("Unavailable: {0}")]
    Unavailable(String),
}

impl RemoteError {
    /// Copy of this error for a second consumer.
    ///
    /// Every variant keeps its kind except `Http` and `Parse`, whose sources
    /// cannot be cloned; those become `Unavailable` with the same message.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        match self {
            Self::Status { status, body } => Self::Status {
                status: *status,
                body: body.clone(),
            },
            Self::Rejected(message) => Self::Rejected(message.clone()),
            Self::MissingField(field) => Self::MissingField(field),
            Self::Unavailable(message) => Self::Unavailable(message.clone()),
            Self::Http(_) | Self::Parse(_) => Self::Unavailable(self.to_string()),
        }
    }
}

/// Durable per-user cart.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Load the whole cart for the session.
    async fn fetch_cart(&self, session: &Session) -> Result<CartState, RemoteError>;

    /// Upsert the absolute quantity of one entry; zero deletes it.
    async fn put_cart_entry(
        &self,
        session: &Session,
        product_id: &ProductId,
        size: &Size,
        quantity: u32,
    ) -> Result<(), RemoteError>;
}

/// Durable per-user wishlist.
#[async_trait]
pub trait WishlistStore: Send + Sync {
    async fn fetch_wishlist(&self, session: &Session) -> Result<Vec<ProductId>, RemoteError>;

    async fn add_to_wishlist(
        &self,
        session: &Session,
        product_id: &ProductId,
    ) -> Result<(), RemoteError>;

    async fn remove_from_wishlist(
        &self,
        session: &Session,
        product_id: &ProductId,
    ) -> Result<(), RemoteError>;
}

/// Remote product list.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn fetch_products(&self) -> Result<Vec<Product>, RemoteError>;
}

/// Order placement.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Submit a draft; ownership of the order passes to the store.
    async fn place_order(
        &self,
        session: &Session,
        draft: &OrderDraft,
    ) -> Result<OrderId, RemoteError>;
}
