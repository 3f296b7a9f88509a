//! Product records as shown in listings and snapshotted into orders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart::Size;
use super::id::ProductId;

/// A product available in the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog identity; duplicates across sources are merged on this.
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Unit price in the store currency.
    pub price: Decimal,
    /// Image URLs, first one is the thumbnail.
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sub_category: String,
    /// Sizes the shopper can pick from.
    #[serde(default)]
    pub sizes: Vec<Size>,
    #[serde(default)]
    pub bestseller: bool,
    /// When the product was listed.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl Product {
    /// Create a product with the required fields; the rest start empty.
    #[must_use]
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            price,
            images: Vec::new(),
            category: String::new(),
            sub_category: String::new(),
            sizes: Vec::new(),
            bestseller: false,
            date: None,
        }
    }

    /// Builder-style setter for available sizes.
    #[must_use]
    pub fn with_sizes(mut self, sizes: impl IntoIterator<Item = Size>) -> Self {
        self.sizes = sizes.into_iter().collect();
        self
    }

    /// Builder-style setter for images.
    #[must_use]
    pub fn with_images(mut self, images: impl IntoIterator<Item = String>) -> Self {
        self.images = images.into_iter().collect();
        self
    }

    /// First image, used as thumbnail.
    #[must_use]
    pub fn thumbnail(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_json_defaults() {
        let product: Product =
            serde_json::from_str(r#"{ "id": "a", "name": "Tee", "price": "12.50", "sizes": ["S", "M"] }"#)
                .unwrap();
        assert_eq!(product.price, Decimal::new(1250, 2));
        assert_eq!(product.sizes.len(), 2);
        assert!(product.thumbnail().is_none());
    }

    #[test]
    fn test_blank_size_in_json_is_rejected() {
        let parsed = serde_json::from_str::<Product>(
            r#"{ "id": "a", "name": "Tee", "price": "1", "sizes": ["M", ""] }"#,
        );
        assert!(parsed.is_err());
    }
}
