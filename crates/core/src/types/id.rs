//! Newtype IDs for type-safe entity references.
//!
//! Identifiers handed out by the remote stores are opaque strings (document
//! ids, SKUs, order numbers). Use the `define_id!` macro to wrap them so a
//! product id can never be passed where an order id is expected.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<&str>`, `From<String>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use tote_core::define_id;
/// define_id!(ShopperId);
/// define_id!(ReceiptId);
///
/// let shopper = ShopperId::new("u-1");
/// let receipt = ReceiptId::new("u-1");
///
/// // Same text, different types, so this won't compile:
/// // let _: ShopperId = receipt;
/// assert_eq!(shopper.as_str(), receipt.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from anything string-like.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the underlying string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(ProductId);
define_id!(OrderId);
define_id!(UserId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_raw_identifier() {
        let id = ProductId::new("aaaab");
        assert_eq!(id.to_string(), "aaaab");
    }

    #[test]
    fn test_serde_transparent() {
        let id = OrderId::from("ord-42");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"ord-42\"");
    }

    #[test]
    fn test_ordering_follows_string_ordering() {
        assert!(ProductId::new("a") < ProductId::new("b"));
    }
}
