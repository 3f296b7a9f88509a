//! Unified error handling with Sentry integration.
//!
//! Provides the `StoreError` type returned by every engine operation and the
//! mapping from errors to toast-level [`Notice`]s. Remote failures are
//! captured to Sentry before they are turned into notices; without a DSN
//! configured the capture calls are no-ops.

use thiserror::Error;

use tote_core::AddressError;

use crate::notice::Notice;
use crate::remote::RemoteError;

/// Engine-level error type for the storefront.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The operation needs a signed-in shopper.
    #[error("Unauthenticated: sign in required")]
    Unauthenticated,

    /// Add-to-cart was attempted without choosing a size.
    #[error("Missing size: select a size first")]
    MissingSize,

    /// Checkout produced no order lines.
    #[error("Empty cart: nothing to check out")]
    EmptyCart,

    /// A read or write against the remote cart/wishlist store failed.
    #[error("Remote sync failure: {0}")]
    RemoteSync(#[source] RemoteError),

    /// The remote product list could not be fetched.
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(#[source] RemoteError),

    /// The shipping form did not validate.
    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] AddressError),

    /// The remote order store rejected or failed the submission.
    #[error("Checkout failed: {0}")]
    Checkout(#[source] RemoteError),
}

impl StoreError {
    /// Whether the caller should send the shopper to the login flow.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }

    /// Whether this error came from a remote collaborator.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::RemoteSync(_) | Self::CatalogUnavailable(_) | Self::Checkout(_)
        )
    }

    /// Log and capture remote errors; local validation errors are ignored.
    pub fn report(&self) {
        if self.is_remote() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Storefront remote error"
            );
        }
    }

    /// Toast shown to the shopper.
    ///
    /// Transport details are never exposed; only the validation messages
    /// carry specifics.
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::Unauthenticated => Notice::login_required("Please login to continue."),
            Self::MissingSize => Notice::error("Please Select a Size"),
            Self::EmptyCart => Notice::error("Your cart is empty."),
            Self::RemoteSync(_) => {
                Notice::error("We couldn't save your last change. Refresh to see what was saved.")
            }
            Self::CatalogUnavailable(_) => {
                Notice::error("Network error, falling back to local products.")
            }
            Self::InvalidAddress(err) => Notice::error(format!("Please check your address: {err}")),
            Self::Checkout(_) => Notice::error("An error occurred. Please try again."),
        }
    }
}

/// Result type alias for `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after a login event to associate errors with the shopper.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the shopper.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for shopper actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of cart and
/// wishlist actions leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "aaaab"), ("size", "M")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
