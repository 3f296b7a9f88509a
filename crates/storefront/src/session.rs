//! Shopper identity passed explicitly into every engine operation.
//!
//! There is no ambient session storage: whoever drives the engines owns the
//! current [`Identity`] and hands it in. Identity changes arrive as
//! [`SessionEvent`]s so the storefront can reload everything in one place.

use secrecy::{ExposeSecret, SecretString};

use tote_core::UserId;

use crate::error::StoreError;

/// An authenticated session.
///
/// The token is opaque to this crate; it is only forwarded to the remote
/// stores.
#[derive(Clone)]
pub struct Session {
    token: SecretString,
    user_id: Option<UserId>,
}

impl Session {
    /// Create a session from an issued token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
            user_id: None,
        }
    }

    /// Attach the user the token belongs to, when known.
    #[must_use]
    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// The raw token, for transport headers only.
    #[must_use]
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }

    #[must_use]
    pub const fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// Who is currently driving the storefront.
#[derive(Debug, Clone, Default)]
pub enum Identity {
    /// No session; cart and wishlist are empty and read-only.
    #[default]
    Guest,
    /// Signed-in shopper.
    Shopper(Session),
}

impl Identity {
    /// The session, or `Unauthenticated` for guests.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unauthenticated` when the identity is a guest.
    pub fn session(&self) -> Result<&Session, StoreError> {
        match self {
            Self::Shopper(session) => Ok(session),
            Self::Guest => Err(StoreError::Unauthenticated),
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Shopper(_))
    }
}

/// Lifecycle events that invalidate the local cart and wishlist.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// First render with whatever identity is already current.
    Mounted,
    /// A shopper signed in (or switched accounts).
    LoggedIn(Session),
    /// The shopper signed out.
    LoggedOut,
}
