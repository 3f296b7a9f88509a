//! Fire-and-forget reconciliation of local mutations with the remote stores.
//!
//! Every optimistic mutation yields a [`SyncEffect`] describing the remote
//! write that mirrors it. The [`SyncDispatcher`] spawns that write on the
//! Tokio runtime and returns immediately. Failures are logged, captured to
//! Sentry and, when a reporting channel is attached, forwarded as
//! [`SyncFailure`]s so the UI can show a transient notice. The local state
//! is never rolled back.
//!
//! Writes are unordered relative to each other. Cart writes carry absolute
//! quantities, so a replayed or duplicated write cannot double-apply, but a
//! slow stale write may still land after a newer one.

use std::fmt;
use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use tote_core::{ProductId, Size};

use crate::error::StoreError;
use crate::remote::RemoteError;

/// A remote write mirroring one local mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEffect {
    /// Set the absolute quantity of a cart entry; zero deletes it.
    CartEntry {
        product_id: ProductId,
        size: Size,
        quantity: u32,
    },
    WishlistAdd { product_id: ProductId },
    WishlistRemove { product_id: ProductId },
}

impl fmt::Display for SyncEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CartEntry {
                product_id,
                size,
                quantity,
            } => write!(f, "cart {product_id}/{size} = {quantity}"),
            Self::WishlistAdd { product_id } => write!(f, "wishlist + {product_id}"),
            Self::WishlistRemove { product_id } => write!(f, "wishlist - {product_id}"),
        }
    }
}

/// A remote write that did not succeed.
#[derive(Debug)]
pub struct SyncFailure {
    pub effect: SyncEffect,
    pub error: StoreError,
}

/// Handle to an in-flight remote write.
///
/// Dropping the handle detaches the task; awaiting [`settled`](Self::settled)
/// observes its outcome.
#[derive(Debug)]
pub struct SyncHandle {
    effect: SyncEffect,
    task: JoinHandle<Result<(), RemoteError>>,
}

impl SyncHandle {
    /// The write this handle is carrying.
    #[must_use]
    pub const fn effect(&self) -> &SyncEffect {
        &self.effect
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the write to finish.
    ///
    /// # Errors
    ///
    /// Returns the remote error, or `RemoteError::Unavailable` if the task
    /// was cancelled or panicked.
    pub async fn settled(self) -> Result<(), RemoteError> {
        match self.task.await {
            Ok(result) => result,
            Err(join) => Err(RemoteError::Unavailable(join.to_string())),
        }
    }
}

/// Spawns sync effects and routes their failures.
#[derive(Debug, Clone, Default)]
pub struct SyncDispatcher {
    failures: Option<mpsc::UnboundedSender<SyncFailure>>,
}

impl SyncDispatcher {
    /// A dispatcher that only logs failures.
    #[must_use]
    pub fn detached() -> Self {
        Self::default()
    }

    /// A dispatcher that also forwards failures to the returned receiver.
    #[must_use]
    pub fn reporting() -> (Self, mpsc::UnboundedReceiver<SyncFailure>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { failures: Some(tx) }, rx)
    }

    /// Spawn `call` as the remote half of `effect`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn dispatch<F>(&self, effect: SyncEffect, call: F) -> SyncHandle
    where
        F: Future<Output = Result<(), RemoteError>> + Send + 'static,
    {
        let failures = self.failures.clone();
        let label = effect.to_string();
        let task_effect = effect.clone();

        let task = tokio::spawn(async move {
            let error = match call.await {
                Ok(()) => {
                    tracing::debug!(effect = %label, "Remote sync applied");
                    return Ok(());
                }
                Err(e) => e,
            };

            tracing::warn!(effect = %label, error = %error, "Remote sync failed; keeping local state");
            sentry::capture_message(
                &format!("remote sync failed: {label}: {error}"),
                sentry::Level::Warning,
            );

            let Some(tx) = failures else {
                return Err(error);
            };
            // The reporting channel gets the original error, the handle a copy.
            let copy = error.duplicate();
            // A closed receiver means nobody is listening any more.
            let _ = tx.send(SyncFailure {
                effect: task_effect,
                error: StoreError::RemoteSync(error),
            });
            Err(copy)
        });

        SyncHandle { effect, task }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn effect() -> SyncEffect {
        SyncEffect::WishlistAdd {
            product_id: ProductId::new("a"),
        }
    }

    #[tokio::test]
    async fn test_success_is_not_reported() {
        let (dispatcher, mut rx) = SyncDispatcher::reporting();
        let handle = dispatcher.dispatch(effect(), async { Ok(()) });
        assert!(handle.settled().await.is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failure_is_reported_with_effect() {
        let (dispatcher, mut rx) = SyncDispatcher::reporting();
        let handle = dispatcher.dispatch(effect(), async {
            Err(RemoteError::Rejected("Error".to_string()))
        });
        assert!(matches!(
            handle.settled().await,
            Err(RemoteError::Rejected(_))
        ));

        let failure = rx.try_recv().unwrap();
        assert_eq!(failure.effect, effect());
        assert!(matches!(
            failure.error,
            StoreError::RemoteSync(RemoteError::Rejected(ref m)) if m == "Error"
        ));
    }

    #[tokio::test]
    async fn test_status_failure_keeps_its_kind() {
        let (dispatcher, mut rx) = SyncDispatcher::reporting();
        let handle = dispatcher.dispatch(effect(), async {
            Err(RemoteError::Status {
                status: 503,
                body: "maintenance".to_string(),
            })
        });
        assert!(matches!(
            handle.settled().await,
            Err(RemoteError::Status { status: 503, .. })
        ));
        assert!(matches!(
            rx.try_recv().unwrap().error,
            StoreError::RemoteSync(RemoteError::Status { status: 503, .. })
        ));
    }

    #[test]
    fn test_parse_failure_copy_keeps_message() {
        let parse = serde_json::from_str::<u32>("nope").unwrap_err();
        let original = RemoteError::Parse(parse);
        let copy = original.duplicate();
        assert!(matches!(copy, RemoteError::Unavailable(ref m) if *m == original.to_string()));
    }

    #[tokio::test]
    async fn test_detached_dispatch_still_runs() {
        let handle = SyncDispatcher::detached().dispatch(effect(), async { Ok(()) });
        assert_eq!(handle.effect(), &effect());
        assert!(handle.settled().await.is_ok());
    }

    #[test]
    fn test_effect_display() {
        let effect = SyncEffect::CartEntry {
            product_id: ProductId::new("a"),
            size: Size::parse("M").unwrap(),
            quantity: 2,
        };
        assert_eq!(effect.to_string(), "cart a/M = 2");
    }
}
