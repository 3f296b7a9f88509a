//! Password reset tokens.
//!
//! The plaintext token is handed to the email collaborator exactly once and
//! never stored. Only its SHA-256 digest is kept, together with the owner
//! and an expiry one hour after issuance.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use thiserror::Error;

use tote_core::UserId;

/// Random bytes in a token before hex encoding.
const TOKEN_BYTES: usize = 32;

/// How long an issued token stays valid.
#[must_use]
pub fn token_ttl() -> Duration {
    Duration::hours(1)
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ResetTokenError {
    #[error("reset token has expired")]
    Expired,
    #[error("reset token does not match")]
    Mismatch,
}

/// The at-rest form of a reset token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResetToken {
    pub user_id: UserId,
    /// Hex SHA-256 of the plaintext.
    pub digest: String,
    pub expires_at: DateTime<Utc>,
}

impl StoredResetToken {
    /// Check a presented plaintext against this record.
    ///
    /// # Errors
    ///
    /// Returns `ResetTokenError::Expired` once `now` reaches the expiry and
    /// `ResetTokenError::Mismatch` when the digests differ.
    pub fn verify(&self, presented: &str, now: DateTime<Utc>) -> Result<(), ResetTokenError> {
        if self.is_expired(now) {
            return Err(ResetTokenError::Expired);
        }
        if !constant_time_compare(&digest(presented), &self.digest) {
            return Err(ResetTokenError::Mismatch);
        }
        Ok(())
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Issue a fresh token for `user_id`.
///
/// Returns the plaintext to deliver and the record to store.
#[must_use]
pub fn issue(user_id: UserId, now: DateTime<Utc>) -> (SecretString, StoredResetToken) {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    let plaintext = hex::encode(bytes);

    let stored = StoredResetToken {
        user_id,
        digest: digest(&plaintext),
        expires_at: now + token_ttl(),
    };
    tracing::debug!(user_id = %stored.user_id, expires_at = %stored.expires_at, "Issued reset token");
    (SecretString::from(plaintext), stored)
}

/// Convenience wrapper for [`StoredResetToken::verify`] with a secret input.
///
/// # Errors
///
/// See [`StoredResetToken::verify`].
pub fn verify_secret(
    stored: &StoredResetToken,
    presented: &SecretString,
    now: DateTime<Utc>,
) -> Result<(), ResetTokenError> {
    stored.verify(presented.expose_secret(), now)
}

fn digest(plaintext: &str) -> String {
    hex::encode(Sha256::digest(plaintext.as_bytes()))
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}
