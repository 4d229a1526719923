//! Registered users and password digests.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A registered account.
///
/// `password_hash` is persisted under the `password` key for compatibility
/// with data written by earlier builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "password")]
    pub password_hash: String,
}

impl User {
    /// Returns `true` if `email` names this account (case-insensitive, ignoring surrounding whitespace).
    #[must_use]
    pub fn has_email(&self, email: &str) -> bool {
        normalize_email(&self.email) == normalize_email(email)
    }

    /// Returns `true` if `password` hashes to this account's stored digest.
    #[must_use]
    pub fn password_matches(&self, password: &str) -> bool {
        hash_password(password) == self.password_hash
    }
}

/// Hashes a plaintext password to lowercase hex SHA-256.
///
/// The digest is unsalted so the same password always yields the same hash.
/// Stored accounts depend on that property; note it is open to precomputed
/// table attacks.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Canonical form used when comparing emails.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
