//! Error types for the AgroPocket core library.

use crate::core::validation::ValidationErrors;
use thiserror::Error;

/// All errors that can occur within the AgroPocket core library.
///
/// Expected user-facing failures (duplicate email, bad credentials, invalid
/// form input) are ordinary variants here and are returned, never panicked.
/// Corrupt persisted data is not an error at all: readers treat it as empty.
#[derive(Debug, Error)]
pub enum AgroError {
    /// A SQLite operation on the backing medium failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A value could not be serialised to JSON before being persisted.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The opened file is not an AgroPocket store.
    #[error("Invalid store: {0}")]
    InvalidStore(String),

    /// Registration was attempted with an email that already belongs to a user.
    #[error("Email already registered")]
    EmailAlreadyRegistered,

    /// No user matches the supplied email and password.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// A record id was given for an edit but the session user has no such record.
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    /// A write needed a signed-in user but the session is anonymous.
    #[error("No user is signed in")]
    NotAuthenticated,

    /// A record's `userId` does not match the session it was written under.
    #[error("Record {record_id} belongs to another user")]
    OwnershipMismatch { record_id: String },

    /// One or more draft fields failed validation.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
}

/// Convenience alias that pins the error type to [`AgroError`].
pub type Result<T> = std::result::Result<T, AgroError>;

impl AgroError {
    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(e) => format!("Failed to save: {e}"),
            Self::Json(e) => format!("Data format error: {e}"),
            Self::Io(e) => format!("File error: {e}"),
            Self::InvalidStore(_) => "Could not open the data file".to_string(),
            Self::EmailAlreadyRegistered => "Email already registered".to_string(),
            Self::InvalidCredentials => "Invalid email or password".to_string(),
            Self::RecordNotFound(_) => "Record no longer exists".to_string(),
            Self::NotAuthenticated => "Please sign in to continue".to_string(),
            Self::OwnershipMismatch { .. } => "This record belongs to another account".to_string(),
            Self::Validation(errors) => errors
                .first_message()
                .unwrap_or("Please check the form")
                .to_string(),
        }
    }
}
