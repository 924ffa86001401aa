//! Common error types for GaIA
//!
//! Domain failures (authorization, validation, lifecycle conflicts) are kept
//! apart from infrastructure failures (database, I/O, configuration) so the
//! HTTP layer can surface the former precisely and the latter generically.

use crate::db::models::PermissionLevel;
use thiserror::Error;
use uuid::Uuid;

/// Common result type for GaIA operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across GaIA services
#[derive(Error, Debug)]
pub enum Error {
    /// Caller holds no active relation, or one below the required level
    #[error("Access denied: caregiver {caregiver_id} lacks {required} permission on care subject {care_subject_id}")]
    Denied {
        caregiver_id: Uuid,
        care_subject_id: Uuid,
        required: PermissionLevel,
    },

    /// Interaction payload violates a value constraint
    #[error("Invalid interaction: {0}")]
    InvalidInteraction(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An active relation already links this caregiver and care subject
    #[error("Duplicate relation: caregiver {caregiver_id} is already related to care subject {care_subject_id}")]
    DuplicateRelation {
        caregiver_id: Uuid,
        care_subject_id: Uuid,
    },

    /// Alert was resolved earlier; the first resolver is kept
    #[error("Alert already resolved: {0}")]
    AlreadyResolved(Uuid),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (e.g. a stored row that cannot be decoded)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for infrastructure failures that callers may retry
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Error::Database(_) | Error::Io(_) | Error::Config(_) | Error::Internal(_)
        )
    }
}
