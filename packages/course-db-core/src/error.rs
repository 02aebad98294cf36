//! Database error types.

use thiserror::Error;

/// Database operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DbError {
    /// Course not found
    #[error("Course {id} not found")]
    CourseNotFound { id: u64 },

    /// Student not found
    #[error("Student {id} not found")]
    StudentNotFound { id: u64 },

    /// Field validation failed
    #[error("Invalid value for '{field}': {message}")]
    Validation { field: String, message: String },

    /// Id sequence exhausted
    #[error("Capacity overflow during {operation}")]
    CapacityOverflow { operation: &'static str },

    /// Lock poisoned (RwLock poisoned)
    #[error("Lock poisoned")]
    LockPoisoned,

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Data corruption detected
    #[error("Data corruption detected: {0}")]
    DataCorruption(String),

    /// Disk full error during persistence
    #[error("Disk full: {0}")]
    DiskFull(String),

    /// I/O error during persistence
    #[error("I/O error: {0}")]
    IoError(String),

    /// Transient I/O error that may succeed on retry
    #[error("Transient I/O error: {0}")]
    TransientIoError(String),
}

impl DbError {
    /// Shorthand for a validation failure on `field`.
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        DbError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Returns true for the not-found variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DbError::CourseNotFound { .. } | DbError::StudentNotFound { .. }
        )
    }
}
