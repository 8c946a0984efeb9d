//! Store Errors
//!
//! Error types for ride persistence.

use uuid::Uuid;

/// Errors that can occur in the ride store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Optimistic concurrency conflict
    #[error("Concurrency conflict for ride {ride_id}: expected version {expected}")]
    VersionConflict { ride_id: Uuid, expected: i64 },

    /// Update of a ride that does not exist
    #[error("Ride not found: {0}")]
    NotFound(Uuid),

    /// Insert of a ride id that already exists
    #[error("Ride already exists: {0}")]
    Duplicate(Uuid),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored row cannot be turned back into a ride
    #[error("Corrupt ride record {ride_id}: {reason}")]
    Corrupt { ride_id: Uuid, reason: String },
}

impl StoreError {
    /// Check if this error is a concurrency conflict
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }
}
