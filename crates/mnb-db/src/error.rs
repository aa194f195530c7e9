use thiserror::Error;
use uuid::Uuid;

/// Failures at the persistence boundary
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    /// The record was saved by someone else since it was loaded
    #[error("review record {id} was modified concurrently (expected version {expected_version})")]
    Conflict { id: Uuid, expected_version: i32 },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn mistake_not_found(id: Uuid) -> Self {
        Self::NotFound(format!("mistake {id}"))
    }

    pub fn record_not_found(id: Uuid) -> Self {
        Self::NotFound(format!("review record {id}"))
    }

    /// Whether retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Database(
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::WorkerCrashed
            )
        )
    }
}
