//! Storage seams of the review engine.
//!
//! `ReviewStore` owns review schedules; `MistakeStore` is the narrow view of the
//! catalog the engine needs. Both are object safe so the API can hold either the
//! Postgres or the in-memory backend behind an `Arc<dyn _>`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mnb_srs::MasteryStatus;
use uuid::Uuid;

use crate::{
    error::StoreError,
    models::{DueSummary, Mistake, ReviewAttempt, ReviewCommit, ReviewRecord},
};

#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Return the record for (mistake, user), creating a due-now record if there is none.
    async fn create_plan(
        &self,
        mistake_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<ReviewRecord, StoreError>;

    async fn find_record(
        &self,
        mistake_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ReviewRecord>, StoreError>;

    /// Records with `next_review_time <= now`, ordered by next review time then id.
    async fn get_due(&self, user_id: Uuid, now: DateTime<Utc>)
    -> Result<Vec<ReviewRecord>, StoreError>;

    async fn count_due(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<i64, StoreError>;

    /// Replace a record, conditioned on `record.version`. Returns the stored record
    /// with its new version.
    async fn save(&self, record: &ReviewRecord) -> Result<ReviewRecord, StoreError>;

    async fn list_all(&self, user_id: Uuid) -> Result<Vec<ReviewRecord>, StoreError>;

    /// Sum of `review_count` over the user's records.
    async fn total_reviews(&self, user_id: Uuid) -> Result<i64, StoreError>;

    /// Versioned save, mastery update and attempt insert as one unit.
    async fn commit_review(&self, commit: &ReviewCommit) -> Result<ReviewRecord, StoreError>;

    /// Attempts for one mistake and user, newest first.
    async fn history(
        &self,
        mistake_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<ReviewAttempt>, StoreError>;

    /// Due counts for every user that has something due.
    async fn due_summary(&self, now: DateTime<Utc>) -> Result<Vec<DueSummary>, StoreError>;
}

#[async_trait]
pub trait MistakeStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Mistake, StoreError>;

    async fn update_mastery(
        &self,
        id: Uuid,
        status: MasteryStatus,
        level: i32,
    ) -> Result<(), StoreError>;

    /// The user's mistakes in creation order.
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Mistake>, StoreError>;
}
