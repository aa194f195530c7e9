use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mnb_srs::MasteryStatus;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    error::StoreError,
    models::{DueSummary, Mistake, ReviewAttempt, ReviewCommit, ReviewRecord},
    repositories::{attempt, mistake, review},
    store::{MistakeStore, ReviewStore},
};

/// PostgreSQL-backed store
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Explain why a versioned update matched no row.
async fn missing_or_conflict<'e, E>(executor: E, record: &ReviewRecord) -> StoreError
where
    E: Executor<'e, Database = Postgres>,
{
    match review::exists(executor, record.id).await {
        Ok(true) => StoreError::Conflict {
            id: record.id,
            expected_version: record.version,
        },
        Ok(false) => StoreError::record_not_found(record.id),
        Err(e) => e.into(),
    }
}

#[async_trait]
impl ReviewStore for PgStore {
    async fn create_plan(
        &self,
        mistake_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<ReviewRecord, StoreError> {
        let candidate = ReviewRecord::new(mistake_id, user_id, now);

        if let Some(created) = review::insert_if_absent(&self.pool, &candidate).await? {
            tracing::debug!(%mistake_id, %user_id, record_id = %created.id, "Created review plan");
            return Ok(created);
        }

        review::find_by_mistake_and_user(&self.pool, mistake_id, user_id)
            .await?
            .ok_or_else(|| StoreError::record_not_found(candidate.id))
    }

    async fn find_record(
        &self,
        mistake_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ReviewRecord>, StoreError> {
        Ok(review::find_by_mistake_and_user(&self.pool, mistake_id, user_id).await?)
    }

    async fn get_due(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReviewRecord>, StoreError> {
        Ok(review::list_due(&self.pool, user_id, now).await?)
    }

    async fn count_due(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<i64, StoreError> {
        Ok(review::count_due(&self.pool, user_id, now).await?)
    }

    async fn save(&self, record: &ReviewRecord) -> Result<ReviewRecord, StoreError> {
        match review::update_versioned(&self.pool, record).await? {
            Some(saved) => Ok(saved),
            None => Err(missing_or_conflict(&self.pool, record).await),
        }
    }

    async fn list_all(&self, user_id: Uuid) -> Result<Vec<ReviewRecord>, StoreError> {
        Ok(review::list_by_user(&self.pool, user_id).await?)
    }

    async fn total_reviews(&self, user_id: Uuid) -> Result<i64, StoreError> {
        Ok(review::sum_review_count(&self.pool, user_id).await?)
    }

    async fn commit_review(&self, commit: &ReviewCommit) -> Result<ReviewRecord, StoreError> {
        // Single transaction for atomicity; dropping `tx` on an early return rolls back
        let mut tx = self.pool.begin().await?;

        let Some(saved) = review::update_versioned(&mut *tx, &commit.record).await? else {
            return Err(missing_or_conflict(&mut *tx, &commit.record).await);
        };

        let mistake_id = commit.record.mistake_id;
        let updated = mistake::update_mastery(
            &mut *tx,
            mistake_id,
            commit.mastery_status,
            commit.mastery_level,
        )
        .await?;
        if !updated {
            return Err(StoreError::mistake_not_found(mistake_id));
        }

        attempt::insert(&mut *tx, &commit.attempt).await?;

        tx.commit().await?;

        Ok(saved)
    }

    async fn history(
        &self,
        mistake_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<ReviewAttempt>, StoreError> {
        Ok(attempt::list_for_mistake(&self.pool, mistake_id, user_id).await?)
    }

    async fn due_summary(&self, now: DateTime<Utc>) -> Result<Vec<DueSummary>, StoreError> {
        Ok(review::due_counts_by_user(&self.pool, now).await?)
    }
}

#[async_trait]
impl MistakeStore for PgStore {
    async fn get(&self, id: Uuid) -> Result<Mistake, StoreError> {
        mistake::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| StoreError::mistake_not_found(id))
    }

    async fn update_mastery(
        &self,
        id: Uuid,
        status: MasteryStatus,
        level: i32,
    ) -> Result<(), StoreError> {
        if mistake::update_mastery(&self.pool, id, status, level).await? {
            Ok(())
        } else {
            Err(StoreError::mistake_not_found(id))
        }
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Mistake>, StoreError> {
        Ok(mistake::list_by_user(&self.pool, user_id).await?)
    }
}
