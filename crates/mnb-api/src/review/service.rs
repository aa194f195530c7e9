use std::sync::Arc;

use chrono::{DateTime, Utc};
use mnb_db::{
    MistakeStore, ReviewStore, StoreError,
    models::{DueSummary, ReviewAttempt, ReviewCommit, ReviewRecord},
};
use mnb_srs::{Outcome, Scheduler};
use uuid::Uuid;

use crate::{error::ApiError, metrics};

/// Review schedule operations on top of the stores.
///
/// All mastery changes go through [`ReviewService::submit`], so the scheduler
/// is the only source of a mistake's level and status.
#[derive(Clone)]
pub struct ReviewService {
    reviews: Arc<dyn ReviewStore>,
    mistakes: Arc<dyn MistakeStore>,
    scheduler: Arc<Scheduler>,
}

impl ReviewService {
    pub fn new(
        reviews: Arc<dyn ReviewStore>,
        mistakes: Arc<dyn MistakeStore>,
        scheduler: Scheduler,
    ) -> Self {
        Self {
            reviews,
            mistakes,
            scheduler: Arc::new(scheduler),
        }
    }

    /// Get the user's plan for a mistake, creating a due-now one if missing.
    pub async fn create_plan(
        &self,
        mistake_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<ReviewRecord, ApiError> {
        // Fail with NotFound before touching review_records
        self.mistakes.get(mistake_id).await?;

        Ok(self.reviews.create_plan(mistake_id, user_id, now).await?)
    }

    pub async fn due(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<Vec<ReviewRecord>, ApiError> {
        Ok(self.reviews.get_due(user_id, now).await?)
    }

    pub async fn due_count(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<i64, ApiError> {
        Ok(self.reviews.count_due(user_id, now).await?)
    }

    pub async fn records(&self, user_id: Uuid) -> Result<Vec<ReviewRecord>, ApiError> {
        Ok(self.reviews.list_all(user_id).await?)
    }

    pub async fn history(
        &self,
        mistake_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<ReviewAttempt>, ApiError> {
        Ok(self.reviews.history(mistake_id, user_id).await?)
    }

    pub async fn due_summary(&self, now: DateTime<Utc>) -> Result<Vec<DueSummary>, ApiError> {
        Ok(self.reviews.due_summary(now).await?)
    }

    /// Record an outcome for a mistake, creating its plan first if needed.
    pub async fn record_outcome(
        &self,
        mistake_id: Uuid,
        user_id: Uuid,
        outcome: Outcome,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ReviewRecord, ApiError> {
        let record = self.create_plan(mistake_id, user_id, now).await?;
        self.submit(&record, outcome, notes, now).await
    }

    /// Schedule the next review of `record` and persist it together with the
    /// mistake's new mastery.
    ///
    /// A version conflict reloads the record and recomputes once; a transient
    /// database error retries the same commit once. Any second failure is returned.
    pub async fn submit(
        &self,
        record: &ReviewRecord,
        outcome: Outcome,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ReviewRecord, ApiError> {
        let commit = self.prepare(record, outcome, notes.clone(), now).await?;

        let saved = match self.reviews.commit_review(&commit).await {
            Ok(saved) => saved,
            Err(StoreError::Conflict {
                id,
                expected_version,
            }) => {
                tracing::warn!(record_id = %id, expected_version, "Review record changed concurrently, retrying");
                metrics::record_review_retry("conflict");

                let reloaded = self
                    .reviews
                    .find_record(record.mistake_id, record.user_id)
                    .await?
                    .ok_or_else(|| StoreError::record_not_found(id))?;
                let commit = self.prepare(&reloaded, outcome, notes, now).await?;
                self.reviews.commit_review(&commit).await?
            }
            Err(e) if e.is_transient() => {
                tracing::warn!(record_id = %record.id, error = %e, "Transient database error, retrying");
                metrics::record_review_retry("transient");

                self.recommit(&commit).await?
            }
            Err(e) => return Err(e.into()),
        };

        metrics::record_review_submission(outcome);
        tracing::debug!(
            record_id = %saved.id,
            mistake_id = %saved.mistake_id,
            %outcome,
            stage = saved.review_stage,
            next_review_time = %saved.next_review_time,
            "Recorded review outcome"
        );

        Ok(saved)
    }

    /// Read the mistake's current mastery and compute the writes for one outcome.
    async fn prepare(
        &self,
        record: &ReviewRecord,
        outcome: Outcome,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ReviewCommit, StoreError> {
        let mistake = self.mistakes.get(record.mistake_id).await?;
        let update =
            self.scheduler
                .compute_next(record.review_stage, mistake.mastery_level, outcome, now);

        Ok(ReviewCommit::new(record, outcome, &update, notes, now))
    }

    /// Resend a commit after a transient failure.
    ///
    /// The failed attempt may still have been applied with only its acknowledgement
    /// lost. The retry then conflicts with our own write, which is recognised by the
    /// attempt id already being in the history.
    async fn recommit(&self, commit: &ReviewCommit) -> Result<ReviewRecord, StoreError> {
        let conflict = match self.reviews.commit_review(commit).await {
            Err(conflict @ StoreError::Conflict { .. }) => conflict,
            other => return other,
        };

        let (mistake_id, user_id) = (commit.record.mistake_id, commit.record.user_id);
        let applied = self
            .reviews
            .history(mistake_id, user_id)
            .await?
            .iter()
            .any(|attempt| attempt.id == commit.attempt.id);
        if !applied {
            return Err(conflict);
        }

        tracing::debug!(attempt_id = %commit.attempt.id, "Commit had already been applied");
        self.reviews
            .find_record(mistake_id, user_id)
            .await?
            .ok_or_else(|| StoreError::record_not_found(commit.record.id))
    }
}
