use chrono::{DateTime, Utc};
use mnb_srs::{MasteryStatus, Outcome, ReviewResult, ScheduleUpdate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mistake as seen by the review engine. Owned by the catalog; only the mastery
/// fields are ever written from here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Mistake {
    pub id: Uuid,
    /// Owner of the mistake
    pub user_id: Uuid,
    pub subject_id: Uuid,
    /// Free-form reason the question was missed, if the user gave one
    pub error_reason: Option<String>,
    #[sqlx(try_from = "String")]
    pub mastery_status: MasteryStatus,
    /// Retention confidence, 0..=100
    pub mastery_level: i32,
    pub created_at: DateTime<Utc>,
}

/// Review schedule of one mistake for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub id: Uuid,
    pub mistake_id: Uuid,
    pub user_id: Uuid,
    /// Index into the scheduler's interval table
    pub review_stage: i32,
    /// Number of outcomes ever recorded; only goes up
    pub review_count: i32,
    #[sqlx(try_from = "String")]
    pub last_review_result: ReviewResult,
    /// Unset until the first attempt
    pub last_review_time: Option<DateTime<Utc>>,
    /// The record is due once this is <= now
    pub next_review_time: DateTime<Utc>,
    /// Optimistic lock counter, bumped on every save
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

impl ReviewRecord {
    /// Fresh plan, due immediately.
    pub fn new(mistake_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            mistake_id,
            user_id,
            review_stage: 0,
            review_count: 0,
            last_review_result: ReviewResult::Unset,
            last_review_time: None,
            next_review_time: now,
            version: 0,
            created_at: now,
        }
    }

    /// Copy of this record after one recorded outcome. The version is left untouched:
    /// it is the version the save is conditioned on.
    pub fn scheduled(&self, outcome: Outcome, update: &ScheduleUpdate, now: DateTime<Utc>) -> Self {
        Self {
            review_stage: update.stage,
            review_count: self.review_count + 1,
            last_review_result: outcome.into(),
            last_review_time: Some(now),
            next_review_time: update.next_review_time,
            ..self.clone()
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_time <= now
    }
}

/// One recorded outcome in a mistake's review history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAttempt {
    pub id: Uuid,
    pub review_record_id: Uuid,
    pub mistake_id: Uuid,
    pub user_id: Uuid,
    #[sqlx(try_from = "String")]
    pub result: ReviewResult,
    pub stage_after: i32,
    pub level_after: i32,
    #[sqlx(try_from = "String")]
    pub status_after: MasteryStatus,
    /// Free-form note the user left with this attempt
    pub notes: Option<String>,
    pub reviewed_at: DateTime<Utc>,
}

/// Everything written for one submitted outcome, applied atomically
#[derive(Debug, Clone)]
pub struct ReviewCommit {
    /// Updated record; `version` is the version it was loaded at
    pub record: ReviewRecord,
    pub mastery_status: MasteryStatus,
    pub mastery_level: i32,
    pub attempt: ReviewAttempt,
}

impl ReviewCommit {
    pub fn new(
        loaded: &ReviewRecord,
        outcome: Outcome,
        update: &ScheduleUpdate,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let record = loaded.scheduled(outcome, update, now);
        let attempt = ReviewAttempt {
            id: Uuid::new_v4(),
            review_record_id: record.id,
            mistake_id: record.mistake_id,
            user_id: record.user_id,
            result: outcome.into(),
            stage_after: update.stage,
            level_after: update.mastery_level,
            status_after: update.status,
            notes,
            reviewed_at: now,
        };

        Self {
            record,
            mastery_status: update.status,
            mastery_level: update.mastery_level,
            attempt,
        }
    }
}

/// Number of due records for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DueSummary {
    pub user_id: Uuid,
    pub due_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use mnb_srs::Scheduler;

    #[test]
    fn test_new_record_is_due_immediately() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let record = ReviewRecord::new(Uuid::new_v4(), Uuid::new_v4(), now);

        assert!(record.is_due(now));
        assert_eq!(record.review_count, 0);
        assert_eq!(record.last_review_result, ReviewResult::Unset);
        assert!(record.last_review_time.is_none());
    }

    #[test]
    fn test_commit_carries_schedule_and_loaded_version() {
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let now = created + Duration::hours(3);
        let mut record = ReviewRecord::new(Uuid::new_v4(), Uuid::new_v4(), created);
        record.version = 4;

        let update = Scheduler::default().compute_next(0, 0, Outcome::Correct, now);
        let commit = ReviewCommit::new(
            &record,
            Outcome::Correct,
            &update,
            Some("mixed up the signs".to_string()),
            now,
        );

        assert_eq!(commit.record.version, 4);
        assert_eq!(commit.record.review_count, 1);
        assert_eq!(commit.record.review_stage, 1);
        assert_eq!(commit.record.last_review_result, ReviewResult::Correct);
        assert_eq!(commit.record.last_review_time, Some(now));
        assert!(commit.record.next_review_time >= now);
        assert_eq!(commit.mastery_level, 25);
        assert_eq!(commit.mastery_status, MasteryStatus::Reviewing);
        assert_eq!(commit.attempt.review_record_id, record.id);
        assert_eq!(commit.attempt.reviewed_at, now);
        assert_eq!(commit.attempt.notes.as_deref(), Some("mixed up the signs"));
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let record = ReviewRecord::new(Uuid::nil(), Uuid::nil(), now);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["reviewStage"], 0);
        assert_eq!(json["lastReviewResult"], "unset");
        assert!(json["lastReviewTime"].is_null());
        assert!(json.get("nextReviewTime").is_some());
    }
}
