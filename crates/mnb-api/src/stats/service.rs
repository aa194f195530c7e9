use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use mnb_db::{MistakeStore, ReviewStore, models::Mistake};
use mnb_srs::{MasteryStatus, bucket_counts, end_of_day};
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total_mistakes: i64,
    /// Sum of review counts over the user's records
    pub total_reviews: i64,
    pub mastered: i64,
    /// Records due by the end of the current day
    pub due_today: i64,
}

/// Mistake counts per key, in order of first appearance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketStats {
    pub by_subject: Vec<(Uuid, i64)>,
    pub by_error_reason: Vec<(String, i64)>,
}

/// Statistics derived on demand from mistakes and review records
#[derive(Clone)]
pub struct StatsService {
    reviews: Arc<dyn ReviewStore>,
    mistakes: Arc<dyn MistakeStore>,
    day_offset: FixedOffset,
}

impl StatsService {
    pub fn new(
        reviews: Arc<dyn ReviewStore>,
        mistakes: Arc<dyn MistakeStore>,
        day_offset: FixedOffset,
    ) -> Self {
        Self {
            reviews,
            mistakes,
            day_offset,
        }
    }

    pub async fn review_stats(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<ReviewStats, ApiError> {
        let mistakes = self.mistakes.list_by_user(user_id).await?;
        let total_reviews = self.reviews.total_reviews(user_id).await?;
        let due_today = self
            .reviews
            .count_due(user_id, end_of_day(now, self.day_offset))
            .await?;

        let mastered = mistakes
            .iter()
            .filter(|m| m.mastery_status == MasteryStatus::Mastered)
            .count();

        Ok(ReviewStats {
            total_mistakes: mistakes.len() as i64,
            total_reviews,
            mastered: mastered as i64,
            due_today,
        })
    }

    pub async fn buckets(&self, user_id: Uuid) -> Result<BucketStats, ApiError> {
        let mistakes = self.mistakes.list_by_user(user_id).await?;

        Ok(BucketStats {
            by_subject: by_subject(&mistakes),
            by_error_reason: by_error_reason(&mistakes),
        })
    }
}

pub fn by_subject(mistakes: &[Mistake]) -> Vec<(Uuid, i64)> {
    bucket_counts(mistakes.iter().map(|m| m.subject_id))
}

/// Mistakes without a reason, or with a blank one, are left out.
pub fn by_error_reason(mistakes: &[Mistake]) -> Vec<(String, i64)> {
    bucket_counts(
        mistakes
            .iter()
            .filter_map(|m| m.error_reason.as_deref())
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
            .map(str::to_owned),
    )
}
