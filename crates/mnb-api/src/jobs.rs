//! Background jobs.
//!
//! Due-ness is always evaluated at query time. The reminder only reads and
//! reports; the session sweep only drops finished in-memory sessions.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::{task::JoinHandle, time::interval};

use crate::{
    error::ApiError,
    review::{ReviewCoordinator, ReviewService},
};

const REMINDER_INITIAL_DELAY: Duration = Duration::from_secs(60);
const REMINDER_PERIOD: Duration = Duration::from_secs(86400); // 24 hours

const SESSION_SWEEP_PERIOD: Duration = Duration::from_secs(600); // 10 minutes
/// How long a finished session stays readable
const FINISHED_SESSION_RETENTION: chrono::Duration = chrono::Duration::minutes(30);

/// Start the daily review reminder
pub fn start_review_reminder_job(reviews: ReviewService) -> JoinHandle<()> {
    tokio::spawn(review_reminder_job(reviews))
}

async fn review_reminder_job(reviews: ReviewService) {
    // Let startup settle before the first run
    tokio::time::sleep(REMINDER_INITIAL_DELAY).await;

    let mut interval = interval(REMINDER_PERIOD);

    loop {
        interval.tick().await;

        match run_review_reminder(&reviews, Utc::now()).await {
            Ok(0) => tracing::debug!("Review reminder: nothing due"),
            Ok(users) => tracing::info!(users, "Review reminder sent"),
            Err(e) => tracing::error!("Failed to run review reminder: {e}"),
        }
    }
}

/// Log a reminder for every user with reviews due at `now`.
///
/// Returns the number of users reminded.
pub async fn run_review_reminder(
    reviews: &ReviewService,
    now: DateTime<Utc>,
) -> Result<usize, ApiError> {
    let summary = reviews.due_summary(now).await?;

    for entry in &summary {
        tracing::info!(
            user_id = %entry.user_id,
            due_count = entry.due_count,
            "Reviews due"
        );
    }

    Ok(summary.len())
}

/// Start the periodic sweep of finished review sessions
pub fn start_session_sweep_job(sessions: ReviewCoordinator) -> JoinHandle<()> {
    tokio::spawn(session_sweep_job(sessions))
}

async fn session_sweep_job(sessions: ReviewCoordinator) {
    let mut interval = interval(SESSION_SWEEP_PERIOD);

    loop {
        interval.tick().await;

        let evicted = run_session_sweep(&sessions, Utc::now()).await;
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted finished review sessions");
        }
    }
}

/// Drop sessions that finished more than the retention window before `now`.
pub async fn run_session_sweep(sessions: &ReviewCoordinator, now: DateTime<Utc>) -> usize {
    sessions
        .evict_finished(now - FINISHED_SESSION_RETENTION)
        .await
}
