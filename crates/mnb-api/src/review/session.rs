//! Per-user review sessions held in memory.
//!
//! The session itself is the pure [`ReviewSession`] state machine; this module
//! pairs it with persistence. A submit is only counted once the outcome has been
//! committed, so a failed commit leaves the item revealed and retryable.
//!
//! Finished sessions stay readable until [`ReviewCoordinator::evict_finished`]
//! drops them.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use mnb_db::models::ReviewRecord;
use mnb_srs::{Outcome, ReviewSession};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::{model::SessionView, service::ReviewService};
use crate::{error::ApiError, metrics};

struct ActiveSession {
    session: ReviewSession<ReviewRecord>,
    /// When the session reached `Empty` or `Completed`
    finished_at: Option<DateTime<Utc>>,
}

type SharedSession = Arc<Mutex<ActiveSession>>;

#[derive(Clone)]
pub struct ReviewCoordinator {
    service: ReviewService,
    sessions: Arc<RwLock<HashMap<Uuid, SharedSession>>>,
}

impl ReviewCoordinator {
    pub fn new(service: ReviewService) -> Self {
        Self {
            service,
            sessions: Arc::default(),
        }
    }

    /// Start a new session over everything due now, replacing any previous one.
    pub async fn start(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<SessionView, ApiError> {
        let due = self.service.due(user_id, now).await?;
        let session = ReviewSession::start(due);
        let view = SessionView::from(&session);
        let finished_at = session.is_finished().then_some(now);

        self.sessions.write().await.insert(
            user_id,
            Arc::new(Mutex::new(ActiveSession {
                session,
                finished_at,
            })),
        );

        metrics::record_session_event("start");
        tracing::debug!(%user_id, items = view.total, "Started review session");

        Ok(view)
    }

    pub async fn view(&self, user_id: Uuid) -> Result<SessionView, ApiError> {
        let shared = self.session(user_id).await?;
        let active = shared.lock().await;
        Ok(SessionView::from(&active.session))
    }

    pub async fn reveal(&self, user_id: Uuid) -> Result<SessionView, ApiError> {
        let shared = self.session(user_id).await?;
        let mut active = shared.lock().await;

        active.session.reveal()?;
        metrics::record_session_event("reveal");

        Ok(SessionView::from(&active.session))
    }

    /// Persist the outcome of the revealed item, then advance the session.
    pub async fn submit(
        &self,
        user_id: Uuid,
        outcome: Outcome,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<SessionView, ApiError> {
        let shared = self.session(user_id).await?;
        let mut active = shared.lock().await;

        let pending = active.session.pending()?.clone();
        self.service.submit(&pending, outcome, notes, now).await?;

        active.session.record(outcome)?;
        metrics::record_session_event("submit");
        if active.session.is_finished() {
            active.finished_at = Some(now);
            let session = &active.session;
            metrics::record_session_event("complete");
            tracing::debug!(
                %user_id,
                reviewed = session.reviewed(),
                accuracy = session.accuracy(),
                "Completed review session"
            );
        }

        Ok(SessionView::from(&active.session))
    }

    /// Drop the user's session. Returns whether one existed.
    pub async fn abandon(&self, user_id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&user_id).is_some();
        if removed {
            metrics::record_session_event("abandon");
        }
        removed
    }

    /// Drop sessions that finished at or before `cutoff`. Sessions busy with a
    /// submit are skipped until the next sweep.
    ///
    /// Returns the number of sessions dropped.
    pub async fn evict_finished(&self, cutoff: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|_, shared| match shared.try_lock() {
            Ok(active) => !active.finished_at.is_some_and(|at| at <= cutoff),
            Err(_) => true,
        });

        before - sessions.len()
    }

    async fn session(&self, user_id: Uuid) -> Result<SharedSession, ApiError> {
        self.sessions
            .read()
            .await
            .get(&user_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound("no active review session".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use mnb_db::{MemoryStore, ReviewStore, models::Mistake};
    use mnb_srs::{MasteryStatus, Scheduler, SessionState};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    async fn setup(n: usize) -> (ReviewCoordinator, Arc<MemoryStore>, Uuid, Vec<Mistake>) {
        let store = Arc::new(MemoryStore::new());
        let user_id = Uuid::new_v4();
        let mut mistakes = Vec::new();
        for _ in 0..n {
            let m = Mistake {
                id: Uuid::new_v4(),
                user_id,
                subject_id: Uuid::new_v4(),
                error_reason: None,
                mastery_status: MasteryStatus::NotMastered,
                mastery_level: 0,
                created_at: t0(),
            };
            store.insert_mistake(m.clone()).await;
            store.create_plan(m.id, user_id, t0()).await.unwrap();
            mistakes.push(m);
        }
        let service = ReviewService::new(store.clone(), store.clone(), Scheduler::default());
        (ReviewCoordinator::new(service), store, user_id, mistakes)
    }

    #[tokio::test]
    async fn test_full_session() {
        let (coordinator, store, user_id, _) = setup(2).await;

        let view = coordinator.start(user_id, t0()).await.unwrap();
        assert_eq!(view.state, SessionState::Presenting(0));
        assert_eq!(view.total, 2);

        coordinator.reveal(user_id).await.unwrap();
        let view = coordinator
            .submit(user_id, Outcome::Correct, None, t0())
            .await
            .unwrap();
        assert_eq!(view.state, SessionState::Presenting(1));

        coordinator.reveal(user_id).await.unwrap();
        let view = coordinator
            .submit(user_id, Outcome::Incorrect, None, t0())
            .await
            .unwrap();

        assert_eq!(view.state, SessionState::Completed);
        assert_eq!(view.reviewed, 2);
        assert_eq!(view.correct_count, 1);
        assert_eq!(view.accuracy, 50);
        assert!(view.current.is_none());
        assert_eq!(store.total_reviews(user_id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_submit_before_reveal_is_invalid() {
        let (coordinator, store, user_id, _) = setup(1).await;
        coordinator.start(user_id, t0()).await.unwrap();

        let err = coordinator
            .submit(user_id, Outcome::Correct, None, t0())
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::InvalidState(_)));
        assert_eq!(store.total_reviews(user_id).await.unwrap(), 0);
        assert_eq!(
            coordinator.view(user_id).await.unwrap().state,
            SessionState::Presenting(0)
        );
    }

    #[tokio::test]
    async fn test_failed_commit_keeps_item_revealed() {
        let (coordinator, store, user_id, mistakes) = setup(1).await;
        coordinator.start(user_id, t0()).await.unwrap();
        coordinator.reveal(user_id).await.unwrap();

        store.delete_mistake(mistakes[0].id).await;

        let err = coordinator
            .submit(user_id, Outcome::Correct, None, t0())
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::NotFound(_)));
        let view = coordinator.view(user_id).await.unwrap();
        assert_eq!(view.state, SessionState::Revealed(0));
        assert_eq!(view.reviewed, 0);
    }

    #[tokio::test]
    async fn test_abandon() {
        let (coordinator, _, user_id, _) = setup(0).await;

        let view = coordinator.start(user_id, t0()).await.unwrap();
        assert_eq!(view.state, SessionState::Empty);

        assert!(coordinator.abandon(user_id).await);
        assert!(!coordinator.abandon(user_id).await);
        assert!(matches!(
            coordinator.view(user_id).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_finished_sessions_are_evicted_after_cutoff() {
        let (coordinator, _, user_id, _) = setup(1).await;
        let empty_user = Uuid::new_v4();

        coordinator.start(empty_user, t0()).await.unwrap();
        coordinator.start(user_id, t0()).await.unwrap();
        coordinator.reveal(user_id).await.unwrap();

        // Only the empty session has finished; the revealed one is kept
        assert_eq!(coordinator.evict_finished(t0() - Duration::minutes(1)).await, 0);
        assert_eq!(coordinator.evict_finished(t0() + Duration::days(1)).await, 1);
        assert!(matches!(
            coordinator.view(empty_user).await,
            Err(ApiError::NotFound(_))
        ));
        assert_eq!(
            coordinator.view(user_id).await.unwrap().state,
            SessionState::Revealed(0)
        );

        let done = t0() + Duration::minutes(5);
        coordinator
            .submit(user_id, Outcome::Correct, None, done)
            .await
            .unwrap();

        // Completed sessions stay readable until the cutoff passes
        assert_eq!(coordinator.evict_finished(done - Duration::minutes(1)).await, 0);
        assert_eq!(
            coordinator.view(user_id).await.unwrap().state,
            SessionState::Completed
        );
        assert_eq!(coordinator.evict_finished(done).await, 1);
        assert!(matches!(
            coordinator.view(user_id).await,
            Err(ApiError::NotFound(_))
        ));
    }
}
