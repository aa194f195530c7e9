//! In-memory store for local development and tests.
//!
//! Holds the same invariants as the Postgres schema: one record per
//! (mistake, user), version-checked saves, cascade on mistake deletion. All
//! writes of a commit happen under one write lock, so they are atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mnb_srs::MasteryStatus;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::StoreError,
    models::{DueSummary, Mistake, ReviewAttempt, ReviewCommit, ReviewRecord},
    store::{MistakeStore, ReviewStore},
};

#[derive(Debug, Default)]
struct Tables {
    mistakes: HashMap<Uuid, Mistake>,
    records: HashMap<Uuid, ReviewRecord>,
    attempts: Vec<ReviewAttempt>,
}

impl Tables {
    fn record_for(&self, mistake_id: Uuid, user_id: Uuid) -> Option<&ReviewRecord> {
        self.records
            .values()
            .find(|r| r.mistake_id == mistake_id && r.user_id == user_id)
    }

    fn check_version(&self, record: &ReviewRecord) -> Result<(), StoreError> {
        match self.records.get(&record.id) {
            None => Err(StoreError::record_not_found(record.id)),
            Some(stored) if stored.version != record.version => Err(StoreError::Conflict {
                id: record.id,
                expected_version: record.version,
            }),
            Some(_) => Ok(()),
        }
    }

    fn replace(&mut self, record: &ReviewRecord) -> ReviewRecord {
        let saved = ReviewRecord {
            version: record.version + 1,
            ..record.clone()
        };
        self.records.insert(saved.id, saved.clone());
        saved
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a mistake, standing in for the catalog subsystem.
    pub async fn insert_mistake(&self, mistake: Mistake) {
        self.tables.write().await.mistakes.insert(mistake.id, mistake);
    }

    /// Delete a mistake together with its review records and attempts.
    ///
    /// Returns whether the mistake existed.
    pub async fn delete_mistake(&self, id: Uuid) -> bool {
        let mut tables = self.tables.write().await;
        let existed = tables.mistakes.remove(&id).is_some();
        tables.records.retain(|_, r| r.mistake_id != id);
        tables.attempts.retain(|a| a.mistake_id != id);
        existed
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn create_plan(
        &self,
        mistake_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<ReviewRecord, StoreError> {
        let mut tables = self.tables.write().await;

        if !tables.mistakes.contains_key(&mistake_id) {
            return Err(StoreError::mistake_not_found(mistake_id));
        }
        if let Some(existing) = tables.record_for(mistake_id, user_id) {
            return Ok(existing.clone());
        }

        let record = ReviewRecord::new(mistake_id, user_id, now);
        tables.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_record(
        &self,
        mistake_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ReviewRecord>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .record_for(mistake_id, user_id)
            .cloned())
    }

    async fn get_due(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReviewRecord>, StoreError> {
        let tables = self.tables.read().await;
        let mut due: Vec<ReviewRecord> = tables
            .records
            .values()
            .filter(|r| r.user_id == user_id && r.is_due(now))
            .cloned()
            .collect();
        due.sort_by(|a, b| {
            a.next_review_time
                .cmp(&b.next_review_time)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(due)
    }

    async fn count_due(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<i64, StoreError> {
        let tables = self.tables.read().await;
        let count = tables
            .records
            .values()
            .filter(|r| r.user_id == user_id && r.is_due(now))
            .count();
        Ok(count as i64)
    }

    async fn save(&self, record: &ReviewRecord) -> Result<ReviewRecord, StoreError> {
        let mut tables = self.tables.write().await;
        tables.check_version(record)?;
        Ok(tables.replace(record))
    }

    async fn list_all(&self, user_id: Uuid) -> Result<Vec<ReviewRecord>, StoreError> {
        let tables = self.tables.read().await;
        let mut records: Vec<ReviewRecord> = tables
            .records
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn total_reviews(&self, user_id: Uuid) -> Result<i64, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .records
            .values()
            .filter(|r| r.user_id == user_id)
            .map(|r| i64::from(r.review_count))
            .sum())
    }

    async fn commit_review(&self, commit: &ReviewCommit) -> Result<ReviewRecord, StoreError> {
        let mut tables = self.tables.write().await;

        // Validate everything before the first write
        tables.check_version(&commit.record)?;
        let mistake_id = commit.record.mistake_id;
        if !tables.mistakes.contains_key(&mistake_id) {
            return Err(StoreError::mistake_not_found(mistake_id));
        }

        let saved = tables.replace(&commit.record);
        if let Some(mistake) = tables.mistakes.get_mut(&mistake_id) {
            mistake.mastery_status = commit.mastery_status;
            mistake.mastery_level = commit.mastery_level;
        }
        tables.attempts.push(commit.attempt.clone());

        Ok(saved)
    }

    async fn history(
        &self,
        mistake_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<ReviewAttempt>, StoreError> {
        let tables = self.tables.read().await;
        let mut attempts: Vec<ReviewAttempt> = tables
            .attempts
            .iter()
            .filter(|a| a.mistake_id == mistake_id && a.user_id == user_id)
            .cloned()
            .collect();
        attempts.sort_by(|a, b| b.reviewed_at.cmp(&a.reviewed_at).then_with(|| b.id.cmp(&a.id)));
        Ok(attempts)
    }

    async fn due_summary(&self, now: DateTime<Utc>) -> Result<Vec<DueSummary>, StoreError> {
        let tables = self.tables.read().await;
        let mut counts: HashMap<Uuid, i64> = HashMap::new();
        for record in tables.records.values().filter(|r| r.is_due(now)) {
            *counts.entry(record.user_id).or_default() += 1;
        }

        let mut summary: Vec<DueSummary> = counts
            .into_iter()
            .map(|(user_id, due_count)| DueSummary { user_id, due_count })
            .collect();
        summary.sort_by_key(|s| s.user_id);
        Ok(summary)
    }
}

#[async_trait]
impl MistakeStore for MemoryStore {
    async fn get(&self, id: Uuid) -> Result<Mistake, StoreError> {
        self.tables
            .read()
            .await
            .mistakes
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::mistake_not_found(id))
    }

    async fn update_mastery(
        &self,
        id: Uuid,
        status: MasteryStatus,
        level: i32,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let mistake = tables
            .mistakes
            .get_mut(&id)
            .ok_or_else(|| StoreError::mistake_not_found(id))?;
        mistake.mastery_status = status;
        mistake.mastery_level = level;
        Ok(())
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Mistake>, StoreError> {
        let tables = self.tables.read().await;
        let mut mistakes: Vec<Mistake> = tables
            .mistakes
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        mistakes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(mistakes)
    }
}
