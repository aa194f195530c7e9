use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{DueSummary, ReviewRecord};

/// Insert a new plan unless one already exists for (mistake, user).
///
/// Returns `None` when the row already existed.
pub async fn insert_if_absent<'e, E>(
    executor: E,
    record: &ReviewRecord,
) -> Result<Option<ReviewRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO review_records
                (id, mistake_id, user_id, review_stage, review_count, last_review_result,
                 last_review_time, next_review_time, version, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (mistake_id, user_id) DO NOTHING
            RETURNING id, mistake_id, user_id, review_stage, review_count, last_review_result,
                      last_review_time, next_review_time, version, created_at
        "#,
    )
    .bind(record.id)
    .bind(record.mistake_id)
    .bind(record.user_id)
    .bind(record.review_stage)
    .bind(record.review_count)
    .bind(record.last_review_result.as_str())
    .bind(record.last_review_time)
    .bind(record.next_review_time)
    .bind(record.version)
    .bind(record.created_at)
    .fetch_optional(executor)
    .await
}

pub async fn find_by_mistake_and_user<'e, E>(
    executor: E,
    mistake_id: Uuid,
    user_id: Uuid,
) -> Result<Option<ReviewRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, mistake_id, user_id, review_stage, review_count, last_review_result,
                   last_review_time, next_review_time, version, created_at
            FROM review_records
            WHERE mistake_id = $1 AND user_id = $2
        "#,
    )
    .bind(mistake_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

pub async fn exists<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT EXISTS(SELECT 1 FROM review_records WHERE id = $1)
        "#,
    )
    .bind(id)
    .fetch_one(executor)
    .await
}

pub async fn list_due<'e, E>(
    executor: E,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Vec<ReviewRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, mistake_id, user_id, review_stage, review_count, last_review_result,
                   last_review_time, next_review_time, version, created_at
            FROM review_records
            WHERE user_id = $1 AND next_review_time <= $2
            ORDER BY next_review_time ASC, id ASC
        "#,
    )
    .bind(user_id)
    .bind(now)
    .fetch_all(executor)
    .await
}

pub async fn count_due<'e, E>(
    executor: E,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*)
            FROM review_records
            WHERE user_id = $1 AND next_review_time <= $2
        "#,
    )
    .bind(user_id)
    .bind(now)
    .fetch_one(executor)
    .await
}

pub async fn list_by_user<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<ReviewRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, mistake_id, user_id, review_stage, review_count, last_review_result,
                   last_review_time, next_review_time, version, created_at
            FROM review_records
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

pub async fn sum_review_count<'e, E>(executor: E, user_id: Uuid) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COALESCE(SUM(review_count), 0)::bigint
            FROM review_records
            WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(executor)
    .await
}

/// Replace the mutable columns of a record if its version still matches.
///
/// Returns `None` when no row matched, either because the record is gone or
/// because another writer bumped the version first.
pub async fn update_versioned<'e, E>(
    executor: E,
    record: &ReviewRecord,
) -> Result<Option<ReviewRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            UPDATE review_records
            SET review_stage = $3,
                review_count = $4,
                last_review_result = $5,
                last_review_time = $6,
                next_review_time = $7,
                version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING id, mistake_id, user_id, review_stage, review_count, last_review_result,
                      last_review_time, next_review_time, version, created_at
        "#,
    )
    .bind(record.id)
    .bind(record.version)
    .bind(record.review_stage)
    .bind(record.review_count)
    .bind(record.last_review_result.as_str())
    .bind(record.last_review_time)
    .bind(record.next_review_time)
    .fetch_optional(executor)
    .await
}

pub async fn due_counts_by_user<'e, E>(
    executor: E,
    now: DateTime<Utc>,
) -> Result<Vec<DueSummary>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT user_id, COUNT(*) AS due_count
            FROM review_records
            WHERE next_review_time <= $1
            GROUP BY user_id
            ORDER BY user_id
        "#,
    )
    .bind(now)
    .fetch_all(executor)
    .await
}
