use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::ReviewAttempt;

pub async fn insert<'e, E>(executor: E, attempt: &ReviewAttempt) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO review_attempts
                (id, review_record_id, mistake_id, user_id, result, stage_after, level_after, status_after, notes, reviewed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(attempt.id)
    .bind(attempt.review_record_id)
    .bind(attempt.mistake_id)
    .bind(attempt.user_id)
    .bind(attempt.result.as_str())
    .bind(attempt.stage_after)
    .bind(attempt.level_after)
    .bind(attempt.status_after.as_str())
    .bind(attempt.notes.as_deref())
    .bind(attempt.reviewed_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn list_for_mistake<'e, E>(
    executor: E,
    mistake_id: Uuid,
    user_id: Uuid,
) -> Result<Vec<ReviewAttempt>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, review_record_id, mistake_id, user_id, result, stage_after, level_after, status_after, notes, reviewed_at
            FROM review_attempts
            WHERE mistake_id = $1 AND user_id = $2
            ORDER BY reviewed_at DESC, id DESC
        "#,
    )
    .bind(mistake_id)
    .bind(user_id)
    .fetch_all(executor)
    .await
}
