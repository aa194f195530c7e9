use mnb_srs::MasteryStatus;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::Mistake;

pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Mistake>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, user_id, subject_id, error_reason, mastery_status, mastery_level, created_at
            FROM mistakes
            WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn list_by_user<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<Mistake>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, user_id, subject_id, error_reason, mastery_status, mastery_level, created_at
            FROM mistakes
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

/// Returns whether a row was updated.
pub async fn update_mastery<'e, E>(
    executor: E,
    id: Uuid,
    status: MasteryStatus,
    level: i32,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE mistakes
            SET mastery_status = $2,
                mastery_level = $3,
                updated_at = NOW()
            WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(status.as_str())
    .bind(level)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}
