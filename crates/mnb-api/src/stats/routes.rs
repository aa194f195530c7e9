use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::Utc;

use super::service::{BucketStats, ReviewStats};
use crate::{ApiState, auth::AuthUser, error::ApiError, review::model::UserQuery};

/// Create the statistics routes
pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/review/stats", get(get_review_stats))
        .route("/mistakes/stats", get(get_mistake_stats))
}

async fn get_review_stats(
    auth: AuthUser,
    State(state): State<ApiState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<ReviewStats>, ApiError> {
    auth.authorize(query.user_id)?;
    Ok(Json(state.stats.review_stats(query.user_id, Utc::now()).await?))
}

/// Mistake counts by subject and by error reason
async fn get_mistake_stats(
    auth: AuthUser,
    State(state): State<ApiState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<BucketStats>, ApiError> {
    auth.authorize(query.user_id)?;
    Ok(Json(state.stats.buckets(query.user_id).await?))
}
