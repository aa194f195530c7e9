use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use mnb_db::models::{ReviewAttempt, ReviewRecord};
use uuid::Uuid;

use super::model::{
    DueCount, PlanRequest, RecordRequest, SessionRequest, SessionSubmitRequest, SessionView,
    UserQuery, normalize_notes,
};
use crate::{ApiState, auth::AuthUser, error::ApiError};

/// Create the review routes
pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/review/due", get(get_due))
        .route("/review/due/count", get(get_due_count))
        .route("/review/plan", post(create_plan))
        .route("/review/record", post(record_outcome))
        .route("/review/records", get(list_records))
        .route("/review/history/{mistake_id}", get(get_history))
        .route("/review/session", get(get_session).delete(abandon_session))
        .route("/review/session/start", post(start_session))
        .route("/review/session/reveal", post(reveal_session))
        .route("/review/session/submit", post(submit_session))
}

/// Records due now, earliest first
async fn get_due(
    auth: AuthUser,
    State(state): State<ApiState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<ReviewRecord>>, ApiError> {
    auth.authorize(query.user_id)?;
    let due = state.reviews.due(query.user_id, Utc::now()).await?;
    Ok(Json(due))
}

async fn get_due_count(
    auth: AuthUser,
    State(state): State<ApiState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<DueCount>, ApiError> {
    auth.authorize(query.user_id)?;
    let count = state.reviews.due_count(query.user_id, Utc::now()).await?;
    Ok(Json(DueCount { count }))
}

async fn create_plan(
    auth: AuthUser,
    State(state): State<ApiState>,
    Json(payload): Json<PlanRequest>,
) -> Result<Json<ReviewRecord>, ApiError> {
    auth.authorize(payload.user_id)?;
    let record = state
        .reviews
        .create_plan(payload.mistake_id, payload.user_id, Utc::now())
        .await?;
    Ok(Json(record))
}

/// Submit an outcome outside of a session
async fn record_outcome(
    auth: AuthUser,
    State(state): State<ApiState>,
    Json(payload): Json<RecordRequest>,
) -> Result<Json<ReviewRecord>, ApiError> {
    auth.authorize(payload.user_id)?;
    let outcome = payload.outcome.outcome()?;
    let notes = normalize_notes(payload.notes)?;
    let record = state
        .reviews
        .record_outcome(payload.mistake_id, payload.user_id, outcome, notes, Utc::now())
        .await?;
    Ok(Json(record))
}

async fn list_records(
    auth: AuthUser,
    State(state): State<ApiState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<ReviewRecord>>, ApiError> {
    auth.authorize(query.user_id)?;
    Ok(Json(state.reviews.records(query.user_id).await?))
}

/// Attempts for one mistake, newest first
async fn get_history(
    auth: AuthUser,
    State(state): State<ApiState>,
    Path(mistake_id): Path<Uuid>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<ReviewAttempt>>, ApiError> {
    auth.authorize(query.user_id)?;
    Ok(Json(state.reviews.history(mistake_id, query.user_id).await?))
}

async fn start_session(
    auth: AuthUser,
    State(state): State<ApiState>,
    Json(payload): Json<SessionRequest>,
) -> Result<Json<SessionView>, ApiError> {
    auth.authorize(payload.user_id)?;
    Ok(Json(state.sessions.start(payload.user_id, Utc::now()).await?))
}

async fn get_session(
    auth: AuthUser,
    State(state): State<ApiState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<SessionView>, ApiError> {
    auth.authorize(query.user_id)?;
    Ok(Json(state.sessions.view(query.user_id).await?))
}

async fn reveal_session(
    auth: AuthUser,
    State(state): State<ApiState>,
    Json(payload): Json<SessionRequest>,
) -> Result<Json<SessionView>, ApiError> {
    auth.authorize(payload.user_id)?;
    Ok(Json(state.sessions.reveal(payload.user_id).await?))
}

async fn submit_session(
    auth: AuthUser,
    State(state): State<ApiState>,
    Json(payload): Json<SessionSubmitRequest>,
) -> Result<Json<SessionView>, ApiError> {
    auth.authorize(payload.user_id)?;
    let outcome = payload.outcome.outcome()?;
    let notes = normalize_notes(payload.notes)?;
    let view = state
        .sessions
        .submit(payload.user_id, outcome, notes, Utc::now())
        .await?;
    Ok(Json(view))
}

/// Abandoning is idempotent
async fn abandon_session(
    auth: AuthUser,
    State(state): State<ApiState>,
    Query(query): Query<UserQuery>,
) -> Result<StatusCode, ApiError> {
    auth.authorize(query.user_id)?;
    state.sessions.abandon(query.user_id).await;
    Ok(StatusCode::NO_CONTENT)
}
