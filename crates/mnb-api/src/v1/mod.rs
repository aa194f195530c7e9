use axum::Router;

use crate::{review, state::ApiState, stats};

/// V1 API routes
pub fn routes() -> Router<ApiState> {
    Router::new()
        .merge(review::routes())
        .merge(stats::routes())
}
