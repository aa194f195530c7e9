use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mnb_db::StoreError;
use mnb_srs::SessionError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    Validation(String),

    #[error("invalid outcome: {0}")]
    InvalidOutcome(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    InvalidState(#[from] SessionError),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl ApiError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Validation(_) | Self::InvalidOutcome(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) | Self::InvalidState(_) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Jwt(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code sent as the `error` field
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Auth(_) => "unauthorized",
            Self::Validation(_) => "validation_error",
            Self::InvalidOutcome(_) => "invalid_outcome",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::InvalidState(_) => "invalid_state",
            Self::Database(_) | Self::Jwt(_) => "internal_error",
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Self::NotFound(format!("{what} not found")),
            conflict @ StoreError::Conflict { .. } => Self::Conflict(conflict.to_string()),
            StoreError::Database(e) => Self::Database(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(json!({
                "error": self.code(),
                "message": message,
            })),
        )
            .into_response()
    }
}
