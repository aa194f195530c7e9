use mnb_db::models::ReviewRecord;
use mnb_srs::{Outcome, ReviewSession, SessionState};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiError;

/// Longest note accepted with a recorded outcome, in characters
pub const MAX_NOTES_LEN: usize = 1000;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub mistake_id: Uuid,
    pub user_id: Uuid,
}

/// Outcome as submitted by a client: either `correct: bool` or
/// `result: "correct" | "incorrect"`. Kept loosely typed so that anything else
/// is reported as an invalid outcome rather than a malformed body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutcomeFields {
    #[serde(default)]
    pub correct: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
}

impl OutcomeFields {
    pub fn outcome(&self) -> Result<Outcome, ApiError> {
        let value = self
            .correct
            .as_ref()
            .or(self.result.as_ref())
            .ok_or_else(|| {
                ApiError::InvalidOutcome("either `correct` or `result` is required".to_string())
            })?;

        match value {
            Value::Bool(correct) => Ok(Outcome::from(*correct)),
            Value::String(s) => s
                .parse()
                .map_err(|_| ApiError::InvalidOutcome(format!("'{s}'"))),
            other => Err(ApiError::InvalidOutcome(other.to_string())),
        }
    }
}

/// Trim a submitted note, dropping it when blank.
pub fn normalize_notes(notes: Option<String>) -> Result<Option<String>, ApiError> {
    let Some(notes) = notes else {
        return Ok(None);
    };
    let trimmed = notes.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > MAX_NOTES_LEN {
        return Err(ApiError::Validation(format!(
            "notes must be at most {MAX_NOTES_LEN} characters"
        )));
    }
    Ok(Some(trimmed.to_string()))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRequest {
    pub mistake_id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub outcome: OutcomeFields,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSubmitRequest {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub outcome: OutcomeFields,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct DueCount {
    pub count: i64,
}

/// Snapshot of a user's review session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    #[serde(flatten)]
    pub state: SessionState,
    pub total: usize,
    pub reviewed: u32,
    pub correct_count: u32,
    pub accuracy: u32,
    /// Item being presented or revealed
    pub current: Option<ReviewRecord>,
}

impl From<&ReviewSession<ReviewRecord>> for SessionView {
    fn from(session: &ReviewSession<ReviewRecord>) -> Self {
        Self {
            state: session.state(),
            total: session.len(),
            reviewed: session.reviewed(),
            correct_count: session.correct_count(),
            accuracy: session.accuracy(),
            current: session.current().cloned(),
        }
    }
}
