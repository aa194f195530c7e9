use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a stored or submitted string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind}: '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Mastery bucket of a mistake, derived from its mastery level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteryStatus {
    #[default]
    NotMastered,
    Reviewing,
    Mastered,
    /// Level fell back to 0 after at least one attempt. Only produced when the
    /// scheduler runs with [`ZeroLevelPolicy::Regressed`].
    Regressed,
}

impl MasteryStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotMastered => "not_mastered",
            Self::Reviewing => "reviewing",
            Self::Mastered => "mastered",
            Self::Regressed => "regressed",
        }
    }
}

impl fmt::Display for MasteryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MasteryStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_mastered" => Ok(Self::NotMastered),
            "reviewing" => Ok(Self::Reviewing),
            "mastered" => Ok(Self::Mastered),
            "regressed" => Ok(Self::Regressed),
            other => Err(ParseEnumError::new("mastery status", other)),
        }
    }
}

impl TryFrom<String> for MasteryStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Outcome of a single review attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Correct,
    Incorrect,
}

impl Outcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Incorrect => "incorrect",
        }
    }

    pub const fn is_correct(self) -> bool {
        matches!(self, Self::Correct)
    }
}

impl From<bool> for Outcome {
    fn from(correct: bool) -> Self {
        if correct { Self::Correct } else { Self::Incorrect }
    }
}

impl FromStr for Outcome {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "correct" => Ok(Self::Correct),
            "incorrect" => Ok(Self::Incorrect),
            _ => Err(ParseEnumError::new("outcome", s)),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last result stored on a review record; `Unset` until the first attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewResult {
    Correct,
    Incorrect,
    #[default]
    Unset,
}

impl ReviewResult {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Incorrect => "incorrect",
            Self::Unset => "unset",
        }
    }
}

impl From<Outcome> for ReviewResult {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Correct => Self::Correct,
            Outcome::Incorrect => Self::Incorrect,
        }
    }
}

impl FromStr for ReviewResult {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "correct" => Ok(Self::Correct),
            "incorrect" => Ok(Self::Incorrect),
            "unset" => Ok(Self::Unset),
            other => Err(ParseEnumError::new("review result", other)),
        }
    }
}

impl TryFrom<String> for ReviewResult {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Which status a mistake gets when its level drops to 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroLevelPolicy {
    #[default]
    NotMastered,
    Regressed,
}

impl ZeroLevelPolicy {
    pub const fn status(self) -> MasteryStatus {
        match self {
            Self::NotMastered => MasteryStatus::NotMastered,
            Self::Regressed => MasteryStatus::Regressed,
        }
    }
}
