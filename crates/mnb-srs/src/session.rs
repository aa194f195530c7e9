//! Review session state machine
//!
//! A session is one pass over the items that were due when it started. The caller
//! reveals the current item, then records an outcome which moves to the next item.
//!
//! ```text
//! start ─┬─ empty queue ──> Empty
//!        └─ otherwise ───> Presenting(0) ─reveal─> Revealed(0) ─record─> Presenting(1) ... ─> Completed
//! ```
//!
//! Persisting the outcome is the caller's job: check [`ReviewSession::pending`] first,
//! persist, then call [`ReviewSession::record`]. A failed persist leaves the session in
//! `Revealed` so the same item can be submitted again.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::{mastery::Outcome, stats::accuracy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "position", rename_all = "snake_case")]
pub enum SessionState {
    /// Nothing was due when the session started
    Empty,
    Presenting(usize),
    Revealed(usize),
    Completed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty"),
            Self::Presenting(i) => write!(f, "presenting item {i}"),
            Self::Revealed(i) => write!(f, "revealed item {i}"),
            Self::Completed => f.write_str("completed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("cannot {action} while session is {state}")]
    InvalidState {
        action: &'static str,
        state: SessionState,
    },
}

#[derive(Debug, Clone)]
pub struct ReviewSession<T> {
    queue: Vec<T>,
    state: SessionState,
    reviewed: u32,
    correct_count: u32,
}

impl<T> ReviewSession<T> {
    /// Load a queue of due items.
    pub fn start(queue: Vec<T>) -> Self {
        let state = if queue.is_empty() {
            SessionState::Empty
        } else {
            SessionState::Presenting(0)
        };

        Self {
            queue,
            state,
            reviewed: 0,
            correct_count: 0,
        }
    }

    pub const fn state(&self) -> SessionState {
        self.state
    }

    pub const fn is_finished(&self) -> bool {
        matches!(self.state, SessionState::Empty | SessionState::Completed)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub const fn reviewed(&self) -> u32 {
        self.reviewed
    }

    pub const fn correct_count(&self) -> u32 {
        self.correct_count
    }

    pub const fn accuracy(&self) -> u32 {
        accuracy(self.reviewed, self.correct_count)
    }

    /// Item currently being presented or revealed.
    pub fn current(&self) -> Option<&T> {
        match self.state {
            SessionState::Presenting(i) | SessionState::Revealed(i) => self.queue.get(i),
            SessionState::Empty | SessionState::Completed => None,
        }
    }

    pub fn reveal(&mut self) -> Result<&T, SessionError> {
        let SessionState::Presenting(i) = self.state else {
            return Err(self.invalid("reveal"));
        };
        self.state = SessionState::Revealed(i);
        Ok(&self.queue[i])
    }

    /// Item awaiting an outcome. Fails unless the current item has been revealed.
    pub fn pending(&self) -> Result<&T, SessionError> {
        match self.state {
            SessionState::Revealed(i) => Ok(&self.queue[i]),
            _ => Err(self.invalid("submit")),
        }
    }

    /// Count the outcome and move on to the next item.
    pub fn record(&mut self, outcome: Outcome) -> Result<SessionState, SessionError> {
        let SessionState::Revealed(i) = self.state else {
            return Err(self.invalid("submit"));
        };

        self.reviewed += 1;
        if outcome.is_correct() {
            self.correct_count += 1;
        }

        let next = i + 1;
        self.state = if next == self.queue.len() {
            SessionState::Completed
        } else {
            SessionState::Presenting(next)
        };
        Ok(self.state)
    }

    const fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidState {
            action,
            state: self.state,
        }
    }
}
