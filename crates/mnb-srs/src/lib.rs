//! SRS (Spaced Repetition System) core for the mistake notebook
//!
//! This crate holds the pure parts of the review engine: the mastery and outcome
//! vocabulary, the interval scheduler, the per-user review session state machine,
//! and the helpers used to aggregate statistics. Nothing in here performs I/O.

pub mod mastery;
pub mod scheduler;
pub mod session;
pub mod stats;

pub use mastery::{MasteryStatus, Outcome, ParseEnumError, ReviewResult, ZeroLevelPolicy};
pub use scheduler::{ConfigError, DEFAULT_INTERVAL_DAYS, ScheduleUpdate, Scheduler, SchedulerConfig};
pub use session::{ReviewSession, SessionError, SessionState};
pub use stats::{accuracy, bucket_counts, end_of_day};
