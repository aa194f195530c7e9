use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::mastery::{MasteryStatus, Outcome, ZeroLevelPolicy};

/// Default review intervals in days, indexed by review stage
pub const DEFAULT_INTERVAL_DAYS: [i64; 6] = [1, 2, 4, 7, 15, 30];

/// Highest mastery level a mistake can reach
pub const MAX_MASTERY_LEVEL: i32 = 100;

/// Longest configurable review interval (about a century)
pub const MAX_INTERVAL_DAYS: i64 = 36_500;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("interval table must not be empty")]
    EmptyIntervals,
    #[error("interval table must be positive and strictly increasing, got {0:?}")]
    NonIncreasingIntervals(Vec<i64>),
    #[error("{0} must not be negative")]
    NegativeStep(&'static str),
    #[error("{name} must be at most {max}, got {value}", max = MAX_MASTERY_LEVEL)]
    StepTooLarge { name: &'static str, value: i32 },
    #[error("review interval of {0} days exceeds the maximum of {max}", max = MAX_INTERVAL_DAYS)]
    IntervalTooLong(i64),
}

/// Tunables of the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Days until the next review, indexed by stage. Lookups past the end reuse the last entry.
    pub interval_days: Vec<i64>,
    /// Level added on a correct answer
    pub correct_gain: i32,
    /// Level removed on an incorrect answer
    pub incorrect_penalty: i32,
    pub zero_level: ZeroLevelPolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_days: DEFAULT_INTERVAL_DAYS.to_vec(),
            correct_gain: 25,
            incorrect_penalty: 10,
            zero_level: ZeroLevelPolicy::NotMastered,
        }
    }
}

/// Result of scheduling one review outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleUpdate {
    pub stage: i32,
    pub mastery_level: i32,
    pub status: MasteryStatus,
    pub next_review_time: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    intervals: Vec<Duration>,
    correct_gain: i32,
    incorrect_penalty: i32,
    zero_level: ZeroLevelPolicy,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            intervals: DEFAULT_INTERVAL_DAYS.iter().copied().map(Duration::days).collect(),
            correct_gain: 25,
            incorrect_penalty: 10,
            zero_level: ZeroLevelPolicy::NotMastered,
        }
    }
}

impl Scheduler {
    /// Build a scheduler from a validated configuration.
    pub fn new(config: SchedulerConfig) -> Result<Self, ConfigError> {
        if config.interval_days.is_empty() {
            return Err(ConfigError::EmptyIntervals);
        }
        let increasing = config.interval_days[0] > 0
            && config.interval_days.windows(2).all(|w| w[0] < w[1]);
        if !increasing {
            return Err(ConfigError::NonIncreasingIntervals(config.interval_days));
        }
        // Strictly increasing, so the last entry is the longest
        let longest = config.interval_days[config.interval_days.len() - 1];
        if longest > MAX_INTERVAL_DAYS {
            return Err(ConfigError::IntervalTooLong(longest));
        }
        check_step("correct gain", config.correct_gain)?;
        check_step("incorrect penalty", config.incorrect_penalty)?;

        Ok(Self {
            intervals: config.interval_days.into_iter().map(Duration::days).collect(),
            correct_gain: config.correct_gain,
            incorrect_penalty: config.incorrect_penalty,
            zero_level: config.zero_level,
        })
    }

    /// Compute the new stage, mastery and next review time for one outcome.
    ///
    /// # Algorithm
    ///
    /// * Correct: stage moves up by one and the level gains `correct_gain` (capped at 100).
    /// * Incorrect: stage moves back by one (never below 0) and the level loses
    ///   `incorrect_penalty` (never below 0).
    /// * Status is `mastered` at 100, the zero-level policy status at 0, `reviewing` otherwise.
    /// * The next review is `now` plus the interval of the new stage, clamped to the table.
    ///
    /// Out-of-range inputs are clamped first, so this never fails and the returned level
    /// always lies in `0..=100`.
    pub fn compute_next(
        &self,
        stage: i32,
        mastery_level: i32,
        outcome: Outcome,
        now: DateTime<Utc>,
    ) -> ScheduleUpdate {
        let stage = stage.max(0);
        let level = mastery_level.clamp(0, MAX_MASTERY_LEVEL);

        let (stage, level) = match outcome {
            Outcome::Correct => (
                stage.saturating_add(1),
                level
                    .saturating_add(self.correct_gain)
                    .min(MAX_MASTERY_LEVEL),
            ),
            Outcome::Incorrect => (
                (stage - 1).max(0),
                level.saturating_sub(self.incorrect_penalty).max(0),
            ),
        };

        // Saturate at the end of representable time instead of panicking
        let next_review_time = now
            .checked_add_signed(self.interval_for_stage(stage))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        ScheduleUpdate {
            stage,
            mastery_level: level,
            status: self.status_for_level(level),
            next_review_time,
        }
    }

    /// Interval for a stage; stages past the end of the table reuse the last entry.
    pub fn interval_for_stage(&self, stage: i32) -> Duration {
        let last = self.intervals.len() - 1;
        let index = usize::try_from(stage).map_or(0, |s| s.min(last));
        self.intervals[index]
    }

    pub const fn status_for_level(&self, level: i32) -> MasteryStatus {
        if level >= MAX_MASTERY_LEVEL {
            MasteryStatus::Mastered
        } else if level <= 0 {
            self.zero_level.status()
        } else {
            MasteryStatus::Reviewing
        }
    }
}

fn check_step(name: &'static str, value: i32) -> Result<(), ConfigError> {
    if value < 0 {
        return Err(ConfigError::NegativeStep(name));
    }
    if value > MAX_MASTERY_LEVEL {
        return Err(ConfigError::StepTooLarge { name, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_new_record_correct_answer() {
        let update = Scheduler::default().compute_next(0, 0, Outcome::Correct, now());

        assert_eq!(update.stage, 1);
        assert_eq!(update.mastery_level, 25);
        assert_eq!(update.status, MasteryStatus::Reviewing);
        assert_eq!(update.next_review_time, now() + Duration::days(2));
    }

    #[test]
    fn test_correct_answer_caps_level_and_masters() {
        let update = Scheduler::default().compute_next(3, 90, Outcome::Correct, now());

        assert_eq!(update.mastery_level, 100);
        assert_eq!(update.status, MasteryStatus::Mastered);
        assert_eq!(update.next_review_time, now() + Duration::days(15));
    }

    #[test]
    fn test_incorrect_answer_at_first_stage_stays_at_floor() {
        let scheduler = Scheduler::default();

        let update = scheduler.compute_next(0, 35, Outcome::Incorrect, now());
        assert_eq!(update.stage, 0);
        assert_eq!(update.mastery_level, 25);
        assert_eq!(update.next_review_time, now() + Duration::days(1));

        let update = scheduler.compute_next(0, 5, Outcome::Incorrect, now());
        assert_eq!(update.mastery_level, 0);
        assert_eq!(update.status, MasteryStatus::NotMastered);
    }

    #[test]
    fn test_incorrect_answer_steps_back_one_stage() {
        let update = Scheduler::default().compute_next(4, 75, Outcome::Incorrect, now());

        assert_eq!(update.stage, 3);
        assert_eq!(update.mastery_level, 65);
        assert_eq!(update.next_review_time, now() + Duration::days(7));
    }

    #[test]
    fn test_four_correct_answers_master_from_zero() {
        let scheduler = Scheduler::default();
        let (mut stage, mut level) = (0, 0);

        for _ in 0..3 {
            let update = scheduler.compute_next(stage, level, Outcome::Correct, now());
            (stage, level) = (update.stage, update.mastery_level);
            assert_eq!(update.status, MasteryStatus::Reviewing);
        }

        let update = scheduler.compute_next(stage, level, Outcome::Correct, now());
        assert_eq!(update.status, MasteryStatus::Mastered);
        assert_eq!(update.stage, 4);
    }

    #[test]
    fn test_interval_lookup_is_clamped_after_many_correct_answers() {
        let scheduler = Scheduler::default();
        let mut stage = 0;
        let mut level = 0;

        for _ in 0..50 {
            let update = scheduler.compute_next(stage, level, Outcome::Correct, now());
            assert!(update.stage >= 0);
            assert!(update.next_review_time <= now() + Duration::days(30));
            stage = update.stage;
            level = update.mastery_level;
        }

        assert_eq!(stage, 50);
        assert_eq!(scheduler.interval_for_stage(stage), Duration::days(30));
        assert_eq!(scheduler.interval_for_stage(i32::MAX), Duration::days(30));
        assert_eq!(scheduler.interval_for_stage(-3), Duration::days(1));
    }

    #[test]
    fn test_level_stays_in_bounds_for_any_start() {
        let scheduler = Scheduler::default();

        for start in [-500, -1, 0, 1, 50, 99, 100, 101, 10_000] {
            for outcome in [Outcome::Correct, Outcome::Incorrect] {
                let update = scheduler.compute_next(0, start, outcome, now());
                assert!(
                    (0..=100).contains(&update.mastery_level),
                    "start {start} {outcome} gave {}",
                    update.mastery_level
                );
            }
        }
    }

    #[test]
    fn test_negative_stage_is_treated_as_zero() {
        let update = Scheduler::default().compute_next(-7, 10, Outcome::Correct, now());
        assert_eq!(update.stage, 1);
    }

    #[test]
    fn test_regressed_policy() {
        let scheduler = Scheduler::new(SchedulerConfig {
            zero_level: ZeroLevelPolicy::Regressed,
            ..SchedulerConfig::default()
        })
        .unwrap();

        let update = scheduler.compute_next(2, 10, Outcome::Incorrect, now());
        assert_eq!(update.mastery_level, 0);
        assert_eq!(update.status, MasteryStatus::Regressed);
    }

    #[test]
    fn test_config_validation() {
        let empty = SchedulerConfig {
            interval_days: vec![],
            ..SchedulerConfig::default()
        };
        assert_eq!(Scheduler::new(empty).unwrap_err(), ConfigError::EmptyIntervals);

        let flat = SchedulerConfig {
            interval_days: vec![1, 3, 3],
            ..SchedulerConfig::default()
        };
        assert!(matches!(
            Scheduler::new(flat),
            Err(ConfigError::NonIncreasingIntervals(_))
        ));

        let zero_first = SchedulerConfig {
            interval_days: vec![0, 1],
            ..SchedulerConfig::default()
        };
        assert!(Scheduler::new(zero_first).is_err());

        let negative = SchedulerConfig {
            incorrect_penalty: -10,
            ..SchedulerConfig::default()
        };
        assert_eq!(
            Scheduler::new(negative).unwrap_err(),
            ConfigError::NegativeStep("incorrect penalty")
        );
    }

    #[test]
    fn test_oversized_steps_and_intervals_are_rejected() {
        let gain = SchedulerConfig {
            correct_gain: i32::MAX,
            ..SchedulerConfig::default()
        };
        assert_eq!(
            Scheduler::new(gain).unwrap_err(),
            ConfigError::StepTooLarge {
                name: "correct gain",
                value: i32::MAX
            }
        );

        let penalty = SchedulerConfig {
            incorrect_penalty: 101,
            ..SchedulerConfig::default()
        };
        assert!(matches!(
            Scheduler::new(penalty),
            Err(ConfigError::StepTooLarge { .. })
        ));

        let long = SchedulerConfig {
            interval_days: vec![1, 100_000_000],
            ..SchedulerConfig::default()
        };
        assert_eq!(
            Scheduler::new(long).unwrap_err(),
            ConfigError::IntervalTooLong(100_000_000)
        );
    }

    #[test]
    fn test_largest_allowed_settings_stay_in_bounds() {
        let scheduler = Scheduler::new(SchedulerConfig {
            interval_days: vec![1, MAX_INTERVAL_DAYS],
            correct_gain: MAX_MASTERY_LEVEL,
            incorrect_penalty: MAX_MASTERY_LEVEL,
            ..SchedulerConfig::default()
        })
        .unwrap();

        let update = scheduler.compute_next(0, 50, Outcome::Correct, now());
        assert_eq!(update.mastery_level, 100);
        assert_eq!(update.next_review_time, now() + Duration::days(MAX_INTERVAL_DAYS));

        let update = scheduler.compute_next(0, 50, Outcome::Incorrect, now());
        assert_eq!(update.mastery_level, 0);

        // Near the end of representable time the next review saturates
        let late = DateTime::<Utc>::MAX_UTC - Duration::days(2);
        let update = scheduler.compute_next(0, 0, Outcome::Correct, late);
        assert_eq!(update.next_review_time, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_custom_intervals() {
        let scheduler = Scheduler::new(SchedulerConfig {
            interval_days: vec![1, 3],
            ..SchedulerConfig::default()
        })
        .unwrap();

        let update = scheduler.compute_next(0, 0, Outcome::Correct, now());
        assert_eq!(update.next_review_time, now() + Duration::days(3));
        let update = scheduler.compute_next(7, 0, Outcome::Correct, now());
        assert_eq!(update.next_review_time, now() + Duration::days(3));
    }
}
