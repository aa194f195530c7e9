use chrono::FixedOffset;
use mnb_srs::{DEFAULT_INTERVAL_DAYS, SchedulerConfig, ZeroLevelPolicy};
use serde::Deserialize;
use thiserror::Error;

const MIN_JWT_SECRET_LEN: usize = 32;
const MIN_COOKIE_SECRET_LEN: usize = 64;

/// Deployment environment, selects the log format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Where review records and mistakes live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    /// Process-local store, lost on restart
    Memory,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration from environment: {0}")]
    Env(#[from] envy::Error),

    #[error("DATABASE_URL is required when STORAGE=postgres")]
    MissingDatabaseUrl,

    #[error("{name} must be at least {min} characters long")]
    SecretTooShort { name: &'static str, min: usize },

    #[error("invalid scheduler configuration: {0}")]
    Scheduler(#[from] mnb_srs::ConfigError),

    #[error("REVIEW_DAY_OFFSET_MINUTES must be within ±1439, got {0}")]
    DayOffset(i32),
}

/// Server configuration, read from environment variables of the same name in
/// upper case (`PORT`, `JWT_SECRET`, `SRS_INTERVAL_DAYS`, ...).
#[derive(Clone, Debug, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub env: Environment,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub cookie_secret: String,
    /// Comma separated list of origins allowed by CORS
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_interval_days")]
    pub srs_interval_days: Vec<i64>,
    #[serde(default = "default_correct_gain")]
    pub srs_correct_gain: i32,
    #[serde(default = "default_incorrect_penalty")]
    pub srs_incorrect_penalty: i32,
    #[serde(default)]
    pub srs_zero_level_status: ZeroLevelPolicy,
    /// UTC offset of the user's calendar day, used for "due today"
    #[serde(default)]
    pub review_day_offset_minutes: i32,
    #[serde(default)]
    pub review_reminder_enabled: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_db_max_connections() -> u32 {
    10
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:8080".to_string()]
}

fn default_interval_days() -> Vec<i64> {
    DEFAULT_INTERVAL_DAYS.to_vec()
}

const fn default_correct_gain() -> i32 {
    25
}

const fn default_incorrect_penalty() -> i32 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            env: Environment::default(),
            host: default_host(),
            port: default_port(),
            storage: StorageBackend::default(),
            database_url: None,
            db_max_connections: default_db_max_connections(),
            jwt_secret: String::new(),
            cookie_secret: String::new(),
            allowed_origins: default_allowed_origins(),
            srs_interval_days: default_interval_days(),
            srs_correct_gain: default_correct_gain(),
            srs_incorrect_penalty: default_incorrect_penalty(),
            srs_zero_level_status: ZeroLevelPolicy::default(),
            review_day_offset_minutes: 0,
            review_reminder_enabled: false,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Build the configuration from explicit `(NAME, value)` pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Self = envy::from_iter(vars)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage == StorageBackend::Postgres && self.database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        if self.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::SecretTooShort {
                name: "JWT_SECRET",
                min: MIN_JWT_SECRET_LEN,
            });
        }
        if self.cookie_secret.len() < MIN_COOKIE_SECRET_LEN {
            return Err(ConfigError::SecretTooShort {
                name: "COOKIE_SECRET",
                min: MIN_COOKIE_SECRET_LEN,
            });
        }
        mnb_srs::Scheduler::new(self.scheduler_config())?;
        self.day_offset()?;
        Ok(())
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            interval_days: self.srs_interval_days.clone(),
            correct_gain: self.srs_correct_gain,
            incorrect_penalty: self.srs_incorrect_penalty,
            zero_level: self.srs_zero_level_status,
        }
    }

    pub fn day_offset(&self) -> Result<FixedOffset, ConfigError> {
        let minutes = self.review_day_offset_minutes;
        if minutes.abs() >= 24 * 60 {
            return Err(ConfigError::DayOffset(minutes));
        }
        FixedOffset::east_opt(minutes * 60).ok_or(ConfigError::DayOffset(minutes))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
