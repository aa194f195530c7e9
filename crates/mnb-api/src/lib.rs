pub mod auth;
pub mod config;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod middleware;
pub mod review;
pub mod router;
pub mod state;
pub mod stats;
pub mod tracing;
pub mod v1;

pub use config::ApiConfig;
pub use state::{ApiState, AuthConfig};
