pub mod routes;
pub mod service;

pub use routes::routes;
pub use service::{BucketStats, ReviewStats, StatsService};
