use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use mnb_db::{MistakeStore, ReviewStore};
use mnb_srs::Scheduler;

use crate::{
    ApiConfig,
    config::ConfigError,
    review::{ReviewCoordinator, ReviewService},
    stats::StatsService,
};

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Clone)]
pub struct ApiState {
    pub reviews: ReviewService,
    pub stats: StatsService,
    pub sessions: ReviewCoordinator,
    pub auth: AuthConfig,
    pub cookie_key: Key,
}

impl ApiState {
    /// Wire the services over the given stores.
    pub fn new(
        config: &ApiConfig,
        reviews: Arc<dyn ReviewStore>,
        mistakes: Arc<dyn MistakeStore>,
    ) -> Result<Self, ConfigError> {
        let scheduler = Scheduler::new(config.scheduler_config())?;
        let day_offset = config.day_offset()?;

        let cookie_key =
            Key::try_from(config.cookie_secret.as_bytes()).map_err(|_| ConfigError::SecretTooShort {
                name: "COOKIE_SECRET",
                min: 64,
            })?;

        let review_service = ReviewService::new(reviews.clone(), mistakes.clone(), scheduler);
        let stats = StatsService::new(reviews, mistakes, day_offset);
        let sessions = ReviewCoordinator::new(review_service.clone());

        Ok(Self {
            reviews: review_service,
            stats,
            sessions,
            auth: AuthConfig {
                jwt_secret: config.jwt_secret.clone(),
            },
            cookie_key,
        })
    }
}

impl FromRef<ApiState> for Key {
    fn from_ref(state: &ApiState) -> Self {
        state.cookie_key.clone()
    }
}

impl FromRef<ApiState> for AuthConfig {
    fn from_ref(state: &ApiState) -> Self {
        state.auth.clone()
    }
}
