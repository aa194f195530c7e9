use std::sync::Arc;

use anyhow::Context;
use axum::{Router, middleware, routing::get};
use mnb_api::{
    config::{ApiConfig, StorageBackend},
    jobs,
    metrics::{init_metrics, metrics_handler, track_metrics},
    middleware::{create_cors_layer, request_id_middleware},
    state::ApiState,
    tracing::init_tracing,
};
use mnb_db::{MemoryStore, MistakeStore, PgStore, ReviewStore};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment variables
    dotenvy::dotenv().ok();
    let config = ApiConfig::from_env().context("invalid configuration")?;

    init_tracing(config.env)?;
    let metrics_handle = init_metrics().context("failed to install metrics recorder")?;

    let (reviews, mistakes): (Arc<dyn ReviewStore>, Arc<dyn MistakeStore>) = match config.storage
    {
        StorageBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required when STORAGE=postgres")?;
            let pool = mnb_db::create_pool(database_url, config.db_max_connections).await?;
            mnb_db::ensure_db_and_migrate(database_url, &pool).await?;

            let store = Arc::new(PgStore::new(pool));
            (store.clone(), store)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on restart");
            let store = Arc::new(MemoryStore::new());
            (store.clone(), store)
        }
    };

    let state = ApiState::new(&config, reviews, mistakes)?;

    let _session_sweep = jobs::start_session_sweep_job(state.sessions.clone());
    if config.review_reminder_enabled {
        let _reminder = jobs::start_review_reminder_job(state.reviews.clone());
    }

    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    let app = mnb_api::router::router()
        .with_state(state)
        .merge(metrics_router)
        .layer(middleware::from_fn(track_metrics))
        .layer(create_cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    tracing::info!(%address, env = ?config.env, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
