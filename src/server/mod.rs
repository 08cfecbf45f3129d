use axum::{
    http::{HeaderValue, Method, StatusCode},
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use crate::config::JobTrendsConfig;
use crate::storage::SqliteStore;

pub mod error;
pub mod routes;

/// Server state
pub struct AppState {
    pub store: SqliteStore,
    pub config: JobTrendsConfig,
}

impl AppState {
    pub fn new(store: SqliteStore, config: JobTrendsConfig) -> Arc<Self> {
        Arc::new(Self { store, config })
    }
}

/// Assemble the HTTP surface with CORS, tracing and a per-request timeout
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);
    let timeout = state.config.request_timeout();

    Router::new()
        .route("/analytics/summary", get(routes::get_summary))
        .route("/jobs", get(routes::list_jobs).post(routes::create_job))
        .route("/jobs/count", get(routes::count_jobs))
        .route("/jobs/{id}", get(routes::get_job))
        .route("/health", get(routes::health))
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        tracing::warn!("CORS allows any origin; set cors_allowed_origins to restrict it");
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

pub async fn start_server(config: JobTrendsConfig) -> anyhow::Result<()> {
    crate::config::ensure_db_dir(&config.database)?;
    let store = SqliteStore::open(&config.database, &config.store_options())?;
    tracing::info!("Database tables ready at {:?}", config.database);

    let addr = config.bind_addr();
    let app = build_router(AppState::new(store, config));

    tracing::info!("Starting server on {}", addr);
    println!("🌍 Server running at http://{}", addr);
    println!("📍 Health check: http://{}/health", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received ctrl+c, shutting down"),
        Err(e) => tracing::error!("Failed to listen for ctrl+c: {}", e),
    }
}
