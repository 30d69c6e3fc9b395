//! PhishGuard API Server
//!
//! HTTP/WebSocket transport over the phishguard-core detection engine.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                   PHISHGUARD SERVER                    │
//! ├────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌──────────────┐  ┌────────────────┐  │
//! │  │  API      │  │  WebSocket   │  │  Blocking Pool │  │
//! │  │  Gateway  │  │  Progress    │  │  (CPU-bound    │  │
//! │  │  (Axum)   │  │  Streaming   │  │   analysis)    │  │
//! │  └─────┬─────┘  └──────┬───────┘  └───────┬────────┘  │
//! │        └───────────────┼──────────────────┘           │
//! │                        ▼                               │
//! │              ┌──────────────────┐                      │
//! │              │ SignalAggregator │                      │
//! │              │ (phishguard-core)│                      │
//! │              └──────────────────┘                      │
//! └────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod handlers;
mod models;

use axum::{
    routing::{get, post},
    Router,
};
use phishguard_core::{DetectionPolicy, SignalAggregator};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "phishguard_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    tracing::info!("PhishGuard server starting...");

    // Build the detection policy: external file when configured,
    // built-in catalog otherwise
    let policy = match &config.policy_path {
        Some(path) => DetectionPolicy::from_json_file(path)?,
        None => DetectionPolicy::default(),
    };
    tracing::info!("Detection policy '{}' active", policy.version);

    // Statistical collaborators are deployment-specific; the default
    // build runs rule-only with the image channel absent
    let engine = Arc::new(SignalAggregator::new(policy));

    let state = AppState {
        engine,
        config: config.clone(),
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SignalAggregator>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health::index))
        .route("/health", get(handlers::health::check))
        .route("/api/v1/analyze", post(handlers::analyze::analyze))
        .route("/ws/analyze", get(handlers::ws::analyze_ws))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
