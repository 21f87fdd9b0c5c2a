//! HTTP server implementation using Axum.

use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use voxlead_channels::{Mailer, VoiceClient};
use voxlead_core::VoxleadConfig;
use voxlead_core::error::Result;
use voxlead_dispatch::{DispatchJob, spawn_dispatch_loop};
use voxlead_store::SqliteStore;

/// Shared state for the gateway server.
pub struct AppState {
    pub config: VoxleadConfig,
    pub store: Arc<SqliteStore>,
    pub mailer: Arc<Mailer>,
    pub voice: VoiceClient,
    pub job: DispatchJob,
    pub start_time: std::time::Instant,
    /// Bearer secret for the cron trigger. None = open (local testing).
    pub cron_secret: Option<String>,
}

/// Build the Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(super::routes::health_check))
        .route("/api/v1/info", get(super::routes::system_info))
        .route("/api/v1/call", post(super::routes::call_intake))
        .route("/api/v1/contact", post(super::routes::contact))
        // The scheduler can hit the trigger with either method.
        .route(
            "/api/v1/cron/dispatch",
            get(super::routes::cron_dispatch).post(super::routes::cron_dispatch),
        )
        .layer(
            CorsLayer::new()
                .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
                .allow_headers(Any)
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn start(config: VoxleadConfig) -> Result<()> {
    let db_path = shellexpand::tilde(&config.database.path).to_string();
    if let Some(parent) = Path::new(&db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = Arc::new(SqliteStore::open(Path::new(&db_path))?);
    tracing::info!("💾 Lead store initialized: {db_path}");

    let mailer = Arc::new(Mailer::new(config.smtp.clone()));
    if !mailer.is_smtp_configured() {
        tracing::warn!("⚠️ SMTP not configured — follow-up dispatch will be skipped");
    }

    let voice = VoiceClient::new(config.voice.clone());
    if !voice.is_configured() {
        tracing::warn!("⚠️ Voice vendor not configured — intake calls will fail");
    }

    let job = DispatchJob::new(store.clone(), mailer.clone());

    // In-process dispatch loop; 0 means an external scheduler hits the
    // trigger endpoint instead.
    if config.dispatch.interval_secs > 0 {
        tokio::spawn(spawn_dispatch_loop(
            job.clone(),
            config.dispatch.interval_secs,
        ));
    }

    let cron_secret = if config.dispatch.cron_secret.is_empty() {
        None
    } else {
        Some(config.dispatch.cron_secret.clone())
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState {
        config,
        store,
        mailer,
        voice,
        job,
        start_time: std::time::Instant::now(),
        cron_secret,
    });

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("🌐 Gateway server listening on http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
