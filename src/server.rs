//! # Server Configuration
//!
//! Router assembly and server startup for the webhook collector API.

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::handlers;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/status", get(handlers::status))
        .route("/webhook/cakto/sync", get(handlers::webhooks::cakto_sync))
        .route("/webhook/{platform}", post(handlers::webhooks::ingest))
        .route(
            "/webhook/{platform}/test",
            get(handlers::webhooks::webhook_test),
        )
        .route("/export/stats", get(handlers::export::stats))
        .route("/export/excel", get(handlers::export::excel))
        .route("/export/csv", get(handlers::export::csv))
        .route("/admin/retention", delete(handlers::export::retention))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;
    let profile = config.profile.clone();

    let state = AppState {
        db,
        config: Arc::new(config),
    };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, profile, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::status,
        crate::handlers::webhooks::ingest,
        crate::handlers::webhooks::cakto_sync,
        crate::handlers::webhooks::webhook_test,
        crate::handlers::export::stats,
        crate::handlers::export::excel,
        crate::handlers::export::csv,
        crate::handlers::export::retention,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::repositories::PlatformStat,
            crate::repositories::EventTypeStat,
        )
    ),
    info(
        title = "Webhook Collector API",
        description = "Ingests checkout webhooks from Kirvano, Hubla, Braip and Cakto, normalizes them into a single events table and produces Excel/CSV reports",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
