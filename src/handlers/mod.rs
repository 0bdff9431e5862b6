//! HTTP handlers for the collector API.

pub mod export;
pub mod webhooks;

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::db;
use crate::error::ApiError;
use crate::models::ServiceInfo;
use crate::server::AppState;

/// Service identity and endpoint listing.
#[utoipa::path(
    get,
    path = "/",
    tag = "service",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    )
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::current())
}

/// Liveness probe that also checks database connectivity.
#[utoipa::path(
    get,
    path = "/status",
    tag = "service",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Database unavailable", body = ApiError)
    )
)]
pub async fn status(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    if let Err(err) = db::health_check(&state.db).await {
        tracing::error!("health check failed: {:?}", err);
        return Err(crate::error::ErrorType::ServiceUnavailable.into());
    }

    Ok(Json(json!({
        "status": "healthy",
        "database": "connected",
    })))
}
