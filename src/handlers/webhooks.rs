//! Webhook ingestion handlers.
//!
//! One ingestion endpoint serves every platform: the path segment selects the
//! extractor, the signature check runs against the raw body, and the
//! normalized event is stored with its full payload. A delivery is only
//! acknowledged after the row is committed.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::error::{ApiError, ErrorType, provider_error, validation_error};
use crate::extractors::{self, Platform};
use crate::repositories::WebhookEventRepository;
use crate::server::AppState;
use crate::signature;

/// Ingest a webhook delivery from one of the supported platforms.
#[utoipa::path(
    post,
    path = "/webhook/{platform}",
    tag = "webhooks",
    params(
        ("platform" = String, Path, description = "Platform slug: kirvano, hubla, braip or cakto")
    ),
    responses(
        (status = 200, description = "Event stored"),
        (status = 403, description = "Signature verification failed", body = ApiError),
        (status = 404, description = "Unknown platform", body = ApiError),
        (status = 409, description = "Duplicate transaction", body = ApiError),
        (status = 500, description = "Payload could not be processed", body = ApiError)
    )
)]
pub async fn ingest(
    State(state): State<AppState>,
    Path(platform): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let platform: Platform = platform.parse().map_err(|_| {
        ApiError::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Unknown webhook platform",
        )
    })?;

    signature::verify_webhook(platform, &body, &headers, &state.config)?;

    let payload: Value = serde_json::from_slice(&body).map_err(|err| {
        error!(
            platform = %platform,
            error = %err,
            raw_body = %String::from_utf8_lossy(&body),
            "webhook payload is not valid JSON"
        );
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "Failed to process webhook payload",
        )
    })?;

    let event = extractors::extract(platform, &payload);

    let repo = WebhookEventRepository::new(&state.db);

    if state.config.enforce_unique_transactions
        && let Some(transaction_id) = event.transaction_id.as_deref()
        && repo.exists_transaction(platform, transaction_id).await?
    {
        warn!(platform = %platform, transaction_id, "duplicate transaction rejected");
        return Err(ErrorType::Conflict.into());
    }

    let stored = repo.insert(event).await.map_err(|err| {
        error!(
            platform = %platform,
            error = %err,
            raw_body = %String::from_utf8_lossy(&body),
            "failed to store webhook event"
        );
        ApiError::from(err)
    })?;

    info!(
        platform = %platform,
        event_type = %stored.event_type,
        id = %stored.id,
        "webhook event stored"
    );

    Ok(Json(json!({
        "status": "ok",
        "platform": stored.platform,
        "event_type": stored.event_type,
        "id": stored.id,
    })))
}

/// Pull recent orders from the Cakto API and store any not yet seen.
#[utoipa::path(
    get,
    path = "/webhook/cakto/sync",
    tag = "webhooks",
    responses(
        (status = 200, description = "Sync summary"),
        (status = 400, description = "Cakto API key not configured", body = ApiError),
        (status = 502, description = "Cakto API error", body = ApiError)
    )
)]
pub async fn cakto_sync(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let Some(api_key) = state.config.cakto_api_key.as_deref() else {
        return Err(validation_error(
            "Cakto API key is not configured",
            json!({"setting": "COLLECTOR_CAKTO_API_KEY"}),
        ));
    };

    let url = format!("{}/orders", state.config.cakto_api_base);
    let response = reqwest::Client::new()
        .get(&url)
        .bearer_auth(api_key)
        .send()
        .await
        .map_err(|err| {
            error!(error = %err, "cakto order sync request failed");
            provider_error("cakto".to_string(), 0, Some(err.to_string()))
        })?;

    let upstream_status = response.status();
    if !upstream_status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(provider_error(
            "cakto".to_string(),
            upstream_status.as_u16(),
            Some(body),
        ));
    }

    let body: Value = response.json().await.map_err(|err| {
        error!(error = %err, "cakto order sync returned unreadable body");
        provider_error("cakto".to_string(), upstream_status.as_u16(), Some(err.to_string()))
    })?;

    // Orders arrive as a bare array or under an orders/results envelope
    let orders = body
        .as_array()
        .cloned()
        .or_else(|| body.get("orders").and_then(Value::as_array).cloned())
        .or_else(|| body.get("results").and_then(Value::as_array).cloned())
        .unwrap_or_default();

    let repo = WebhookEventRepository::new(&state.db);
    let mut synced = 0u64;
    let mut skipped = 0u64;

    for order in &orders {
        let event = extractors::extract(Platform::Cakto, order);

        if let Some(transaction_id) = event.transaction_id.as_deref()
            && repo.exists_transaction(Platform::Cakto, transaction_id).await?
        {
            skipped += 1;
            continue;
        }

        repo.insert(event).await?;
        synced += 1;
    }

    info!(synced, skipped, total = orders.len(), "cakto order sync finished");

    Ok(Json(json!({
        "status": "ok",
        "synced": synced,
        "skipped": skipped,
    })))
}

/// Report whether a platform is known and has a secret configured.
#[utoipa::path(
    get,
    path = "/webhook/{platform}/test",
    tag = "webhooks",
    params(
        ("platform" = String, Path, description = "Platform slug")
    ),
    responses(
        (status = 200, description = "Platform configuration summary"),
        (status = 404, description = "Unknown platform", body = ApiError)
    )
)]
pub async fn webhook_test(
    State(state): State<AppState>,
    Path(platform): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let platform: Platform = platform.parse().map_err(|_| {
        ApiError::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Unknown webhook platform",
        )
    })?;

    Ok(Json(json!({
        "platform": platform.as_str(),
        "endpoint": format!("/webhook/{}", platform.as_str()),
        "signature_header": platform.signature_header(),
        "secret_configured": signature::platform_secret(platform, &state.config).is_some(),
    })))
}
