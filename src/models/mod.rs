//! Data models for the webhook collector.

pub mod webhook_event;

pub use webhook_event::Model as WebhookEvent;

use serde::Serialize;
use utoipa::ToSchema;

/// Service identity returned from the root endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub status: String,
    pub endpoints: Vec<String>,
}

impl ServiceInfo {
    pub fn current() -> Self {
        Self {
            service: "webhook-collector".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            status: "online".to_string(),
            endpoints: vec![
                "POST /webhook/kirvano".to_string(),
                "POST /webhook/hubla".to_string(),
                "POST /webhook/braip".to_string(),
                "POST /webhook/cakto".to_string(),
                "GET /webhook/cakto/sync".to_string(),
                "GET /webhook/{platform}/test".to_string(),
                "GET /export/stats".to_string(),
                "GET /export/excel".to_string(),
                "GET /export/csv".to_string(),
                "DELETE /admin/retention".to_string(),
                "GET /status".to_string(),
                "GET /docs".to_string(),
            ],
        }
    }
}
