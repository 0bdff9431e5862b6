//! Repository layer for database access.

pub mod webhook_event;

pub use webhook_event::{EventFilter, EventTypeStat, PlatformStat, WebhookEventRepository};
