//! # Webhook Collector Library
//!
//! Core functionality for the webhook collector service: platform payload
//! extractors, signature verification, persistence, report exports and the
//! HTTP server wiring.

pub mod config;
pub mod db;
pub mod drive;
pub mod error;
pub mod export;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod money;
pub mod repositories;
pub mod server;
pub mod signature;
pub mod telemetry;
pub use migration;
