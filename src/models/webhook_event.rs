//! Webhook event entity model
//!
//! SeaORM entity for the `webhooks` table, one row per normalized delivery
//! from any supported platform. Every extracted field is nullable; only the
//! platform, event type and raw payload are guaranteed present.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "webhooks")]
pub struct Model {
    /// Unique identifier for the stored event (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Source platform slug (kirvano, hubla, braip, cakto)
    pub platform: String,

    /// Platform-reported event name, or "webhook" when absent
    pub event_type: String,

    /// Platform-side delivery/checkout identifier
    pub webhook_id: Option<String>,

    /// Platform-side sale/transaction identifier
    pub transaction_id: Option<String>,

    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub customer_document: Option<String>,
    pub customer_phone: Option<String>,

    pub product_name: Option<String>,
    pub product_id: Option<String>,
    pub offer_id: Option<String>,
    pub offer_name: Option<String>,

    /// JSON-serialized product array when the payload carries more than one
    pub product_list: Option<String>,

    /// Monetary total in currency base units
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub commission_amount: Option<f64>,

    pub payment_method: Option<String>,

    /// JSON-serialized payment detail section (boleto line, pix code, ...)
    pub payment_details: Option<String>,

    pub status: Option<String>,
    pub affiliate_email: Option<String>,

    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub sales_link: Option<String>,

    pub attendant_name: Option<String>,
    pub attendant_email: Option<String>,

    /// Exact JSON body as delivered
    pub raw_data: String,

    /// Timestamp when the event was stored
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
