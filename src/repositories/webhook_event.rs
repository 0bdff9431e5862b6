//! # Webhook Event Repository
//!
//! Data access for stored webhook events: insertion of normalized deliveries,
//! duplicate probing, filtered listing for exports, aggregate statistics and
//! retention cleanup.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::extractors::{CanonicalEvent, Platform};
use crate::models::webhook_event::{ActiveModel, Column, Entity as WebhookEvents, Model};

/// Filters applied when listing events for exports.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub platform: Option<Platform>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub limit: Option<u64>,
}

/// Per-platform aggregate row.
#[derive(Debug, Clone, Serialize, FromQueryResult, ToSchema)]
pub struct PlatformStat {
    pub platform: String,
    pub event_count: i64,
    pub total_amount: Option<f64>,
}

/// Per-event-type aggregate row.
#[derive(Debug, Clone, Serialize, FromQueryResult, ToSchema)]
pub struct EventTypeStat {
    pub platform: String,
    pub event_type: String,
    pub event_count: i64,
}

/// Repository for webhook event database operations
pub struct WebhookEventRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> WebhookEventRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Persist a normalized event, assigning its id and storage timestamp.
    pub async fn insert(&self, event: CanonicalEvent) -> Result<Model, DbErr> {
        let row = ActiveModel {
            id: Set(Uuid::new_v4()),
            platform: Set(event.platform.as_str().to_string()),
            event_type: Set(event.event_type),
            webhook_id: Set(event.webhook_id),
            transaction_id: Set(event.transaction_id),
            customer_email: Set(event.customer_email),
            customer_name: Set(event.customer_name),
            customer_document: Set(event.customer_document),
            customer_phone: Set(event.customer_phone),
            product_name: Set(event.product_name),
            product_id: Set(event.product_id),
            offer_id: Set(event.offer_id),
            offer_name: Set(event.offer_name),
            product_list: Set(event.product_list),
            amount: Set(event.amount),
            currency: Set(event.currency),
            commission_amount: Set(event.commission_amount),
            payment_method: Set(event.payment_method),
            payment_details: Set(event.payment_details),
            status: Set(event.status),
            affiliate_email: Set(event.affiliate_email),
            utm_source: Set(event.utm_source),
            utm_medium: Set(event.utm_medium),
            utm_campaign: Set(event.utm_campaign),
            sales_link: Set(event.sales_link),
            attendant_name: Set(event.attendant_name),
            attendant_email: Set(event.attendant_email),
            raw_data: Set(event.raw_data),
            created_at: Set(Utc::now().into()),
        };

        row.insert(self.db).await
    }

    /// Check whether a transaction id was already stored for a platform.
    /// Rows with a null transaction id never count as duplicates.
    pub async fn exists_transaction(
        &self,
        platform: Platform,
        transaction_id: &str,
    ) -> Result<bool, DbErr> {
        let count = WebhookEvents::find()
            .filter(Column::Platform.eq(platform.as_str()))
            .filter(Column::TransactionId.eq(transaction_id))
            .count(self.db)
            .await?;

        Ok(count > 0)
    }

    /// List events matching the filter, newest first.
    pub async fn list(&self, filter: EventFilter) -> Result<Vec<Model>, DbErr> {
        let mut query = WebhookEvents::find();

        if let Some(platform) = filter.platform {
            query = query.filter(Column::Platform.eq(platform.as_str()));
        }

        if let Some(start) = filter.start {
            query = query.filter(Column::CreatedAt.gte(start));
        }

        if let Some(end) = filter.end {
            query = query.filter(Column::CreatedAt.lt(end));
        }

        query = query
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id);

        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }

        query.all(self.db).await
    }

    /// Aggregate event count and monetary total per platform within a window.
    pub async fn platform_stats(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<PlatformStat>, DbErr> {
        let mut query = WebhookEvents::find()
            .select_only()
            .column(Column::Platform)
            .column_as(Expr::col(Column::Id).count(), "event_count")
            .column_as(Expr::col(Column::Amount).sum(), "total_amount")
            .group_by(Column::Platform);

        if let Some(start) = start {
            query = query.filter(Column::CreatedAt.gte(start));
        }
        if let Some(end) = end {
            query = query.filter(Column::CreatedAt.lt(end));
        }

        query.into_model::<PlatformStat>().all(self.db).await
    }

    /// Aggregate event counts per platform and event type within a window.
    pub async fn event_type_stats(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<EventTypeStat>, DbErr> {
        let mut query = WebhookEvents::find()
            .select_only()
            .column(Column::Platform)
            .column(Column::EventType)
            .column_as(Expr::col(Column::Id).count(), "event_count")
            .group_by(Column::Platform)
            .group_by(Column::EventType);

        if let Some(start) = start {
            query = query.filter(Column::CreatedAt.gte(start));
        }
        if let Some(end) = end {
            query = query.filter(Column::CreatedAt.lt(end));
        }

        query.into_model::<EventTypeStat>().all(self.db).await
    }

    /// Delete events stored before the cutoff, returning the number removed.
    pub async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, DbErr> {
        let result = WebhookEvents::delete_many()
            .filter(Column::CreatedAt.lt(cutoff))
            .exec(self.db)
            .await?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use migration::Migrator;
    use sea_orm::{ConnectOptions, Database};
    use sea_orm_migration::MigratorTrait;
    use serde_json::json;

    async fn test_db() -> DatabaseConnection {
        // a pooled in-memory sqlite is per-connection, so keep a single one
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1);

        let db = Database::connect(options).await.expect("connect sqlite");
        Migrator::up(&db, None).await.expect("run migrations");
        db
    }

    fn sample_event(
        platform: Platform,
        transaction_id: Option<&str>,
        amount: Option<f64>,
    ) -> CanonicalEvent {
        let mut event = CanonicalEvent::new(platform, &json!({"event": "SALE_APPROVED"}));
        event.transaction_id = transaction_id.map(str::to_string);
        event.amount = amount;
        event.customer_email = Some("ana@example.com".to_string());
        event
    }

    #[tokio::test]
    async fn insert_then_list_round_trips() {
        let db = test_db().await;
        let repo = WebhookEventRepository::new(&db);

        repo.insert(sample_event(Platform::Kirvano, Some("sale_1"), Some(99.90)))
            .await
            .unwrap();
        repo.insert(sample_event(Platform::Hubla, Some("hub_1"), None))
            .await
            .unwrap();

        let rows = repo.list(EventFilter::default()).await.unwrap();
        assert_eq!(rows.len(), 2);

        let filtered = repo
            .list(EventFilter {
                platform: Some(Platform::Kirvano),
                ..EventFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].platform, "kirvano");
        assert_eq!(filtered[0].transaction_id.as_deref(), Some("sale_1"));
        assert_eq!(filtered[0].amount, Some(99.90));
        assert_eq!(filtered[0].customer_email.as_deref(), Some("ana@example.com"));
    }

    #[tokio::test]
    async fn exists_transaction_is_scoped_to_the_platform() {
        let db = test_db().await;
        let repo = WebhookEventRepository::new(&db);

        repo.insert(sample_event(Platform::Kirvano, Some("sale_1"), None))
            .await
            .unwrap();
        // rows without a transaction id never count as duplicates
        repo.insert(sample_event(Platform::Kirvano, None, None))
            .await
            .unwrap();

        assert!(repo
            .exists_transaction(Platform::Kirvano, "sale_1")
            .await
            .unwrap());
        assert!(!repo
            .exists_transaction(Platform::Kirvano, "sale_2")
            .await
            .unwrap());
        assert!(!repo
            .exists_transaction(Platform::Hubla, "sale_1")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn stats_aggregate_counts_and_amounts_per_platform() {
        let db = test_db().await;
        let repo = WebhookEventRepository::new(&db);

        repo.insert(sample_event(Platform::Kirvano, Some("sale_1"), Some(99.90)))
            .await
            .unwrap();
        repo.insert(sample_event(Platform::Kirvano, Some("sale_2"), Some(99.90)))
            .await
            .unwrap();
        repo.insert(sample_event(Platform::Hubla, Some("hub_1"), None))
            .await
            .unwrap();

        let mut stats = repo.platform_stats(None, None).await.unwrap();
        stats.sort_by(|a, b| a.platform.cmp(&b.platform));

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].platform, "hubla");
        assert_eq!(stats[0].event_count, 1);
        // SUM over amount-less rows only is NULL
        assert_eq!(stats[0].total_amount, None);
        assert_eq!(stats[1].platform, "kirvano");
        assert_eq!(stats[1].event_count, 2);
        assert!((stats[1].total_amount.unwrap() - 199.80).abs() < 1e-9);

        let types = repo.event_type_stats(None, None).await.unwrap();
        assert!(types
            .iter()
            .any(|t| t.platform == "kirvano"
                && t.event_type == "SALE_APPROVED"
                && t.event_count == 2));
    }

    #[tokio::test]
    async fn purge_removes_only_rows_before_the_cutoff() {
        let db = test_db().await;
        let repo = WebhookEventRepository::new(&db);

        repo.insert(sample_event(Platform::Cakto, Some("ord_1"), Some(45.0)))
            .await
            .unwrap();

        let kept = repo
            .purge_older_than(Utc::now() - Duration::days(1))
            .await
            .unwrap();
        assert_eq!(kept, 0);

        let removed = repo
            .purge_older_than(Utc::now() + Duration::days(1))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(repo.list(EventFilter::default()).await.unwrap().is_empty());
    }
}
