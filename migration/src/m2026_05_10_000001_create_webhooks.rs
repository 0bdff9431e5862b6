//! Migration to create the webhooks table.
//!
//! One flat, intentionally denormalized table: one row per received or synced
//! event, queryable by platform and insertion time. No foreign keys; the raw
//! payload column is the audit trail.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Webhooks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Webhooks::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Webhooks::Platform).text().not_null())
                    .col(ColumnDef::new(Webhooks::EventType).text().not_null())
                    .col(ColumnDef::new(Webhooks::WebhookId).text().null())
                    .col(ColumnDef::new(Webhooks::TransactionId).text().null())
                    .col(ColumnDef::new(Webhooks::CustomerEmail).text().null())
                    .col(ColumnDef::new(Webhooks::CustomerName).text().null())
                    .col(ColumnDef::new(Webhooks::CustomerDocument).text().null())
                    .col(ColumnDef::new(Webhooks::CustomerPhone).text().null())
                    .col(ColumnDef::new(Webhooks::ProductName).text().null())
                    .col(ColumnDef::new(Webhooks::ProductId).text().null())
                    .col(ColumnDef::new(Webhooks::OfferId).text().null())
                    .col(ColumnDef::new(Webhooks::OfferName).text().null())
                    .col(ColumnDef::new(Webhooks::ProductList).text().null())
                    .col(ColumnDef::new(Webhooks::Amount).double().null())
                    .col(ColumnDef::new(Webhooks::Currency).text().null())
                    .col(ColumnDef::new(Webhooks::CommissionAmount).double().null())
                    .col(ColumnDef::new(Webhooks::PaymentMethod).text().null())
                    .col(ColumnDef::new(Webhooks::PaymentDetails).text().null())
                    .col(ColumnDef::new(Webhooks::Status).text().null())
                    .col(ColumnDef::new(Webhooks::AffiliateEmail).text().null())
                    .col(ColumnDef::new(Webhooks::UtmSource).text().null())
                    .col(ColumnDef::new(Webhooks::UtmMedium).text().null())
                    .col(ColumnDef::new(Webhooks::UtmCampaign).text().null())
                    .col(ColumnDef::new(Webhooks::SalesLink).text().null())
                    .col(ColumnDef::new(Webhooks::AttendantName).text().null())
                    .col(ColumnDef::new(Webhooks::AttendantEmail).text().null())
                    .col(ColumnDef::new(Webhooks::RawData).text().not_null())
                    .col(
                        ColumnDef::new(Webhooks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // created_at is the sole ordering and filtering key for reports
        manager
            .create_index(
                Index::create()
                    .name("idx_webhooks_created_at")
                    .table(Webhooks::Table)
                    .col(Webhooks::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_webhooks_platform")
                    .table(Webhooks::Table)
                    .col(Webhooks::Platform)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Webhooks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Webhooks {
    Table,
    Id,
    Platform,
    EventType,
    WebhookId,
    TransactionId,
    CustomerEmail,
    CustomerName,
    CustomerDocument,
    CustomerPhone,
    ProductName,
    ProductId,
    OfferId,
    OfferName,
    ProductList,
    Amount,
    Currency,
    CommissionAmount,
    PaymentMethod,
    PaymentDetails,
    Status,
    AffiliateEmail,
    UtmSource,
    UtmMedium,
    UtmCampaign,
    SalesLink,
    AttendantName,
    AttendantEmail,
    RawData,
    CreatedAt,
}
