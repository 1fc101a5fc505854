use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Subscriptions::Table)
                    .if_not_exists()
                    .col(pk_uuid(Subscriptions::Id))
                    .col(uuid(Subscriptions::UserId).not_null())
                    .col(string_len(Subscriptions::Plan, 16).not_null().default("free"))
                    .col(string_len(Subscriptions::Status, 16).not_null().default("none"))
                    .col(timestamp_with_time_zone_null(Subscriptions::CurrentPeriodEnd))
                    .col(string_null(Subscriptions::Provider))
                    .col(string_null(Subscriptions::ProviderSubscriptionId))
                    .col(string_null(Subscriptions::ProviderCustomerId))
                    .col(
                        boolean(Subscriptions::CancelAtPeriodEnd)
                            .not_null()
                            .default(false),
                    )
                    .col(boolean(Subscriptions::TrialUsed).not_null().default(false))
                    .col(timestamp_with_time_zone_null(Subscriptions::TrialStartedAt))
                    .col(timestamp_with_time_zone_null(Subscriptions::TrialEndsAt))
                    .col(
                        timestamp_with_time_zone(Subscriptions::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Subscriptions::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // One subscription per user; the upsert conflict target
        manager
            .create_index(
                Index::create()
                    .name("idx_subscriptions_user_id")
                    .table(Subscriptions::Table)
                    .col(Subscriptions::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Admin filters
        manager
            .create_index(
                Index::create()
                    .name("idx_subscriptions_plan_status")
                    .table(Subscriptions::Table)
                    .col(Subscriptions::Plan)
                    .col(Subscriptions::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_subscriptions_provider_customer_id")
                    .table(Subscriptions::Table)
                    .col(Subscriptions::ProviderCustomerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Subscriptions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Subscriptions {
    Table,
    Id,
    UserId,
    Plan,
    Status,
    CurrentPeriodEnd,
    Provider,
    ProviderSubscriptionId,
    ProviderCustomerId,
    CancelAtPeriodEnd,
    TrialUsed,
    TrialStartedAt,
    TrialEndsAt,
    CreatedAt,
    UpdatedAt,
}
