use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AdminAuditLogs::Table)
                    .if_not_exists()
                    .col(pk_uuid(AdminAuditLogs::Id))
                    .col(uuid(AdminAuditLogs::AdminId).not_null())
                    .col(uuid(AdminAuditLogs::TargetUserId).not_null())
                    .col(string_len(AdminAuditLogs::Action, 32).not_null())
                    .col(string_len(AdminAuditLogs::Plan, 16).not_null())
                    .col(string_len(AdminAuditLogs::Status, 16).not_null())
                    .col(
                        timestamp_with_time_zone(AdminAuditLogs::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_admin_audit_logs_target_user_id")
                    .table(AdminAuditLogs::Table)
                    .col(AdminAuditLogs::TargetUserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AdminAuditLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AdminAuditLogs {
    Table,
    Id,
    AdminId,
    TargetUserId,
    Action,
    Plan,
    Status,
    CreatedAt,
}
