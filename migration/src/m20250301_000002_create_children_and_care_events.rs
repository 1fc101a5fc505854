use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Children::Table)
                    .if_not_exists()
                    .col(pk_uuid(Children::Id))
                    .col(uuid(Children::UserId).not_null())
                    .col(string(Children::Name).not_null())
                    .col(date_null(Children::BirthDate))
                    .col(
                        timestamp_with_time_zone(Children::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_children_user_id")
                    .table(Children::Table)
                    .col(Children::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CareEvents::Table)
                    .if_not_exists()
                    .col(pk_uuid(CareEvents::Id))
                    .col(uuid(CareEvents::UserId).not_null())
                    .col(uuid(CareEvents::ChildId).not_null())
                    .col(string_len(CareEvents::EventType, 32).not_null())
                    .col(timestamp_with_time_zone(CareEvents::OccurredAt).not_null())
                    .col(text_null(CareEvents::Notes))
                    .col(
                        timestamp_with_time_zone(CareEvents::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_care_events_child_id")
                            .from(CareEvents::Table, CareEvents::ChildId)
                            .to(Children::Table, Children::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Monthly quota counts filter on (user_id, created_at)
        manager
            .create_index(
                Index::create()
                    .name("idx_care_events_user_created_at")
                    .table(CareEvents::Table)
                    .col(CareEvents::UserId)
                    .col(CareEvents::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CareEvents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Children::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Children {
    Table,
    Id,
    UserId,
    Name,
    BirthDate,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CareEvents {
    Table,
    Id,
    UserId,
    ChildId,
    EventType,
    OccurredAt,
    Notes,
    CreatedAt,
}
