use async_trait::async_trait;
use entity::{care_events, children};
use sea_orm::{
    entity::*, query::*, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    PaginatorTrait, Statement, TransactionTrait,
};
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use super::{CappedInsert, CareRepository, RepoResult};
use crate::models::care::{CareEvent, Child, NewCareEvent, NewChild};

/// Postgres-backed children and care event store
#[derive(Clone)]
pub struct SeaOrmCareRepository {
    db: DatabaseConnection,
}

impl SeaOrmCareRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn event_model(event: NewCareEvent) -> care_events::ActiveModel {
        care_events::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(event.user_id),
            child_id: Set(event.child_id),
            event_type: Set(event.event_type),
            occurred_at: Set(event.occurred_at),
            notes: Set(event.notes),
            created_at: Set(OffsetDateTime::now_utc()),
        }
    }

    fn child_model(child: NewChild) -> children::ActiveModel {
        children::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(child.user_id),
            name: Set(child.name),
            birth_date: Set(child.birth_date),
            created_at: Set(OffsetDateTime::now_utc()),
        }
    }

    /// Open a transaction holding the user's capacity lock until it ends.
    /// Free users may have no subscription row to lock, so this takes a
    /// transaction-scoped advisory lock keyed by user id instead.
    async fn begin_locked(&self, user_id: Uuid) -> RepoResult<DatabaseTransaction> {
        let txn = self.db.begin().await?;

        txn.execute(Statement::from_sql_and_values(
            txn.get_database_backend(),
            "SELECT pg_advisory_xact_lock(hashtextextended($1, 0))",
            [format!("care:{}", user_id).into()],
        ))
        .await?;

        Ok(txn)
    }
}

#[async_trait]
impl CareRepository for SeaOrmCareRepository {
    #[instrument(skip(self))]
    async fn count_events_since(&self, user_id: Uuid, since: OffsetDateTime) -> RepoResult<u64> {
        care_events::Entity::find()
            .filter(care_events::Column::UserId.eq(user_id))
            .filter(care_events::Column::CreatedAt.gte(since))
            .count(&self.db)
            .await
    }

    #[instrument(skip(self, event), fields(user_id = %event.user_id))]
    async fn insert_event_capped(
        &self,
        event: NewCareEvent,
        since: OffsetDateTime,
        limit: Option<u64>,
    ) -> RepoResult<CappedInsert<CareEvent>> {
        let Some(limit) = limit else {
            let saved = Self::event_model(event).insert(&self.db).await?;
            return Ok(CappedInsert::Inserted(saved.into()));
        };

        let txn = self.begin_locked(event.user_id).await?;

        let used = care_events::Entity::find()
            .filter(care_events::Column::UserId.eq(event.user_id))
            .filter(care_events::Column::CreatedAt.gte(since))
            .count(&txn)
            .await?;

        if used >= limit {
            txn.rollback().await?;
            return Ok(CappedInsert::AtCapacity { used });
        }

        let saved = Self::event_model(event).insert(&txn).await?;
        txn.commit().await?;

        Ok(CappedInsert::Inserted(saved.into()))
    }

    #[instrument(skip(self))]
    async fn list_events(&self, user_id: Uuid, limit: u64) -> RepoResult<Vec<CareEvent>> {
        let events = care_events::Entity::find()
            .filter(care_events::Column::UserId.eq(user_id))
            .order_by_desc(care_events::Column::OccurredAt)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(events.into_iter().map(CareEvent::from).collect())
    }

    #[instrument(skip(self))]
    async fn count_children(&self, user_id: Uuid) -> RepoResult<u64> {
        children::Entity::find()
            .filter(children::Column::UserId.eq(user_id))
            .count(&self.db)
            .await
    }

    #[instrument(skip(self, child), fields(user_id = %child.user_id))]
    async fn insert_child_capped(
        &self,
        child: NewChild,
        limit: Option<u64>,
    ) -> RepoResult<CappedInsert<Child>> {
        let Some(limit) = limit else {
            let saved = Self::child_model(child).insert(&self.db).await?;
            return Ok(CappedInsert::Inserted(saved.into()));
        };

        let txn = self.begin_locked(child.user_id).await?;

        let used = children::Entity::find()
            .filter(children::Column::UserId.eq(child.user_id))
            .count(&txn)
            .await?;

        if used >= limit {
            txn.rollback().await?;
            return Ok(CappedInsert::AtCapacity { used });
        }

        let saved = Self::child_model(child).insert(&txn).await?;
        txn.commit().await?;

        Ok(CappedInsert::Inserted(saved.into()))
    }

    #[instrument(skip(self))]
    async fn child_belongs_to(&self, child_id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        let count = children::Entity::find()
            .filter(children::Column::Id.eq(child_id))
            .filter(children::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }
}
