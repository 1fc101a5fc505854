use async_trait::async_trait;
use entity::{
    admin_audit_logs,
    sea_orm_active_enums::{PlanTier, SubscriptionStatus},
    subscriptions,
};
use sea_orm::{
    entity::*, query::*, sea_query::OnConflict, ConnectionTrait, DatabaseConnection, DbErr,
    PaginatorTrait, TransactionTrait,
};
use std::collections::BTreeMap;
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use super::{AuditEntry, RepoResult, SubscriptionCounts, SubscriptionFilter, SubscriptionRepository};
use crate::models::subscription::{Subscription, SubscriptionPatch, TrialActivation};

/// Postgres-backed subscription store
#[derive(Clone)]
pub struct SeaOrmSubscriptionRepository {
    db: DatabaseConnection,
}

impl SeaOrmSubscriptionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert model carrying defaults for every column a first writer leaves unset
    fn insert_model(user_id: Uuid, patch: &SubscriptionPatch, now: OffsetDateTime) -> subscriptions::ActiveModel {
        subscriptions::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            plan: Set(patch.plan.unwrap_or(PlanTier::Free)),
            status: Set(patch.status.unwrap_or(SubscriptionStatus::None)),
            current_period_end: Set(patch.current_period_end),
            provider: Set(patch.provider.clone()),
            provider_subscription_id: Set(patch.provider_subscription_id.clone()),
            provider_customer_id: Set(patch.provider_customer_id.clone()),
            cancel_at_period_end: Set(patch.cancel_at_period_end.unwrap_or(false)),
            trial_used: Set(false),
            trial_started_at: Set(None),
            trial_ends_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }

    /// Columns overwritten on conflict: only the ones the patch sets
    fn patch_columns(patch: &SubscriptionPatch) -> Vec<subscriptions::Column> {
        let mut columns = vec![subscriptions::Column::UpdatedAt];
        if patch.plan.is_some() {
            columns.push(subscriptions::Column::Plan);
        }
        if patch.status.is_some() {
            columns.push(subscriptions::Column::Status);
        }
        if patch.current_period_end.is_some() {
            columns.push(subscriptions::Column::CurrentPeriodEnd);
        }
        if patch.provider.is_some() {
            columns.push(subscriptions::Column::Provider);
        }
        if patch.provider_subscription_id.is_some() {
            columns.push(subscriptions::Column::ProviderSubscriptionId);
        }
        if patch.provider_customer_id.is_some() {
            columns.push(subscriptions::Column::ProviderCustomerId);
        }
        if patch.cancel_at_period_end.is_some() {
            columns.push(subscriptions::Column::CancelAtPeriodEnd);
        }
        columns
    }

    /// INSERT ... ON CONFLICT (user_id) DO UPDATE SET <patched columns>
    async fn upsert_on<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
        patch: &SubscriptionPatch,
    ) -> RepoResult<Subscription> {
        let model = Self::insert_model(user_id, patch, OffsetDateTime::now_utc());

        let saved = subscriptions::Entity::insert(model)
            .on_conflict(
                OnConflict::column(subscriptions::Column::UserId)
                    .update_columns(Self::patch_columns(patch))
                    .to_owned(),
            )
            .exec_with_returning(conn)
            .await?;

        Ok(saved.into())
    }
}

#[async_trait]
impl SubscriptionRepository for SeaOrmSubscriptionRepository {
    #[instrument(skip(self))]
    async fn find_by_user(&self, user_id: Uuid) -> RepoResult<Option<Subscription>> {
        let model = subscriptions::Entity::find()
            .filter(subscriptions::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        Ok(model.map(Subscription::from))
    }

    #[instrument(skip(self))]
    async fn upsert(&self, user_id: Uuid, patch: SubscriptionPatch) -> RepoResult<Subscription> {
        Self::upsert_on(&self.db, user_id, &patch).await
    }

    #[instrument(skip(self))]
    async fn activate_trial(
        &self,
        user_id: Uuid,
        started_at: OffsetDateTime,
        ends_at: OffsetDateTime,
    ) -> RepoResult<TrialActivation> {
        let mut model = Self::insert_model(user_id, &SubscriptionPatch::default(), started_at);
        model.trial_used = Set(true);
        model.trial_started_at = Set(Some(started_at));
        model.trial_ends_at = Set(Some(ends_at));

        // The WHERE on the conflict branch makes check-and-set a single statement,
        // so concurrent activations cannot both win.
        let affected = subscriptions::Entity::insert(model)
            .on_conflict(
                OnConflict::column(subscriptions::Column::UserId)
                    .update_columns([
                        subscriptions::Column::TrialUsed,
                        subscriptions::Column::TrialStartedAt,
                        subscriptions::Column::TrialEndsAt,
                        subscriptions::Column::UpdatedAt,
                    ])
                    .action_and_where(
                        subscriptions::Column::TrialUsed.eq(false).and(
                            subscriptions::Column::Status.is_not_in([
                                SubscriptionStatus::Active,
                                SubscriptionStatus::Trialing,
                                SubscriptionStatus::PastDue,
                            ]),
                        ),
                    )
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        let current = self.find_by_user(user_id).await?;

        if affected == 0 {
            return Ok(TrialActivation::Rejected(current));
        }

        current.map(TrialActivation::Activated).ok_or_else(|| {
            DbErr::RecordNotFound(format!("subscription for user {} after trial upsert", user_id))
        })
    }

    #[instrument(skip(self, entry))]
    async fn upsert_with_audit(
        &self,
        user_id: Uuid,
        patch: SubscriptionPatch,
        entry: AuditEntry,
    ) -> RepoResult<Subscription> {
        // Override and audit row commit together or not at all
        let txn = self.db.begin().await?;

        let saved = Self::upsert_on(&txn, user_id, &patch).await?;

        let audit = admin_audit_logs::ActiveModel {
            id: Set(Uuid::new_v4()),
            admin_id: Set(entry.admin_id),
            target_user_id: Set(entry.target_user_id),
            action: Set(entry.action),
            plan: Set(entry.plan),
            status: Set(entry.status),
            created_at: Set(entry.created_at),
        };

        admin_audit_logs::Entity::insert(audit)
            .exec_without_returning(&txn)
            .await?;

        txn.commit().await?;

        Ok(saved)
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        filter: SubscriptionFilter,
        page: u64,
        per_page: u64,
    ) -> RepoResult<(Vec<Subscription>, u64)> {
        let mut query = subscriptions::Entity::find();

        if let Some(plan) = filter.plan {
            query = query.filter(subscriptions::Column::Plan.eq(plan));
        }
        if let Some(status) = filter.status {
            query = query.filter(subscriptions::Column::Status.eq(status));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = match Uuid::parse_str(search) {
                Ok(user_id) => query.filter(subscriptions::Column::UserId.eq(user_id)),
                Err(_) => query.filter(
                    Condition::any()
                        .add(subscriptions::Column::ProviderCustomerId.contains(search))
                        .add(subscriptions::Column::ProviderSubscriptionId.contains(search)),
                ),
            };
        }

        let paginator = query
            .order_by_desc(subscriptions::Column::UpdatedAt)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await?
            .into_iter()
            .map(Subscription::from)
            .collect();

        Ok((items, total))
    }

    #[instrument(skip(self))]
    async fn counts(&self) -> RepoResult<SubscriptionCounts> {
        let total = subscriptions::Entity::find().count(&self.db).await?;

        let by_status: Vec<(String, i64)> = subscriptions::Entity::find()
            .select_only()
            .column(subscriptions::Column::Status)
            .column_as(subscriptions::Column::Id.count(), "count")
            .group_by(subscriptions::Column::Status)
            .into_tuple()
            .all(&self.db)
            .await?;

        let by_plan: Vec<(String, i64)> = subscriptions::Entity::find()
            .select_only()
            .column(subscriptions::Column::Plan)
            .column_as(subscriptions::Column::Id.count(), "count")
            .group_by(subscriptions::Column::Plan)
            .into_tuple()
            .all(&self.db)
            .await?;

        let by_provider: Vec<(Option<String>, i64)> = subscriptions::Entity::find()
            .select_only()
            .column(subscriptions::Column::Provider)
            .column_as(subscriptions::Column::Id.count(), "count")
            .group_by(subscriptions::Column::Provider)
            .into_tuple()
            .all(&self.db)
            .await?;

        let trials_used = subscriptions::Entity::find()
            .filter(subscriptions::Column::TrialUsed.eq(true))
            .count(&self.db)
            .await?;

        let trials_converted = subscriptions::Entity::find()
            .filter(subscriptions::Column::TrialUsed.eq(true))
            .filter(subscriptions::Column::Plan.eq(PlanTier::Pro))
            .count(&self.db)
            .await?;

        let to_map = |rows: Vec<(String, i64)>| -> BTreeMap<String, u64> {
            rows.into_iter()
                .map(|(key, count)| (key, count.max(0) as u64))
                .collect()
        };

        Ok(SubscriptionCounts {
            total,
            by_status: to_map(by_status),
            by_plan: to_map(by_plan),
            by_provider: to_map(
                by_provider
                    .into_iter()
                    .map(|(provider, count)| (provider.unwrap_or_else(|| "none".to_string()), count))
                    .collect(),
            ),
            trials_used,
            trials_converted,
        })
    }
}
