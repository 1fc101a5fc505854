//! Repository traits
//!
//! Async persistence interfaces. Services only see these traits; the
//! SeaORM implementations live next to them.

pub mod care_repository;
pub mod subscription_repository;

pub use care_repository::SeaOrmCareRepository;
pub use subscription_repository::SeaOrmSubscriptionRepository;

use async_trait::async_trait;
use entity::sea_orm_active_enums::{PlanTier, SubscriptionStatus};
use sea_orm::DbErr;
use std::collections::BTreeMap;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::{
    care::{CareEvent, Child, NewCareEvent, NewChild},
    subscription::{Subscription, SubscriptionPatch, TrialActivation},
};

pub type RepoResult<T> = std::result::Result<T, DbErr>;

/// Admin list filter
#[derive(Debug, Clone, Default)]
pub struct SubscriptionFilter {
    pub plan: Option<PlanTier>,
    pub status: Option<SubscriptionStatus>,
    /// Exact user id when it parses as a UUID, otherwise a substring of the
    /// provider customer/subscription ids
    pub search: Option<String>,
}

/// Raw counts behind the billing metrics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionCounts {
    pub total: u64,
    pub by_status: BTreeMap<String, u64>,
    pub by_plan: BTreeMap<String, u64>,
    pub by_provider: BTreeMap<String, u64>,
    pub trials_used: u64,
    pub trials_converted: u64,
}

/// One admin override, as recorded in the audit log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub admin_id: Uuid,
    pub target_user_id: Uuid,
    pub action: String,
    pub plan: PlanTier,
    pub status: SubscriptionStatus,
    pub created_at: OffsetDateTime,
}

/// Subscription record store. Every write is an atomic upsert keyed by user id.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find the subscription for a user
    async fn find_by_user(&self, user_id: Uuid) -> RepoResult<Option<Subscription>>;

    /// Insert-or-update the user's record with the patch's set fields
    async fn upsert(&self, user_id: Uuid, patch: SubscriptionPatch) -> RepoResult<Subscription>;

    /// Mark the free-tier trial as used, only if it was unused and the record
    /// is not paid or trialing. Check and write happen in one statement.
    async fn activate_trial(
        &self,
        user_id: Uuid,
        started_at: OffsetDateTime,
        ends_at: OffsetDateTime,
    ) -> RepoResult<TrialActivation>;

    /// Apply an admin override and append its audit entry in one
    /// transaction. Neither is visible unless both are written.
    async fn upsert_with_audit(
        &self,
        user_id: Uuid,
        patch: SubscriptionPatch,
        entry: AuditEntry,
    ) -> RepoResult<Subscription>;

    /// Page through subscriptions (1-based page), newest first
    async fn list(
        &self,
        filter: SubscriptionFilter,
        page: u64,
        per_page: u64,
    ) -> RepoResult<(Vec<Subscription>, u64)>;

    /// Aggregate counts for billing metrics
    async fn counts(&self) -> RepoResult<SubscriptionCounts>;
}

/// Outcome of an insert bounded by a per-user ceiling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CappedInsert<T> {
    Inserted(T),
    /// Nothing was written; `used` rows already existed
    AtCapacity { used: u64 },
}

/// Children and care events
#[async_trait]
pub trait CareRepository: Send + Sync {
    /// Count events a user recorded at or after `since`
    async fn count_events_since(&self, user_id: Uuid, since: OffsetDateTime) -> RepoResult<u64>;

    /// Insert an event unless the user already has `limit` events since
    /// `since`. Count and insert are serialized per user, so concurrent
    /// writers cannot overshoot. `None` inserts without counting.
    async fn insert_event_capped(
        &self,
        event: NewCareEvent,
        since: OffsetDateTime,
        limit: Option<u64>,
    ) -> RepoResult<CappedInsert<CareEvent>>;

    /// Most recent events first
    async fn list_events(&self, user_id: Uuid, limit: u64) -> RepoResult<Vec<CareEvent>>;

    async fn count_children(&self, user_id: Uuid) -> RepoResult<u64>;

    /// Same contract as `insert_event_capped`, over all of the user's children
    async fn insert_child_capped(
        &self,
        child: NewChild,
        limit: Option<u64>,
    ) -> RepoResult<CappedInsert<Child>>;

    /// Whether the child exists and belongs to the user
    async fn child_belongs_to(&self, child_id: Uuid, user_id: Uuid) -> RepoResult<bool>;
}
