use entity::sea_orm_active_enums::{PlanTier, SubscriptionStatus};
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// Persisted subscription record, one per user.
///
/// `status = trialing` is a provider-managed trial; `trial_used` and the
/// `trial_*` window belong to the separate free-tier trial overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub user_id: Uuid,
    pub plan: PlanTier,
    pub status: SubscriptionStatus,
    #[serde(with = "time::serde::rfc3339::option")]
    pub current_period_end: Option<OffsetDateTime>,
    pub provider: Option<String>,
    pub provider_subscription_id: Option<String>,
    pub provider_customer_id: Option<String>,
    pub cancel_at_period_end: bool,
    pub trial_used: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub trial_started_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub trial_ends_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Subscription {
    /// Defaults for a record created lazily by its first writer
    pub fn new_default(user_id: Uuid, now: OffsetDateTime) -> Self {
        Self {
            user_id,
            plan: PlanTier::Free,
            status: SubscriptionStatus::None,
            current_period_end: None,
            provider: None,
            provider_subscription_id: None,
            provider_customer_id: None,
            cancel_at_period_end: false,
            trial_used: false,
            trial_started_at: None,
            trial_ends_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Paid or already-trialing users cannot start a free-tier trial
    pub fn blocks_free_trial(&self) -> bool {
        matches!(
            self.status,
            SubscriptionStatus::Active | SubscriptionStatus::Trialing | SubscriptionStatus::PastDue
        )
    }

    /// Apply a `$set`-style patch in place
    pub fn apply(&mut self, patch: &SubscriptionPatch, now: OffsetDateTime) {
        if let Some(plan) = patch.plan {
            self.plan = plan;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(end) = patch.current_period_end {
            self.current_period_end = Some(end);
        }
        if let Some(ref provider) = patch.provider {
            self.provider = Some(provider.clone());
        }
        if let Some(ref id) = patch.provider_subscription_id {
            self.provider_subscription_id = Some(id.clone());
        }
        if let Some(ref id) = patch.provider_customer_id {
            self.provider_customer_id = Some(id.clone());
        }
        if let Some(cancel) = patch.cancel_at_period_end {
            self.cancel_at_period_end = cancel;
        }
        self.updated_at = now;
    }
}

impl From<entity::subscriptions::Model> for Subscription {
    fn from(model: entity::subscriptions::Model) -> Self {
        Self {
            user_id: model.user_id,
            plan: model.plan,
            status: model.status,
            current_period_end: model.current_period_end,
            provider: model.provider,
            provider_subscription_id: model.provider_subscription_id,
            provider_customer_id: model.provider_customer_id,
            cancel_at_period_end: model.cancel_at_period_end,
            trial_used: model.trial_used,
            trial_started_at: model.trial_started_at,
            trial_ends_at: model.trial_ends_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Field-set update for a subscription record. Only `Some` fields are written;
/// trial fields are deliberately absent (see `SubscriptionRepository::activate_trial`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionPatch {
    pub plan: Option<PlanTier>,
    pub status: Option<SubscriptionStatus>,
    pub current_period_end: Option<OffsetDateTime>,
    pub provider: Option<String>,
    pub provider_subscription_id: Option<String>,
    pub provider_customer_id: Option<String>,
    pub cancel_at_period_end: Option<bool>,
}

/// Outcome of the conditional trial upsert
#[derive(Debug, Clone)]
pub enum TrialActivation {
    Activated(Subscription),
    /// Preconditions failed; carries the record as it stands
    Rejected(Option<Subscription>),
}
