use entity::sea_orm_active_enums::{PlanTier, SubscriptionStatus};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use super::plan_service::PlanService;
use crate::{
    cache::Cache,
    error::{ApiError, Result},
    models::{
        admin::{
            BillingMetrics, ListSubscriptionsQuery, SetPlanRequest, SubscriptionDetailData,
            SubscriptionListData, UsageSummary,
        },
        subscription::{Subscription, SubscriptionPatch},
    },
    repositories::{
        AuditEntry, CareRepository, SubscriptionCounts, SubscriptionFilter,
        SubscriptionRepository,
    },
    utils::time::start_of_month,
};

pub const METRICS_CACHE_KEY: &str = "billing:metrics";
const DEFAULT_PER_PAGE: u64 = 20;

/// Operator tooling: overrides, lookups and billing metrics
pub struct AdminService {
    subscriptions: Arc<dyn SubscriptionRepository>,
    care: Arc<dyn CareRepository>,
    plan_service: Arc<PlanService>,
    cache: Arc<dyn Cache>,
    metrics_ttl: u64,
}

impl AdminService {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        care: Arc<dyn CareRepository>,
        plan_service: Arc<PlanService>,
        cache: Arc<dyn Cache>,
        metrics_ttl: u64,
    ) -> Self {
        Self {
            subscriptions,
            care,
            plan_service,
            cache,
            metrics_ttl,
        }
    }

    /// Force a user's plan and status. Skips every trial or billing rule.
    #[instrument(skip(self, request))]
    pub async fn set_plan(
        &self,
        admin_id: Uuid,
        user_id: Uuid,
        request: SetPlanRequest,
    ) -> Result<Subscription> {
        let patch = SubscriptionPatch {
            plan: Some(request.plan),
            status: Some(request.status),
            cancel_at_period_end: Some(false),
            ..Default::default()
        };

        let entry = AuditEntry {
            admin_id,
            target_user_id: user_id,
            action: "set_plan".to_string(),
            plan: request.plan,
            status: request.status,
            created_at: OffsetDateTime::now_utc(),
        };

        let saved = self
            .subscriptions
            .upsert_with_audit(user_id, patch, entry)
            .await?;
        self.plan_service.invalidate(user_id).await;

        info!(
            "Admin {} set plan for user {}: plan={}, status={}",
            admin_id,
            user_id,
            request.plan.as_str(),
            request.status.as_str()
        );

        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn list_subscriptions(
        &self,
        query: ListSubscriptionsQuery,
    ) -> Result<SubscriptionListData> {
        query
            .validate()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        let page = query.page.unwrap_or(1);
        let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE);
        let filter = SubscriptionFilter {
            plan: query.plan,
            status: query.status,
            search: query.search,
        };

        let (items, total) = self.subscriptions.list(filter, page, per_page).await?;

        Ok(SubscriptionListData {
            items,
            total,
            page,
            per_page,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_subscription_detail(&self, user_id: Uuid) -> Result<SubscriptionDetailData> {
        let subscription = self.subscriptions.find_by_user(user_id).await?;
        let plan = self.plan_service.get_user_plan(user_id).await?;

        let since = start_of_month(OffsetDateTime::now_utc());
        let usage = UsageSummary {
            events_this_month: self.care.count_events_since(user_id, since).await?,
            children: self.care.count_children(user_id).await?,
        };

        Ok(SubscriptionDetailData {
            subscription,
            plan,
            usage,
        })
    }

    /// Aggregate metrics, served from cache for `metrics_ttl` seconds
    #[instrument(skip(self))]
    pub async fn billing_metrics(&self) -> Result<BillingMetrics> {
        match self.cache.get(METRICS_CACHE_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(metrics) => {
                    debug!("Billing metrics cache hit");
                    return Ok(metrics);
                }
                Err(e) => warn!("Discarding unreadable billing metrics cache entry: {}", e),
            },
            Ok(None) => {}
            Err(e) => warn!("Billing metrics cache read failed: {}", e),
        }

        let counts = self.subscriptions.counts().await?;
        let metrics = compute_metrics(counts, OffsetDateTime::now_utc());

        if self.metrics_ttl > 0 {
            match serde_json::to_string(&metrics) {
                Ok(raw) => {
                    if let Err(e) = self.cache.set(METRICS_CACHE_KEY, &raw, self.metrics_ttl).await {
                        warn!("Billing metrics cache write failed: {}", e);
                    }
                }
                Err(e) => warn!("Failed to serialize billing metrics: {}", e),
            }
        }

        Ok(metrics)
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

pub fn compute_metrics(counts: SubscriptionCounts, now: OffsetDateTime) -> BillingMetrics {
    let status = |s: SubscriptionStatus| counts.by_status.get(s.as_str()).copied().unwrap_or(0);

    let pro = counts
        .by_plan
        .get(PlanTier::Pro.as_str())
        .copied()
        .unwrap_or(0);
    let canceled = status(SubscriptionStatus::Canceled);
    let ever_paid = status(SubscriptionStatus::Active)
        + status(SubscriptionStatus::PastDue)
        + status(SubscriptionStatus::Trialing)
        + canceled;

    BillingMetrics {
        total: counts.total,
        conversion_rate: ratio(pro, counts.total),
        churn_rate: ratio(canceled, ever_paid),
        trial_conversion_rate: ratio(counts.trials_converted, counts.trials_used),
        by_status: counts.by_status,
        by_plan: counts.by_plan,
        by_provider: counts.by_provider,
        generated_at: now,
    }
}
