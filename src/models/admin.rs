use entity::sea_orm_active_enums::{PlanTier, SubscriptionStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;
use validator::Validate;

use super::{plan::UserPlanInfo, subscription::Subscription};

/// Query string for `GET /admin/subscriptions`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListSubscriptionsQuery {
    #[validate(range(min = 1, max = 10000))]
    pub page: Option<u64>,

    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<u64>,

    pub plan: Option<PlanTier>,

    pub status: Option<SubscriptionStatus>,

    #[validate(length(min = 1, max = 128))]
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionListData {
    pub items: Vec<Subscription>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    pub events_this_month: u64,
    pub children: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDetailData {
    pub subscription: Option<Subscription>,
    pub plan: UserPlanInfo,
    pub usage: UsageSummary,
}

/// Body for `PUT /admin/subscriptions/{userId}/plan`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPlanRequest {
    pub plan: PlanTier,
    pub status: SubscriptionStatus,
}

/// Aggregate billing metrics for the admin dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingMetrics {
    pub total: u64,
    pub by_status: BTreeMap<String, u64>,
    pub by_plan: BTreeMap<String, u64>,
    pub by_provider: BTreeMap<String, u64>,
    pub conversion_rate: f64,
    pub churn_rate: f64,
    pub trial_conversion_rate: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
}
