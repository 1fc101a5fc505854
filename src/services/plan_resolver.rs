//! Pure entitlement resolution.
//!
//! Turns a subscription record (or its absence) into the effective plan at
//! a given instant. No I/O happens here; `PlanService` wraps this with the
//! cache-aside layer.

use entity::sea_orm_active_enums::{PlanTier, SubscriptionStatus};
use time::OffsetDateTime;

use super::plan_catalog::PlanCatalog;
use crate::models::{
    plan::{TrialInfo, UserPlanInfo},
    subscription::Subscription,
};

/// Effective tier for a record at `now`
pub fn resolve_tier(subscription: &Subscription, now: OffsetDateTime) -> PlanTier {
    let period_open = |end: Option<OffsetDateTime>| end.is_some_and(|end| end > now);

    match subscription.status {
        SubscriptionStatus::Active | SubscriptionStatus::PastDue => PlanTier::Pro,
        // A provider trial with no period end has not expired yet
        SubscriptionStatus::Trialing => {
            if subscription.current_period_end.is_none()
                || period_open(subscription.current_period_end)
            {
                PlanTier::Pro
            } else {
                PlanTier::Free
            }
        }
        SubscriptionStatus::Canceled => {
            if period_open(subscription.current_period_end) {
                PlanTier::Pro
            } else {
                PlanTier::Free
            }
        }
        SubscriptionStatus::None => PlanTier::Free,
    }
}

/// Resolve the caller's plan at `now`
pub fn resolve_plan(
    subscription: Option<&Subscription>,
    catalog: &PlanCatalog,
    now: OffsetDateTime,
) -> UserPlanInfo {
    let Some(subscription) = subscription else {
        return UserPlanInfo {
            plan: PlanTier::Free,
            status: SubscriptionStatus::None,
            limits: catalog.limits_for(PlanTier::Free),
            current_period_end: None,
            cancel_at_period_end: false,
            trial: TrialInfo {
                active: false,
                used: false,
                ends_at: None,
            },
        };
    };

    let plan = resolve_tier(subscription, now);

    // The free-trial overlay only ever applies on top of a free base tier
    let trial_active = plan == PlanTier::Free
        && subscription.trial_used
        && subscription.trial_ends_at.is_some_and(|ends| ends > now);

    let mut limits = catalog.limits_for(plan);
    if trial_active {
        limits = limits.with_overrides(catalog.trial_overrides());
    }

    UserPlanInfo {
        plan,
        status: subscription.status,
        limits,
        current_period_end: subscription.current_period_end,
        cancel_at_period_end: subscription.cancel_at_period_end,
        trial: TrialInfo {
            active: trial_active,
            used: subscription.trial_used,
            ends_at: subscription.trial_ends_at,
        },
    }
}

/// How long a resolved plan may be cached.
///
/// Starts from `default_ttl` and shrinks to the next instant the resolution
/// could flip on its own: the trial overlay ending, or the period end that
/// keeps a canceled or provider-trialing record on pro. `None` means do not
/// cache.
pub fn cache_ttl(info: &UserPlanInfo, default_ttl: u64, now: OffsetDateTime) -> Option<u64> {
    let mut ttl = i64::try_from(default_ttl).unwrap_or(i64::MAX);

    if info.trial.active {
        if let Some(ends_at) = info.trial.ends_at {
            ttl = ttl.min((ends_at - now).whole_seconds());
        }
    }

    let period_bound = info.plan == PlanTier::Pro
        && matches!(
            info.status,
            SubscriptionStatus::Canceled | SubscriptionStatus::Trialing
        );
    if period_bound {
        if let Some(end) = info.current_period_end {
            ttl = ttl.min((end - now).whole_seconds());
        }
    }

    u64::try_from(ttl).ok().filter(|ttl| *ttl > 0)
}
