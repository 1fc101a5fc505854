use entity::sea_orm_active_enums::PlanTier;
use time::Duration;

use crate::{
    config::{BillingConfig, PlanLimitsConfig, PlansConfig},
    models::plan::{PlanLimits, TrialOverrides, TRIAL_OVERRIDES},
};

/// Static limits per tier plus the free-trial overlay. Built once at startup.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    free: PlanLimits,
    pro: PlanLimits,
    trial_overrides: TrialOverrides,
    trial_duration: Duration,
}

impl PlanCatalog {
    pub fn new(plans: &PlansConfig, billing: &BillingConfig) -> Self {
        Self {
            free: limits_from_config(&plans.free),
            pro: limits_from_config(&plans.pro),
            trial_overrides: TRIAL_OVERRIDES,
            trial_duration: Duration::days(billing.trial_duration_days),
        }
    }

    pub fn limits_for(&self, tier: PlanTier) -> PlanLimits {
        match tier {
            PlanTier::Free => self.free,
            PlanTier::Pro => self.pro,
        }
    }

    pub fn trial_overrides(&self) -> &TrialOverrides {
        &self.trial_overrides
    }

    pub fn trial_duration(&self) -> Duration {
        self.trial_duration
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::new(&PlansConfig::default(), &BillingConfig::default())
    }
}

fn limits_from_config(config: &PlanLimitsConfig) -> PlanLimits {
    PlanLimits {
        max_children: config.max_children,
        max_events_per_month: config.max_events_per_month,
        ai_enabled: config.ai_enabled,
        voice_enabled: config.voice_enabled,
        avatars_enabled: config.avatars_enabled,
    }
}
