use entity::sea_orm_active_enums::{PlanTier, SubscriptionStatus};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Feature ceilings for a plan tier. `None` ceilings are unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanLimits {
    pub max_children: Option<u32>,
    pub max_events_per_month: Option<u32>,
    pub ai_enabled: bool,
    pub voice_enabled: bool,
    pub avatars_enabled: bool,
}

impl PlanLimits {
    /// Apply a partial overlay; set overlay fields win.
    pub fn with_overrides(mut self, overrides: &TrialOverrides) -> Self {
        if let Some(ai) = overrides.ai_enabled {
            self.ai_enabled = ai;
        }
        if let Some(voice) = overrides.voice_enabled {
            self.voice_enabled = voice;
        }
        if let Some(avatars) = overrides.avatars_enabled {
            self.avatars_enabled = avatars;
        }
        self
    }
}

/// Flags loosened while a free-tier trial is active. Numeric ceilings are
/// never part of the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialOverrides {
    pub ai_enabled: Option<bool>,
    pub voice_enabled: Option<bool>,
    pub avatars_enabled: Option<bool>,
}

pub const TRIAL_OVERRIDES: TrialOverrides = TrialOverrides {
    ai_enabled: Some(true),
    voice_enabled: Some(true),
    avatars_enabled: None,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialInfo {
    pub active: bool,
    pub used: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub ends_at: Option<OffsetDateTime>,
}

/// Effective entitlement of a user at the moment it was resolved.
/// Derived from the subscription record; never persisted to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPlanInfo {
    pub plan: PlanTier,
    pub status: SubscriptionStatus,
    pub limits: PlanLimits,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub current_period_end: Option<OffsetDateTime>,
    pub cancel_at_period_end: bool,
    pub trial: TrialInfo,
}

impl UserPlanInfo {
    pub fn is_pro(&self) -> bool {
        self.plan == PlanTier::Pro
    }
}
