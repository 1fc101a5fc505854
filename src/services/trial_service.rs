use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    notification_service::{Notification, Notifier},
    plan_service::PlanService,
};
use crate::{
    error::{ApiError, Result},
    models::{plan::UserPlanInfo, subscription::{Subscription, TrialActivation}},
    repositories::SubscriptionRepository,
};

/// One-time free-tier trial grant
pub struct TrialService {
    subscriptions: Arc<dyn SubscriptionRepository>,
    plan_service: Arc<PlanService>,
    notifier: Arc<dyn Notifier>,
}

impl TrialService {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        plan_service: Arc<PlanService>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            subscriptions,
            plan_service,
            notifier,
        }
    }

    /// Start the free-tier trial for a user.
    ///
    /// The preconditions are checked first for a precise error, then enforced
    /// again by the conditional write so concurrent calls cannot both win.
    #[instrument(skip(self))]
    pub async fn start_trial(&self, user_id: Uuid) -> Result<UserPlanInfo> {
        let existing = self.subscriptions.find_by_user(user_id).await?;
        if let Some(ref sub) = existing {
            check_trial_preconditions(sub)?;
        }

        let started_at = OffsetDateTime::now_utc();
        let ends_at = started_at + self.plan_service.catalog().trial_duration();

        match self
            .subscriptions
            .activate_trial(user_id, started_at, ends_at)
            .await?
        {
            TrialActivation::Activated(_) => {}
            TrialActivation::Rejected(current) => {
                // Lost a race; report whichever precondition now fails
                return Err(match current {
                    Some(ref sub) => check_trial_preconditions(sub)
                        .err()
                        .unwrap_or(ApiError::TrialAlreadyUsed),
                    None => ApiError::TrialAlreadyUsed,
                });
            }
        }

        let info = self.plan_service.refresh(user_id).await?;

        info!("Trial started for user {} (ends {})", user_id, ends_at);
        self.notifier
            .notify(user_id, Notification::TrialStarted { ends_at });

        Ok(info)
    }
}

/// First failing precondition wins
fn check_trial_preconditions(subscription: &Subscription) -> Result<()> {
    if subscription.trial_used {
        return Err(ApiError::TrialAlreadyUsed);
    }
    if subscription.blocks_free_trial() {
        return Err(ApiError::TrialNotAvailable);
    }
    Ok(())
}
