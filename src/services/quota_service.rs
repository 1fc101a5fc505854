use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::plan_service::PlanService;
use crate::{
    error::{ApiError, Result},
    models::care::{CareEvent, Child, NewCareEvent, NewChild},
    repositories::{CappedInsert, CareRepository},
    utils::time::start_of_month,
};

/// Plan-derived ceilings on resource creation. The ceiling comes from the
/// resolver; the check and the write happen together in the repository.
pub struct QuotaService {
    plan_service: Arc<PlanService>,
    care: Arc<dyn CareRepository>,
}

impl QuotaService {
    pub fn new(plan_service: Arc<PlanService>, care: Arc<dyn CareRepository>) -> Self {
        Self { plan_service, care }
    }

    /// Record a care event unless this month's ceiling is reached.
    /// Unbounded plans skip the count entirely.
    #[instrument(skip(self, event), fields(user_id = %event.user_id))]
    pub async fn record_event(&self, event: NewCareEvent) -> Result<CareEvent> {
        let user_id = event.user_id;
        let plan = self.plan_service.get_user_plan(user_id).await?;
        let limit = plan.limits.max_events_per_month;

        let since = start_of_month(OffsetDateTime::now_utc());
        match self
            .care
            .insert_event_capped(event, since, limit.map(u64::from))
            .await?
        {
            CappedInsert::Inserted(event) => Ok(event),
            CappedInsert::AtCapacity { used } => {
                debug!("User {} has recorded {} events this month", user_id, used);
                Err(ApiError::QuotaExceeded {
                    resource: "events",
                    limit: limit.unwrap_or_default(),
                })
            }
        }
    }

    /// Add a child unless the plan's ceiling is reached
    #[instrument(skip(self, child), fields(user_id = %child.user_id))]
    pub async fn add_child(&self, child: NewChild) -> Result<Child> {
        let plan = self.plan_service.get_user_plan(child.user_id).await?;
        let limit = plan.limits.max_children;

        match self
            .care
            .insert_child_capped(child, limit.map(u64::from))
            .await?
        {
            CappedInsert::Inserted(child) => Ok(child),
            CappedInsert::AtCapacity { .. } => Err(ApiError::QuotaExceeded {
                resource: "children",
                limit: limit.unwrap_or_default(),
            }),
        }
    }
}

