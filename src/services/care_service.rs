use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use super::quota_service::QuotaService;
use crate::{
    error::{ApiError, Result},
    models::care::{
        CareEvent, Child, CreateCareEventRequest, CreateChildRequest, NewCareEvent, NewChild,
    },
    repositories::CareRepository,
};

/// Upper bound on a single export
const EXPORT_LIMIT: u64 = 10_000;

/// Event logging and child management, both behind the quota gate
pub struct CareService {
    care: Arc<dyn CareRepository>,
    quota_service: Arc<QuotaService>,
}

impl CareService {
    pub fn new(care: Arc<dyn CareRepository>, quota_service: Arc<QuotaService>) -> Self {
        Self {
            care,
            quota_service,
        }
    }

    #[instrument(skip(self, request))]
    pub async fn create_child(&self, user_id: Uuid, request: CreateChildRequest) -> Result<Child> {
        request
            .validate()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        let child = self
            .quota_service
            .add_child(NewChild {
                user_id,
                name: request.name.trim().to_string(),
                birth_date: request.birth_date,
            })
            .await?;

        info!("User {} added child {}", user_id, child.id);
        Ok(child)
    }

    /// Record a care event. Nothing is written when the quota gate rejects.
    #[instrument(skip(self, request))]
    pub async fn record_event(
        &self,
        user_id: Uuid,
        request: CreateCareEventRequest,
    ) -> Result<CareEvent> {
        request
            .validate()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        if !self.care.child_belongs_to(request.child_id, user_id).await? {
            return Err(ApiError::NotFound(format!("Child {}", request.child_id)));
        }

        let event = self
            .quota_service
            .record_event(NewCareEvent {
                user_id,
                child_id: request.child_id,
                event_type: request.event_type,
                occurred_at: request.occurred_at.unwrap_or_else(OffsetDateTime::now_utc),
                notes: request.notes,
            })
            .await?;

        Ok(event)
    }

    #[instrument(skip(self))]
    pub async fn export_events(&self, user_id: Uuid) -> Result<Vec<CareEvent>> {
        Ok(self.care.list_events(user_id, EXPORT_LIMIT).await?)
    }
}
