use axum::{extract::State, http::StatusCode, Json};
use tracing::instrument;

use crate::{
    app_state::AppState,
    error::{AppJson, Result},
    middleware::UserIdentity,
    models::{
        care::{CareEvent, Child, CreateCareEventRequest, CreateChildRequest},
        common::SuccessResponse,
    },
};

/// POST /api/v1/children
#[instrument(skip(state, identity, request), fields(user_id = %identity.user_id))]
pub async fn create_child(
    State(state): State<AppState>,
    identity: UserIdentity,
    AppJson(request): AppJson<CreateChildRequest>,
) -> Result<(StatusCode, Json<SuccessResponse<Child>>)> {
    let child = state
        .care_service
        .create_child(identity.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(child))))
}

/// POST /api/v1/events
#[instrument(skip(state, identity, request), fields(user_id = %identity.user_id))]
pub async fn create_event(
    State(state): State<AppState>,
    identity: UserIdentity,
    AppJson(request): AppJson<CreateCareEventRequest>,
) -> Result<(StatusCode, Json<SuccessResponse<CareEvent>>)> {
    let event = state
        .care_service
        .record_event(identity.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(event))))
}

/// GET /api/v1/events/export (pro only)
#[instrument(skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn export_events(
    State(state): State<AppState>,
    identity: UserIdentity,
) -> Result<Json<SuccessResponse<Vec<CareEvent>>>> {
    let events = state.care_service.export_events(identity.user_id).await?;
    Ok(Json(SuccessResponse::new(events)))
}
