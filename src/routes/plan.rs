use axum::{extract::State, http::StatusCode, Json};
use tracing::instrument;

use crate::{
    app_state::AppState,
    error::Result,
    middleware::UserIdentity,
    models::{common::SuccessResponse, plan::UserPlanInfo},
};

/// GET /api/v1/plan
#[instrument(skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn get_plan(
    State(state): State<AppState>,
    identity: UserIdentity,
) -> Result<Json<SuccessResponse<UserPlanInfo>>> {
    let info = state.plan_service.get_user_plan(identity.user_id).await?;
    Ok(Json(SuccessResponse::new(info)))
}

/// POST /api/v1/plan/trial
#[instrument(skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn start_trial(
    State(state): State<AppState>,
    identity: UserIdentity,
) -> Result<(StatusCode, Json<SuccessResponse<UserPlanInfo>>)> {
    let info = state.trial_service.start_trial(identity.user_id).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(info))))
}
