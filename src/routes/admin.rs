use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_state::AppState,
    error::{AppJson, Result},
    middleware::UserIdentity,
    models::{
        admin::{
            BillingMetrics, ListSubscriptionsQuery, SetPlanRequest, SubscriptionDetailData,
            SubscriptionListData,
        },
        common::SuccessResponse,
        subscription::Subscription,
    },
};

/// GET /api/v1/admin/subscriptions
#[instrument(skip(state))]
pub async fn list_subscriptions(
    State(state): State<AppState>,
    Query(query): Query<ListSubscriptionsQuery>,
) -> Result<Json<SuccessResponse<SubscriptionListData>>> {
    let data = state.admin_service.list_subscriptions(query).await?;
    Ok(Json(SuccessResponse::new(data)))
}

/// GET /api/v1/admin/subscriptions/{userId}
#[instrument(skip(state))]
pub async fn get_subscription(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<SubscriptionDetailData>>> {
    let data = state.admin_service.get_subscription_detail(user_id).await?;
    Ok(Json(SuccessResponse::new(data)))
}

/// PUT /api/v1/admin/subscriptions/{userId}/plan
#[instrument(skip(state, admin, request), fields(admin_id = %admin.user_id))]
pub async fn set_plan(
    State(state): State<AppState>,
    admin: UserIdentity,
    Path(user_id): Path<Uuid>,
    AppJson(request): AppJson<SetPlanRequest>,
) -> Result<Json<SuccessResponse<Subscription>>> {
    let saved = state
        .admin_service
        .set_plan(admin.user_id, user_id, request)
        .await?;
    Ok(Json(SuccessResponse::new(saved)))
}

/// GET /api/v1/admin/metrics
#[instrument(skip(state))]
pub async fn billing_metrics(
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse<BillingMetrics>>> {
    let metrics = state.admin_service.billing_metrics().await?;
    Ok(Json(SuccessResponse::new(metrics)))
}
