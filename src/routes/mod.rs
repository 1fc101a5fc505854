// Route modules
pub mod admin;
pub mod care;
pub mod plan;
pub mod webhook;

use crate::{
    app_state::AppState,
    middleware::{jwt_auth_middleware, logging_middleware, plan_gate, require_admin},
};
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use entity::sea_orm_active_enums::PlanTier;
use std::time::Duration;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    let request_timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    Router::new()
        .nest("/api/v1", api_v1_routes(state.clone()))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

/// API v1 routes
fn api_v1_routes(state: AppState) -> Router<AppState> {
    // Pro-only routes: authentication, then the feature gate
    let pro_routes = Router::new()
        .route("/events/export", get(care::export_events))
        .route_layer(middleware::from_fn(plan_gate(
            state.plan_service.clone(),
            PlanTier::Pro,
        )))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ));

    // Authenticated routes; quota checks happen inside the services
    let user_routes = Router::new()
        .route("/plan", get(plan::get_plan))
        .route("/plan/trial", post(plan::start_trial))
        .route("/children", post(care::create_child))
        .route("/events", post(care::create_event))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ));

    let admin_routes = Router::new()
        .route("/admin/subscriptions", get(admin::list_subscriptions))
        .route("/admin/subscriptions/{user_id}", get(admin::get_subscription))
        .route("/admin/subscriptions/{user_id}/plan", put(admin::set_plan))
        .route("/admin/metrics", get(admin::billing_metrics))
        .route_layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ));

    // Provider callbacks authenticate by signature, not JWT
    let webhook_routes = Router::new().route("/webhooks/{provider}", post(webhook::receive_webhook));

    Router::new()
        .merge(pro_routes)
        .merge(user_routes)
        .merge(admin_routes)
        .merge(webhook_routes)
        .layer(middleware::from_fn(logging_middleware))
}
