//! Feature gate for tier-restricted routes.
//!
//! Asks the plan resolver on every request; the only caching involved is
//! the resolver's own.

use axum::{extract::Request, middleware::Next, response::Response};
use entity::sea_orm_active_enums::PlanTier;
use std::{future::Future, pin::Pin, sync::Arc};
use tracing::debug;

use super::jwt_auth::UserIdentity;
use crate::{
    error::{ApiError, Result},
    services::PlanService,
};

fn satisfies(plan: PlanTier, required: PlanTier) -> bool {
    match required {
        PlanTier::Free => true,
        PlanTier::Pro => plan == PlanTier::Pro,
    }
}

/// Build a middleware that rejects callers whose resolved tier is below `required`
pub fn plan_gate(
    plan_service: Arc<PlanService>,
    required: PlanTier,
) -> impl Fn(Request, Next) -> Pin<Box<dyn Future<Output = Result<Response>> + Send>> + Clone {
    move |request: Request, next: Next| {
        let plan_service = plan_service.clone();

        Box::pin(async move {
            let user_id = request
                .extensions()
                .get::<UserIdentity>()
                .map(|identity| identity.user_id)
                .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

            let plan = plan_service.get_user_plan(user_id).await?;

            if !satisfies(plan.plan, required) {
                debug!(
                    "User {} on {} plan denied {} route",
                    user_id,
                    plan.plan.as_str(),
                    required.as_str()
                );
                return Err(ApiError::PlanRequired { required });
            }

            Ok(next.run(request).await)
        })
    }
}
