use axum::{extract::Request, middleware::Next, response::Response};
use tracing::warn;

use super::jwt_auth::UserIdentity;
use crate::error::{ApiError, Result};

/// Admin-only guard. Must run after `jwt_auth_middleware`.
pub async fn require_admin(request: Request, next: Next) -> Result<Response> {
    let identity = request
        .extensions()
        .get::<UserIdentity>()
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

    if !identity.is_admin() {
        warn!("User {} attempted an admin operation", identity.user_id);
        return Err(ApiError::Forbidden("Admin role required".to_string()));
    }

    Ok(next.run(request).await)
}
