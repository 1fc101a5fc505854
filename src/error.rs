use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use entity::sea_orm_active_enums::PlanTier;
use serde_json::json;

use crate::models::common::ErrorResponse;

/// Where clients send users who hit a plan limit
pub const UPGRADE_PATH: &str = "/plan/upgrade";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Free trial has already been used")]
    TrialAlreadyUsed,

    #[error("Free trial is not available for this subscription")]
    TrialNotAvailable,

    #[error("This feature requires a {} plan", .required.as_str())]
    PlanRequired { required: PlanTier },

    #[error("Quota exceeded: {resource} limit of {limit} reached")]
    QuotaExceeded { resource: &'static str, limit: u32 },

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::TrialAlreadyUsed | ApiError::TrialNotAvailable => StatusCode::CONFLICT,
            ApiError::PlanRequired { .. } | ApiError::QuotaExceeded { .. } => StatusCode::FORBIDDEN,
            ApiError::InvalidSignature
            | ApiError::Unauthorized(_)
            | ApiError::InvalidToken(_)
            | ApiError::ExpiredToken => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code returned to clients
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Database(_) => "STORE_UNAVAILABLE",
            ApiError::TrialAlreadyUsed => "TRIAL_ALREADY_USED",
            ApiError::TrialNotAvailable => "TRIAL_NOT_AVAILABLE",
            ApiError::PlanRequired { .. } => "PLAN_REQUIRED",
            ApiError::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
            ApiError::InvalidSignature => "INVALID_SIGNATURE",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::InvalidToken(_) => "INVALID_TOKEN",
            ApiError::ExpiredToken => "TOKEN_EXPIRED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        let (message, details) = match self {
            ApiError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    "The service is temporarily unavailable, please retry".to_string(),
                    None,
                )
            }
            ApiError::Internal(ref e) => {
                tracing::error!("Internal error: {:?}", e);
                ("An internal error occurred".to_string(), None)
            }
            ApiError::PlanRequired { required } => (
                format!(
                    "This feature requires a {} plan. Upgrade to unlock it.",
                    required.as_str()
                ),
                Some(json!({
                    "requiredPlan": required,
                    "upgradePath": UPGRADE_PATH,
                })),
            ),
            ApiError::QuotaExceeded { resource, limit } => (
                format!(
                    "You have reached the {} limit of {} on your current plan. Upgrade to Pro for unlimited {}.",
                    resource, limit, resource
                ),
                Some(json!({
                    "resource": resource,
                    "limit": limit,
                    "upgradePath": UPGRADE_PATH,
                })),
            ),
            ref other => (other.to_string(), None),
        };

        let body = json!({
            "success": false,
            "error": ErrorResponse::new(code, message, details).error,
        });

        (status, Json(body)).into_response()
    }
}

/// JSON extractor whose rejections use the API error envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

// Helper type for results
pub type Result<T> = std::result::Result<T, ApiError>;
