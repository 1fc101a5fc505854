use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use tracing::{instrument, warn};

use crate::{
    app_state::AppState,
    error::{ApiError, Result},
    models::webhook::WebhookResponse,
    services::webhook_service::{verify_signature, WebhookEvent},
};

const SIGNATURE_HEADERS: [&str; 2] = ["x-webhook-signature", "x-signature"];

/// POST /api/v1/webhooks/{provider}
///
/// Takes the raw body so the signature is checked over exactly the bytes
/// the provider signed.
#[instrument(skip(state, headers, body))]
pub async fn receive_webhook(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>> {
    if let Some(secret) = state.config.billing.webhook_secret() {
        let signature = SIGNATURE_HEADERS
            .iter()
            .find_map(|name| headers.get(*name))
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                warn!("Rejected {} webhook without signature", provider);
                ApiError::InvalidSignature
            })?;

        verify_signature(secret, &body, signature).inspect_err(|_| {
            warn!("Rejected {} webhook with invalid signature", provider);
        })?;
    }

    let event = WebhookEvent::parse(&body)?;

    let response = state
        .webhook_service
        .handle_webhook(&provider, &event.event_type, &event.payload)
        .await?;

    Ok(Json(response))
}
