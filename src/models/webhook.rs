use serde::Serialize;

/// Response body for `POST /webhooks/{provider}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WebhookResponse {
    pub handled: bool,
}
