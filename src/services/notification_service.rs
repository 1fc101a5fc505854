use serde::Serialize;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::NotificationsConfig;

/// Outbound user notification triggered by a billing transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Notification {
    #[serde(rename_all = "camelCase")]
    TrialStarted {
        #[serde(with = "time::serde::rfc3339")]
        ends_at: OffsetDateTime,
    },
    PaymentFailed,
    #[serde(rename_all = "camelCase")]
    SubscriptionCanceled {
        #[serde(with = "time::serde::rfc3339::option")]
        current_period_end: Option<OffsetDateTime>,
        cancel_at_period_end: bool,
    },
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::TrialStarted { .. } => "trial_started",
            Notification::PaymentFailed => "payment_failed",
            Notification::SubscriptionCanceled { .. } => "subscription_canceled",
        }
    }
}

/// Fire-and-forget delivery. Implementations never block the caller and
/// never report failure back to it.
pub trait Notifier: Send + Sync {
    fn notify(&self, user_id: Uuid, notification: Notification);
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PushPayload {
    user_id: Uuid,
    #[serde(flatten)]
    notification: Notification,
}

/// POSTs notifications to the push gateway from a detached task
pub struct PushNotifier {
    http_client: reqwest::Client,
    push_url: String,
}

impl PushNotifier {
    pub fn new(push_url: String, config: &NotificationsConfig) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            http_client,
            push_url,
        })
    }
}

impl Notifier for PushNotifier {
    fn notify(&self, user_id: Uuid, notification: Notification) {
        let client = self.http_client.clone();
        let url = self.push_url.clone();
        let kind = notification.kind();
        let payload = PushPayload {
            user_id,
            notification,
        };

        tokio::spawn(async move {
            match client.post(&url).json(&payload).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!("Delivered {} notification to user {}", kind, user_id);
                }
                Ok(response) => {
                    warn!(
                        "Push gateway rejected {} notification for user {}: {}",
                        kind,
                        user_id,
                        response.status()
                    );
                }
                Err(e) => {
                    warn!("Failed to send {} notification to user {}: {}", kind, user_id, e);
                }
            }
        });
    }
}

/// Used when no push gateway is configured
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, user_id: Uuid, notification: Notification) {
        info!(
            "Notification for user {} (no push gateway configured): {:?}",
            user_id, notification
        );
    }
}
