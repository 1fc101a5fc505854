//! Payment-provider webhook reconciliation.
//!
//! Every recognised event maps to one idempotent upsert keyed by user id.
//! Replaying an event converges to the same record, so at-least-once
//! delivery needs no event-id bookkeeping.

use entity::sea_orm_active_enums::{PlanTier, SubscriptionStatus};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{
    notification_service::{Notification, Notifier},
    plan_service::PlanService,
};
use crate::{
    error::{ApiError, Result},
    models::{subscription::SubscriptionPatch, webhook::WebhookResponse},
    repositories::SubscriptionRepository,
    utils::time::parse_timestamp,
};

type HmacSha256 = Hmac<Sha256>;

/// Verify a hex HMAC-SHA256 of the raw body. Accepts an optional `sha256=` prefix.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> Result<()> {
    let signature = signature.trim();
    let signature = signature.strip_prefix("sha256=").unwrap_or(signature);
    let provided = hex::decode(signature).map_err(|_| ApiError::InvalidSignature)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| ApiError::InvalidSignature)?;
    mac.update(body);
    let expected = mac.finalize().into_bytes();

    if subtle::ConstantTimeEq::ct_eq(expected.as_slice(), provided.as_slice()).into() {
        Ok(())
    } else {
        Err(ApiError::InvalidSignature)
    }
}

/// A webhook body split into its event type and the object the event is about
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEvent {
    pub event_type: String,
    pub payload: Value,
}

impl WebhookEvent {
    /// Event type from `type`, `event_type` or `event`; payload is `data`
    /// when it is an object, else the whole body
    pub fn parse(body: &[u8]) -> Result<Self> {
        let mut envelope: Value = serde_json::from_slice(body)
            .map_err(|e| ApiError::BadRequest(format!("Webhook body is not JSON: {}", e)))?;

        let event_type = ["type", "event_type", "event"]
            .iter()
            .find_map(|key| envelope.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest("Webhook event type is missing".to_string()))?;

        let payload = if envelope.get("data").is_some_and(Value::is_object) {
            envelope["data"].take()
        } else {
            envelope
        };

        Ok(Self {
            event_type,
            payload,
        })
    }
}

/// Fields a provider payload may carry, under any of their known spellings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookFields {
    pub user_id: Option<String>,
    pub provider_customer_id: Option<String>,
    pub provider_subscription_id: Option<String>,
    pub current_period_end: Option<OffsetDateTime>,
    pub cancel_at_period_end: bool,
}

impl WebhookFields {
    pub fn extract(payload: &Value) -> Self {
        let metadata_user = payload.get("metadata").and_then(|m| m.get("userId"));

        Self {
            user_id: first_string(payload, &["userId", "user_id"])
                .or_else(|| metadata_user.and_then(value_as_string)),
            provider_customer_id: first_string(payload, &["customer_id", "customerId"]),
            provider_subscription_id: first_string(
                payload,
                &["subscription_id", "subscriptionId", "id"],
            ),
            current_period_end: first_present(payload, &["current_period_end"])
                .and_then(parse_timestamp),
            cancel_at_period_end: first_present(payload, &["cancel_at_period_end"])
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }
}

fn first_present<'a>(payload: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| payload.get(*key))
        .find(|value| !value.is_null())
}

fn first_string(payload: &Value, keys: &[&str]) -> Option<String> {
    first_present(payload, keys).and_then(value_as_string)
}

/// Strings as-is, numbers stringified (some providers send numeric ids)
fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Event types grouped by the transition they cause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookEventClass {
    Activation,
    Renewal,
    Cancellation,
    PastDue,
    ProviderTrial,
}

impl WebhookEventClass {
    /// Case-sensitive exact match; unknown types yield `None`
    pub fn classify(event_type: &str) -> Option<Self> {
        match event_type {
            "subscription_activated" | "checkout.completed" | "subscription_created" => {
                Some(Self::Activation)
            }
            "subscription_renewed" | "invoice.paid" => Some(Self::Renewal),
            "subscription_canceled" => Some(Self::Cancellation),
            "subscription_past_due" | "payment_failed" | "invoice.payment_failed" => {
                Some(Self::PastDue)
            }
            "subscription_trial_started" => Some(Self::ProviderTrial),
            _ => None,
        }
    }

    /// The field set this event writes
    pub fn patch(self, provider: &str, fields: &WebhookFields) -> SubscriptionPatch {
        match self {
            Self::Activation => SubscriptionPatch {
                plan: Some(PlanTier::Pro),
                status: Some(SubscriptionStatus::Active),
                current_period_end: fields.current_period_end,
                provider: Some(provider.to_string()),
                provider_subscription_id: fields.provider_subscription_id.clone(),
                provider_customer_id: fields.provider_customer_id.clone(),
                cancel_at_period_end: Some(false),
            },
            Self::Renewal => SubscriptionPatch {
                status: Some(SubscriptionStatus::Active),
                current_period_end: fields.current_period_end,
                cancel_at_period_end: Some(false),
                ..Default::default()
            },
            // Cancelling at period end keeps the subscription paid until then
            Self::Cancellation => SubscriptionPatch {
                status: Some(if fields.cancel_at_period_end {
                    SubscriptionStatus::Active
                } else {
                    SubscriptionStatus::Canceled
                }),
                current_period_end: fields.current_period_end,
                cancel_at_period_end: Some(fields.cancel_at_period_end),
                ..Default::default()
            },
            Self::PastDue => SubscriptionPatch {
                status: Some(SubscriptionStatus::PastDue),
                ..Default::default()
            },
            Self::ProviderTrial => SubscriptionPatch {
                plan: Some(PlanTier::Pro),
                status: Some(SubscriptionStatus::Trialing),
                current_period_end: fields.current_period_end,
                provider: Some(provider.to_string()),
                provider_subscription_id: fields.provider_subscription_id.clone(),
                provider_customer_id: fields.provider_customer_id.clone(),
                ..Default::default()
            },
        }
    }

    /// User-facing notification emitted after the transition, if any
    pub fn notification(self, fields: &WebhookFields) -> Option<Notification> {
        match self {
            Self::PastDue => Some(Notification::PaymentFailed),
            Self::Cancellation => Some(Notification::SubscriptionCanceled {
                current_period_end: fields.current_period_end,
                cancel_at_period_end: fields.cancel_at_period_end,
            }),
            _ => None,
        }
    }
}

pub struct WebhookService {
    subscriptions: Arc<dyn SubscriptionRepository>,
    plan_service: Arc<PlanService>,
    notifier: Arc<dyn Notifier>,
}

impl WebhookService {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        plan_service: Arc<PlanService>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            subscriptions,
            plan_service,
            notifier,
        }
    }

    /// Apply one provider event. Unknown or unattributable events return
    /// `handled: false` without touching the store.
    #[instrument(skip(self, payload))]
    pub async fn handle_webhook(
        &self,
        provider: &str,
        event_type: &str,
        payload: &Value,
    ) -> Result<WebhookResponse> {
        let Some(class) = WebhookEventClass::classify(event_type) else {
            debug!("Ignoring unhandled {} webhook event {}", provider, event_type);
            return Ok(WebhookResponse { handled: false });
        };

        let fields = WebhookFields::extract(payload);

        let Some(raw_user_id) = fields.user_id.as_deref() else {
            debug!("Ignoring {} event {}: no user id", provider, event_type);
            return Ok(WebhookResponse { handled: false });
        };
        let Ok(user_id) = Uuid::parse_str(raw_user_id) else {
            debug!(
                "Ignoring {} event {}: user id {:?} is not a UUID",
                provider, event_type, raw_user_id
            );
            return Ok(WebhookResponse { handled: false });
        };

        let saved = self
            .subscriptions
            .upsert(user_id, class.patch(provider, &fields))
            .await?;
        self.plan_service.invalidate(user_id).await;

        info!(
            "Applied {} webhook {} ({:?}) for user {}: plan={}, status={}",
            provider,
            event_type,
            class,
            user_id,
            saved.plan.as_str(),
            saved.status.as_str()
        );

        if let Some(notification) = class.notification(&fields) {
            self.notifier.notify(user_id, notification);
        }

        Ok(WebhookResponse { handled: true })
    }
}
