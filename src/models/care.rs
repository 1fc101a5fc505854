use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;
use validator::Validate;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Request body for `POST /children`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateChildRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[serde(default, with = "iso_date::option")]
    pub birth_date: Option<Date>,
}

/// Request body for `POST /events`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCareEventRequest {
    pub child_id: Uuid,

    /// feeding, sleep, diaper, ...
    #[validate(length(min = 1, max = 32))]
    pub event_type: String,

    #[serde(default, with = "time::serde::rfc3339::option")]
    pub occurred_at: Option<OffsetDateTime>,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewChild {
    pub user_id: Uuid,
    pub name: String,
    pub birth_date: Option<Date>,
}

#[derive(Debug, Clone)]
pub struct NewCareEvent {
    pub user_id: Uuid,
    pub child_id: Uuid,
    pub event_type: String,
    pub occurred_at: OffsetDateTime,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Child {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(with = "iso_date::option")]
    pub birth_date: Option<Date>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<entity::children::Model> for Child {
    fn from(model: entity::children::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            birth_date: model.birth_date,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CareEvent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub child_id: Uuid,
    pub event_type: String,
    #[serde(with = "time::serde::rfc3339")]
    pub occurred_at: OffsetDateTime,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<entity::care_events::Model> for CareEvent {
    fn from(model: entity::care_events::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            child_id: model.child_id,
            event_type: model.event_type,
            occurred_at: model.occurred_at,
            notes: model.notes,
            created_at: model.created_at,
        }
    }
}
