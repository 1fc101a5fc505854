// Service modules
pub mod admin_service;
pub mod care_service;
pub mod jwt_service;
pub mod notification_service;
pub mod plan_catalog;
pub mod plan_resolver;
pub mod plan_service;
pub mod quota_service;
pub mod trial_service;
pub mod webhook_service;

pub use admin_service::AdminService;
pub use care_service::CareService;
pub use jwt_service::JWTService;
pub use notification_service::{LogNotifier, Notification, Notifier, PushNotifier};
pub use plan_catalog::PlanCatalog;
pub use plan_service::PlanService;
pub use quota_service::QuotaService;
pub use trial_service::TrialService;
pub use webhook_service::WebhookService;
