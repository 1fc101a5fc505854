// Middleware modules
pub mod admin;
pub mod jwt_auth;
pub mod logging;
pub mod plan_gate;

pub use admin::require_admin;
pub use jwt_auth::{jwt_auth_middleware, UserIdentity};
pub use logging::logging_middleware;
pub use plan_gate::plan_gate;
