use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub billing: BillingConfig,
    #[serde(default)]
    pub plans: PlansConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    /// Apply pending migrations at startup
    #[serde(default)]
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// When absent the entitlement cache lives in-process.
    #[serde(default)]
    pub url: Option<String>,
    /// Upper bound for any single cache round-trip.
    #[serde(default = "default_cache_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_ms: default_cache_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_access_token_expiration_minutes")]
    pub access_token_expiration_minutes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    #[serde(default = "default_trial_duration_days")]
    pub trial_duration_days: i64,
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,
    #[serde(default = "default_metrics_cache_ttl_seconds")]
    pub metrics_cache_ttl_seconds: u64,
    /// Shared secret for webhook HMAC signatures. Verification is skipped
    /// when unset or blank; read it through `webhook_secret()`.
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

impl BillingConfig {
    /// The signing secret, if one is actually configured
    pub fn webhook_secret(&self) -> Option<&str> {
        self.webhook_secret
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            trial_duration_days: default_trial_duration_days(),
            cache_ttl_seconds: default_cache_ttl_seconds(),
            metrics_cache_ttl_seconds: default_metrics_cache_ttl_seconds(),
            webhook_secret: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlansConfig {
    pub free: PlanLimitsConfig,
    pub pro: PlanLimitsConfig,
}

impl Default for PlansConfig {
    fn default() -> Self {
        Self {
            free: PlanLimitsConfig {
                max_children: Some(2),
                max_events_per_month: Some(500),
                ai_enabled: false,
                voice_enabled: false,
                avatars_enabled: false,
            },
            pro: PlanLimitsConfig {
                max_children: None,
                max_events_per_month: None,
                ai_enabled: true,
                voice_enabled: true,
                avatars_enabled: true,
            },
        }
    }
}

/// Limits for one tier. A missing ceiling means "no limit".
#[derive(Debug, Clone, Deserialize)]
pub struct PlanLimitsConfig {
    #[serde(default)]
    pub max_children: Option<u32>,
    #[serde(default)]
    pub max_events_per_month: Option<u32>,
    #[serde(default)]
    pub ai_enabled: bool,
    #[serde(default)]
    pub voice_enabled: bool,
    #[serde(default)]
    pub avatars_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default)]
    pub push_url: Option<String>,
    #[serde(default = "default_notification_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            push_url: None,
            timeout_ms: default_notification_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub json: bool,
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_cache_timeout_ms() -> u64 {
    250
}

fn default_access_token_expiration_minutes() -> u64 {
    15
}

fn default_trial_duration_days() -> i64 {
    14
}

fn default_cache_ttl_seconds() -> u64 {
    60
}

fn default_metrics_cache_ttl_seconds() -> u64 {
    120
}

fn default_notification_timeout_ms() -> u64 {
    3000
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for environment variable overrides)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(true))
            .add_source(
                config::Environment::with_prefix("CARENEST")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
