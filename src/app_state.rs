use crate::{
    cache::{Cache, MemoryCache, RedisCache},
    config::Config,
    repositories::{
        CareRepository, SeaOrmCareRepository, SeaOrmSubscriptionRepository,
        SubscriptionRepository,
    },
    services::{
        AdminService, CareService, JWTService, LogNotifier, Notifier, PlanCatalog, PlanService,
        PushNotifier, QuotaService, TrialService, WebhookService,
    },
};
use migration::{Migrator, MigratorTrait};
use std::{sync::Arc, time::Duration};
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub jwt_service: Arc<JWTService>,
    pub plan_service: Arc<PlanService>,
    pub trial_service: Arc<TrialService>,
    pub webhook_service: Arc<WebhookService>,
    pub admin_service: Arc<AdminService>,
    pub care_service: Arc<CareService>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self, anyhow::Error> {
        // Connect to database
        let db = sea_orm::Database::connect(&config.database.url).await?;

        if config.database.run_migrations {
            Migrator::up(&db, None).await?;
            info!("Database migrations applied");
        }

        let cache: Arc<dyn Cache> = match config.redis.url.as_deref() {
            Some(url) => {
                info!("Using Redis cache");
                let client = redis::Client::open(url)?;
                Arc::new(RedisCache::new(
                    client,
                    Duration::from_millis(config.redis.timeout_ms),
                ))
            }
            None => {
                info!("No Redis configured, using in-process cache");
                Arc::new(MemoryCache::new())
            }
        };

        let notifier: Arc<dyn Notifier> = match config.notifications.push_url.clone() {
            Some(url) => Arc::new(PushNotifier::new(url, &config.notifications)?),
            None => Arc::new(LogNotifier),
        };

        Ok(Self::from_parts(
            config,
            Arc::new(SeaOrmSubscriptionRepository::new(db.clone())),
            Arc::new(SeaOrmCareRepository::new(db)),
            cache,
            notifier,
        ))
    }

    /// Wire services over the given collaborators
    pub fn from_parts(
        config: Config,
        subscriptions: Arc<dyn SubscriptionRepository>,
        care: Arc<dyn CareRepository>,
        cache: Arc<dyn Cache>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let catalog = Arc::new(PlanCatalog::new(&config.plans, &config.billing));
        let jwt_service = Arc::new(JWTService::new(Arc::new(config.auth.clone())));

        let plan_service = Arc::new(PlanService::new(
            subscriptions.clone(),
            cache.clone(),
            catalog,
            config.billing.cache_ttl_seconds,
        ));
        let trial_service = Arc::new(TrialService::new(
            subscriptions.clone(),
            plan_service.clone(),
            notifier.clone(),
        ));
        let webhook_service = Arc::new(WebhookService::new(
            subscriptions.clone(),
            plan_service.clone(),
            notifier,
        ));
        let admin_service = Arc::new(AdminService::new(
            subscriptions,
            care.clone(),
            plan_service.clone(),
            cache,
            config.billing.metrics_cache_ttl_seconds,
        ));
        let quota_service = Arc::new(QuotaService::new(plan_service.clone(), care.clone()));
        let care_service = Arc::new(CareService::new(care, quota_service));

        Self {
            config: Arc::new(config),
            jwt_service,
            plan_service,
            trial_service,
            webhook_service,
            admin_service,
            care_service,
        }
    }
}
