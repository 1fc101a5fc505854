use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::{
    plan_catalog::PlanCatalog,
    plan_resolver::{cache_ttl, resolve_plan},
};
use crate::{
    cache::Cache,
    error::Result,
    models::plan::UserPlanInfo,
    repositories::SubscriptionRepository,
};

pub fn cache_key(user_id: Uuid) -> String {
    format!("plan:{}", user_id)
}

/// Cache-aside entitlement lookup. The store is the only hard dependency;
/// every cache failure degrades to a miss.
pub struct PlanService {
    subscriptions: Arc<dyn SubscriptionRepository>,
    cache: Arc<dyn Cache>,
    catalog: Arc<PlanCatalog>,
    default_ttl: u64,
}

impl PlanService {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        cache: Arc<dyn Cache>,
        catalog: Arc<PlanCatalog>,
        default_ttl: u64,
    ) -> Self {
        Self {
            subscriptions,
            cache,
            catalog,
            default_ttl,
        }
    }

    pub fn catalog(&self) -> &PlanCatalog {
        &self.catalog
    }

    /// Effective plan for the user right now
    #[instrument(skip(self))]
    pub async fn get_user_plan(&self, user_id: Uuid) -> Result<UserPlanInfo> {
        let key = cache_key(user_id);

        if let Some(info) = self.read_cached(&key).await {
            debug!("Plan cache hit for user {}", user_id);
            return Ok(info);
        }

        self.resolve_and_store(user_id, &key).await
    }

    /// Drop any cached entry, then resolve from the store and re-cache.
    /// Every writer calls this after mutating the record.
    #[instrument(skip(self))]
    pub async fn refresh(&self, user_id: Uuid) -> Result<UserPlanInfo> {
        let key = cache_key(user_id);
        self.invalidate_key(&key).await;
        self.resolve_and_store(user_id, &key).await
    }

    #[instrument(skip(self))]
    pub async fn invalidate(&self, user_id: Uuid) {
        self.invalidate_key(&cache_key(user_id)).await;
    }

    async fn resolve_and_store(&self, user_id: Uuid, key: &str) -> Result<UserPlanInfo> {
        let subscription = self.subscriptions.find_by_user(user_id).await?;
        let now = OffsetDateTime::now_utc();
        let info = resolve_plan(subscription.as_ref(), &self.catalog, now);

        if let Some(ttl) = cache_ttl(&info, self.default_ttl, now) {
            self.write_cached(key, &info, ttl).await;
        }

        Ok(info)
    }

    async fn read_cached(&self, key: &str) -> Option<UserPlanInfo> {
        let raw = match self.cache.get(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Plan cache read failed for {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(info) => Some(info),
            Err(e) => {
                warn!("Discarding unreadable plan cache entry {}: {}", key, e);
                None
            }
        }
    }

    async fn write_cached(&self, key: &str, info: &UserPlanInfo, ttl: u64) {
        let raw = match serde_json::to_string(info) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to serialize plan for cache: {}", e);
                return;
            }
        };

        if let Err(e) = self.cache.set(key, &raw, ttl).await {
            warn!("Plan cache write failed for {}: {}", key, e);
        }
    }

    async fn invalidate_key(&self, key: &str) {
        if let Err(e) = self.cache.delete(key).await {
            warn!("Plan cache invalidation failed for {}: {}", key, e);
        }
    }
}
