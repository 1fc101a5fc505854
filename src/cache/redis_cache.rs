use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use std::{future::Future, time::Duration};
use tokio::sync::OnceCell;
use tracing::debug;

use super::{Cache, CacheError};

/// Redis-backed cache. Connects lazily so an unreachable Redis at startup
/// only costs cache misses; every round-trip is bounded by `timeout`.
pub struct RedisCache {
    client: Client,
    connection: OnceCell<ConnectionManager>,
    timeout: Duration,
}

impl RedisCache {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self {
            client,
            connection: OnceCell::new(),
            timeout,
        }
    }

    async fn with_timeout<T, F>(&self, fut: F) -> Result<T, CacheError>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(CacheError::Unavailable(e.to_string())),
            Err(_) => Err(CacheError::Timeout),
        }
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        let conn = self
            .connection
            .get_or_try_init(|| async {
                debug!("Connecting to Redis cache");
                self.with_timeout(ConnectionManager::new(self.client.clone()))
                    .await
            })
            .await?;

        // ConnectionManager is a cheap handle over one multiplexed connection
        Ok(conn.clone())
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        self.with_timeout(conn.get::<_, Option<String>>(key)).await
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        self.with_timeout(conn.set_ex::<_, _, ()>(key, value, ttl_seconds))
            .await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        self.with_timeout(conn.del::<_, ()>(key)).await
    }
}
