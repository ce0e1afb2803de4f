//! Redis-backed KV store.

use super::KvStore;
use crate::error::{IntegrationError, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, ConnectionInfo, Script};
use std::time::Duration;
use tracing::{error, info};

/// Deletes KEYS[1] only while it still holds ARGV[1].
const REMOVE_IF_VALUE_SCRIPT: &str = r"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
end
return 0
";

/// `host:port/db` of a connection, without credentials.
fn endpoint(info: &ConnectionInfo) -> String {
    format!("{}/{}", info.addr, info.redis.db)
}

/// KV store on a shared Redis instance.
///
/// `ConnectionManager` reconnects transparently between commands; a command
/// that fails is reported to the caller immediately.
#[derive(Clone)]
pub struct RedisKvStore {
    manager: ConnectionManager,
}

impl RedisKvStore {
    /// Connects to Redis at `url` (e.g. `redis://localhost:6379/0`).
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(IntegrationError::store)?;
        info!(endpoint = %endpoint(client.get_connection_info()), "Connecting to Redis");

        let manager = ConnectionManager::new(client)
            .await
            .map_err(IntegrationError::store)?;

        info!("Successfully connected to Redis");
        Ok(Self { manager })
    }
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.manager.clone();
        conn.get::<_, Option<String>>(key).await.map_err(|e| {
            error!(error = %e, "Redis GET failed");
            IntegrationError::store(e)
        })
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.manager.clone();
        let result = match ttl {
            // SET .. EX in one command so the key never exists without its TTL
            Some(ttl) => {
                conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
                    .await
            }
            None => conn.set::<_, _, ()>(key, value).await,
        };
        result.map_err(|e| {
            error!(error = %e, "Redis SET failed");
            IntegrationError::store(e)
        })
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.manager.clone();
        let removed: i64 = conn.del(key).await.map_err(|e| {
            error!(error = %e, "Redis DEL failed");
            IntegrationError::store(e)
        })?;
        Ok(removed > 0)
    }

    async fn take(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.manager.clone();
        conn.get_del::<_, Option<String>>(key).await.map_err(|e| {
            error!(error = %e, "Redis GETDEL failed");
            IntegrationError::store(e)
        })
    }

    async fn remove_if_value(&self, key: &str, expected: &str) -> Result<bool> {
        let mut conn = self.manager.clone();
        let removed: i64 = Script::new(REMOVE_IF_VALUE_SCRIPT)
            .key(key)
            .arg(expected)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| {
                error!(error = %e, "Redis compare-and-delete failed");
                IntegrationError::store(e)
            })?;
        Ok(removed > 0)
    }
}
