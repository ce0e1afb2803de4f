//! Key-value store abstraction backing the credential cache.
//!
//! The hub only needs get/set/delete with an optional TTL, plus two atomic
//! read-and-remove operations for single-use values. Two backends are
//! provided:
//!
//! - [`MemoryKvStore`] - in-process, for single-instance deployments and tests
//! - [`RedisKvStore`] - shared Redis instance, for multi-instance deployments
//!
//! Transport failures surface as [`IntegrationError::StoreUnavailable`] and are
//! never retried here.
//!
//! [`IntegrationError::StoreUnavailable`]: crate::error::IntegrationError::StoreUnavailable

mod memory;
mod redis;

pub use self::memory::{run_expiry_cleanup, MemoryKvStore};
pub use self::redis::RedisKvStore;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Minimal async key-value interface.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Returns the value for `key`, or `None` when unset or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value and TTL.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Removes `key`. Returns whether a live value was removed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Returns and removes the value for `key` in one atomic step.
    ///
    /// Of several concurrent callers, at most one receives the value.
    async fn take(&self, key: &str) -> Result<Option<String>>;

    /// Removes `key` only while it holds exactly `expected`, atomically.
    /// Returns whether it was removed.
    async fn remove_if_value(&self, key: &str, expected: &str) -> Result<bool>;
}

/// Builds the configured store backend.
///
/// The memory backend gets a background expiry sweep; call from within a
/// tokio runtime.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn KvStore>> {
    match config.backend {
        StoreBackend::Memory => {
            let store = MemoryKvStore::new();
            tokio::spawn(run_expiry_cleanup(
                store.clone(),
                config.cleanup_interval_seconds.max(1),
            ));
            Ok(Arc::new(store))
        }
        StoreBackend::Redis => {
            let store = RedisKvStore::connect(&config.redis_url).await?;
            Ok(Arc::new(store))
        }
    }
}
