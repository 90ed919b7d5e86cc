//! Named short-TTL locks
//!
//! A lease is held by one holder until it is released or its TTL runs out.
//! Acquiring a key held by someone else inside their TTL fails without error.

use ahash::AHashMap;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::core::calendar::{Clock, Timestamp};
use crate::core::error::{RealmError, Result};

#[async_trait]
pub trait LockService: Send + Sync {
    /// Try to take `key` for `ttl_ms`; false when another holder has it
    async fn acquire(&self, key: &str, holder: &str, ttl_ms: u64) -> Result<bool>;

    /// Give up `key`; a no-op unless `holder` owns it
    async fn release(&self, key: &str, holder: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
struct Lease {
    holder: String,
    expires_at: Timestamp,
}

/// Process-local lock service driven by a `Clock`
pub struct InMemoryLockService {
    clock: Arc<dyn Clock>,
    leases: Mutex<AHashMap<String, Lease>>,
}

impl InMemoryLockService {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock, leases: Mutex::new(AHashMap::new()) }
    }

    /// Current holder of `key`, if its lease is still live
    pub async fn holder(&self, key: &str) -> Option<String> {
        let now = self.clock.now();
        let leases = self.leases.lock().await;
        leases.get(key).filter(|l| l.expires_at > now).map(|l| l.holder.clone())
    }
}

#[async_trait]
impl LockService for InMemoryLockService {
    async fn acquire(&self, key: &str, holder: &str, ttl_ms: u64) -> Result<bool> {
        if ttl_ms == 0 {
            return Err(RealmError::Lock(format!("lock {key} requested with zero ttl")));
        }
        let now = self.clock.now();
        let mut leases = self.leases.lock().await;
        if let Some(lease) = leases.get(key) {
            if lease.expires_at > now && lease.holder != holder {
                return Ok(false);
            }
        }
        let lease = Lease { holder: holder.to_string(), expires_at: now.plus_millis(ttl_ms) };
        leases.insert(key.to_string(), lease);
        Ok(true)
    }

    async fn release(&self, key: &str, holder: &str) -> Result<()> {
        let mut leases = self.leases.lock().await;
        if leases.get(key).is_some_and(|l| l.holder == holder) {
            leases.remove(key);
        }
        Ok(())
    }
}

/// One worker's handle on a lock service
#[derive(Clone)]
pub struct LockClient {
    service: Arc<dyn LockService>,
    holder: String,
}

impl LockClient {
    /// Client with a fresh random holder identity
    pub fn new(service: Arc<dyn LockService>) -> Self {
        Self::with_holder(service, Uuid::new_v4().to_string())
    }

    pub fn with_holder(service: Arc<dyn LockService>, holder: impl Into<String>) -> Self {
        Self { service, holder: holder.into() }
    }

    pub fn holder(&self) -> &str {
        &self.holder
    }

    pub async fn acquire(&self, key: &str, ttl_ms: u64) -> Result<bool> {
        let acquired = self.service.acquire(key, &self.holder, ttl_ms).await?;
        if !acquired {
            debug!(key, holder = %self.holder, "lock busy");
        }
        Ok(acquired)
    }

    pub async fn release(&self, key: &str) -> Result<()> {
        self.service.release(key, &self.holder).await
    }
}

impl std::fmt::Debug for LockClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockClient").field("holder", &self.holder).finish_non_exhaustive()
    }
}
