//! Shard enumeration

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::core::error::{RealmError, Result};
use crate::core::types::ShardId;
use crate::store::{InMemoryStore, WorldStore};

#[async_trait]
pub trait ShardRegistry: Send + Sync {
    /// Shards due for maintenance, in a stable order
    async fn active_shards(&self) -> Result<Vec<ShardId>>;

    async fn store(&self, shard: ShardId) -> Result<Arc<dyn WorldStore>>;
}

/// Registry over in-memory shard stores
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    shards: RwLock<BTreeMap<ShardId, Arc<InMemoryStore>>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, store: Arc<InMemoryStore>) {
        self.shards.write().await.insert(store.shard(), store);
    }

    pub async fn remove(&self, shard: ShardId) -> Option<Arc<InMemoryStore>> {
        self.shards.write().await.remove(&shard)
    }

    pub async fn get(&self, shard: ShardId) -> Option<Arc<InMemoryStore>> {
        self.shards.read().await.get(&shard).cloned()
    }
}

#[async_trait]
impl ShardRegistry for InMemoryRegistry {
    async fn active_shards(&self) -> Result<Vec<ShardId>> {
        Ok(self.shards.read().await.keys().copied().collect())
    }

    async fn store(&self, shard: ShardId) -> Result<Arc<dyn WorldStore>> {
        let store: Arc<dyn WorldStore> = self
            .shards
            .read()
            .await
            .get(&shard)
            .cloned()
            .ok_or_else(|| RealmError::not_found("shard", shard.0))?;
        Ok(store)
    }
}
