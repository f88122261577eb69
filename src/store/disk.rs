use crate::core::cache::Cache;
use crate::core::error::RateError;
use anyhow::Result;
use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;
use std::time::{Duration, SystemTime};
use tracing::debug;

#[derive(Serialize, Deserialize)]
struct CacheEntry<V> {
    value: V,
    expires_at: Option<SystemTime>,
}

/// Cache persisted in a fjall partition so entries survive between runs.
pub struct DiskCache<K, V>
where
    K: Eq + Hash + Send + Sync + Serialize + 'static + Debug,
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    partition: PartitionHandle,
    _marker: PhantomData<(K, V)>,
}

impl<K, V> DiskCache<K, V>
where
    K: Eq + Hash + Send + Sync + Serialize + Debug,
    V: Clone + Send + Sync + Serialize + DeserializeOwned,
{
    pub fn new(keyspace: &Keyspace, name: &str) -> Result<Self, RateError> {
        let partition = keyspace.open_partition(name, PartitionCreateOptions::default())?;
        Ok(Self {
            partition,
            _marker: PhantomData,
        })
    }
}

#[async_trait]
impl<K, V> Cache<K, V> for DiskCache<K, V>
where
    K: Eq + Hash + Send + Sync + Serialize + 'static + Debug,
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    async fn get(&self, key: &K) -> Option<V> {
        let res: Result<Option<V>> = (|| {
            let raw_key = serde_json::to_vec(key)?;
            if let Some(value) = self.partition.get(&raw_key)? {
                let entry: CacheEntry<V> = serde_json::from_slice(&value)?;
                if let Some(expires_at) = entry.expires_at {
                    if SystemTime::now() > expires_at {
                        debug!("Cache entry expired for key: {:?}", key);
                        self.partition.remove(raw_key)?;
                        return Ok(None);
                    }
                }
                debug!("Cache HIT for key: {:?}", key);
                return Ok(Some(entry.value));
            }
            debug!("Cache MISS for key: {:?}", key);
            Ok(None)
        })();

        match res {
            Ok(val) => val,
            Err(e) => {
                debug!("DiskCache get error: {}", e);
                None
            }
        }
    }

    async fn put(&self, key: K, value: V, ttl: Option<Duration>) {
        let res: Result<()> = (|| {
            let expires_at = ttl.map(|d| SystemTime::now() + d);
            let entry = CacheEntry { value, expires_at };
            self.partition
                .insert(serde_json::to_vec(&key)?, serde_json::to_vec(&entry)?)?;
            debug!("Cache PUT for key: {:?}", key);
            Ok(())
        })();
        if let Err(e) = res {
            debug!("DiskCache put error: {}", e);
        }
    }

    async fn remove(&self, key: &K) {
        let res: Result<()> = (|| Ok(self.partition.remove(serde_json::to_vec(key)?)?))();
        match res {
            Ok(()) => debug!("Cache REMOVE for key: {:?}", key),
            Err(e) => debug!("DiskCache remove error: {}", e),
        }
    }

    async fn clear(&self) {
        let res: Result<()> = (|| {
            let keys = self
                .partition
                .iter()
                .map(|kv| kv.map(|(key, _)| key))
                .collect::<Result<Vec<_>, fjall::Error>>()?;
            for key in keys {
                self.partition.remove(key)?;
            }
            Ok(())
        })();
        match res {
            Ok(()) => debug!("Cache CLEAR"),
            Err(e) => debug!("DiskCache clear error: {}", e),
        }
    }
}
