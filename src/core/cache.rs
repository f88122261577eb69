use async_trait::async_trait;
use std::hash::Hash;
use std::time::Duration;

/// A key-value cache with optional per-entry expiry.
///
/// Implementations never fail loudly: a broken entry reads as a miss.
#[async_trait]
pub trait Cache<K, V>: Send + Sync
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &K) -> Option<V>;

    /// Stores `value`; `None` keeps it until it is removed.
    async fn put(&self, key: K, value: V, ttl: Option<Duration>);

    async fn remove(&self, key: &K);

    async fn clear(&self);
}
