use crate::core::cache::Cache;
use crate::core::config::RateLookup;
use crate::core::error::RateError;
use crate::core::rate::{Rate, RateSource};
use crate::store::{KEY_SEPARATOR, RateRepository};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Read-through cache of each source's base currency.
#[derive(Clone)]
pub struct SourceCache {
    cache: Arc<dyn Cache<String, String>>,
    ttl: Option<Duration>,
}

impl SourceCache {
    pub fn new(cache: Arc<dyn Cache<String, String>>, ttl: Option<Duration>) -> Self {
        Self { cache, ttl }
    }

    pub(crate) fn key(source_name: &str) -> String {
        format!("rates{KEY_SEPARATOR}source{KEY_SEPARATOR}{source_name}")
    }

    pub async fn get(
        &self,
        repo: &dyn RateRepository,
        source_name: &str,
    ) -> Result<String, RateError> {
        let key = Self::key(source_name);
        if let Some(base_currency) = self.cache.get(&key).await {
            return Ok(base_currency);
        }

        let source = repo
            .find_source(source_name)?
            .ok_or_else(|| RateError::NotFound(format!("RateSource '{source_name}'")))?;
        self.set(&source).await;
        Ok(source.base_currency)
    }

    pub async fn set(&self, source: &RateSource) {
        self.cache
            .put(
                Self::key(&source.name),
                source.base_currency.clone(),
                self.ttl,
            )
            .await;
    }

    pub async fn clear(&self, source: &RateSource) {
        self.cache.remove(&Self::key(&source.name)).await;
    }
}

/// Read-through cache of rate values keyed by source, currency and date.
#[derive(Clone)]
pub struct RateCache {
    cache: Arc<dyn Cache<String, Decimal>>,
    ttl: Option<Duration>,
    lookup: RateLookup,
}

impl RateCache {
    pub fn new(
        cache: Arc<dyn Cache<String, Decimal>>,
        ttl: Option<Duration>,
        lookup: RateLookup,
    ) -> Self {
        Self { cache, ttl, lookup }
    }

    pub(crate) fn key(source_name: &str, currency: &str, date: NaiveDate) -> String {
        format!(
            "rates{KEY_SEPARATOR}rate{KEY_SEPARATOR}{source_name}{KEY_SEPARATOR}{currency}{KEY_SEPARATOR}{date}"
        )
    }

    /// Returns the cached value for `date`, filling a miss from storage
    /// according to the configured [`RateLookup`].
    pub async fn get(
        &self,
        repo: &dyn RateRepository,
        source_name: &str,
        currency: &str,
        date: NaiveDate,
    ) -> Result<Decimal, RateError> {
        let key = Self::key(source_name, currency, date);
        if let Some(value) = self.cache.get(&key).await {
            return Ok(value);
        }

        let stored = match self.lookup {
            RateLookup::Latest => repo.latest_rate(source_name, currency)?,
            RateLookup::Exact => repo.find_rate(source_name, currency, date)?,
        };
        let rate = stored.ok_or_else(|| {
            RateError::NotFound(format!("Rate for {currency} from '{source_name}'"))
        })?;
        if rate.date != date {
            debug!(
                requested = %date,
                stored = %rate.date,
                "Caching latest rate under a different date"
            );
        }

        self.cache.put(key, rate.value, self.ttl).await;
        Ok(rate.value)
    }

    pub async fn clear(&self, rate: &Rate) {
        self.cache
            .remove(&Self::key(&rate.source, &rate.currency, rate.date))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_keys_do_not_collide_on_colons() {
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert_ne!(
            RateCache::key("a:b", "c", date),
            RateCache::key("a", "b:c", date)
        );
        assert_ne!(SourceCache::key("a:b"), RateCache::key("a", "b", date));
    }

    #[test]
    fn test_key_parts_are_separated() {
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let key = RateCache::key("openexchange.org", "EUR", date);
        let parts: Vec<&str> = key.split(KEY_SEPARATOR).collect();
        assert_eq!(
            parts,
            vec!["rates", "rate", "openexchange.org", "EUR", "2020-01-01"]
        );
        assert_eq!(
            SourceCache::key("openexchange.org").split(KEY_SEPARATOR).count(),
            3
        );
    }
}
