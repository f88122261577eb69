//! Rate records with cache hooks.
//!
//! Every write goes to the repository first and then updates or clears the
//! matching cache entry, so the caches never outlive the write that changed
//! the record:
//!
//! - saving a source puts its base currency into the source cache,
//! - deleting a source clears it (and the entries of its cascaded rates),
//! - updating or deleting a rate clears its rate-value entry. Creating a
//!   rate leaves the cache alone.

use crate::core::cache::Cache;
use crate::core::config::CacheConfig;
use crate::core::error::RateError;
use crate::core::rate::{RATE_DECIMAL_PLACES, Rate, RateSource, today};
use crate::store::{DiskCache, FjallRepository, RateCache, RateRepository, SourceCache};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const SOURCE_CACHE_PARTITION: &str = "cache_sources";
const RATE_CACHE_PARTITION: &str = "cache_rates";

pub struct RateStore {
    repo: Arc<dyn RateRepository>,
    sources: SourceCache,
    rates: RateCache,
}

impl RateStore {
    pub fn new(
        repo: Arc<dyn RateRepository>,
        source_cache: Arc<dyn Cache<String, String>>,
        rate_cache: Arc<dyn Cache<String, Decimal>>,
        config: &CacheConfig,
    ) -> Self {
        Self {
            repo,
            sources: SourceCache::new(source_cache, config.source_ttl()),
            rates: RateCache::new(rate_cache, config.rate_ttl(), config.rate_lookup),
        }
    }

    /// Opens the records and both caches in one fjall keyspace at `path`.
    pub fn open(path: &Path, config: &CacheConfig) -> Result<Self, RateError> {
        let repo = FjallRepository::open(path)?;
        let source_cache: DiskCache<String, String> =
            DiskCache::new(repo.keyspace(), SOURCE_CACHE_PARTITION)?;
        let rate_cache: DiskCache<String, Decimal> =
            DiskCache::new(repo.keyspace(), RATE_CACHE_PARTITION)?;
        debug!("Opened rate store at {}", path.display());

        Ok(Self::new(
            Arc::new(repo),
            Arc::new(source_cache),
            Arc::new(rate_cache),
            config,
        ))
    }

    pub fn find_source(&self, name: &str) -> Result<Option<RateSource>, RateError> {
        self.repo.find_source(name)
    }

    pub async fn get_or_create_source(&self, name: &str) -> Result<RateSource, RateError> {
        if let Some(source) = self.repo.find_source(name)? {
            return Ok(source);
        }
        let mut source = RateSource::new(name);
        self.save_source(&mut source).await?;
        Ok(source)
    }

    /// Stores `source`, touching its `last_update`. Returns `true` when
    /// the source was created.
    pub async fn save_source(&self, source: &mut RateSource) -> Result<bool, RateError> {
        source.last_update = Utc::now();
        let created = self.repo.put_source(source)?;
        self.sources.set(source).await;
        Ok(created)
    }

    /// Deletes a source and all of its rates. Returns `false` when no such
    /// source exists.
    pub async fn delete_source(&self, name: &str) -> Result<bool, RateError> {
        let Some((source, rates)) = self.repo.remove_source(name)? else {
            return Ok(false);
        };
        for rate in &rates {
            self.rates.clear(rate).await;
        }
        self.sources.clear(&source).await;
        Ok(true)
    }

    pub fn get_rate(
        &self,
        source: &str,
        currency: &str,
        date: NaiveDate,
    ) -> Result<Option<Rate>, RateError> {
        self.repo.find_rate(source, currency, date)
    }

    /// Stores `rate` with its value rounded to six decimal places. Returns
    /// `true` when the rate was created.
    pub async fn save_rate(&self, rate: &mut Rate) -> Result<bool, RateError> {
        rate.value = rate.value.round_dp(RATE_DECIMAL_PLACES);
        let created = self.repo.put_rate(rate)?;
        if !created {
            self.rates.clear(rate).await;
        }
        Ok(created)
    }

    pub async fn delete_rate(&self, rate: &Rate) -> Result<bool, RateError> {
        let existed = self.repo.remove_rate(rate)?;
        self.rates.clear(rate).await;
        Ok(existed)
    }

    /// Base currency of `source_name`, read through the source cache.
    pub async fn base_currency(&self, source_name: &str) -> Result<String, RateError> {
        self.sources.get(self.repo.as_ref(), source_name).await
    }

    /// Rate value of `currency` from `source_name` on `date` (default
    /// today), read through the rate cache.
    pub async fn rate_value(
        &self,
        source_name: &str,
        currency: &str,
        date: Option<NaiveDate>,
    ) -> Result<Decimal, RateError> {
        let date = date.unwrap_or_else(today);
        self.rates
            .get(self.repo.as_ref(), source_name, currency, date)
            .await
    }

    pub fn rates_for_source(&self, source_name: &str) -> Result<Vec<Rate>, RateError> {
        self.repo.rates_for_source(source_name)
    }

    pub fn persist(&self) -> Result<(), RateError> {
        self.repo.persist()
    }
}
