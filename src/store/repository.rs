use crate::core::error::RateError;
use crate::core::rate::{Rate, RateSource};
use crate::store::{KEY_SEPARATOR, RateRepository};
use chrono::NaiveDate;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

const SOURCES_PARTITION: &str = "rate_sources";
const RATES_PARTITION: &str = "rates";

/// Rate records stored as JSON in two fjall partitions.
///
/// Rates are keyed by `source␟currency␟YYYY-MM-DD`, which makes the
/// (source, currency, date) triple unique and keeps each currency's
/// history sorted by date.
pub struct FjallRepository {
    keyspace: Keyspace,
    sources: PartitionHandle,
    rates: PartitionHandle,
}

impl FjallRepository {
    pub fn open(path: &Path) -> Result<Self, RateError> {
        let keyspace = fjall::Config::new(path).open()?;
        Self::from_keyspace(keyspace)
    }

    pub fn from_keyspace(keyspace: Keyspace) -> Result<Self, RateError> {
        let sources = keyspace.open_partition(SOURCES_PARTITION, PartitionCreateOptions::default())?;
        let rates = keyspace.open_partition(RATES_PARTITION, PartitionCreateOptions::default())?;
        Ok(Self {
            keyspace,
            sources,
            rates,
        })
    }

    pub fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    fn currency_prefix(source: &str, currency: &str) -> String {
        format!("{source}{KEY_SEPARATOR}{currency}{KEY_SEPARATOR}")
    }

    fn rate_key(source: &str, currency: &str, date: NaiveDate) -> String {
        format!(
            "{}{}",
            Self::currency_prefix(source, currency),
            date.format("%Y-%m-%d")
        )
    }

    fn source_prefix(source: &str) -> String {
        format!("{source}{KEY_SEPARATOR}")
    }

    fn scan_rates(&self, prefix: &str) -> Result<Vec<Rate>, RateError> {
        self.rates
            .prefix(prefix)
            .map(|kv| -> Result<Rate, RateError> {
                let (_, value) = kv?;
                Ok(serde_json::from_slice(&value)?)
            })
            .collect()
    }
}

impl RateRepository for FjallRepository {
    fn find_source(&self, name: &str) -> Result<Option<RateSource>, RateError> {
        match self.sources.get(name)? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    fn put_source(&self, source: &RateSource) -> Result<bool, RateError> {
        let created = !self.sources.contains_key(&source.name)?;
        self.sources
            .insert(source.name.as_str(), serde_json::to_vec(source)?)?;
        debug!(source = %source.name, created, "Stored rate source");
        Ok(created)
    }

    fn remove_source(&self, name: &str) -> Result<Option<(RateSource, Vec<Rate>)>, RateError> {
        let Some(source) = self.find_source(name)? else {
            return Ok(None);
        };

        let rates = self.scan_rates(&Self::source_prefix(name))?;
        for rate in &rates {
            self.rates
                .remove(Self::rate_key(&rate.source, &rate.currency, rate.date))?;
        }
        self.sources.remove(name)?;
        debug!(source = %name, rates = rates.len(), "Removed rate source");
        Ok(Some((source, rates)))
    }

    fn find_rate(
        &self,
        source: &str,
        currency: &str,
        date: NaiveDate,
    ) -> Result<Option<Rate>, RateError> {
        match self.rates.get(Self::rate_key(source, currency, date))? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    fn latest_rate(&self, source: &str, currency: &str) -> Result<Option<Rate>, RateError> {
        match self
            .rates
            .prefix(Self::currency_prefix(source, currency))
            .next_back()
        {
            Some(kv) => {
                let (_, value) = kv?;
                Ok(Some(serde_json::from_slice(&value)?))
            }
            None => Ok(None),
        }
    }

    fn put_rate(&self, rate: &Rate) -> Result<bool, RateError> {
        if !self.sources.contains_key(&rate.source)? {
            return Err(RateError::NotFound(format!("RateSource '{}'", rate.source)));
        }

        let key = Self::rate_key(&rate.source, &rate.currency, rate.date);
        let created = !self.rates.contains_key(&key)?;
        self.rates.insert(key, serde_json::to_vec(rate)?)?;
        Ok(created)
    }

    fn remove_rate(&self, rate: &Rate) -> Result<bool, RateError> {
        let key = Self::rate_key(&rate.source, &rate.currency, rate.date);
        let existed = self.rates.contains_key(&key)?;
        self.rates.remove(key)?;
        Ok(existed)
    }

    fn rates_for_source(&self, source: &str) -> Result<Vec<Rate>, RateError> {
        let mut rates = self.scan_rates(&Self::source_prefix(source))?;
        rates.sort_by(Rate::default_ordering);
        Ok(rates)
    }

    fn persist(&self) -> Result<(), RateError> {
        self.keyspace.persist(PersistMode::SyncAll)?;
        Ok(())
    }
}
