pub mod caches;
pub mod disk;
pub mod memory;
pub mod rates;
pub mod repository;

use crate::core::error::RateError;
use crate::core::rate::{Rate, RateSource};
use chrono::NaiveDate;

pub use caches::{RateCache, SourceCache};
pub use disk::DiskCache;
pub use memory::MemoryCache;
pub use rates::RateStore;
pub use repository::FjallRepository;

/// Separates the parts of composite storage and cache keys; must not appear
/// in source names or currency codes.
pub(crate) const KEY_SEPARATOR: char = '\x1f';

/// Authoritative storage for rate sources and rates.
///
/// Writes report whether they created a new record, which the cache hooks
/// in [`RateStore`] rely on.
pub trait RateRepository: Send + Sync {
    fn find_source(&self, name: &str) -> Result<Option<RateSource>, RateError>;

    /// Inserts or replaces a source; returns `true` if it did not exist.
    fn put_source(&self, source: &RateSource) -> Result<bool, RateError>;

    /// Removes a source together with all of its rates.
    fn remove_source(&self, name: &str) -> Result<Option<(RateSource, Vec<Rate>)>, RateError>;

    fn find_rate(
        &self,
        source: &str,
        currency: &str,
        date: NaiveDate,
    ) -> Result<Option<Rate>, RateError>;

    /// Most recent rate of `currency` for `source`, whatever its date.
    fn latest_rate(&self, source: &str, currency: &str) -> Result<Option<Rate>, RateError>;

    /// Inserts or replaces the rate for its (source, currency, date);
    /// returns `true` if it did not exist. The source must exist.
    fn put_rate(&self, rate: &Rate) -> Result<bool, RateError>;

    fn remove_rate(&self, rate: &Rate) -> Result<bool, RateError>;

    /// All rates of a source, newest date first, then by currency.
    fn rates_for_source(&self, source: &str) -> Result<Vec<Rate>, RateError>;

    /// Flushes pending writes to durable storage.
    fn persist(&self) -> Result<(), RateError>;
}
