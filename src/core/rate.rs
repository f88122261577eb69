//! Rate records and the provider abstraction

use crate::core::error::RateError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::Display;

/// Number of fractional digits kept for a stored rate value.
pub const RATE_DECIMAL_PLACES: u32 = 6;

/// Current date in UTC, used wherever a date is optional.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// A named rate provider and the currency its rates are quoted against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSource {
    pub name: String,
    pub base_currency: String,
    pub last_update: DateTime<Utc>,
}

impl RateSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            base_currency: String::new(),
            last_update: Utc::now(),
        }
    }
}

impl Display for RateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} rates in {} update {}",
            self.name, self.base_currency, self.last_update
        )
    }
}

/// Value of one currency against a source's base currency on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    pub source: String,
    pub currency: String,
    pub value: Decimal,
    pub date: NaiveDate,
}

impl Rate {
    /// Creates a zero-valued rate; `date` defaults to today.
    pub fn new(source: &str, currency: &str, date: Option<NaiveDate>) -> Self {
        Self {
            source: source.to_string(),
            currency: currency.to_string(),
            value: Decimal::ZERO,
            date: date.unwrap_or_else(today),
        }
    }

    /// Newest date first, then currency code.
    pub fn default_ordering(&self, other: &Self) -> Ordering {
        other
            .date
            .cmp(&self.date)
            .then_with(|| self.currency.cmp(&other.currency))
    }
}

impl Display for Rate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {:.6}", self.currency, self.value)
    }
}

/// A provider of exchange rates for a single base currency.
#[async_trait]
pub trait RateBackend: Send + Sync {
    /// Name identifying the provider; stored as the `RateSource` name.
    fn source_name(&self) -> Result<&str, RateError>;

    /// Currency all returned rates are relative to.
    fn base_currency(&self) -> Result<&str, RateError>;

    /// Fetches a currency code to value mapping for `date`, or for today
    /// when `date` is `None`.
    async fn get_rates(&self, date: Option<NaiveDate>) -> Result<HashMap<String, Decimal>, RateError>;
}

/// Returns `value` unless it is empty, in which case a configuration error
/// naming `field` is raised.
pub(crate) fn require<'a>(value: &'a str, field: &str) -> Result<&'a str, RateError> {
    if value.trim().is_empty() {
        return Err(RateError::Config(format!("'{field}' can't be empty")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_rate_display_uses_six_decimals() {
        let mut rate = Rate::new("test", "EUR", None);
        rate.value = Decimal::from_str("0.92").unwrap();
        assert_eq!(rate.to_string(), "EUR at 0.920000");
    }

    #[test]
    fn test_rate_date_defaults_to_today() {
        let rate = Rate::new("test", "EUR", None);
        assert_eq!(rate.date, today());
    }

    #[test]
    fn test_default_ordering() {
        let d1 = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
        let mut rates = vec![
            Rate::new("s", "GBP", Some(d1)),
            Rate::new("s", "EUR", Some(d1)),
            Rate::new("s", "GBP", Some(d2)),
            Rate::new("s", "EUR", Some(d2)),
        ];
        rates.sort_by(Rate::default_ordering);

        let ordered: Vec<(NaiveDate, &str)> =
            rates.iter().map(|r| (r.date, r.currency.as_str())).collect();
        assert_eq!(
            ordered,
            vec![(d2, "EUR"), (d2, "GBP"), (d1, "EUR"), (d1, "GBP")]
        );
    }

    #[test]
    fn test_require_rejects_blank_values() {
        assert_eq!(require("USD", "base_currency").unwrap(), "USD");
        let err = require("  ", "base_currency").unwrap_err();
        assert!(matches!(err, RateError::Config(_)));
        assert!(err.to_string().contains("base_currency"));
    }
}
