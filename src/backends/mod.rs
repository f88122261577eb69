//! Rate providers and the registry that resolves them by identifier.

pub mod currencylayer;
mod http;
pub mod openexchange;

use crate::core::config::AppConfig;
use crate::core::error::RateError;
use crate::core::rate::RateBackend;
use currencylayer::CurrencyLayerBackend;
use openexchange::OpenExchangeBackend;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::collections::{BTreeMap, HashMap};

pub const OPENEXCHANGE: &str = "openexchange";
pub const CURRENCYLAYER: &str = "currencylayer";

/// Builds a backend from the application configuration.
pub type BackendFactory =
    Box<dyn Fn(&AppConfig) -> Result<Box<dyn RateBackend>, RateError> + Send + Sync>;

/// Maps backend identifiers to factories.
pub struct BackendRegistry {
    factories: BTreeMap<String, BackendFactory>,
}

impl BackendRegistry {
    /// An empty registry; see [`BackendRegistry::default`] for the built-in
    /// providers.
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&AppConfig) -> Result<Box<dyn RateBackend>, RateError> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    pub fn resolve(&self, name: &str) -> Option<&BackendFactory> {
        self.factories.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(OPENEXCHANGE, |config| {
            Ok(Box::new(OpenExchangeBackend::new(
                &config.providers.openexchange,
            )?))
        });
        registry.register(CURRENCYLAYER, |config| {
            Ok(Box::new(CurrencyLayerBackend::new(
                &config.providers.currencylayer,
            )?))
        });
        registry
    }
}

/// Converts provider floats into decimals.
pub(crate) fn to_decimal_rates(
    rates: HashMap<String, f64>,
) -> Result<HashMap<String, Decimal>, RateError> {
    rates
        .into_iter()
        .map(|(currency, value)| {
            Decimal::from_f64(value)
                .map(|value| (currency.clone(), value))
                .ok_or_else(|| {
                    RateError::Provider(format!("Invalid rate {value} for {currency}"))
                })
        })
        .collect()
}
