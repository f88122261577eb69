use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_BACKEND: &str = "openexchange";
pub const DEFAULT_RATE_CACHE_TTL: u64 = 600;

/// How a rate-value cache miss is filled from storage.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RateLookup {
    /// Most recent stored rate for the currency, whatever its date.
    #[default]
    Latest,
    /// Only the rate stored for the requested date.
    Exact,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds a base-currency entry lives; unset means until invalidated.
    pub source_ttl: Option<u64>,
    /// Seconds a rate-value entry lives; unset means until invalidated.
    pub rate_ttl: Option<u64>,
    pub rate_lookup: RateLookup,
}

impl CacheConfig {
    pub fn source_ttl(&self) -> Option<Duration> {
        self.source_ttl.map(Duration::from_secs)
    }

    pub fn rate_ttl(&self) -> Option<Duration> {
        self.rate_ttl.map(Duration::from_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            source_ttl: None,
            rate_ttl: Some(DEFAULT_RATE_CACHE_TTL),
            rate_lookup: RateLookup::Latest,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct OpenExchangeConfig {
    pub url: String,
    pub app_id: String,
    pub base_currency: String,
}

impl Default for OpenExchangeConfig {
    fn default() -> Self {
        OpenExchangeConfig {
            url: "https://openexchangerates.org/api/latest.json".to_string(),
            app_id: String::new(),
            base_currency: "USD".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CurrencyLayerConfig {
    /// Endpoint prefix; `live` or `historical` is appended verbatim.
    pub url: String,
    pub access_key: String,
    pub base_currency: String,
}

impl Default for CurrencyLayerConfig {
    fn default() -> Self {
        CurrencyLayerConfig {
            url: "http://apilayer.net/api/".to_string(),
            access_key: String::new(),
            base_currency: "USD".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct ProvidersConfig {
    pub openexchange: OpenExchangeConfig,
    pub currencylayer: CurrencyLayerConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_backend")]
    pub default_backend: String,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    pub data_path: Option<String>,
}

fn default_backend() -> String {
    DEFAULT_BACKEND.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            default_backend: default_backend(),
            cache: CacheConfig::default(),
            providers: ProvidersConfig::default(),
            data_path: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "rates", "rates")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "rates", "rates")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
