use super::http::{build_url, fetch_json};
use super::to_decimal_rates;
use crate::core::config::CurrencyLayerConfig;
use crate::core::error::RateError;
use crate::core::rate::{RateBackend, require, today};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Url;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

pub const SOURCE_NAME: &str = "currencylayer.com";

const LIVE_ENDPOINT: &str = "live";
const HISTORICAL_ENDPOINT: &str = "historical";

#[derive(Debug, Deserialize)]
struct CurrencyLayerResponse {
    /// Keyed by `<BASE><CURRENCY>`, e.g. `USDEUR`.
    quotes: HashMap<String, f64>,
}

/// Rates from currencylayer.com, with live and historical endpoints.
pub struct CurrencyLayerBackend {
    base_url: String,
    access_key: String,
    base_currency: String,
}

impl CurrencyLayerBackend {
    pub fn new(config: &CurrencyLayerConfig) -> Result<Self, RateError> {
        if config.url.trim().is_empty() {
            return Err(RateError::Config(
                "'url' should not be empty when using the currencylayer backend".to_string(),
            ));
        }
        if config.access_key.trim().is_empty() {
            return Err(RateError::Config(
                "'access_key' should not be empty when using the currencylayer backend"
                    .to_string(),
            ));
        }

        Ok(Self {
            base_url: config.url.clone(),
            access_key: config.access_key.clone(),
            base_currency: config.base_currency.clone(),
        })
    }

    /// Live endpoint for today (or no date), historical endpoint otherwise.
    pub fn request_url(&self, date: Option<NaiveDate>) -> Result<Url, RateError> {
        match date {
            Some(date) if date != today() => {
                let date = date.format("%Y-%m-%d").to_string();
                build_url(
                    &format!("{}{}", self.base_url, HISTORICAL_ENDPOINT),
                    &[("access_key", self.access_key.as_str()), ("date", date.as_str())],
                )
            }
            _ => build_url(
                &format!("{}{}", self.base_url, LIVE_ENDPOINT),
                &[("access_key", self.access_key.as_str())],
            ),
        }
    }
}

/// Strips the three-letter base prefix from each quote key.
fn strip_base(quotes: HashMap<String, f64>) -> Result<HashMap<String, f64>, RateError> {
    quotes
        .into_iter()
        .map(|(pair, value)| match pair.get(3..) {
            Some(currency) if !currency.is_empty() => Ok((currency.to_string(), value)),
            _ => Err(RateError::Provider(format!("Unexpected quote key '{pair}'"))),
        })
        .collect()
}

#[async_trait]
impl RateBackend for CurrencyLayerBackend {
    fn source_name(&self) -> Result<&str, RateError> {
        require(SOURCE_NAME, "source_name")
    }

    fn base_currency(&self) -> Result<&str, RateError> {
        require(&self.base_currency, "base_currency")
    }

    async fn get_rates(
        &self,
        date: Option<NaiveDate>,
    ) -> Result<HashMap<String, Decimal>, RateError> {
        let url = self.request_url(date)?;
        let response: CurrencyLayerResponse = fetch_json(&url).await?;
        to_decimal_rates(strip_base(response.quotes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::str::FromStr;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MOCK_JSON: &str = r#"{
        "success": true,
        "source": "USD",
        "quotes": {
            "USDEUR": 0.92,
            "USDGBP": 0.79
        }
    }"#;

    fn config(url: &str) -> CurrencyLayerConfig {
        CurrencyLayerConfig {
            url: url.to_string(),
            access_key: "secret".to_string(),
            base_currency: "USD".to_string(),
        }
    }

    async fn create_mock_server(endpoint: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/api/{endpoint}")))
            .and(query_param("access_key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string(MOCK_JSON))
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn backend_for(mock_server: &MockServer) -> CurrencyLayerBackend {
        CurrencyLayerBackend::new(&config(&format!("{}/api/", mock_server.uri()))).unwrap()
    }

    fn query_pairs(url: &Url) -> HashMap<String, String> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_missing_settings_are_config_errors() {
        assert!(matches!(
            CurrencyLayerBackend::new(&config("")),
            Err(RateError::Config(_))
        ));

        let mut cfg = config("http://example.com/api/");
        cfg.access_key = String::new();
        assert!(matches!(
            CurrencyLayerBackend::new(&cfg),
            Err(RateError::Config(_))
        ));

        let mut cfg = config("http://example.com/api/");
        cfg.base_currency = String::new();
        let backend = CurrencyLayerBackend::new(&cfg).unwrap();
        assert!(matches!(backend.base_currency(), Err(RateError::Config(_))));
        assert_eq!(backend.source_name().unwrap(), SOURCE_NAME);
    }

    #[test]
    fn test_request_url_selection() {
        let backend = CurrencyLayerBackend::new(&config("http://example.com/api/")).unwrap();

        let live = backend.request_url(None).unwrap();
        assert_eq!(live.path(), "/api/live");
        assert!(!query_pairs(&live).contains_key("date"));

        let today_url = backend.request_url(Some(today())).unwrap();
        assert_eq!(today_url, live);

        let historical = backend
            .request_url(NaiveDate::from_ymd_opt(2020, 1, 2))
            .unwrap();
        assert_eq!(historical.path(), "/api/historical");
        let params = query_pairs(&historical);
        assert_eq!(params["date"], "2020-01-02");
        assert_eq!(params["access_key"], "secret");
    }

    #[test]
    fn test_strip_base() {
        let quotes = HashMap::from([("USDEUR".to_string(), 0.92), ("USDGBP".to_string(), 0.79)]);
        let rates = strip_base(quotes).unwrap();
        assert_eq!(rates.len(), 2);
        assert_eq!(rates["EUR"], 0.92);
        assert_eq!(rates["GBP"], 0.79);

        let bad = HashMap::from([("USD".to_string(), 1.0)]);
        assert!(matches!(strip_base(bad), Err(RateError::Provider(_))));
    }

    #[tokio::test]
    async fn test_get_rates_live() {
        let mock_server = create_mock_server(LIVE_ENDPOINT).await;
        let backend = backend_for(&mock_server);

        let rates = backend.get_rates(None).await.unwrap();
        assert_eq!(rates.len(), 2);
        assert_eq!(rates["EUR"], Decimal::from_str("0.92").unwrap());
        assert_eq!(rates["GBP"], Decimal::from_str("0.79").unwrap());

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(!query_pairs(&requests[0].url).contains_key("date"));
    }

    #[tokio::test]
    async fn test_get_rates_historical() {
        let mock_server = create_mock_server(HISTORICAL_ENDPOINT).await;
        let backend = backend_for(&mock_server);
        let date = today() - Duration::days(3);

        let rates = backend.get_rates(Some(date)).await.unwrap();
        assert_eq!(rates["EUR"], Decimal::from_str("0.92").unwrap());

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url.path(), "/api/historical");
        assert_eq!(
            query_pairs(&requests[0].url)["date"],
            date.format("%Y-%m-%d").to_string()
        );
    }

    #[tokio::test]
    async fn test_error_payload_is_provider_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/live"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"success": false, "error": {"code": 101, "info": "invalid key"}}"#,
            ))
            .mount(&mock_server)
            .await;
        let backend = backend_for(&mock_server);

        let err = backend.get_rates(None).await.unwrap_err();
        assert!(matches!(err, RateError::Provider(_)));
        assert!(err.to_string().contains("quotes"));
    }
}
