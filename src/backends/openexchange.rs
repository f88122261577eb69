use super::http::{build_url, fetch_json};
use super::to_decimal_rates;
use crate::core::config::OpenExchangeConfig;
use crate::core::error::RateError;
use crate::core::rate::{RateBackend, require};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Url;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

pub const SOURCE_NAME: &str = "openexchange.org";

#[derive(Debug, Deserialize)]
struct OpenExchangeResponse {
    rates: HashMap<String, f64>,
}

/// Rates from openexchangerates.org.
///
/// The endpoint only serves the latest rates, so the requested date is
/// ignored.
pub struct OpenExchangeBackend {
    base_currency: String,
    url: Url,
}

impl OpenExchangeBackend {
    pub fn new(config: &OpenExchangeConfig) -> Result<Self, RateError> {
        if config.url.trim().is_empty() {
            return Err(RateError::Config(
                "'url' should not be empty when using the openexchange backend".to_string(),
            ));
        }
        if config.app_id.trim().is_empty() {
            return Err(RateError::Config(
                "'app_id' should not be empty when using the openexchange backend".to_string(),
            ));
        }

        let mut params = vec![("app_id", config.app_id.as_str())];
        if !config.base_currency.is_empty() {
            params.push(("base", config.base_currency.as_str()));
        }
        let url = build_url(&config.url, &params)?;

        Ok(Self {
            base_currency: config.base_currency.clone(),
            url,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl RateBackend for OpenExchangeBackend {
    fn source_name(&self) -> Result<&str, RateError> {
        require(SOURCE_NAME, "source_name")
    }

    fn base_currency(&self) -> Result<&str, RateError> {
        require(&self.base_currency, "base_currency")
    }

    async fn get_rates(
        &self,
        _date: Option<NaiveDate>,
    ) -> Result<HashMap<String, Decimal>, RateError> {
        let response: OpenExchangeResponse = fetch_json(&self.url).await?;
        to_decimal_rates(response.rates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MOCK_JSON: &str = r#"{
        "disclaimer": "Usage subject to terms",
        "timestamp": 1449877801,
        "base": "USD",
        "rates": {
            "EUR": 0.92,
            "GBP": 0.79,
            "JPY": 121
        }
    }"#;

    fn config(url: &str) -> OpenExchangeConfig {
        OpenExchangeConfig {
            url: url.to_string(),
            app_id: "abc123".to_string(),
            base_currency: "USD".to_string(),
        }
    }

    async fn create_mock_server(mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/latest.json"))
            .and(query_param("app_id", "abc123"))
            .and(query_param("base", "USD"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;
        mock_server
    }

    #[test]
    fn test_url_built_once_with_credentials() {
        let backend = OpenExchangeBackend::new(&config("http://example.com/api/latest.json"))
            .unwrap();
        assert_eq!(
            backend.url().as_str(),
            "http://example.com/api/latest.json?app_id=abc123&base=USD"
        );
    }

    #[test]
    fn test_missing_url_is_config_error() {
        let result = OpenExchangeBackend::new(&config(""));
        assert!(matches!(result, Err(RateError::Config(_))));
    }

    #[test]
    fn test_missing_app_id_is_config_error() {
        let mut cfg = config("http://example.com/api/latest.json");
        cfg.app_id = String::new();
        let result = OpenExchangeBackend::new(&cfg);
        let err = result.err().unwrap();
        assert!(matches!(err, RateError::Config(_)));
        assert!(err.to_string().contains("app_id"));
    }

    #[test]
    fn test_empty_base_currency_is_config_error() {
        let mut cfg = config("http://example.com/api/latest.json");
        cfg.base_currency = String::new();
        let backend = OpenExchangeBackend::new(&cfg).unwrap();

        assert!(matches!(backend.base_currency(), Err(RateError::Config(_))));
        assert_eq!(backend.source_name().unwrap(), SOURCE_NAME);
    }

    #[tokio::test]
    async fn test_get_rates() {
        let mock_server = create_mock_server(MOCK_JSON).await;
        let backend =
            OpenExchangeBackend::new(&config(&format!("{}/api/latest.json", mock_server.uri())))
                .unwrap();

        let rates = backend.get_rates(None).await.unwrap();
        assert_eq!(rates.len(), 3);
        assert_eq!(rates["EUR"], Decimal::from_str("0.92").unwrap());
        assert_eq!(rates["GBP"], Decimal::from_str("0.79").unwrap());
        assert_eq!(rates["JPY"], Decimal::from(121));
    }

    #[tokio::test]
    async fn test_get_rates_ignores_date() {
        let mock_server = create_mock_server(MOCK_JSON).await;
        let backend =
            OpenExchangeBackend::new(&config(&format!("{}/api/latest.json", mock_server.uri())))
                .unwrap();

        let first = backend
            .get_rates(NaiveDate::from_ymd_opt(2020, 1, 1))
            .await
            .unwrap();
        let second = backend
            .get_rates(NaiveDate::from_ymd_opt(2015, 6, 30))
            .await
            .unwrap();
        assert_eq!(first, second);

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url, requests[1].url);
    }

    #[tokio::test]
    async fn test_missing_rates_field_is_provider_error() {
        let mock_server = create_mock_server(r#"{"error": true, "status": 401}"#).await;
        let backend =
            OpenExchangeBackend::new(&config(&format!("{}/api/latest.json", mock_server.uri())))
                .unwrap();

        let result = backend.get_rates(None).await;
        assert!(matches!(result, Err(RateError::Provider(_))));
    }

    #[tokio::test]
    async fn test_server_error_is_provider_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;
        let backend =
            OpenExchangeBackend::new(&config(&format!("{}/api/latest.json", mock_server.uri())))
                .unwrap();

        let err = backend.get_rates(None).await.unwrap_err();
        assert!(matches!(err, RateError::Provider(_)));
        assert!(err.to_string().contains("503"));
    }
}
