use crate::core::error::RateError;
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

const USER_AGENT: &str = concat!("rates/", env!("CARGO_PKG_VERSION"));

async fn fetch_text(url: &Url) -> Result<String, reqwest::Error> {
    let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
    client
        .get(url.clone())
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
}

/// Fetches `url` and decodes the body as `T`.
///
/// Any transport, status or decoding failure becomes a
/// [`RateError::Provider`] carrying the underlying message.
pub(crate) async fn fetch_json<T: DeserializeOwned>(url: &Url) -> Result<T, RateError> {
    debug!("Connecting to url {}", url);

    let text = fetch_text(url).await.map_err(|e| {
        error!(error = %e, "Error retrieving data from {}", url);
        RateError::Provider(e.to_string())
    })?;

    serde_json::from_str(&text).map_err(|e| {
        error!(error = %e, response = %text, "Error parsing data from {}", url);
        RateError::Provider(e.to_string())
    })
}

/// Builds `base` with `params` appended as a query string.
pub(crate) fn build_url(base: &str, params: &[(&str, &str)]) -> Result<Url, RateError> {
    Url::parse_with_params(base, params)
        .map_err(|e| RateError::Config(format!("Invalid provider url '{base}': {e}")))
}
