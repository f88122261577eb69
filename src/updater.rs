use crate::core::error::RateError;
use crate::core::rate::{Rate, RateBackend, today};
use crate::store::RateStore;
use chrono::NaiveDate;
use tracing::{debug, info};

/// Fetches the rates of `backend` for `date` (default today) and stores
/// them.
///
/// The fetch happens once, before any write. The writes are not atomic: if
/// one of them fails, the currencies stored before it stay updated.
pub async fn update_rates(
    backend: &dyn RateBackend,
    store: &RateStore,
    date: Option<NaiveDate>,
) -> Result<usize, RateError> {
    let date = date.unwrap_or_else(today);
    let source_name = backend.source_name()?;
    let base_currency = backend.base_currency()?;

    let rates = backend.get_rates(Some(date)).await?;
    debug!(source = %source_name, %date, count = rates.len(), "Fetched rates");

    let mut source = store.get_or_create_source(source_name).await?;
    source.base_currency = base_currency.to_string();
    store.save_source(&mut source).await?;

    let mut currencies: Vec<_> = rates.into_iter().collect();
    currencies.sort_by(|a, b| a.0.cmp(&b.0));

    let count = currencies.len();
    for (currency, value) in currencies {
        let mut rate = store
            .get_rate(&source.name, &currency, date)?
            .unwrap_or_else(|| Rate::new(&source.name, &currency, Some(date)));
        rate.value = value;
        store.save_rate(&mut rate).await?;
    }

    info!(source = %source.name, %date, count, "Updated rates");
    Ok(count)
}
