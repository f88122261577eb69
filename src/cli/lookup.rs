use super::ui;
use crate::core::error::RateError;
use crate::store::RateStore;
use chrono::NaiveDate;
use comfy_table::Cell;

/// Formats the cached rate of `currency` from `source` on `date`.
pub async fn rate(
    store: &RateStore,
    source: &str,
    currency: &str,
    date: Option<NaiveDate>,
) -> Result<String, RateError> {
    let base_currency = store.base_currency(source).await?;
    let value = store.rate_value(source, currency, date).await?;
    Ok(format!("1 {base_currency} = {value:.6} {currency}"))
}

pub async fn base_currency(store: &RateStore, source: &str) -> Result<String, RateError> {
    store.base_currency(source).await
}

/// Renders every stored rate of `source` as a table, newest first.
pub fn list(store: &RateStore, source: &str) -> Result<String, RateError> {
    let source_record = store
        .find_source(source)?
        .ok_or_else(|| RateError::NotFound(format!("RateSource '{source}'")))?;
    let rates = store.rates_for_source(source)?;

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Currency"),
        ui::header_cell(&format!("Value ({})", source_record.base_currency)),
    ]);
    for rate in &rates {
        table.add_row(vec![
            Cell::new(rate.date.to_string()),
            Cell::new(&rate.currency),
            ui::rate_cell(rate.value),
        ]);
    }

    Ok(format!(
        "{}\n{}\n{table}",
        ui::style_text(&source_record.name, ui::StyleType::Title),
        ui::style_text(&source_record.to_string(), ui::StyleType::Subtle),
    ))
}
