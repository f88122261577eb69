pub mod backends;
pub mod cli;
pub mod core;
pub mod store;
pub mod updater;

use crate::backends::BackendRegistry;
use crate::cli::{lookup, ui, update};
use crate::core::config::AppConfig;
use crate::core::error::CommandError;
use crate::core::rate::today;
use crate::store::RateStore;
use anyhow::{Context, Result};
use tracing::{debug, info};

pub enum AppCommand {
    /// Positional `[date_from|"yesterday"] [date_to] [backend]`.
    Update(Vec<String>),
    Rate {
        source: String,
        currency: String,
        date: Option<String>,
    },
    BaseCurrency {
        source: String,
    },
    List {
        source: String,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Rates starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let data_path = config.default_data_path()?;
    let store = RateStore::open(&data_path, &config.cache)
        .with_context(|| format!("Failed to open rate store at {}", data_path.display()))?;

    let result = execute(command, &config, &store).await;
    store.persist().context("Failed to persist rate store")?;
    result
}

async fn execute(command: AppCommand, config: &AppConfig, store: &RateStore) -> Result<()> {
    match command {
        AppCommand::Update(args) => {
            let args = update::UpdateArgs::parse(&args, &config.default_backend, today())?;
            let registry = BackendRegistry::default();
            let message = update::run(&args, &registry, config, store, true).await?;
            println!("{}", ui::style_text(&message, ui::StyleType::Success));
        }
        AppCommand::Rate {
            source,
            currency,
            date,
        } => {
            let date = date
                .map(|d| update::parse_date(&d).ok_or(CommandError::InvalidDate(d)))
                .transpose()?;
            println!("{}", lookup::rate(store, &source, &currency, date).await?);
        }
        AppCommand::BaseCurrency { source } => {
            println!("{}", lookup::base_currency(store, &source).await?);
        }
        AppCommand::List { source } => {
            println!("{}", lookup::list(store, &source)?);
        }
    }
    Ok(())
}
