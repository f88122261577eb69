use super::ui;
use crate::backends::BackendRegistry;
use crate::core::config::AppConfig;
use crate::core::error::CommandError;
use crate::store::RateStore;
use crate::updater::update_rates;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use tracing::debug;

/// Argument that updates exactly the previous day, for daily cron runs.
pub const YESTERDAY: &str = "yesterday";

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Parses the date spellings accepted on the command line.
///
/// Relative words are not dates; only a lone `yesterday` argument to
/// `update` is special.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if input.len() == 8 && input.bytes().all(|b| b.is_ascii_digit()) {
        let year = input[..4].parse().ok()?;
        let month = input[4..6].parse().ok()?;
        let day = input[6..].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(input)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Resolved arguments of the `update` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateArgs {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub backend: String,
}

impl UpdateArgs {
    /// Interprets `[date_from|"yesterday"] [date_to] [backend]`.
    ///
    /// Both bounds default to `today`; a lone `"yesterday"` sets both to the
    /// previous day.
    pub fn parse(
        args: &[String],
        default_backend: &str,
        today: NaiveDate,
    ) -> Result<Self, CommandError> {
        let mut parsed = Self {
            date_from: today,
            date_to: today,
            backend: default_backend.to_string(),
        };

        if let [only] = args {
            if only == YESTERDAY {
                let yesterday = today - Duration::days(1);
                parsed.date_from = yesterday;
                parsed.date_to = yesterday;
                return Ok(parsed);
            }
        }

        if let Some(from) = args.first() {
            parsed.date_from =
                parse_date(from).ok_or_else(|| CommandError::InvalidDate(from.clone()))?;
        }
        if let Some(to) = args.get(1) {
            parsed.date_to =
                parse_date(to).ok_or_else(|| CommandError::InvalidDate(to.clone()))?;
        }
        if let Some(backend) = args.get(2) {
            parsed.backend = backend.clone();
        }
        Ok(parsed)
    }

    /// Days from `date_from` to `date_to`, both inclusive.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let (from, to) = (self.date_from, self.date_to);
        from.iter_days().take_while(move |date| *date <= to)
    }
}

/// Runs `args.backend` once per day in the range and returns the
/// confirmation line.
pub async fn run(
    args: &UpdateArgs,
    registry: &BackendRegistry,
    config: &AppConfig,
    store: &RateStore,
    show_progress: bool,
) -> Result<String, CommandError> {
    let factory = registry
        .resolve(&args.backend)
        .ok_or_else(|| CommandError::UnknownBackend(args.backend.clone()))?;
    let backend = factory(config).map_err(CommandError::Update)?;
    debug!(
        backend = %args.backend,
        from = %args.date_from,
        to = %args.date_to,
        "Updating rates"
    );

    let days = args.dates().count() as u64;
    let pb = if show_progress {
        ui::new_progress_bar(days)
    } else {
        indicatif::ProgressBar::hidden()
    };
    for date in args.dates() {
        pb.set_message(date.to_string());
        update_rates(backend.as_ref(), store, Some(date))
            .await
            .map_err(CommandError::Update)?;
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(format!(
        "Successfully updated rates for \"{}\"",
        args.backend
    ))
}
