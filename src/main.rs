use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use rates::cli::ui;
use rates::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for rates::AppCommand {
    fn from(cmd: Commands) -> rates::AppCommand {
        match cmd {
            Commands::Update { args } => rates::AppCommand::Update(args),
            Commands::Rate {
                source,
                currency,
                date,
            } => rates::AppCommand::Rate {
                source,
                currency,
                date,
            },
            Commands::BaseCurrency { source } => rates::AppCommand::BaseCurrency { source },
            Commands::List { source } => rates::AppCommand::List { source },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch and store rates for a range of days
    Update {
        /// [DATE_FROM|yesterday] [DATE_TO] [BACKEND]
        #[arg(num_args = 0..=3, value_name = "ARGS")]
        args: Vec<String>,
    },
    /// Look up a stored rate
    Rate {
        /// Source name, e.g. openexchange.org
        source: String,
        /// Currency code, e.g. EUR
        currency: String,
        /// Date of the rate; defaults to today
        date: Option<String>,
    },
    /// Look up the base currency of a source
    BaseCurrency { source: String },
    /// List all stored rates of a source
    List { source: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => rates::cli::setup::setup(),
        Some(cmd) => rates::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
        eprintln!("{}", ui::error_line(e));
        std::process::exit(1);
    }
    Ok(())
}
