mod app;
mod config;
mod logging;

use std::path::PathBuf;
use std::time::Instant;

use clap::{ArgAction, Args, Parser, Subcommand};
use datagen_core::StoreError;
use datagen_generate::{GeneratorError, OutputFormat, PipelineError};
use datagen_store::{DEFAULT_SEED_WORKERS, SeedError};
use thiserror::Error;
use uuid::Uuid;

use app::{App, GenerateRequest};
use config::{ConfigError, load_or_create_config, reset_config};
use logging::{LoggingError, init_logging};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("generator error: {0}")]
    Generator(#[from] GeneratorError),
    #[error("generation failed: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("seeding failed: {0}")]
    Seed(#[from] SeedError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "datagen", version, about = "Random data generator")]
struct Cli {
    /// Configuration file, created with defaults when missing.
    #[arg(long, global = true, default_value = "datagen.toml")]
    config: PathBuf,
    /// SQLite database, overrides `[store] path`.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    /// Append JSON logs to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate values for one or more resources.
    Generate(GenerateArgs),
    /// List configured resources.
    Resources,
    /// Load the configured seeds into the store.
    Seed(SeedArgs),
    /// Print or reset the configuration.
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Resource name(s), comma separated or repeated.
    #[arg(short, long = "resource", value_delimiter = ',', required = true)]
    resources: Vec<String>,
    /// Values generated per resource.
    #[arg(short = 'n', long, default_value_t = 100)]
    count: usize,
    /// Output format: text or json.
    #[arg(short, long, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Never emit the same value twice for a resource.
    #[arg(long, default_value_t = false)]
    unique: bool,
    /// Draws attempted per value when uniqueness is enforced.
    #[arg(long)]
    max_unique_retries: Option<u32>,
}

#[derive(Args, Debug)]
struct SeedArgs {
    /// Concurrent inserts per seed.
    #[arg(short, long, default_value_t = DEFAULT_SEED_WORKERS)]
    workers: usize,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Overwrite the configuration with the defaults.
    #[arg(long, default_value_t = false)]
    reset: bool,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let run_id = Uuid::new_v4().to_string();
    tracing::info!(event = "run_started", run_id = %run_id, config = %cli.config.display());
    let timer = Instant::now();

    let result = run(cli).await;
    let duration_ms = timer.elapsed().as_millis();
    match &result {
        Ok(()) => {
            tracing::info!(event = "run_finished", status = "success", duration_ms = duration_ms)
        }
        Err(err) => tracing::error!(
            event = "run_finished",
            status = "failure",
            duration_ms = duration_ms,
            error = %err
        ),
    }
    result
}

async fn run(cli: Cli) -> Result<(), CliError> {
    if let Command::Config(args) = &cli.command {
        let config = if args.reset {
            reset_config(&cli.config)?
        } else {
            load_or_create_config(&cli.config)?
        };
        let encoded = toml::to_string_pretty(&config).map_err(ConfigError::from)?;
        print!("{encoded}");
        return Ok(());
    }

    let config = load_or_create_config(&cli.config)?;
    let seed_if_new = !matches!(cli.command, Command::Seed(_));
    let app = App::open(config, cli.db, seed_if_new).await?;
    let outcome = match cli.command {
        Command::Generate(args) => {
            let request = GenerateRequest {
                resources: args.resources,
                count: args.count,
                format: args.format,
                unique: args.unique,
                max_unique_retries: args.max_unique_retries,
            };
            app.generate(&request).await.map(|report| {
                tracing::info!(
                    event = "generation_reported",
                    produced = report.produced,
                    consumed = report.consumed
                );
            })
        }
        Command::Resources => app.list_resources().await,
        Command::Seed(args) => app.seed(args.workers).await.map(|_| ()),
        Command::Config(_) => Ok(()),
    };
    app.shutdown().await;
    outcome
}
