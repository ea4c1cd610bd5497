mod config;
mod logging;

use clap::{Args, Parser};
use config::{Config, ConfigError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracking::errors::{TrackingError, ValidationError};
use tracking::request::LookupRequest;

#[derive(Parser, Debug)]
#[command(about = "Batch shipment tracking gateway")]
enum CliCommand {
    /// Serve batch lookups on POST /api/tracking
    Serve(ServeArgs),
    /// Look up waybills once and print the records as JSON
    Lookup(LookupArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Path to the YAML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct LookupArgs {
    /// Path to the YAML config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Token forwarded to the upstream provider
    #[arg(long)]
    token: String,
    /// Waybill numbers to look up
    #[arg(required = true)]
    order_ids: Vec<String>,
}

impl CliCommand {
    fn config_path(&self) -> Option<&PathBuf> {
        match self {
            CliCommand::Serve(args) => args.config.as_ref(),
            CliCommand::Lookup(args) => args.config.as_ref(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
enum GatewayError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Tracking(#[from] TrackingError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("could not encode records: {0}")]
    Encode(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    let cli = CliCommand::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: CliCommand) -> Result<(), GatewayError> {
    let config = Config::load(cli.config_path().map(PathBuf::as_path))?;
    let _sentry = logging::init(config.sentry_dsn());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match cli {
        CliCommand::Serve(_) => {
            tracing::info!("Starting tracking gateway");
            if let Err(e) = runtime.block_on(tracking::run(config.tracking)) {
                tracing::error!("Tracking service stopped: {e}");
                return Err(e.into());
            }
        }
        CliCommand::Lookup(args) => {
            let request = LookupRequest::new(args.order_ids, args.token)?;
            let dispatcher = tracking::build_dispatcher(&config.tracking)?;
            let records = runtime.block_on(dispatcher.run(request));
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
    }

    Ok(())
}
