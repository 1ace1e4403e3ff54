use crate::{
    commands::{Commands, StoreArgs},
    config::{ScanOverrides, load_settings},
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use connectors::{file::fixture, store::DocumentStore};
use engine_runtime::{
    error::ScanError,
    execution::request::ScanRequest,
    service::ChangeFeedService,
};
use model::{
    core::{identifiers::RangeId, watermark::Watermark},
    pagination::continuation::ContinuationToken,
};
use std::{collections::BTreeMap, path::Path, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod env;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "feedscan",
    version = "0.1.0",
    about = "Change feed scanner for partitioned document collections"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();

    let code = match run(cli.command, &shutdown).await {
        Ok(code) => code,
        Err(CliError::Scan(ScanError::Cancelled)) if shutdown.is_shutdown_requested() => {
            info!("Scan cancelled by shutdown request");
            ExitCode::ShutdownRequested
        }
        Err(err) => {
            error!("{err}");
            ExitCode::GeneralError
        }
    };

    std::process::exit(code.as_i32());
}

async fn run(command: Commands, shutdown: &ShutdownCoordinator) -> Result<ExitCode, CliError> {
    match command {
        Commands::Scan {
            store,
            resource_type,
            since,
            concurrency,
            strict,
            resume,
            output,
            report,
        } => {
            let settings = load_settings(&store, ScanOverrides { concurrency, strict }).await?;
            let service = ChangeFeedService::new(
                open_store(&store).await?,
                settings,
                shutdown.cancel_token(),
            );

            let mut request = ScanRequest::new(resource_type);
            if let Some(since) = since {
                request = request.since(since.parse::<Watermark>()?);
            }
            if let Some(path) = resume {
                request = request.resume_from(load_resume_tokens(&path).await?);
            }

            let result = service.scan(request).await?;

            output::write_outcome(&result.outcome, output.as_deref()).await?;
            if let Some(path) = report {
                output::write_report(&result.report, &path).await?;
            }

            Ok(ExitCode::for_outcome(&result.outcome))
        }
        Commands::Ranges { store } => {
            let settings = load_settings(&store, ScanOverrides::default()).await?;
            if settings.default_collection.is_none() {
                return Err(CliError::Config(
                    "pass --database and --collection or configure defaults".into(),
                ));
            }

            let service = ChangeFeedService::new(
                open_store(&store).await?,
                settings,
                shutdown.cancel_token(),
            );
            let ranges = service.list_ranges(None).await?;
            output::print_ranges(&ranges).await?;
            Ok(ExitCode::Success)
        }
    }
}

async fn open_store(args: &StoreArgs) -> Result<Arc<dyn DocumentStore>, CliError> {
    let store = fixture::load(&args.fixture).await?;
    Ok(Arc::new(store))
}

async fn load_resume_tokens(path: &Path) -> Result<BTreeMap<RangeId, ContinuationToken>, CliError> {
    let json = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&json)?)
}
