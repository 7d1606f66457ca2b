//! upstate - upload progress tracking shared between request contexts
//!
//! This CLI wires the progress, store and sync crates together and drives a
//! simulated upload so their behaviour can be watched from the outside.

mod cli;
mod display;
mod error;
mod logging;
mod simulate;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::logging::log_event_with_tracing;
use crate::simulate::SimulationReport;
use clap::Parser;
use std::future::Future;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::select;
use tracing::{error, info};
use upstate_config::Config;
use upstate_events::{EventReceiver, EventSender};
use upstate_progress::SystemClock;
use upstate_store::{spawn_cache_sweeper, CachePolicy, RecordStore, StoreOptions};
use upstate_sync::{SyncCoordinator, SyncOptions};

#[tokio::main]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting upstate v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration with proper precedence:
    // 1. Start with file config (or defaults)
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;

    // 2. Merge environment variables
    config.merge_env()?;

    // 3. Apply CLI flags (highest precedence)
    apply_cli_config(&mut config, &cli.global)?;

    let renderer = OutputRenderer::new(cli.global.json);

    match cli.command {
        Commands::Config => renderer.render_config(&config)?,
        Commands::Simulate(args) => {
            let (event_sender, event_receiver) = upstate_events::channel();
            let coordinator = build_coordinator(&config, event_sender);
            let sweeper = spawn_cache_sweeper(
                coordinator.store(),
                config.cache_grace().max(Duration::from_secs(1)),
            );

            let report = execute_with_events(
                simulate::simulate(Arc::clone(&coordinator), args, renderer),
                event_receiver,
            )
            .await;
            sweeper.abort();

            let report: SimulationReport = report?;
            renderer.render_report(&report)?;
        }
    }

    info!("Command completed successfully");
    Ok(())
}

fn build_coordinator(config: &Config, events: EventSender) -> Arc<SyncCoordinator> {
    let clock = Arc::new(SystemClock);
    let options = StoreOptions {
        key_prefix: config.store.key_prefix.clone(),
        cache: CachePolicy {
            grace: config.cache_grace(),
            sliding: config.cache.sliding,
        },
    };
    let store = Arc::new(RecordStore::new(options, clock.clone()));
    let sync = SyncOptions {
        sync_interval: config.sync_interval(),
        rate_window: config.rate_window(),
    };
    Arc::new(SyncCoordinator::new(store, clock, sync).with_events(events))
}

/// Run a command while logging the events it emits
async fn execute_with_events<T>(
    command: impl Future<Output = Result<T, CliError>>,
    mut event_receiver: EventReceiver,
) -> Result<T, CliError> {
    let mut command_future = Box::pin(command);
    let mut channel_open = true;

    loop {
        select! {
            result = &mut command_future => {
                // Drain any remaining events
                while let Ok(message) = event_receiver.try_recv() {
                    log_event_with_tracing(&message);
                }
                return result;
            }

            message = event_receiver.recv(), if channel_open => {
                match message {
                    Some(message) => log_event_with_tracing(&message),
                    None => channel_open = false,
                }
            }
        }
    }
}

/// Apply CLI configuration overrides
fn apply_cli_config(config: &mut Config, global: &GlobalArgs) -> Result<(), CliError> {
    if let Some(interval) = global.sync_interval_ms {
        config.sync.interval_ms = interval;
    }
    if let Some(grace) = global.cache_grace_secs {
        config.cache.grace_secs = grace;
    }
    config.validate()?;
    Ok(())
}

fn init_tracing(json_mode: bool, debug_enabled: bool) {
    let default_directive = if debug_enabled {
        "info,upstate=debug,upstate_sync=debug,upstate_store=debug"
    } else {
        "warn,upstate=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));

    // Logs go to stderr so stdout stays clean for poll output
    if json_mode {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    }
}
