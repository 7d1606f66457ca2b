//! Command line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// upstate - upload progress tracking shared between request contexts
#[derive(Parser)]
#[command(name = "upstate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Upload progress tracking shared between request contexts")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Publish interval in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    pub sync_interval_ms: Option<u64>,

    /// Seconds a finished transfer stays visible to pollers
    #[arg(long, global = true, value_name = "SECS")]
    pub cache_grace_secs: Option<u64>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Receive a simulated upload while pollers watch its progress
    #[command(alias = "sim")]
    Simulate(SimulateArgs),

    /// Print the effective configuration
    Config,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Transfer id to use (generated when omitted)
    #[arg(long)]
    pub id: Option<String>,

    /// Size of the simulated request body in bytes
    #[arg(long, default_value_t = 1_000_000)]
    pub total_bytes: u64,

    /// Bytes received per read
    #[arg(long, default_value_t = 64 * 1024)]
    pub chunk_bytes: u64,

    /// Pause between reads in milliseconds
    #[arg(long, default_value_t = 50)]
    pub chunk_delay_ms: u64,

    /// Number of concurrent pollers
    #[arg(long, default_value_t = 1)]
    pub pollers: usize,

    /// Milliseconds between polls
    #[arg(long, default_value_t = 250)]
    pub poll_interval_ms: u64,

    /// Have the first poller cancel the transfer after this many milliseconds
    #[arg(long, value_name = "MS")]
    pub cancel_after_ms: Option<u64>,

    /// Reject the upload once this many bytes have arrived
    #[arg(long, value_name = "BYTES")]
    pub reject_above: Option<u64>,

    /// Run without a client session; progress is published process-wide
    #[arg(long)]
    pub no_session: bool,

    /// Name reported for the uploaded file
    #[arg(long, default_value = "upload.bin")]
    pub file_name: String,
}
