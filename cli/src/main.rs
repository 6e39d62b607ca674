//! `ballot`: operator command line for a weighted ballot ledger stored in LMDB.
//!
//! Every command prints one JSON document on stdout; logs go to stderr.

mod commands;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use ballot_utils::LogFormat;
use clap::Parser;

use crate::commands::Command;
use crate::config::{CliConfig, Overrides};

#[derive(Parser)]
#[command(name = "ballot", version, about = "Weighted ballot ledger operator tool")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// flags and environment variables override them.
    #[arg(long, env = "BALLOT_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Data directory of the LMDB environment.
    #[arg(long, env = "BALLOT_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// LMDB map size in MiB.
    #[arg(long, env = "BALLOT_MAP_SIZE_MB", global = true)]
    map_size_mb: Option<usize>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "BALLOT_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "BALLOT_LOG_FORMAT", global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = CliConfig::load(cli.config.as_deref())?.with_overrides(Overrides {
        data_dir: cli.data_dir,
        map_size_mb: cli.map_size_mb,
        log_level: cli.log_level,
        log_format: cli.log_format,
    });
    ballot_utils::init_tracing(config.log_format, &config.log_level);
    tracing::debug!(data_dir = %config.data_dir.display(), "configuration resolved");

    let engine = commands::open_engine(&config)?;
    let output = commands::execute(&engine, cli.command)?;
    println!("{}", serde_json::to_string_pretty(&output.body)?);
    tracing::debug!(stats = ?engine.stats(), "done");

    Ok(if output.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
