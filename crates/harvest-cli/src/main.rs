//! harvest - incremental Europe PMC literature harvester
//!
//! Searches Europe PMC for recently published, BHF-funded papers, merges
//! them into a CSV archive and flags the ones not seen before.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "harvest")]
#[command(about = "Incremental Europe PMC literature harvester")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./harvest.toml or ~/.config/harvest/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Search, merge into the archive and write it back
    Run(cmd::run::RunArgs),
    /// Show the archive snapshot with new papers highlighted
    Status(cmd::status::StatusArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(harvest_core::ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug; spinners show activity
    //   non-TTY: info unless --debug; logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    harvest_core::init_logging(quiet, cli.debug, multi);

    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    match cli.command {
        Command::Run(args) => cmd::run::run(args, &config, &progress),
        Command::Status(args) => cmd::status::run(args, &config),
        Command::Config => {
            cmd::print_summary(
                "Setting",
                &[
                    ("Archive", config.archive.path.display().to_string()),
                    (
                        "Snapshot",
                        config::snapshot_path(
                            &config.archive.path,
                            config.archive.snapshot.as_deref(),
                        )
                        .display()
                        .to_string(),
                    ),
                    ("Backups", config.archive.backup_dir.display().to_string()),
                    ("Merge policy", config.archive.policy.clone()),
                    (
                        "Compression level",
                        config.archive.compression_level.to_string(),
                    ),
                    ("Search URL", config.search.base_url.clone()),
                    ("Filter", config.search.filter.clone()),
                    (
                        "Look-back",
                        format!("{} days", config.search.lookback_days),
                    ),
                    ("Page size", config.search.page_size.to_string()),
                    ("Page delay", format!("{}ms", config.search.page_delay_ms)),
                    (
                        "Contact e-mail",
                        if config.search.email.is_some() {
                            "configured".to_string()
                        } else {
                            "not set".to_string()
                        },
                    ),
                ],
            );
            Ok(())
        }
    }
}
