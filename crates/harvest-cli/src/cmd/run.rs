//! Run subcommand - search, merge, write archive and snapshot

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Args;

use harvest_archive::{
    MergePolicy, backup_archive, load_archive, reconcile, save_archive_with_snapshot,
};
use harvest_core::{SharedProgress, fmt_num, remove_stale_tmp};

use crate::cmd::print_summary;
use crate::cmd::status::print_papers;
use crate::config::{Config, snapshot_path};

/// New papers listed after a dry run
const DRY_RUN_PREVIEW: usize = 20;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Harvest and merge but write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Stop after this many result pages
    #[arg(short = 'l', long)]
    pub max_pages: Option<usize>,

    /// Publication window length in days, ending today
    #[arg(long)]
    pub lookback_days: Option<u32>,

    /// Archive CSV (default from config)
    #[arg(short, long)]
    pub archive: Option<PathBuf>,

    /// What to keep when a DOI is archived and fetched again
    #[arg(long)]
    pub policy: Option<MergePolicy>,
}

pub fn run(args: RunArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let start = Instant::now();
    let now = Local::now().naive_local();
    let today = now.date();

    let (archive_path, snapshot) = match args.archive {
        Some(path) => {
            let snapshot = snapshot_path(&path, None);
            (path, snapshot)
        }
        None => (
            config.archive.path.clone(),
            snapshot_path(&config.archive.path, config.archive.snapshot.as_deref()),
        ),
    };
    let policy = match args.policy {
        Some(policy) => policy,
        None => config.archive.merge_policy()?,
    };

    let mut search = config.search.to_epmc();
    if let Some(max_pages) = args.max_pages {
        search.max_pages = Some(max_pages);
    }
    if let Some(days) = args.lookback_days {
        search.lookback_days = days;
    }

    if !args.dry_run {
        let removed = remove_stale_tmp(&[archive_path.as_path(), snapshot.as_path()])
            .context("Failed to remove stale tmp files")?;
        if removed > 0 {
            log::info!("Removed {removed} stale tmp files");
        }
    }

    // Read the archive before searching so a bad file fails fast
    let pb = progress.stage_line("archive");
    pb.set_message(format!("loading {}", archive_path.display()));
    let archive = load_archive(&archive_path).context("Failed to load archive")?;
    let archived = archive.len();
    pb.finish_and_clear();
    log::info!("Archive: {} papers", fmt_num(archived));

    let pb = progress.stage_line("search");
    let harvested = harvest_epmc::run(&search, today, &pb)?;
    pb.finish_and_clear();
    let fetched = harvested.papers.len();

    let merged = reconcile(archive, harvested.papers, policy);
    let new_count = merged.new_count();
    log::info!(
        "Merged: {} papers, {} new",
        fmt_num(merged.entries.len()),
        fmt_num(new_count)
    );

    if args.dry_run {
        log::info!("Dry run: archive not written");
    } else {
        backup_archive(&archive_path, &config.archive.backup_dir, now)
            .context("Failed to back up archive")?;
        save_archive_with_snapshot(
            &archive_path,
            &snapshot,
            &merged.entries,
            config.archive.compression_level,
        )
        .context("Failed to write archive and snapshot; previous archive kept")?;
    }

    let summary = &harvested.summary;
    print_summary(
        "Harvest",
        &[
            ("Window", summary.query.to_string()),
            ("Pages", summary.pages.to_string()),
            ("Stopped", summary.stop.to_string()),
            ("Fetched", fmt_num(fetched)),
            ("Archived before", fmt_num(archived)),
            ("New", fmt_num(new_count)),
            ("Refreshed", fmt_num(merged.refreshed)),
            ("Duplicates dropped", fmt_num(merged.duplicates)),
            ("Total", fmt_num(merged.entries.len())),
            (
                "Archive",
                if args.dry_run {
                    "not written (dry run)".to_string()
                } else {
                    archive_path.display().to_string()
                },
            ),
            ("Time", format!("{:.1}s", start.elapsed().as_secs_f64())),
        ],
    );

    if args.dry_run && new_count > 0 {
        print_papers(
            merged.entries.iter().filter(|e| e.new),
            DRY_RUN_PREVIEW,
        );
    }
    Ok(())
}
