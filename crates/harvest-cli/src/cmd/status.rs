//! Status subcommand - show the latest snapshot, new papers highlighted

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{
    Attribute, Cell, Color, ContentArrangement, Table, modifiers::UTF8_ROUND_CORNERS,
    presets::UTF8_FULL,
};

use harvest_archive::{ArchiveEntry, read_snapshot};
use harvest_core::{fmt_num, is_valid_parquet};

use crate::cmd::print_summary;
use crate::config::{Config, snapshot_path};

const TITLE_WIDTH: usize = 60;
const JOURNAL_WIDTH: usize = 30;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Archive CSV whose snapshot to show (default from config)
    #[arg(short, long)]
    pub archive: Option<PathBuf>,

    /// Number of papers to list
    #[arg(short = 'n', long, default_value_t = 20)]
    pub limit: usize,
}

pub fn run(args: StatusArgs, config: &Config) -> Result<()> {
    let snapshot = match &args.archive {
        Some(path) => snapshot_path(path, None),
        None => snapshot_path(&config.archive.path, config.archive.snapshot.as_deref()),
    };
    if !is_valid_parquet(&snapshot) {
        anyhow::bail!(
            "No readable snapshot at {} (run `harvest run` first)",
            snapshot.display()
        );
    }

    let entries = read_snapshot(&snapshot)
        .with_context(|| format!("Failed to read snapshot {}", snapshot.display()))?;
    let new_count = entries.iter().filter(|e| e.new).count();

    print_summary(
        "Snapshot",
        &[
            ("File", snapshot.display().to_string()),
            ("Papers", fmt_num(entries.len())),
            ("New in last run", fmt_num(new_count)),
        ],
    );
    print_papers(&entries, args.limit);
    Ok(())
}

/// Print up to `limit` papers on stderr; new ones in bold green
pub fn print_papers<'a>(entries: impl IntoIterator<Item = &'a ArchiveEntry>, limit: usize) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            ["", "DOI", "Title", "Journal", "Published", "Added"]
                .into_iter()
                .map(|h| Cell::new(h).fg(Color::Cyan)),
        );

    let mut shown = 0;
    let mut hidden = 0;
    for entry in entries {
        if shown == limit {
            hidden += 1;
            continue;
        }
        let p = &entry.paper;
        let cells = [
            (if entry.new { "new" } else { "" }).to_string(),
            p.doi.clone(),
            truncate(&p.title, TITLE_WIDTH),
            truncate(&p.journal_name, JOURNAL_WIDTH),
            p.print_publication_date.clone(),
            p.date_added.clone(),
        ];
        table.add_row(cells.into_iter().map(|text| {
            let cell = Cell::new(text);
            if entry.new {
                cell.fg(Color::Green).add_attribute(Attribute::Bold)
            } else {
                cell
            }
        }));
        shown += 1;
    }

    eprintln!("\n{table}");
    if hidden > 0 {
        eprintln!("... and {} more", fmt_num(hidden));
    }
}

/// Cut `s` to at most `width` characters, marking the cut with `…`
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate("Heart", 10), "Heart");
        assert_eq!(truncate("", 10), "");
    }

    #[test]
    fn long_text_is_cut_on_char_boundary() {
        let cut = truncate("Myocardial infarction in älteren Patienten", 12);
        assert_eq!(cut.chars().count(), 12);
        assert!(cut.ends_with('…'));
        assert_eq!(truncate("Ärzteblatt", 3), "Är…");
    }
}
