//! Cursor-following fetch loop.
//!
//! fetch → parse → project, then decide: next cursor, stop, or abort.
//! Strictly sequential; pages are kept in fetch order.

use std::time::{Duration, Instant};

use anyhow::Context;
use harvest_core::{FetchError, fmt_num};
use indicatif::ProgressBar;

use crate::parser::{ParsedPage, parse_page};
use crate::project::project;
use crate::table::Table;

/// Cursor value requesting the first page
pub const INITIAL_CURSOR: &str = "*";

/// Scalar field used for per-page coverage logging
const FIRST_PUBLICATION_DATE: &str = "firstPublicationDate";

/// Anything that can return the raw XML page for a cursor.
pub trait PageSource {
    fn fetch(&mut self, cursor: &str) -> Result<String, FetchError>;

    /// Human readable description of what is fetched, used in error context
    fn describe(&self) -> String {
        String::from("search")
    }
}

/// Why the loop finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Page carried no continuation token
    NoCursor,
    /// Page had no records (authoritative even if a token was present)
    EmptyPage,
    /// API handed back the cursor that was just requested
    RepeatedCursor,
    /// Configured page limit reached
    PageLimit,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::NoCursor => "no further cursor",
            Self::EmptyPage => "empty page",
            Self::RepeatedCursor => "cursor did not advance",
            Self::PageLimit => "page limit reached",
        })
    }
}

/// Outcome of one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    More(String),
    Done(StopReason),
}

/// Decide what follows a parsed page.
///
/// Emptiness is checked before the cursor is trusted.
pub fn next_step(
    requested: &str,
    cursor: Option<&str>,
    records: usize,
    pages_done: usize,
    max_pages: Option<usize>,
) -> Step {
    if records == 0 {
        return Step::Done(StopReason::EmptyPage);
    }
    let Some(cursor) = cursor else {
        return Step::Done(StopReason::NoCursor);
    };
    if cursor == requested {
        return Step::Done(StopReason::RepeatedCursor);
    }
    if max_pages.is_some_and(|max| pages_done >= max) {
        return Step::Done(StopReason::PageLimit);
    }
    Step::More(cursor.to_string())
}

/// Accumulated result of a harvest
#[derive(Debug)]
pub struct Harvest {
    /// Enriched record rows of every page, in fetch order
    pub table: Table,
    pub pages: usize,
    pub stop: StopReason,
    pub elapsed: Duration,
}

/// Pagination settings
#[derive(Debug, Clone)]
pub struct PaginationDriver {
    /// Pause between successive fetches (none before the first)
    pub delay: Duration,
    /// Stop after this many pages; `Some(0)` fetches nothing
    pub max_pages: Option<usize>,
}

impl Default for PaginationDriver {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            max_pages: None,
        }
    }
}

impl PaginationDriver {
    /// Follow cursors until the source is exhausted.
    ///
    /// Any fetch or parse failure aborts the whole harvest; nothing
    /// collected so far is returned.
    pub fn run(&self, source: &mut impl PageSource, pb: &ProgressBar) -> anyhow::Result<Harvest> {
        let start = Instant::now();
        if self.max_pages == Some(0) {
            log::info!("{}: page limit is 0, nothing fetched", source.describe());
            return Ok(Harvest {
                table: Table::new(),
                pages: 0,
                stop: StopReason::PageLimit,
                elapsed: start.elapsed(),
            });
        }
        let mut pages: Vec<Table> = Vec::new();
        let mut records = 0usize;
        let mut cursor = INITIAL_CURSOR.to_string();

        let stop = loop {
            if !pages.is_empty() && !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
            let page_no = pages.len() + 1;
            pb.set_message(format!("page {page_no} ({} records)", fmt_num(records)));

            let body = source.fetch(&cursor).with_context(|| {
                format!(
                    "{}: failed to fetch page {page_no} (cursor {cursor})",
                    source.describe()
                )
            })?;
            let page = parse_page(&body).with_context(|| {
                format!(
                    "{}: failed to parse page {page_no} (cursor {cursor})",
                    source.describe()
                )
            })?;

            log_coverage(page_no, &page);
            let step = next_step(
                &cursor,
                page.cursor.as_deref(),
                page.len(),
                page_no,
                self.max_pages,
            );
            let count = page.len();
            if count > 0 {
                records += count;
                pages.push(project(page));
            }

            match step {
                Step::More(next) => cursor = next,
                Step::Done(reason) => break reason,
            }
        };

        let pages_fetched = pages.len();
        let table = Table::concat(pages);
        let elapsed = start.elapsed();
        log::info!(
            "{}: {} records from {pages_fetched} pages in {:.1}s ({stop})",
            source.describe(),
            fmt_num(table.len()),
            elapsed.as_secs_f64()
        );

        Ok(Harvest {
            table,
            pages: pages_fetched,
            stop,
            elapsed,
        })
    }
}

fn log_coverage(page_no: usize, page: &ParsedPage) {
    let dates = page
        .records
        .column(FIRST_PUBLICATION_DATE)
        .map(|c| c.flatten().collect::<Vec<_>>())
        .unwrap_or_default();
    match (dates.iter().min(), dates.iter().max()) {
        (Some(min), Some(max)) => log::info!(
            "Page {page_no}: {} records, first published {min} .. {max}",
            page.len()
        ),
        _ => log::info!("Page {page_no}: {} records", page.len()),
    }
}
