//! Main runner for a Europe PMC harvest

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use harvest_archive::Paper;
use harvest_core::fmt_num;
use indicatif::ProgressBar;

use crate::api::{EuropePmcClient, SearchQuery};
use crate::config::Config;
use crate::paginate::{PageSource, PaginationDriver, StopReason};
use crate::schema::to_papers;

/// Harvest execution summary
#[derive(Debug)]
pub struct Summary {
    pub query: SearchQuery,
    pub pages: usize,
    pub records: usize,
    pub stop: StopReason,
    pub elapsed: Duration,
}

/// Papers from one harvest, in fetch order
#[derive(Debug)]
pub struct Harvested {
    pub papers: Vec<Paper>,
    pub summary: Summary,
}

/// Harvest the publication window ending `today` from the live API.
pub fn run(config: &Config, today: NaiveDate, pb: &ProgressBar) -> Result<Harvested> {
    let query = SearchQuery::lookback(today, config.lookback_days, &config.filter);
    log::info!("Searching Europe PMC: {}", query.to_query());
    let mut client = EuropePmcClient::new(config, query.clone());
    harvest(&mut client, config, query, &today.to_string(), pb)
}

/// Drive `source` to exhaustion and convert the result to archive papers.
///
/// `date_added` is stamped on every paper.
pub fn harvest(
    source: &mut impl PageSource,
    config: &Config,
    query: SearchQuery,
    date_added: &str,
    pb: &ProgressBar,
) -> Result<Harvested> {
    let driver = PaginationDriver {
        delay: config.page_delay,
        max_pages: config.max_pages,
    };
    let harvest = driver
        .run(source, pb)
        .with_context(|| format!("Harvest of {query} aborted; archive left untouched"))?;

    let papers = to_papers(&harvest.table, date_added);
    let summary = Summary {
        query,
        pages: harvest.pages,
        records: papers.len(),
        stop: harvest.stop,
        elapsed: harvest.elapsed,
    };

    log::info!("=== Europe PMC Harvest Summary ===");
    log::info!("Window: {}", summary.query);
    log::info!(
        "Records: {} from {} pages ({})",
        fmt_num(summary.records),
        summary.pages,
        summary.stop
    );
    log::info!("Time: {:.1}s", summary.elapsed.as_secs_f64());

    Ok(Harvested { papers, summary })
}
