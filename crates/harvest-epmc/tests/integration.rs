//! End-to-end harvest tests over recorded search pages.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::NaiveDate;
use harvest_archive::{MergePolicy, load_archive, reconcile, save_archive};
use harvest_core::FetchError;
use harvest_epmc::{
    Config, EuropePmcClient, INITIAL_CURSOR, PageSource, SearchQuery, StopReason, harvest,
};
use indicatif::ProgressBar;
use pretty_assertions::assert_eq;

const PAGE1: &str = include_str!("fixtures/page1.xml");
const PAGE2: &str = include_str!("fixtures/page2.xml");
const PAGE3: &str = include_str!("fixtures/page3.xml");

/// Serves recorded pages and remembers the cursors asked for
struct Recorded {
    pages: VecDeque<&'static str>,
    cursors: Vec<String>,
}

impl Recorded {
    fn all() -> Self {
        Self {
            pages: VecDeque::from([PAGE1, PAGE2, PAGE3]),
            cursors: Vec::new(),
        }
    }
}

impl PageSource for Recorded {
    fn fetch(&mut self, cursor: &str) -> Result<String, FetchError> {
        self.cursors.push(cursor.to_string());
        self.pages
            .pop_front()
            .map(str::to_string)
            .ok_or_else(|| FetchError::Status {
                status: 500,
                message: "no more recorded pages".to_string(),
            })
    }
}

fn config() -> Config {
    Config {
        page_delay: Duration::ZERO,
        ..Default::default()
    }
}

fn query() -> SearchQuery {
    let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    SearchQuery::lookback(today, 1825, "")
}

#[test]
fn recorded_pages_become_papers() {
    let mut source = Recorded::all();
    let out = harvest(
        &mut source,
        &config(),
        query(),
        "2025-03-01",
        &ProgressBar::hidden(),
    )
    .unwrap();

    assert_eq!(
        source.cursors,
        vec![
            INITIAL_CURSOR,
            "AoJ4w7yKmo0DKDM4NTk1MzI2",
            "AoJ4w7yKmo0DKDM4NTAwMDAx"
        ]
    );
    assert_eq!(out.summary.stop, StopReason::EmptyPage);
    assert_eq!(out.summary.pages, 2);
    assert_eq!(out.papers.len(), 3);

    let first = &out.papers[0];
    assert_eq!(first.source, "MED");
    assert_eq!(first.pmid, "38595326");
    assert_eq!(first.title, "Cardiac fibrosis & remodelling after myocardial infarction.");
    assert_eq!(first.grants, "PG/20/1234; RE/18/5/34216");
    assert_eq!(first.journal_name, "European heart journal");
    assert_eq!(first.print_publication_date, "2024-03-21");
    assert_eq!(first.electronic_publication_date, "2024-03-10");
    assert_eq!(
        first.abstract_text,
        "Fibrosis drives adverse remodelling in the infarcted heart."
    );
    assert_eq!(first.affiliation, "University of Leeds, UK.");
    assert_eq!(first.date_added, "2025-03-01");

    let second = &out.papers[1];
    assert_eq!(second.pmid, "");
    assert_eq!(second.grants, "FS/19/12/34204");
    assert_eq!(second.journal_name, "Circulation");
    assert_eq!(second.print_publication_date, "");
    assert_eq!(second.abstract_text, "");

    let third = &out.papers[2];
    assert_eq!(third.abstract_text, "Background: BP < 140 mmHg.");
    assert_eq!(third.grants, "");
}

#[test]
fn failed_page_aborts_whole_harvest() {
    let mut source = Recorded {
        pages: VecDeque::from([PAGE1]),
        cursors: Vec::new(),
    };
    let err = harvest(
        &mut source,
        &config(),
        query(),
        "2025-03-01",
        &ProgressBar::hidden(),
    )
    .unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("2020-03-02 to 2025-03-01"), "{msg}");
    assert!(msg.contains("page 2"), "{msg}");
    assert!(msg.contains("HTTP 500"), "{msg}");
}

#[test]
fn harvest_then_merge_into_archive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("papers.csv");

    // First run: everything is new
    let first = harvest(
        &mut Recorded::all(),
        &config(),
        query(),
        "2025-03-01",
        &ProgressBar::hidden(),
    )
    .unwrap();
    let merged = reconcile(
        load_archive(&path).unwrap(),
        first.papers,
        MergePolicy::default(),
    );
    assert_eq!(merged.new_count(), 3);
    // Whitespace around the DOI and title is gone after merging
    assert!(
        merged
            .entries
            .iter()
            .any(|e| e.paper.doi == "10.1093/eurheartj/ehae001")
    );
    assert!(
        merged
            .entries
            .iter()
            .any(|e| e.paper.title == "Blood pressure trajectories in mid-life.")
    );
    save_archive(&path, &merged.entries).unwrap();

    // Second run over the same pages: nothing new, dates kept
    let second = harvest(
        &mut Recorded::all(),
        &config(),
        query(),
        "2025-03-08",
        &ProgressBar::hidden(),
    )
    .unwrap();
    let merged = reconcile(
        load_archive(&path).unwrap(),
        second.papers,
        MergePolicy::default(),
    );
    assert_eq!(merged.entries.len(), 3);
    assert_eq!(merged.new_count(), 0);
    assert!(
        merged
            .entries
            .iter()
            .all(|e| e.paper.date_added == "2025-03-01")
    );
}

#[test]
#[ignore = "hits the live Europe PMC API"]
fn live_first_page() {
    let config = Config {
        max_pages: Some(1),
        page_size: 5,
        ..Default::default()
    };
    let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
    let query = SearchQuery::lookback(today, 30, &config.filter);
    let mut client = EuropePmcClient::new(&config, query.clone());
    let out = harvest(
        &mut client,
        &config,
        query,
        "2024-06-30",
        &ProgressBar::hidden(),
    )
    .unwrap();
    assert!(out.papers.len() <= 5);
    assert_eq!(out.summary.pages, 1);
}
