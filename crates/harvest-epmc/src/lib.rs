//! Harvest EPMC - Europe PMC search harvesting
//!
//! Pages through the Europe PMC REST search with cursor marks and turns the
//! nested XML records into flat rows ready for the archive.
//!
//! # Pipeline
//!
//! - [`parse_page`]: XML page → record table, side tables per nested group, cursor
//! - [`flatten_group`]: one record's nested group → rows keyed by record id
//! - [`project`]: grant and journal side tables joined back as `"; "` lists
//! - [`PaginationDriver`]: fetch/parse/project loop following cursors
//! - [`to_papers`]: rename and prune to the archive columns
//!
//! # Example
//!
//! ```ignore
//! use harvest_epmc::{Config, run};
//!
//! let config = Config {
//!     max_pages: Some(1),
//!     ..Default::default()
//! };
//!
//! let today = chrono::Local::now().date_naive();
//! let harvested = run(&config, today, &indicatif::ProgressBar::hidden())?;
//! println!("Fetched {} papers", harvested.papers.len());
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod flatten;
pub mod paginate;
pub mod parser;
pub mod project;
pub mod runner;
pub mod schema;
pub mod table;
pub mod xml;

// Re-exports
pub use api::{EuropePmcClient, SearchQuery};
pub use config::{Config, DEFAULT_FILTER};
pub use error::ParseError;
pub use flatten::{ID_COLUMN, flatten_group};
pub use paginate::{Harvest, INITIAL_CURSOR, PageSource, PaginationDriver, StopReason};
pub use parser::{ParsedPage, parse_page};
pub use project::{GRANTS_LIST, project};
pub use runner::{Harvested, Summary, harvest, run};
pub use schema::to_papers;
pub use table::Table;
