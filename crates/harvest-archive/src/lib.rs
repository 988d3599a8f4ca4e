//! Harvest Archive - the persisted paper table
//!
//! Loads the CSV archive (deduplicated by DOI), merges freshly harvested
//! papers into it, and writes the result back together with a Parquet
//! snapshot that keeps the per-row `new` flag.
//!
//! # Example
//!
//! ```ignore
//! use harvest_archive::{MergePolicy, load_archive, reconcile, save_archive};
//!
//! let archive = load_archive("output/papers.csv".as_ref())?;
//! let merged = reconcile(archive, fresh, MergePolicy::default());
//! save_archive("output/papers.csv".as_ref(), &merged.entries)?;
//! ```

pub mod archive;
pub mod paper;
pub mod reconcile;
pub mod snapshot;

// Re-exports
pub use archive::{
    ArchiveError, backup_archive, dedupe_by_doi, load_archive, save_archive,
    save_archive_with_snapshot,
};
pub use paper::{COLUMNS, Paper};
pub use reconcile::{ArchiveEntry, MergePolicy, Reconciled, reconcile, sort_entries};
pub use snapshot::{read_snapshot, write_snapshot};
