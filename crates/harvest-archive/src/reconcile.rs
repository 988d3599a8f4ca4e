//! Merge freshly harvested papers into the archive.
//!
//! The archive is concatenated before the fresh rows and deduplicated by DOI,
//! keeping the first position. Freshly seen DOIs are flagged `new`, and the
//! result is ordered new-first, then by print publication date descending.

use std::cmp::Ordering;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::paper::Paper;

/// What to keep when a DOI is both archived and freshly harvested
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// Keep the archived row untouched
    KeepArchive,
    /// Take the fresh bibliographic fields, keep the archived `Date Added`
    #[default]
    PreferFresh,
}

impl std::str::FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep-archive" => Ok(Self::KeepArchive),
            "prefer-fresh" => Ok(Self::PreferFresh),
            other => Err(format!(
                "unknown merge policy '{other}' (expected keep-archive or prefer-fresh)"
            )),
        }
    }
}

/// A paper with its provenance flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub paper: Paper,
    /// DOI not present in the archive before this run
    pub new: bool,
}

/// Outcome of a merge
#[derive(Debug, Default)]
pub struct Reconciled {
    /// Final rows in persisted order
    pub entries: Vec<ArchiveEntry>,
    /// Archived rows whose fields were replaced by a fresh copy
    pub refreshed: usize,
    /// Fresh rows dropped as duplicates of an earlier row
    pub duplicates: usize,
}

impl Reconciled {
    pub fn new_count(&self) -> usize {
        self.entries.iter().filter(|e| e.new).count()
    }
}

/// Merge `fresh` into `archive`.
///
/// `archive` is expected to be deduplicated already (see
/// [`crate::archive::load_archive`]). Papers without a DOI are never merged.
pub fn reconcile(archive: Vec<Paper>, fresh: Vec<Paper>, policy: MergePolicy) -> Reconciled {
    let archived: FxHashSet<String> = archive
        .iter()
        .filter_map(|p| p.identity().map(str::to_string))
        .collect();

    let mut entries: Vec<ArchiveEntry> = Vec::with_capacity(archive.len() + fresh.len());
    // DOI -> index in `entries` of the kept row
    let mut kept: FxHashMap<String, usize> = FxHashMap::default();
    let mut refreshed: FxHashSet<usize> = FxHashSet::default();
    let mut result = Reconciled::default();

    for paper in archive {
        push_unique(&mut entries, &mut kept, paper, false);
    }
    let archive_len = entries.len();

    for mut paper in fresh {
        paper.normalize();
        let new = paper.identity().is_none_or(|doi| !archived.contains(doi));

        let existing = paper.identity().and_then(|doi| kept.get(doi).copied());
        match existing {
            None => push_unique(&mut entries, &mut kept, paper, new),
            Some(idx)
                if idx < archive_len
                    && policy == MergePolicy::PreferFresh
                    && refreshed.insert(idx) =>
            {
                let slot = &mut entries[idx].paper;
                if *slot != paper_with_date(&paper, &slot.date_added) {
                    let date_added = std::mem::take(&mut slot.date_added);
                    *slot = Paper { date_added, ..paper };
                    result.refreshed += 1;
                }
            }
            Some(_) => result.duplicates += 1,
        }
    }

    sort_entries(&mut entries);
    result.entries = entries;
    result
}

fn push_unique(
    entries: &mut Vec<ArchiveEntry>,
    kept: &mut FxHashMap<String, usize>,
    paper: Paper,
    new: bool,
) {
    if let Some(doi) = paper.identity() {
        if kept.contains_key(doi) {
            return;
        }
        kept.insert(doi.to_string(), entries.len());
    }
    entries.push(ArchiveEntry { paper, new });
}

fn paper_with_date(paper: &Paper, date_added: &str) -> Paper {
    Paper {
        date_added: date_added.to_string(),
        ..paper.clone()
    }
}

/// New rows first, then latest print publication date first; empty dates last
pub fn sort_entries(entries: &mut [ArchiveEntry]) {
    entries.sort_by(|a, b| {
        b.new.cmp(&a.new).then_with(|| {
            cmp_date_desc(
                &a.paper.print_publication_date,
                &b.paper.print_publication_date,
            )
        })
    });
}

fn cmp_date_desc(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.trim(), b.trim());
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.cmp(a),
    }
}
