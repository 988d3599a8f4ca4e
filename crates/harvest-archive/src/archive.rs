//! CSV archive: load with DOI deduplication, atomic save, timestamped backup

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rustc_hash::FxHashSet;

use crate::paper::Paper;
use crate::reconcile::ArchiveEntry;
use crate::snapshot::write_snapshot;

/// Error reading or writing archive files
#[derive(Debug)]
pub enum ArchiveError {
    Io { path: PathBuf, source: std::io::Error },
    Csv { path: PathBuf, source: csv::Error },
    Parquet { path: PathBuf, message: String },
}

impl std::fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Csv { path, source } => write!(f, "{}: CSV: {source}", path.display()),
            Self::Parquet { path, message } => write!(f, "{}: parquet: {message}", path.display()),
        }
    }
}

impl std::error::Error for ArchiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Parquet { .. } => None,
        }
    }
}

impl ArchiveError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Read the archive at `path`, deduplicated by DOI.
///
/// A missing file is an empty archive (first run). Unknown columns are
/// ignored and missing ones read as empty strings.
pub fn load_archive(path: &Path) -> Result<Vec<Paper>, ArchiveError> {
    if !path.exists() {
        log::warn!(
            "No archive at {}, starting from an empty archive",
            path.display()
        );
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| ArchiveError::csv(path, e))?;

    let mut papers = Vec::new();
    for row in reader.deserialize::<Paper>() {
        let mut paper = row.map_err(|e| ArchiveError::csv(path, e))?;
        paper.doi = paper.doi.trim().to_string();
        papers.push(paper);
    }

    let loaded = papers.len();
    let papers = dedupe_by_doi(papers);
    if papers.len() < loaded {
        log::warn!(
            "Archive {} had {} duplicate DOI rows, keeping first occurrence",
            path.display(),
            loaded - papers.len()
        );
    }
    log::info!("Loaded {} archived papers from {}", papers.len(), path.display());
    Ok(papers)
}

/// Keep the first paper per DOI; papers without a DOI are all kept
pub fn dedupe_by_doi(papers: Vec<Paper>) -> Vec<Paper> {
    let mut seen = FxHashSet::default();
    papers
        .into_iter()
        .filter(|p| match p.identity() {
            Some(doi) => seen.insert(doi.to_string()),
            None => true,
        })
        .collect()
}

/// Write the archive atomically (`<path>.tmp` then rename).
///
/// Only the literal paper columns are written; the `new` flag lives in the
/// Parquet snapshot.
pub fn save_archive(path: &Path, entries: &[ArchiveEntry]) -> Result<usize, ArchiveError> {
    let tmp_path = write_csv_tmp(path, entries)?;
    fs::rename(&tmp_path, path).map_err(|e| ArchiveError::io(path, e))?;
    Ok(entries.len())
}

/// Write the archive CSV together with its flag snapshot.
///
/// The CSV is staged as `<path>.tmp` and only replaces the previous archive
/// once the snapshot is on disk. On any failure the previous archive is left
/// as it was.
pub fn save_archive_with_snapshot(
    path: &Path,
    snapshot: &Path,
    entries: &[ArchiveEntry],
    zstd_level: i32,
) -> Result<usize, ArchiveError> {
    let tmp_path = write_csv_tmp(path, entries)?;
    if let Err(e) = write_snapshot(snapshot, entries, zstd_level) {
        if let Err(rm) = fs::remove_file(&tmp_path) {
            log::warn!("Could not remove {}: {rm}", tmp_path.display());
        }
        return Err(e);
    }
    fs::rename(&tmp_path, path).map_err(|e| ArchiveError::io(path, e))?;
    Ok(entries.len())
}

/// Serialize `entries` to `<path>.tmp`, creating the parent directory
fn write_csv_tmp(path: &Path, entries: &[ArchiveEntry]) -> Result<PathBuf, ArchiveError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ArchiveError::io(parent, e))?;
    }

    let tmp_path = harvest_core::tmp_path_for(path);
    let mut writer =
        csv::Writer::from_path(&tmp_path).map_err(|e| ArchiveError::csv(&tmp_path, e))?;
    for entry in entries {
        writer
            .serialize(&entry.paper)
            .map_err(|e| ArchiveError::csv(&tmp_path, e))?;
    }
    writer.flush().map_err(|e| ArchiveError::io(&tmp_path, e))?;
    Ok(tmp_path)
}

/// Copy the current archive into `backup_dir` as `<stem>-<YYYYmmdd-HHMMSS>.<ext>`.
///
/// Returns `None` when there is no archive yet.
pub fn backup_archive(
    path: &Path,
    backup_dir: &Path,
    now: NaiveDateTime,
) -> Result<Option<PathBuf>, ArchiveError> {
    if !path.exists() {
        return Ok(None);
    }
    fs::create_dir_all(backup_dir).map_err(|e| ArchiveError::io(backup_dir, e))?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string());
    let stamp = now.format("%Y%m%d-%H%M%S");
    let name = match path.extension() {
        Some(ext) => format!("{stem}-{stamp}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{stamp}"),
    };
    let target = backup_dir.join(name);

    fs::copy(path, &target).map_err(|e| ArchiveError::io(&target, e))?;
    log::info!("Backed up archive to {}", target.display());
    Ok(Some(target))
}
