//! Parquet file writer with atomic tmp→rename, plus tmp-file housekeeping

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::RecordBatch;
use arrow::datatypes::Schema;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;

/// Path of the temporary sibling used while `path` is being written
pub fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Buffered parquet writer; the final file only appears on `finalize`
pub struct ParquetSink {
    writer: ArrowWriter<File>,
    tmp_path: PathBuf,
    final_path: PathBuf,
    row_count: usize,
}

impl std::fmt::Debug for ParquetSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParquetSink")
            .field("final_path", &self.final_path)
            .field("row_count", &self.row_count)
            .finish_non_exhaustive()
    }
}

impl ParquetSink {
    /// Create a sink for `path`, writing to `<path>.tmp` until finalized
    pub fn create(path: &Path, schema: Arc<Schema>, zstd_level: i32) -> std::io::Result<Self> {
        let final_path = path.to_path_buf();
        let tmp_path = tmp_path_for(path);

        // Clean up stale tmp file
        if tmp_path.exists() {
            fs::remove_file(&tmp_path)?;
        }

        let level = ZstdLevel::try_new(zstd_level)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        let file = File::create(&tmp_path)?;
        let props = WriterProperties::builder()
            .set_compression(Compression::ZSTD(level))
            .build();

        let writer =
            ArrowWriter::try_new(file, schema, Some(props)).map_err(std::io::Error::other)?;

        Ok(Self {
            writer,
            tmp_path,
            final_path,
            row_count: 0,
        })
    }

    /// Write a record batch
    pub fn write_batch(&mut self, batch: &RecordBatch) -> std::io::Result<()> {
        self.row_count += batch.num_rows();
        self.writer.write(batch).map_err(std::io::Error::other)
    }

    /// Finalize: flush footer and atomically rename tmp → final
    pub fn finalize(self) -> std::io::Result<usize> {
        let row_count = self.row_count;
        self.writer.close().map_err(std::io::Error::other)?;
        fs::rename(&self.tmp_path, &self.final_path)?;
        Ok(row_count)
    }
}

/// Check if a completed parquet file exists and has a valid footer
pub fn is_valid_parquet(path: &Path) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };
    parquet::file::reader::SerializedFileReader::new(file).is_ok()
}

/// Remove leftover `<target>.tmp` siblings of `targets`, returning how many were removed.
///
/// Only the tmp files this crate would write for those targets are touched.
pub fn remove_stale_tmp(targets: &[&Path]) -> std::io::Result<usize> {
    let mut removed = 0;
    for target in targets {
        let tmp = tmp_path_for(target);
        if tmp.is_file() {
            log::warn!("Removing stale tmp file: {}", tmp.display());
            fs::remove_file(&tmp)?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{BooleanArray, StringArray};
    use arrow::datatypes::{DataType, Field};
    use tempfile::TempDir;

    fn flag_schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("doi", DataType::Utf8, false),
            Field::new("new", DataType::Boolean, false),
        ]))
    }

    #[test]
    fn tmp_path_appends_suffix() {
        let p = tmp_path_for(Path::new("/out/papers.parquet"));
        assert_eq!(p, PathBuf::from("/out/papers.parquet.tmp"));
    }

    #[test]
    fn is_valid_parquet_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(!is_valid_parquet(&dir.path().join("nope.parquet")));
    }

    #[test]
    fn is_valid_parquet_not_parquet() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.parquet");
        std::fs::write(&path, b"DOI,Title\n").unwrap();
        assert!(!is_valid_parquet(&path));
    }

    #[test]
    fn sink_renames_on_finalize() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("papers.parquet");
        let schema = flag_schema();
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["10.1/a", "10.1/b"])),
                Arc::new(BooleanArray::from(vec![true, false])),
            ],
        )
        .unwrap();

        let mut sink = ParquetSink::create(&path, schema, 3).unwrap();
        sink.write_batch(&batch).unwrap();
        assert!(!path.exists());
        assert!(tmp_path_for(&path).exists());

        assert_eq!(sink.finalize().unwrap(), 2);
        assert!(is_valid_parquet(&path));
        assert!(!tmp_path_for(&path).exists());
    }

    #[test]
    fn stale_tmp_of_targets_is_removed() {
        let dir = TempDir::new().unwrap();
        let csv = dir.path().join("papers.csv");
        let snapshot = dir.path().join("papers.parquet");
        std::fs::write(tmp_path_for(&csv), b"stale").unwrap();
        std::fs::write(&csv, b"keep").unwrap();

        assert_eq!(remove_stale_tmp(&[csv.as_path(), snapshot.as_path()]).unwrap(), 1);
        assert!(!tmp_path_for(&csv).exists());
        assert!(csv.exists());
    }

    #[test]
    fn unrelated_tmp_files_survive() {
        let dir = TempDir::new().unwrap();
        let csv = dir.path().join("papers.csv");
        let draft = dir.path().join("my-draft.tmp");
        std::fs::write(&draft, b"user data").unwrap();

        assert_eq!(remove_stale_tmp(&[csv.as_path()]).unwrap(), 0);
        assert!(draft.exists());
    }

    #[test]
    fn invalid_level_leaves_no_tmp_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("papers.parquet");
        assert!(ParquetSink::create(&path, flag_schema(), 99).is_err());
        assert!(!tmp_path_for(&path).exists());
        assert!(!path.exists());
    }
}
