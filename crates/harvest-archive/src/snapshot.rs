//! Parquet snapshot of the reconciled archive, including the `new` flag.
//!
//! The CSV archive carries only the literal paper columns. The snapshot
//! keeps the provenance flag so it stays recoverable for any consumer.

use std::fs::File;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use arrow::array::{Array, ArrayRef, AsArray, BooleanArray, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use harvest_core::ParquetSink;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::archive::ArchiveError;
use crate::paper::{COLUMNS, Paper};
use crate::reconcile::ArchiveEntry;

/// Name of the provenance column
pub const NEW_COLUMN: &str = "new";

/// Snapshot schema: every archive column as Utf8, then the `new` flag
pub static SNAPSHOT: LazyLock<Arc<Schema>> = LazyLock::new(|| {
    let mut fields: Vec<Field> = COLUMNS
        .iter()
        .map(|name| Field::new(*name, DataType::Utf8, false))
        .collect();
    fields.push(Field::new(NEW_COLUMN, DataType::Boolean, false));
    Arc::new(Schema::new(fields))
});

fn parquet_err(path: &Path, e: impl std::fmt::Display) -> ArchiveError {
    ArchiveError::Parquet {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

/// Build one record batch holding all entries
pub fn to_batch(entries: &[ArchiveEntry]) -> Result<RecordBatch, arrow::error::ArrowError> {
    let mut columns: Vec<ArrayRef> = (0..COLUMNS.len())
        .map(|i| {
            let values: StringArray = entries
                .iter()
                .map(|e| Some(e.paper.values()[i]))
                .collect();
            Arc::new(values) as ArrayRef
        })
        .collect();
    let flags: BooleanArray = entries.iter().map(|e| Some(e.new)).collect();
    columns.push(Arc::new(flags));

    RecordBatch::try_new(SNAPSHOT.clone(), columns)
}

/// Write the snapshot atomically; returns the number of rows written
pub fn write_snapshot(
    path: &Path,
    entries: &[ArchiveEntry],
    zstd_level: i32,
) -> Result<usize, ArchiveError> {
    let batch = to_batch(entries).map_err(|e| parquet_err(path, e))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ArchiveError::io(parent, e))?;
    }
    let mut sink = ParquetSink::create(path, SNAPSHOT.clone(), zstd_level)
        .map_err(|e| ArchiveError::io(path, e))?;
    sink.write_batch(&batch)
        .map_err(|e| ArchiveError::io(path, e))?;
    sink.finalize().map_err(|e| ArchiveError::io(path, e))
}

/// Read a snapshot back into entries
pub fn read_snapshot(path: &Path) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    let file = File::open(path).map_err(|e| ArchiveError::io(path, e))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .and_then(|b| b.build())
        .map_err(|e| parquet_err(path, e))?;

    let mut entries = Vec::new();
    for batch in reader {
        let batch = batch.map_err(|e| parquet_err(path, e))?;
        let mut strings = Vec::with_capacity(COLUMNS.len());
        for name in COLUMNS {
            let col = batch
                .column_by_name(name)
                .ok_or_else(|| parquet_err(path, format!("missing column '{name}'")))?;
            strings.push(col.as_string::<i32>().clone());
        }
        let flags = batch
            .column_by_name(NEW_COLUMN)
            .ok_or_else(|| parquet_err(path, format!("missing column '{NEW_COLUMN}'")))?
            .as_boolean()
            .clone();

        for row in 0..batch.num_rows() {
            let values = std::array::from_fn(|i| {
                let col = &strings[i];
                if col.is_null(row) {
                    String::new()
                } else {
                    col.value(row).to_string()
                }
            });
            entries.push(ArchiveEntry {
                paper: Paper::from_values(values),
                new: flags.is_valid(row) && flags.value(row),
            });
        }
    }
    Ok(entries)
}
