use crate::file::parquet::{
    convert::schema_difference,
    error::FileError,
    reader::{ExistingOutput, probe_existing},
    writer_properties,
};
use arrow::{datatypes::SchemaRef, record_batch::RecordBatch};
use parquet::arrow::{ArrowWriter, arrow_reader::ParquetRecordBatchReaderBuilder};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// What to do when the append target already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExistingFilePolicy {
    /// Refuse to touch an existing file.
    #[default]
    Abort,
    /// Replace whatever is there.
    Overwrite,
    /// Keep the existing rows and add the new ones after them.
    Append,
}

/// Outcome of a finished sink.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkSummary {
    pub files: Vec<PathBuf>,
    /// Rows written during this run.
    pub rows: usize,
    pub batches: usize,
    /// Rows carried over from an existing file in append mode.
    pub existing_rows: usize,
}

/// Destination for converted batches.
///
/// Lifecycle: write_batch()* -> finish()
pub trait BatchSink: Send {
    fn write_batch(&mut self, batch: &RecordBatch) -> Result<(), FileError>;

    fn finish(self: Box<Self>) -> Result<SinkSummary, FileError>;
}

fn check_schema(expected: &SchemaRef, batch: &RecordBatch) -> Result<(), FileError> {
    match schema_difference(expected, &batch.schema()) {
        Some(diff) => Err(FileError::SchemaMismatch(diff)),
        None => Ok(()),
    }
}

/// Writes every batch to its own file under `<dir>/<table>/`.
pub struct SplitParquetSink {
    table_dir: PathBuf,
    base_name: String,
    schema: SchemaRef,
    next_index: usize,
    summary: SinkSummary,
}

impl SplitParquetSink {
    /// Creates the table directory up front, so an empty table still leaves it behind.
    pub fn new(
        output_dir: &Path,
        table: &str,
        base_name: Option<&str>,
        schema: SchemaRef,
    ) -> Result<Self, FileError> {
        let table_dir = output_dir.join(table);
        fs::create_dir_all(&table_dir)?;

        let base_name = base_name
            .map(|name| name.strip_suffix(".parquet").unwrap_or(name))
            .filter(|name| !name.is_empty())
            .unwrap_or(table)
            .to_string();

        Ok(SplitParquetSink {
            table_dir,
            base_name,
            schema,
            next_index: 0,
            summary: SinkSummary::default(),
        })
    }

    pub fn table_dir(&self) -> &Path {
        &self.table_dir
    }

    pub fn file_path(&self, index: usize) -> PathBuf {
        self.table_dir
            .join(format!("{}_{}.parquet", self.base_name, index))
    }
}

impl BatchSink for SplitParquetSink {
    fn write_batch(&mut self, batch: &RecordBatch) -> Result<(), FileError> {
        check_schema(&self.schema, batch)?;

        let path = self.file_path(self.next_index);
        if path.exists() {
            warn!("Overwriting existing file {}", path.display());
        }

        let file = File::create(&path)?;
        let mut writer = ArrowWriter::try_new(file, self.schema.clone(), Some(writer_properties()))?;
        writer.write(batch)?;
        writer.close()?;

        info!(
            "Wrote batch {} ({} rows) to {}",
            self.next_index,
            batch.num_rows(),
            path.display()
        );

        self.next_index += 1;
        self.summary.rows += batch.num_rows();
        self.summary.batches += 1;
        self.summary.files.push(path);
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<SinkSummary, FileError> {
        Ok(self.summary)
    }
}

/// A temporary sibling of the append target.
///
/// Removed on drop unless `persist` moved it over the target, so a failed
/// run never leaves a `.partial` file behind.
struct Staging {
    path: PathBuf,
    persisted: bool,
}

impl Staging {
    fn new(path: PathBuf) -> Self {
        Staging {
            path,
            persisted: false,
        }
    }

    fn persist(mut self, target: &Path) -> Result<(), FileError> {
        fs::rename(&self.path, target)?;
        self.persisted = true;
        Ok(())
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        if self.persisted {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed unfinished {}", self.path.display()),
            Err(err) => warn!("Failed to remove {}: {}", self.path.display(), err),
        }
    }
}

// Field order matters: the writer's file handle is dropped before the staging file is removed.
struct OpenFile {
    writer: ArrowWriter<File>,
    /// Set when writing into a temporary sibling that replaces the target on finish.
    staging: Option<Staging>,
}

/// Writes all batches into a single file, one row group per batch.
pub struct AppendParquetSink {
    path: PathBuf,
    schema: SchemaRef,
    policy: ExistingFilePolicy,
    open: Option<OpenFile>,
    summary: SinkSummary,
}

impl AppendParquetSink {
    /// Nothing touches the filesystem until the first batch arrives.
    pub fn new(path: PathBuf, schema: SchemaRef, policy: ExistingFilePolicy) -> Self {
        AppendParquetSink {
            path,
            schema,
            policy,
            open: None,
            summary: SinkSummary::default(),
        }
    }

    fn staging_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.path.with_file_name(format!(".{file_name}.partial"))
    }

    fn create_writer(&self, path: &Path) -> Result<ArrowWriter<File>, FileError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Ok(ArrowWriter::try_new(
            file,
            self.schema.clone(),
            Some(writer_properties()),
        )?)
    }

    fn open_target(&mut self) -> Result<OpenFile, FileError> {
        match (probe_existing(&self.path), self.policy) {
            (ExistingOutput::Absent, _) => {
                debug!("Creating {}", self.path.display());
                Ok(OpenFile {
                    writer: self.create_writer(&self.path)?,
                    staging: None,
                })
            }
            (_, ExistingFilePolicy::Abort) => Err(FileError::OutputExists(self.path.clone())),
            (_, ExistingFilePolicy::Overwrite) => {
                warn!("Overwriting existing file {}", self.path.display());
                Ok(OpenFile {
                    writer: self.create_writer(&self.path)?,
                    staging: None,
                })
            }
            (ExistingOutput::Unreadable { reason }, ExistingFilePolicy::Append) => {
                Err(FileError::UnreadableOutput {
                    path: self.path.clone(),
                    reason,
                })
            }
            (ExistingOutput::Valid { rows, schema }, ExistingFilePolicy::Append) => {
                if let Some(diff) = schema_difference(&self.schema, &schema) {
                    return Err(FileError::SchemaMismatch(format!(
                        "{} cannot be appended to: {}",
                        self.path.display(),
                        diff
                    )));
                }

                let staging = Staging::new(self.staging_path());
                let mut writer = self.create_writer(&staging.path)?;

                // Carry the existing row groups over before any new batch.
                let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&self.path)?)?
                    .build()?;
                for existing in reader {
                    let existing = existing?;
                    let existing =
                        RecordBatch::try_new(self.schema.clone(), existing.columns().to_vec())?;
                    writer.write(&existing)?;
                }
                writer.flush()?;

                info!(
                    "Appending to {} which already holds {} rows",
                    self.path.display(),
                    rows
                );
                self.summary.existing_rows = rows;

                Ok(OpenFile {
                    writer,
                    staging: Some(staging),
                })
            }
        }
    }
}

impl BatchSink for AppendParquetSink {
    fn write_batch(&mut self, batch: &RecordBatch) -> Result<(), FileError> {
        check_schema(&self.schema, batch)?;

        let mut open = match self.open.take() {
            Some(open) => open,
            None => self.open_target()?,
        };

        open.writer.write(batch)?;
        // Close the row group so every batch lands in its own.
        open.writer.flush()?;
        self.open = Some(open);

        self.summary.rows += batch.num_rows();
        self.summary.batches += 1;
        info!(
            "Appended batch {} ({} rows) to {}",
            self.summary.batches - 1,
            batch.num_rows(),
            self.path.display()
        );
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<SinkSummary, FileError> {
        let Some(open) = self.open.take() else {
            debug!("No batches written, {} left untouched", self.path.display());
            return Ok(self.summary);
        };

        open.writer.close()?;
        if let Some(staging) = open.staging {
            staging.persist(&self.path)?;
        }

        self.summary.files.push(self.path.clone());
        Ok(self.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::parquet::reader::read_parquet_summary;
    use arrow::{
        array::{Int64Array, StringArray},
        datatypes::{DataType, Field, Schema},
    };
    use std::sync::Arc;
    use tempfile::tempdir;

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("name", DataType::Utf8, true),
        ]))
    }

    fn batch(ids: std::ops::Range<i64>) -> RecordBatch {
        let names = ids.clone().map(|i| Some(format!("row-{i}"))).collect::<Vec<_>>();
        RecordBatch::try_new(
            schema(),
            vec![
                Arc::new(Int64Array::from(ids.collect::<Vec<_>>())),
                Arc::new(StringArray::from(names)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_split_sink_writes_one_file_per_batch() {
        let dir = tempdir().unwrap();
        let mut sink: Box<dyn BatchSink> = Box::new(
            SplitParquetSink::new(dir.path(), "orders", Some("orders.parquet"), schema()).unwrap(),
        );

        sink.write_batch(&batch(0..3)).unwrap();
        sink.write_batch(&batch(3..5)).unwrap();
        let summary = sink.finish().unwrap();

        assert_eq!(summary.batches, 2);
        assert_eq!(summary.rows, 5);
        assert_eq!(
            summary.files,
            vec![
                dir.path().join("orders").join("orders_0.parquet"),
                dir.path().join("orders").join("orders_1.parquet"),
            ]
        );
        assert_eq!(read_parquet_summary(&summary.files[1]).unwrap().rows, 2);
    }

    #[test]
    fn test_split_sink_creates_directory_without_batches() {
        let dir = tempdir().unwrap();
        let sink = SplitParquetSink::new(dir.path(), "empty", None, schema()).unwrap();
        let table_dir = sink.table_dir().to_path_buf();

        let summary = Box::new(sink).finish().unwrap();
        assert!(table_dir.is_dir());
        assert_eq!(fs::read_dir(&table_dir).unwrap().count(), 0);
        assert!(summary.files.is_empty());
    }

    #[test]
    fn test_split_sink_rejects_foreign_schema() {
        let dir = tempdir().unwrap();
        let other = Arc::new(Schema::new(vec![Field::new("x", DataType::Utf8, true)]));
        let mut sink = SplitParquetSink::new(dir.path(), "orders", None, other).unwrap();

        let err = sink.write_batch(&batch(0..1)).unwrap_err();
        assert!(matches!(err, FileError::SchemaMismatch(_)));
    }

    #[test]
    fn test_append_sink_one_row_group_per_batch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.parquet");
        let mut sink: Box<dyn BatchSink> = Box::new(AppendParquetSink::new(
            path.clone(),
            schema(),
            ExistingFilePolicy::Abort,
        ));

        sink.write_batch(&batch(0..4)).unwrap();
        sink.write_batch(&batch(4..6)).unwrap();
        let summary = sink.finish().unwrap();

        assert_eq!(summary.files, vec![path.clone()]);
        let written = read_parquet_summary(&path).unwrap();
        assert_eq!(written.rows, 6);
        assert_eq!(written.row_groups, 2);
        assert!(schema_difference(&schema(), &written.schema).is_none());
    }

    #[test]
    fn test_append_sink_without_batches_creates_no_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.parquet");
        let sink = Box::new(AppendParquetSink::new(
            path.clone(),
            schema(),
            ExistingFilePolicy::Abort,
        ));

        let summary = sink.finish().unwrap();
        assert!(summary.files.is_empty());
        assert!(!path.exists());
    }

    fn write_file(path: &Path, ids: std::ops::Range<i64>) {
        let mut sink = Box::new(AppendParquetSink::new(
            path.to_path_buf(),
            schema(),
            ExistingFilePolicy::Overwrite,
        ));
        sink.write_batch(&batch(ids)).unwrap();
        sink.finish().unwrap();
    }

    #[test]
    fn test_append_sink_aborts_on_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.parquet");
        write_file(&path, 0..3);

        let mut sink = AppendParquetSink::new(path.clone(), schema(), ExistingFilePolicy::Abort);
        let err = sink.write_batch(&batch(3..4)).unwrap_err();
        assert!(matches!(err, FileError::OutputExists(p) if p == path));
        assert_eq!(read_parquet_summary(&path).unwrap().rows, 3);
    }

    #[test]
    fn test_append_sink_overwrites_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.parquet");
        write_file(&path, 0..3);
        write_file(&path, 10..11);

        assert_eq!(read_parquet_summary(&path).unwrap().rows, 1);
    }

    #[test]
    fn test_append_policy_keeps_existing_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.parquet");
        write_file(&path, 0..3);

        let mut sink = Box::new(AppendParquetSink::new(
            path.clone(),
            schema(),
            ExistingFilePolicy::Append,
        ));
        sink.write_batch(&batch(3..5)).unwrap();
        let summary = sink.finish().unwrap();

        assert_eq!(summary.existing_rows, 3);
        assert_eq!(summary.rows, 2);
        let written = read_parquet_summary(&path).unwrap();
        assert_eq!(written.rows, 5);
        assert!(!dir.path().join(".orders.parquet.partial").exists());
    }

    #[test]
    fn test_unfinished_append_leaves_target_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.parquet");

        write_file(&path, 0..3);

        let mut second: Box<dyn BatchSink> =
            Box::new(AppendParquetSink::new(path.clone(), schema(), ExistingFilePolicy::Append));
        second.write_batch(&batch(3..5)).unwrap();
        assert!(dir.path().join(".orders.parquet.partial").exists());
        drop(second);

        assert!(!dir.path().join(".orders.parquet.partial").exists());
        assert_eq!(read_parquet_summary(&path).unwrap().rows, 3);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_append_policy_rejects_different_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.parquet");
        write_file(&path, 0..3);

        let other = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)]));
        let ids = RecordBatch::try_new(other.clone(), vec![Arc::new(Int64Array::from(vec![9]))])
            .unwrap();
        let mut sink = AppendParquetSink::new(path.clone(), other, ExistingFilePolicy::Append);

        let err = sink.write_batch(&ids).unwrap_err();
        assert!(matches!(err, FileError::SchemaMismatch(_)));
        assert_eq!(read_parquet_summary(&path).unwrap().rows, 3);
    }

    #[test]
    fn test_append_policy_rejects_unreadable_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.parquet");
        fs::write(&path, b"not parquet").unwrap();

        let mut sink = AppendParquetSink::new(path.clone(), schema(), ExistingFilePolicy::Append);
        let err = sink.write_batch(&batch(0..1)).unwrap_err();
        assert!(matches!(err, FileError::UnreadableOutput { .. }));
    }
}
