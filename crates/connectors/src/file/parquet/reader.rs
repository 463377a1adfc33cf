use crate::file::parquet::error::FileError;
use arrow::datatypes::SchemaRef;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::{fs::File, path::Path};

/// Row count and schema of a Parquet file, read from its footer.
#[derive(Debug, Clone)]
pub struct ParquetSummary {
    pub rows: usize,
    pub row_groups: usize,
    pub schema: SchemaRef,
}

pub fn read_parquet_summary(path: &Path) -> Result<ParquetSummary, FileError> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let metadata = builder.metadata();

    Ok(ParquetSummary {
        rows: metadata.file_metadata().num_rows().max(0) as usize,
        row_groups: metadata.num_row_groups(),
        schema: builder.schema().clone(),
    })
}

/// What the append sink finds at its target path before the first write.
#[derive(Debug, Clone)]
pub enum ExistingOutput {
    Absent,
    Valid { rows: usize, schema: SchemaRef },
    Unreadable { reason: String },
}

pub fn probe_existing(path: &Path) -> ExistingOutput {
    if !path.exists() {
        return ExistingOutput::Absent;
    }

    match read_parquet_summary(path) {
        Ok(summary) => ExistingOutput::Valid {
            rows: summary.rows,
            schema: summary.schema,
        },
        Err(err) => ExistingOutput::Unreadable {
            reason: err.to_string(),
        },
    }
}
