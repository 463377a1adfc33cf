use crate::{
    config::{ExportConfig, OutputTarget},
    error::ExportError,
    fetcher::BatchFetcher,
    metrics::{Metrics, MetricsSnapshot},
};
use arrow::datatypes::SchemaRef;
use connectors::{
    file::parquet::{
        convert::rows_to_record_batch,
        sink::{AppendParquetSink, BatchSink, SplitParquetSink},
    },
    sql::{
        base::adapter::SqlAdapter,
        mysql::{data_type::arrow_schema_for, probe::SchemaProber},
    },
};
use model::pagination::cursor::Cursor;
use serde::Serialize;
use std::{path::PathBuf, sync::Arc};
use tracing::info;

/// Report of a finished export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub table: String,
    /// `pk` or `offset`.
    pub strategy: String,
    pub batches: usize,
    pub rows: usize,
    pub existing_rows: usize,
    pub files: Vec<PathBuf>,
    pub final_cursor: Cursor,
    pub metrics: MetricsSnapshot,
}

/// Exports one table: probe the schema, then fetch and write batch after
/// batch until the source is exhausted.
///
/// The adapter is only borrowed; opening and closing the session is the
/// caller's job.
pub async fn export_table(
    adapter: &mut dyn SqlAdapter,
    config: &ExportConfig,
) -> Result<ExportSummary, ExportError> {
    config.validate()?;

    let descriptor = SchemaProber::probe(adapter, &config.table_name).await?;
    let schema: SchemaRef = Arc::new(arrow_schema_for(&descriptor));

    let mut sink: Box<dyn BatchSink> = match &config.output {
        OutputTarget::Split { dir, base_name } => Box::new(SplitParquetSink::new(
            dir,
            &descriptor.name,
            base_name.as_deref(),
            schema.clone(),
        )?),
        OutputTarget::Append { path, on_existing } => Box::new(AppendParquetSink::new(
            path.clone(),
            schema.clone(),
            *on_existing,
        )),
    };

    let metrics = Metrics::new();
    let mut fetcher = BatchFetcher::new(adapter, &descriptor, config.batch_size);
    let strategy = fetcher.strategy().name().to_string();
    info!(
        "Exporting `{}` with {} pagination, batch size {}",
        descriptor.name, strategy, config.batch_size
    );

    while let Some(batch) = fetcher.next_batch().await? {
        metrics.increment_fetched(batch.len() as u64);

        let record_batch = rows_to_record_batch(&schema, &batch.columns, &batch.rows)?;
        sink.write_batch(&record_batch)?;

        metrics.increment_written(record_batch.num_rows() as u64);
        metrics.increment_batches(1);
        info!("Processed batch {} with {} rows", batch.index, batch.len());
    }

    let final_cursor = fetcher.cursor().clone();
    let sink_summary = sink.finish()?;
    let snapshot = metrics.snapshot();

    info!(
        "Exported {} rows from `{}` in {} batches ({} ms, {:.2} rows/s)",
        snapshot.rows_written,
        descriptor.name,
        snapshot.batches_processed,
        snapshot.elapsed_ms,
        snapshot.rows_per_second
    );

    Ok(ExportSummary {
        table: descriptor.name,
        strategy,
        batches: sink_summary.batches,
        rows: sink_summary.rows,
        existing_rows: sink_summary.existing_rows,
        files: sink_summary.files,
        final_cursor,
        metrics: snapshot,
    })
}
