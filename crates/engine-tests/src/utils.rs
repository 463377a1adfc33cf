use crate::memory::{MemoryColumn, MemoryTable};
use arrow::array::{Array, Int64Array};
use chrono::{TimeZone, Utc};
use connectors::file::parquet::reader::read_parquet_summary;
use engine_core::fetcher::BatchFetcher;
use model::{core::value::Value, records::batch::Batch};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::{fs::File, path::Path};

/// `orders`: auto-increment `id`, 1..=rows.
pub fn orders_table(rows: usize) -> MemoryTable {
    let mut table = MemoryTable::new(
        "orders",
        vec![
            MemoryColumn::new("id", "int(11)", false).auto_increment_key(),
            MemoryColumn::new("customer", "varchar(64)", true),
            MemoryColumn::new("total", "decimal(10,2)", false),
            MemoryColumn::new("paid", "tinyint(1)", false),
            MemoryColumn::new("created_at", "datetime", true),
        ],
    );

    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    table.rows = (1..=rows as i64)
        .map(|id| {
            vec![
                Value::Int(id),
                if id % 7 == 0 {
                    Value::Null
                } else {
                    Value::String(format!("customer-{}", id % 100))
                },
                Value::Decimal(format!("{}.{:02}", id % 500, id % 100)),
                Value::Int(id % 2),
                Value::Timestamp(base + chrono::Duration::minutes(id)),
            ]
        })
        .collect();
    table
}

/// `logs`: no auto-increment column, paged by offset.
pub fn logs_table(rows: usize) -> MemoryTable {
    let mut table = MemoryTable::new(
        "logs",
        vec![
            MemoryColumn::new("seq", "bigint(20)", false),
            MemoryColumn::new("level", "enum('info','warn','error')", false),
            MemoryColumn::new("message", "text", true),
            MemoryColumn::new("logged_at", "timestamp", true),
        ],
    );

    let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    table.rows = (0..rows as i64)
        .map(|seq| {
            vec![
                Value::Int(seq),
                Value::String(["info", "warn", "error"][(seq % 3) as usize].to_string()),
                Value::String(format!("event {seq}")),
                Value::Timestamp(base + chrono::Duration::seconds(seq)),
            ]
        })
        .collect();
    table
}

/// `events`: the auto-increment key is not the first column and has gaps.
pub fn events_table(ids: &[i64]) -> MemoryTable {
    let mut table = MemoryTable::new(
        "events",
        vec![
            MemoryColumn::new("kind", "varchar(16)", false),
            MemoryColumn::new("event_id", "bigint(20) unsigned", false).auto_increment_key(),
            MemoryColumn::new("payload", "blob", true),
        ],
    );
    table.rows = ids
        .iter()
        .map(|id| {
            vec![
                Value::String("click".into()),
                Value::Uint(*id as u64),
                Value::Bytes(id.to_le_bytes().to_vec()),
            ]
        })
        .collect();
    table
}

/// Drains a fetcher, checking that it stays exhausted afterwards.
pub async fn drain(mut fetcher: BatchFetcher<'_>) -> Vec<Batch> {
    let mut batches = Vec::new();
    while let Some(batch) = fetcher.next_batch().await.expect("fetch batch") {
        batches.push(batch);
    }
    assert!(fetcher.is_done());
    assert!(fetcher.next_batch().await.expect("fetch after end").is_none());
    batches
}

/// Values of an integer column across a batch, in order.
pub fn batch_ints(batch: &Batch, column: &str) -> Vec<i64> {
    batch
        .rows
        .iter()
        .map(|row| row.get_value(column).as_i64().expect("integer value"))
        .collect()
}

pub fn file_row_count(path: &Path) -> usize {
    read_parquet_summary(path).expect("read parquet").rows
}

pub fn file_column_names(path: &Path) -> Vec<String> {
    read_parquet_summary(path)
        .expect("read parquet")
        .schema
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect()
}

/// Reads an Int64 column back from a Parquet file.
pub fn read_i64_column(path: &Path, column: &str) -> Vec<i64> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(path).expect("open file"))
        .expect("parquet reader")
        .build()
        .expect("build reader");

    let mut values = Vec::new();
    for batch in reader {
        let batch = batch.expect("record batch");
        let array = batch
            .column_by_name(column)
            .expect("column present")
            .as_any()
            .downcast_ref::<Int64Array>()
            .expect("int64 column");
        values.extend((0..array.len()).map(|i| array.value(i)));
    }
    values
}
