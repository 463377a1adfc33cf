use crate::file::parquet::error::FileError;
use arrow::{
    array::{
        ArrayRef, BinaryArray, BooleanArray, Date32Array, Float64Array, Int64Array, StringArray,
        TimestampMicrosecondArray, UInt64Array,
    },
    datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit},
    record_batch::RecordBatch,
};
use chrono::{DateTime, NaiveDate};
use model::{core::value::Value, records::row::RowData};
use std::sync::Arc;

/// Returns a description of the first difference between two schemas, if any.
///
/// Only names, types and nullability are compared; schema metadata is ignored.
pub fn schema_difference(expected: &Schema, found: &Schema) -> Option<String> {
    if expected.fields().len() != found.fields().len() {
        return Some(format!(
            "expected {} columns, found {}",
            expected.fields().len(),
            found.fields().len()
        ));
    }

    expected
        .fields()
        .iter()
        .zip(found.fields().iter())
        .find(|(e, f)| {
            e.name() != f.name()
                || e.data_type() != f.data_type()
                || e.is_nullable() != f.is_nullable()
        })
        .map(|(e, f)| {
            format!(
                "expected `{}` {}{}, found `{}` {}{}",
                e.name(),
                e.data_type(),
                if e.is_nullable() { " NULL" } else { "" },
                f.name(),
                f.data_type(),
                if f.is_nullable() { " NULL" } else { "" },
            )
        })
}

/// Converts fetched rows into a `RecordBatch` with the run's fixed schema.
///
/// `columns` is the column list reported with the rows; it must match the
/// schema field for field.
pub fn rows_to_record_batch(
    schema: &SchemaRef,
    columns: &[String],
    rows: &[RowData],
) -> Result<RecordBatch, FileError> {
    let names_match = columns.len() == schema.fields().len()
        && columns
            .iter()
            .zip(schema.fields().iter())
            .all(|(c, f)| c.eq_ignore_ascii_case(f.name()));
    if !names_match {
        let expected = schema
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(FileError::SchemaMismatch(format!(
            "expected columns [{}], found [{}]",
            expected,
            columns.join(", ")
        )));
    }

    if let Some(row) = rows.iter().find(|r| r.field_values.len() != columns.len()) {
        return Err(FileError::SchemaMismatch(format!(
            "row has {} values, table has {} columns",
            row.field_values.len(),
            columns.len()
        )));
    }

    let arrays = schema
        .fields()
        .iter()
        .enumerate()
        .map(|(idx, field)| build_array(field, rows, idx))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RecordBatch::try_new(schema.clone(), arrays)?)
}

fn build_array(field: &Field, rows: &[RowData], idx: usize) -> Result<ArrayRef, FileError> {
    let array: ArrayRef = match field.data_type() {
        DataType::Boolean => Arc::new(BooleanArray::from(collect(field, rows, idx, Value::as_bool)?)),
        DataType::Int64 => Arc::new(Int64Array::from(collect(field, rows, idx, Value::as_i64)?)),
        DataType::UInt64 => Arc::new(UInt64Array::from(collect(field, rows, idx, Value::as_u64)?)),
        DataType::Float64 => {
            Arc::new(Float64Array::from(collect(field, rows, idx, Value::as_f64)?))
        }
        DataType::Binary => Arc::new(
            collect(field, rows, idx, Value::as_bytes)?
                .into_iter()
                .collect::<BinaryArray>(),
        ),
        DataType::Date32 => Arc::new(Date32Array::from(collect(field, rows, idx, days_since_epoch)?)),
        DataType::Timestamp(TimeUnit::Microsecond, tz) => Arc::new(
            TimestampMicrosecondArray::from(collect(field, rows, idx, micros_since_epoch)?)
                .with_timezone_opt(tz.clone()),
        ),
        _ => Arc::new(
            collect(field, rows, idx, Value::as_string)?
                .into_iter()
                .collect::<StringArray>(),
        ),
    };

    Ok(array)
}

/// Pulls column `idx` out of every row, mapping NULL to `None` and failing
/// on values the column type cannot represent.
fn collect<T>(
    field: &Field,
    rows: &[RowData],
    idx: usize,
    convert: impl Fn(&Value) -> Option<T>,
) -> Result<Vec<Option<T>>, FileError> {
    rows.iter()
        .map(|row| match row.value_at(idx) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => convert(value)
                .map(Some)
                .ok_or_else(|| FileError::UnsupportedValue {
                    column: field.name().clone(),
                    value: value.to_string(),
                }),
        })
        .collect()
}

fn days_since_epoch(value: &Value) -> Option<i32> {
    let date = match value {
        Value::Date(d) => *d,
        Value::Timestamp(ts) => ts.date_naive(),
        Value::String(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?,
        _ => return None,
    };
    let days = date
        .signed_duration_since(DateTime::UNIX_EPOCH.date_naive())
        .num_days();
    i32::try_from(days).ok()
}

fn micros_since_epoch(value: &Value) -> Option<i64> {
    match value {
        Value::Timestamp(ts) => Some(ts.timestamp_micros()),
        Value::Date(d) => d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp_micros()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;
    use chrono::{TimeZone, Utc};
    use model::core::value::FieldValue;

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::UInt64, false),
            Field::new("active", DataType::Boolean, true),
            Field::new("total", DataType::Utf8, true),
            Field::new("day", DataType::Date32, true),
            Field::new(
                "created_at",
                DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
                true,
            ),
            Field::new("payload", DataType::Binary, true),
        ]))
    }

    fn columns() -> Vec<String> {
        ["id", "active", "total", "day", "created_at", "payload"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn row(id: u64, total: Value) -> RowData {
        RowData::new(
            "orders",
            vec![
                FieldValue::new("id", Value::Int(id as i64)),
                FieldValue::new("active", Value::Int(1)),
                FieldValue::new("total", total),
                FieldValue::new(
                    "day",
                    Value::Date(NaiveDate::from_ymd_opt(1970, 1, 11).unwrap()),
                ),
                FieldValue::new(
                    "created_at",
                    Value::Timestamp(Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 1).unwrap()),
                ),
                FieldValue::new("payload", Value::Null),
            ],
        )
    }

    #[test]
    fn test_rows_become_typed_columns() {
        let rows = vec![row(1, Value::Decimal("9.99".into())), row(2, Value::Null)];
        let batch = rows_to_record_batch(&schema(), &columns(), &rows).unwrap();

        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 6);

        let ids = batch
            .column(0)
            .as_any()
            .downcast_ref::<UInt64Array>()
            .unwrap();
        assert_eq!(ids.value(1), 2);

        let active = batch
            .column(1)
            .as_any()
            .downcast_ref::<BooleanArray>()
            .unwrap();
        assert!(active.value(0));

        let totals = batch
            .column(2)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(totals.value(0), "9.99");
        assert!(totals.is_null(1));

        let days = batch
            .column(3)
            .as_any()
            .downcast_ref::<Date32Array>()
            .unwrap();
        assert_eq!(days.value(0), 10);

        let created = batch
            .column(4)
            .as_any()
            .downcast_ref::<TimestampMicrosecondArray>()
            .unwrap();
        assert_eq!(created.value(0), 1_000_000);

        assert_eq!(batch.column(5).null_count(), 2);
    }

    #[test]
    fn test_column_list_must_match_schema() {
        let mut cols = columns();
        cols.swap(0, 1);

        let err = rows_to_record_batch(&schema(), &cols, &[]).unwrap_err();
        assert!(matches!(err, FileError::SchemaMismatch(_)));
    }

    #[test]
    fn test_unrepresentable_value_is_rejected() {
        let mut bad = row(1, Value::Null);
        bad.field_values[0].value = Value::String("abc".into());

        let err = rows_to_record_batch(&schema(), &columns(), &[bad]).unwrap_err();
        assert!(matches!(err, FileError::UnsupportedValue { column, .. } if column == "id"));
    }

    #[test]
    fn test_zero_date_in_not_null_column_is_written_as_null() {
        use crate::sql::mysql::{data_type::arrow_schema_for, row::convert_value};
        use model::schema::table::{ColumnDescriptor, TableDescriptor};
        use mysql_async::{Value as MySqlValue, consts::ColumnType};

        let table = TableDescriptor::new(
            "orders",
            vec![ColumnDescriptor {
                ordinal: 0,
                name: "created_at".into(),
                column_type: "datetime".into(),
                is_nullable: false,
                is_key: false,
            }],
            false,
        );
        let schema: SchemaRef = Arc::new(arrow_schema_for(&table));
        let zero = convert_value(
            MySqlValue::Date(0, 0, 0, 0, 0, 0, 0),
            ColumnType::MYSQL_TYPE_DATETIME,
            false,
        );
        let rows = vec![RowData::new("orders", vec![FieldValue::new("created_at", zero)])];

        let batch = rows_to_record_batch(&schema, &["created_at".to_string()], &rows).unwrap();
        assert_eq!(batch.num_rows(), 1);
        assert!(batch.column(0).is_null(0));
    }

    #[test]
    fn test_tinyint_one_keeps_its_values() {
        use crate::sql::mysql::data_type::arrow_schema_for;
        use model::schema::table::{ColumnDescriptor, TableDescriptor};

        let table = TableDescriptor::new(
            "t",
            vec![ColumnDescriptor {
                ordinal: 0,
                name: "flag".into(),
                column_type: "tinyint(1)".into(),
                is_nullable: false,
                is_key: false,
            }],
            false,
        );
        let schema: SchemaRef = Arc::new(arrow_schema_for(&table));
        let rows = [2, -1, 0]
            .into_iter()
            .map(|v| RowData::new("t", vec![FieldValue::new("flag", Value::Int(v))]))
            .collect::<Vec<_>>();

        let batch = rows_to_record_batch(&schema, &["flag".to_string()], &rows).unwrap();
        let flags = batch
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(flags.values().to_vec(), vec![2, -1, 0]);
    }

    #[test]
    fn test_schema_difference_reports_type_change() {
        let a = Schema::new(vec![Field::new("id", DataType::Int64, false)]);
        let b = Schema::new(vec![Field::new("id", DataType::Utf8, false)]);

        assert!(schema_difference(&a, &a).is_none());
        let diff = schema_difference(&a, &b).unwrap();
        assert!(diff.contains("`id`"), "{diff}");
    }
}
