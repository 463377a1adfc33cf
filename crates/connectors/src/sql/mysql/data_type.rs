use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use model::schema::table::TableDescriptor;

/// Maps a MySQL `COLUMN_TYPE` string (e.g. `int(10) unsigned`) to an Arrow type.
pub fn mysql_type_to_arrow(mysql_type: &str) -> DataType {
    let type_lower = mysql_type.trim().to_lowercase();
    let is_unsigned = type_lower.contains("unsigned");

    let base_type = type_lower
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or_default();

    match base_type {
        "bool" | "boolean" => DataType::Boolean,
        "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" => {
            if is_unsigned {
                DataType::UInt64
            } else {
                DataType::Int64
            }
        }
        "year" => DataType::Int64,
        "float" | "double" | "real" => DataType::Float64,
        "decimal" | "numeric" | "dec" | "fixed" => DataType::Utf8,
        "binary" | "varbinary" | "blob" | "tinyblob" | "mediumblob" | "longblob" | "bit" => {
            DataType::Binary
        }
        "date" => DataType::Date32,
        "datetime" => DataType::Timestamp(TimeUnit::Microsecond, None),
        "timestamp" => DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
        // char/varchar/text variants, enum, set, json, time and anything unknown
        _ => DataType::Utf8,
    }
}

/// The Arrow schema every batch of `table` is written with.
pub fn arrow_schema_for(table: &TableDescriptor) -> Schema {
    let fields = table
        .columns
        .iter()
        .map(|col| {
            let data_type = mysql_type_to_arrow(&col.column_type);
            // Zero dates are read as NULL even in NOT NULL columns.
            let nullable = col.is_nullable
                || matches!(data_type, DataType::Date32 | DataType::Timestamp(..));
            Field::new(&col.name, data_type, nullable)
        })
        .collect::<Vec<_>>();

    Schema::new(fields)
}
