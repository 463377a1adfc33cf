use chrono::{NaiveDate, NaiveDateTime};
use serde::de::IgnoredAny;
use model::{
    core::value::{FieldValue, Value},
    records::row::RowData,
};
use mysql_async::{Row as MySqlRow, Value as MySqlValue, consts::ColumnType};

/// `binary` collation id; blobs and strings carrying it hold raw bytes.
const BINARY_CHARSET: u16 = 63;

/// Converts a driver row into a `RowData`, keeping the column order.
pub fn to_row_data(mut row: MySqlRow, table: &str) -> RowData {
    let columns = row.columns();
    let field_values = columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let raw = row.take::<MySqlValue, usize>(idx).unwrap_or(MySqlValue::NULL);
            let is_binary = column.character_set() == BINARY_CHARSET;
            FieldValue::new(
                column.name_str().into_owned(),
                convert_value(raw, column.column_type(), is_binary),
            )
        })
        .collect();

    RowData::new(table, field_values)
}

/// Maps a wire value to a model value.
///
/// Prepared statements deliver typed values; the text protocol delivers
/// everything as bytes, so those are interpreted through the column type.
pub fn convert_value(raw: MySqlValue, column_type: ColumnType, is_binary: bool) -> Value {
    match raw {
        MySqlValue::NULL => Value::Null,
        MySqlValue::Int(v) => Value::Int(v),
        MySqlValue::UInt(v) => Value::Uint(v),
        MySqlValue::Float(v) => Value::Float(f64::from(v)),
        MySqlValue::Double(v) => Value::Float(v),
        MySqlValue::Date(year, month, day, hour, minute, second, micros) => {
            convert_date(column_type, year, month, day, hour, minute, second, micros)
        }
        MySqlValue::Time(negative, days, hours, minutes, seconds, micros) => {
            Value::Time(format_time(negative, days, hours, minutes, seconds, micros))
        }
        MySqlValue::Bytes(bytes) => convert_bytes(bytes, column_type, is_binary),
    }
}

#[allow(clippy::too_many_arguments)]
fn convert_date(
    column_type: ColumnType,
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    micros: u32,
) -> Value {
    // Zero dates ('0000-00-00') have no calendar representation.
    let Some(date) = NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
    else {
        return Value::Null;
    };

    if matches!(
        column_type,
        ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE
    ) {
        return Value::Date(date);
    }

    date.and_hms_micro_opt(
        u32::from(hour),
        u32::from(minute),
        u32::from(second),
        micros,
    )
    .map(|dt| Value::Timestamp(dt.and_utc()))
    .unwrap_or(Value::Null)
}

fn format_time(negative: bool, days: u32, hours: u8, minutes: u8, seconds: u8, micros: u32) -> String {
    let sign = if negative { "-" } else { "" };
    let total_hours = days * 24 + u32::from(hours);
    if micros == 0 {
        format!("{sign}{total_hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{sign}{total_hours:02}:{minutes:02}:{seconds:02}.{micros:06}")
    }
}

fn convert_bytes(bytes: Vec<u8>, column_type: ColumnType, is_binary: bool) -> Value {
    use ColumnType::*;

    match column_type {
        MYSQL_TYPE_DECIMAL | MYSQL_TYPE_NEWDECIMAL => Value::Decimal(text(&bytes)),
        // Only validated; the server's text is kept as is.
        MYSQL_TYPE_JSON if serde_json::from_slice::<IgnoredAny>(&bytes).is_ok() => {
            Value::Json(text(&bytes))
        }
        MYSQL_TYPE_TINY | MYSQL_TYPE_SHORT | MYSQL_TYPE_LONG | MYSQL_TYPE_INT24
        | MYSQL_TYPE_LONGLONG | MYSQL_TYPE_YEAR => {
            let s = text(&bytes);
            if let Ok(v) = s.parse::<i64>() {
                Value::Int(v)
            } else if let Ok(v) = s.parse::<u64>() {
                Value::Uint(v)
            } else {
                Value::String(s)
            }
        }
        MYSQL_TYPE_FLOAT | MYSQL_TYPE_DOUBLE => {
            let s = text(&bytes);
            s.parse::<f64>().map(Value::Float).unwrap_or(Value::String(s))
        }
        MYSQL_TYPE_DATE | MYSQL_TYPE_NEWDATE => {
            let s = text(&bytes);
            NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map(Value::Date)
                .unwrap_or(Value::Null)
        }
        MYSQL_TYPE_DATETIME | MYSQL_TYPE_TIMESTAMP => {
            let s = text(&bytes);
            NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S%.f")
                .map(|dt| Value::Timestamp(dt.and_utc()))
                .unwrap_or(Value::Null)
        }
        MYSQL_TYPE_TIME => Value::Time(text(&bytes)),
        MYSQL_TYPE_BIT | MYSQL_TYPE_GEOMETRY => Value::Bytes(bytes),
        MYSQL_TYPE_TINY_BLOB | MYSQL_TYPE_MEDIUM_BLOB | MYSQL_TYPE_LONG_BLOB | MYSQL_TYPE_BLOB
        | MYSQL_TYPE_STRING | MYSQL_TYPE_VAR_STRING | MYSQL_TYPE_VARCHAR
            if is_binary =>
        {
            Value::Bytes(bytes)
        }
        _ => Value::String(text(&bytes)),
    }
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_typed_values_pass_through() {
        assert_eq!(
            convert_value(MySqlValue::Int(-3), ColumnType::MYSQL_TYPE_LONG, false),
            Value::Int(-3)
        );
        assert_eq!(
            convert_value(MySqlValue::UInt(7), ColumnType::MYSQL_TYPE_LONGLONG, false),
            Value::Uint(7)
        );
        assert_eq!(
            convert_value(MySqlValue::NULL, ColumnType::MYSQL_TYPE_VARCHAR, false),
            Value::Null
        );
    }

    #[test]
    fn test_dates_follow_column_type() {
        let date = convert_value(
            MySqlValue::Date(2024, 1, 31, 0, 0, 0, 0),
            ColumnType::MYSQL_TYPE_DATE,
            false,
        );
        assert_eq!(date, Value::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()));

        let ts = convert_value(
            MySqlValue::Date(2024, 1, 31, 10, 20, 30, 0),
            ColumnType::MYSQL_TYPE_DATETIME,
            false,
        );
        assert_eq!(
            ts,
            Value::Timestamp(Utc.with_ymd_and_hms(2024, 1, 31, 10, 20, 30).unwrap())
        );
    }

    #[test]
    fn test_zero_date_is_null() {
        assert_eq!(
            convert_value(
                MySqlValue::Date(0, 0, 0, 0, 0, 0, 0),
                ColumnType::MYSQL_TYPE_DATETIME,
                false
            ),
            Value::Null
        );
    }

    #[test]
    fn test_json_keeps_server_text() {
        let doc = r#"{"z": 1, "a": 12345678901234567890123}"#;
        assert_eq!(
            convert_value(
                MySqlValue::Bytes(doc.as_bytes().to_vec()),
                ColumnType::MYSQL_TYPE_JSON,
                false
            ),
            Value::Json(doc.into())
        );
    }

    #[test]
    fn test_time_is_rendered_as_text() {
        assert_eq!(
            convert_value(
                MySqlValue::Time(true, 1, 2, 3, 4, 0),
                ColumnType::MYSQL_TYPE_TIME,
                false
            ),
            Value::Time("-26:03:04".into())
        );
    }

    #[test]
    fn test_bytes_interpreted_by_column_type() {
        let bytes = |s: &str| MySqlValue::Bytes(s.as_bytes().to_vec());

        assert_eq!(
            convert_value(bytes("12.50"), ColumnType::MYSQL_TYPE_NEWDECIMAL, false),
            Value::Decimal("12.50".into())
        );
        assert_eq!(
            convert_value(bytes("42"), ColumnType::MYSQL_TYPE_LONG, false),
            Value::Int(42)
        );
        assert_eq!(
            convert_value(bytes("{not json"), ColumnType::MYSQL_TYPE_JSON, false),
            Value::String("{not json".into())
        );
        assert_eq!(
            convert_value(bytes("hello"), ColumnType::MYSQL_TYPE_VAR_STRING, false),
            Value::String("hello".into())
        );
        assert_eq!(
            convert_value(bytes("raw"), ColumnType::MYSQL_TYPE_BLOB, true),
            Value::Bytes(b"raw".to_vec())
        );
        assert_eq!(
            convert_value(bytes("2024-03-01"), ColumnType::MYSQL_TYPE_DATE, false),
            Value::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
    }
}
