use crate::sql::base::{adapter::SqlAdapter, error::DbError, query::generator::QueryGenerator};
use model::{
    records::row::RowData,
    schema::table::{ColumnDescriptor, TableDescriptor},
};
use planner::query::dialect::MySql;
use tracing::{debug, info};

const COL_CREATE_TABLE: &str = "Create Table";
const COL_FIELD: &str = "Field";
const COL_TYPE: &str = "Type";
const COL_NULL: &str = "Null";
const COL_KEY: &str = "Key";
const COL_EXTRA: &str = "Extra";

/// Builds a `TableDescriptor` from `SHOW CREATE TABLE` and `SHOW COLUMNS`.
pub struct SchemaProber;

impl SchemaProber {
    pub async fn probe(
        adapter: &mut dyn SqlAdapter,
        table: &str,
    ) -> Result<TableDescriptor, DbError> {
        let generator = QueryGenerator::new(&MySql);

        let ddl_rows = adapter
            .query_rows(&generator.show_create_table(table))
            .await?;
        let ddl = ddl_rows
            .first()
            .and_then(|row| row.get_value(COL_CREATE_TABLE).as_string())
            .ok_or_else(|| {
                DbError::Introspection(format!("SHOW CREATE TABLE returned nothing for `{table}`"))
            })?;
        let has_auto_increment = declares_auto_increment(&ddl);
        debug!("Table `{}` declares auto-increment: {}", table, has_auto_increment);

        let column_rows = adapter.query_rows(&generator.show_columns(table)).await?;
        let descriptor = describe_table(table, has_auto_increment, &column_rows)?;

        match descriptor.key_column() {
            Some(key) => info!(
                "Table `{}`: {} columns, paginating on key `{}`",
                table,
                descriptor.columns.len(),
                key.name
            ),
            None => info!(
                "Table `{}`: {} columns, no auto-increment key, paginating by offset",
                table,
                descriptor.columns.len()
            ),
        }

        Ok(descriptor)
    }
}

pub fn declares_auto_increment(ddl: &str) -> bool {
    ddl.to_uppercase().contains("AUTO_INCREMENT")
}

/// Turns `SHOW COLUMNS` rows into a descriptor.
///
/// When the table declares auto-increment the key is the column whose
/// `Extra` mentions it. Failing that, the fallback must be a unique integer
/// column: the sole `PRI` column, or a NOT NULL `UNI` one. A non-unique key
/// would skip rows sharing a page boundary.
pub fn describe_table(
    table: &str,
    has_auto_increment: bool,
    column_rows: &[RowData],
) -> Result<TableDescriptor, DbError> {
    if column_rows.is_empty() {
        return Err(DbError::Introspection(format!(
            "SHOW COLUMNS returned no columns for `{table}`"
        )));
    }

    let mut columns = Vec::with_capacity(column_rows.len());
    let mut auto_increment_col = None;
    let mut primary_cols = Vec::new();
    let mut unique_col = None;

    for (ordinal, row) in column_rows.iter().enumerate() {
        let name = row.get_value(COL_FIELD).as_string().ok_or_else(|| {
            DbError::Introspection(format!("Column {ordinal} of `{table}` has no name"))
        })?;
        let column_type = row.get_value(COL_TYPE).as_string().unwrap_or_default();
        let is_nullable = row
            .get_value(COL_NULL)
            .as_string()
            .is_some_and(|v| v.eq_ignore_ascii_case("YES"));
        let key = row.get_value(COL_KEY).as_string().unwrap_or_default();
        let extra = row.get_value(COL_EXTRA).as_string().unwrap_or_default();

        if auto_increment_col.is_none() && extra.to_lowercase().contains("auto_increment") {
            auto_increment_col = Some(ordinal);
        }
        match key.trim().to_uppercase().as_str() {
            "PRI" => primary_cols.push(ordinal),
            "UNI" if unique_col.is_none() && !is_nullable && is_integer_type(&column_type) => {
                unique_col = Some(ordinal)
            }
            _ => {}
        }

        columns.push(ColumnDescriptor {
            ordinal,
            name,
            column_type,
            is_nullable,
            is_key: false,
        });
    }

    if has_auto_increment {
        // A composite primary key is not unique per column.
        let single_primary = match primary_cols.as_slice() {
            [idx] if is_integer_type(&columns[*idx].column_type) => Some(*idx),
            _ => None,
        };
        let key_idx = auto_increment_col
            .or(single_primary)
            .or(unique_col)
            .ok_or_else(|| DbError::MissingKeyColumn {
                table: table.to_string(),
            })?;
        columns[key_idx].is_key = true;
    }

    Ok(TableDescriptor::new(table, columns, has_auto_increment))
}

fn is_integer_type(column_type: &str) -> bool {
    let lower = column_type.trim().to_lowercase();
    let base = lower
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or_default();
    matches!(
        base,
        "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::core::value::{FieldValue, Value};

    fn column_row(field: &str, ty: &str, null: &str, key: &str, extra: &str) -> RowData {
        let text = |v: &str| Value::String(v.to_string());
        RowData::new(
            "",
            vec![
                FieldValue::new(COL_FIELD, text(field)),
                FieldValue::new(COL_TYPE, text(ty)),
                FieldValue::new(COL_NULL, text(null)),
                FieldValue::new(COL_KEY, text(key)),
                FieldValue::new("Default", Value::Null),
                FieldValue::new(COL_EXTRA, text(extra)),
            ],
        )
    }

    #[test]
    fn test_auto_increment_detection_is_case_insensitive() {
        assert!(declares_auto_increment(
            "CREATE TABLE `orders` (`id` int NOT NULL auto_increment)"
        ));
        assert!(!declares_auto_increment("CREATE TABLE `logs` (`msg` text)"));
    }

    #[test]
    fn test_key_comes_from_extra_not_position() {
        let rows = vec![
            column_row("tenant", "int(11)", "NO", "MUL", ""),
            column_row("order_id", "bigint(20) unsigned", "NO", "PRI", "auto_increment"),
            column_row("total", "decimal(10,2)", "YES", "", ""),
        ];

        let table = describe_table("orders", true, &rows).unwrap();
        let key = table.key_column().unwrap();
        assert_eq!(key.name, "order_id");
        assert_eq!(key.ordinal, 1);
        assert!(table.columns[2].is_nullable);
        assert!(!table.columns[0].is_nullable);
    }

    #[test]
    fn test_key_falls_back_to_single_integer_primary() {
        let rows = vec![
            column_row("note", "text", "YES", "", ""),
            column_row("id", "int(11)", "NO", "PRI", ""),
        ];

        let table = describe_table("orders", true, &rows).unwrap();
        assert_eq!(table.key_column().unwrap().name, "id");
    }

    #[test]
    fn test_non_unique_index_is_not_a_key() {
        let rows = vec![
            column_row("grp", "int(11)", "NO", "MUL", ""),
            column_row("note", "text", "YES", "", ""),
        ];

        let err = describe_table("grouped", true, &rows).unwrap_err();
        assert!(matches!(err, DbError::MissingKeyColumn { table } if table == "grouped"));
    }

    #[test]
    fn test_fallback_rejects_composite_and_text_keys() {
        let composite = vec![
            column_row("tenant", "int(11)", "NO", "PRI", ""),
            column_row("seq", "int(11)", "NO", "PRI", ""),
        ];
        assert!(matches!(
            describe_table("t", true, &composite),
            Err(DbError::MissingKeyColumn { .. })
        ));

        let text_key = vec![column_row("code", "varchar(16)", "NO", "PRI", "")];
        assert!(matches!(
            describe_table("t", true, &text_key),
            Err(DbError::MissingKeyColumn { .. })
        ));
    }

    #[test]
    fn test_fallback_accepts_not_null_unique_integer() {
        let rows = vec![
            column_row("maybe", "int(11)", "YES", "UNI", ""),
            column_row("serial", "bigint(20) unsigned", "NO", "UNI", ""),
        ];

        let table = describe_table("t", true, &rows).unwrap();
        assert_eq!(table.key_column().unwrap().name, "serial");
    }

    #[test]
    fn test_missing_key_column_is_fatal() {
        let rows = vec![column_row("note", "text", "YES", "", "")];

        let err = describe_table("orders", true, &rows).unwrap_err();
        assert!(matches!(err, DbError::MissingKeyColumn { table } if table == "orders"));
    }

    #[test]
    fn test_table_without_auto_increment_has_no_key() {
        let rows = vec![
            column_row("id", "int(11)", "NO", "PRI", ""),
            column_row("msg", "text", "YES", "", ""),
        ];

        let table = describe_table("logs", false, &rows).unwrap();
        assert!(table.key_column().is_none());
        let names = table.columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["id", "msg"]);
    }
}
