use async_trait::async_trait;
use connectors::sql::base::{
    adapter::SqlAdapter,
    error::DbError,
    query::generator::QueryGenerator,
    requests::FetchRowsRequest,
};
use model::{
    core::value::{FieldValue, Value},
    pagination::cursor::Cursor,
    records::row::RowData,
};
use planner::query::dialect::MySql;
use std::collections::HashMap;

/// One row of `SHOW COLUMNS` output.
#[derive(Debug, Clone)]
pub struct MemoryColumn {
    pub name: String,
    pub column_type: String,
    pub nullable: bool,
    pub key: String,
    pub extra: String,
}

impl MemoryColumn {
    pub fn new(name: &str, column_type: &str, nullable: bool) -> Self {
        MemoryColumn {
            name: name.to_string(),
            column_type: column_type.to_string(),
            nullable,
            key: String::new(),
            extra: String::new(),
        }
    }

    pub fn auto_increment_key(mut self) -> Self {
        self.key = "PRI".into();
        self.extra = "auto_increment".into();
        self
    }
}

#[derive(Debug, Clone)]
pub struct MemoryTable {
    pub name: String,
    pub columns: Vec<MemoryColumn>,
    pub rows: Vec<Vec<Value>>,
    /// Overrides the generated `SHOW CREATE TABLE` text.
    pub ddl: Option<String>,
}

impl MemoryTable {
    pub fn new(name: &str, columns: Vec<MemoryColumn>) -> Self {
        MemoryTable {
            name: name.to_string(),
            columns,
            rows: Vec::new(),
            ddl: None,
        }
    }

    pub fn create_table_sql(&self) -> String {
        if let Some(ddl) = &self.ddl {
            return ddl.clone();
        }

        let columns = self
            .columns
            .iter()
            .map(|c| {
                format!(
                    "  `{}` {}{}{}",
                    c.name,
                    c.column_type,
                    if c.nullable { "" } else { " NOT NULL" },
                    if c.extra.is_empty() {
                        String::new()
                    } else {
                        format!(" {}", c.extra.to_uppercase())
                    }
                )
            })
            .collect::<Vec<_>>()
            .join(",\n");
        format!(
            "CREATE TABLE `{}` (\n{}\n) ENGINE=InnoDB",
            self.name, columns
        )
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(column))
    }

    fn to_row_data(&self, values: &[Value]) -> RowData {
        let fields = self
            .columns
            .iter()
            .zip(values.iter())
            .map(|(c, v)| FieldValue::new(c.name.clone(), v.clone()))
            .collect();
        RowData::new(&self.name, fields)
    }
}

/// An in-memory stand-in for a MySQL session.
///
/// It answers the two introspection statements and evaluates paginated
/// fetches directly against the request's cursor. Every rendered fetch is
/// recorded so tests can check the SQL that would have been sent.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    tables: HashMap<String, MemoryTable>,
    pub statements: Vec<String>,
    pub fetches: Vec<(String, Vec<Value>)>,
    /// Fail the n-th fetch (zero-based) with a driver-like error.
    pub fail_on_fetch: Option<usize>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: MemoryTable) -> Self {
        self.tables.insert(table.name.to_lowercase(), table);
        self
    }

    fn table(&self, name: &str) -> Result<&MemoryTable, DbError> {
        self.tables
            .get(&name.to_lowercase())
            .ok_or_else(|| DbError::Introspection(format!("Table '{name}' doesn't exist")))
    }
}

/// Extracts the backtick-quoted identifier at the end of an introspection statement.
fn quoted_table(sql: &str) -> Option<String> {
    let start = sql.find('`')?;
    let end = sql.rfind('`')?;
    (end > start).then(|| sql[start + 1..end].replace("``", "`"))
}

#[async_trait]
impl SqlAdapter for MemoryAdapter {
    async fn query_rows(&mut self, sql: &str) -> Result<Vec<RowData>, DbError> {
        self.statements.push(sql.to_string());

        let name = quoted_table(sql)
            .ok_or_else(|| DbError::Introspection(format!("Unsupported statement: {sql}")))?;
        let table = self.table(&name)?;

        if sql.starts_with("SHOW CREATE TABLE") {
            return Ok(vec![RowData::new(
                "",
                vec![
                    FieldValue::new("Table", Value::String(table.name.clone())),
                    FieldValue::new("Create Table", Value::String(table.create_table_sql())),
                ],
            )]);
        }

        if sql.starts_with("SHOW COLUMNS FROM") {
            let text = |v: &str| Value::String(v.to_string());
            return Ok(table
                .columns
                .iter()
                .map(|c| {
                    RowData::new(
                        "",
                        vec![
                            FieldValue::new("Field", text(&c.name)),
                            FieldValue::new("Type", text(&c.column_type)),
                            FieldValue::new("Null", text(if c.nullable { "YES" } else { "NO" })),
                            FieldValue::new("Key", text(&c.key)),
                            FieldValue::new("Default", Value::Null),
                            FieldValue::new("Extra", text(&c.extra)),
                        ],
                    )
                })
                .collect());
        }

        Err(DbError::Introspection(format!("Unsupported statement: {sql}")))
    }

    async fn fetch_rows(&mut self, request: &FetchRowsRequest) -> Result<Vec<RowData>, DbError> {
        let rendered = QueryGenerator::new(&MySql).select(request);
        let attempt = self.fetches.len();
        self.fetches.push(rendered);

        if self.fail_on_fetch == Some(attempt) {
            return Err(DbError::Introspection("Lost connection to MySQL server during query".into()));
        }

        let table = self.table(&request.table)?;
        let rows: Vec<&Vec<Value>> = match &request.cursor {
            Cursor::Pk { pk_col, id } => {
                let key = table.position(pk_col).ok_or_else(|| {
                    DbError::Introspection(format!("Unknown column '{pk_col}'"))
                })?;
                let mut matching = table
                    .rows
                    .iter()
                    .filter(|row| row[key].as_u64().is_some_and(|v| v > *id))
                    .collect::<Vec<_>>();
                matching.sort_by_key(|row| row[key].as_u64());
                matching.into_iter().take(request.limit).collect()
            }
            Cursor::Default { offset } => table
                .rows
                .iter()
                .skip(*offset)
                .take(request.limit)
                .collect(),
        };

        Ok(rows.into_iter().map(|r| table.to_row_data(r)).collect())
    }
}
