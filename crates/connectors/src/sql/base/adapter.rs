use crate::sql::base::{error::DbError, requests::FetchRowsRequest};
use async_trait::async_trait;
use model::records::row::RowData;

/// A single live session against a relational source.
///
/// Calls take `&mut self`: the exporter issues one statement at a time over
/// one connection and never shares it.
#[async_trait]
pub trait SqlAdapter: Send {
    /// Runs a plain-text statement (used for `SHOW ...` introspection).
    async fn query_rows(&mut self, sql: &str) -> Result<Vec<RowData>, DbError>;

    /// Renders and executes a paginated `SELECT` as a prepared statement.
    async fn fetch_rows(&mut self, request: &FetchRowsRequest) -> Result<Vec<RowData>, DbError>;
}
