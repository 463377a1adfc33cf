use crate::sql::{
    base::{
        adapter::SqlAdapter,
        error::{ConnectorError, DbError},
        query::generator::QueryGenerator,
        requests::FetchRowsRequest,
    },
    mysql::{params::MySqlParamStore, row::to_row_data},
};
use async_trait::async_trait;
use model::records::row::RowData;
use mysql_async::{Conn, Opts, Row, prelude::Queryable};
use planner::query::dialect;
use tracing::{debug, info};

pub struct MySqlAdapter {
    conn: Conn,
    dialect: dialect::MySql,
}

impl MySqlAdapter {
    pub async fn connect(opts: Opts) -> Result<Self, ConnectorError> {
        let conn = Conn::new(opts).await?;
        let (major, minor, patch) = conn.server_version();
        info!("Connected to MySQL server {major}.{minor}.{patch}");
        Ok(MySqlAdapter {
            conn,
            dialect: dialect::MySql,
        })
    }

    /// Closes the session. Consumes the adapter so it cannot be used afterwards.
    pub async fn disconnect(self) -> Result<(), DbError> {
        self.conn.disconnect().await?;
        info!("Disconnected from MySQL");
        Ok(())
    }
}

#[async_trait]
impl SqlAdapter for MySqlAdapter {
    async fn query_rows(&mut self, sql: &str) -> Result<Vec<RowData>, DbError> {
        debug!("Executing: {}", sql);
        let rows: Vec<Row> = self.conn.query(sql).await?;
        Ok(rows.into_iter().map(|row| to_row_data(row, "")).collect())
    }

    async fn fetch_rows(&mut self, request: &FetchRowsRequest) -> Result<Vec<RowData>, DbError> {
        let generator = QueryGenerator::new(&self.dialect);
        let (sql, params) = generator.select(request);

        debug!("Generated SQL: {}", sql);
        debug!("Parameters: {:?}", params);

        let params = MySqlParamStore::from_values(&params).params();
        let rows: Vec<Row> = self.conn.exec(sql, params).await?;

        Ok(rows
            .into_iter()
            .map(|row| to_row_data(row, &request.table))
            .collect())
    }
}
