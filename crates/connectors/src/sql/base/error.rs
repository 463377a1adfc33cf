use planner::query::offsets::CursorError;
use thiserror::Error;

/// All errors coming from the database/query layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// Any MySQL driver error.
    #[error("MySQL error: {0}")]
    MySql(#[from] mysql_async::Error),

    /// The table declares an auto-increment column but no key column could be found.
    #[error("No auto-increment key column found for table `{table}`")]
    MissingKeyColumn { table: String },

    /// A fetched row carries a pagination key that cannot drive the cursor.
    #[error("Invalid value for key column `{column}`: {value}")]
    InvalidKey { column: String, value: String },

    /// Schema introspection returned something unexpected.
    #[error("Introspection error: {0}")]
    Introspection(String),
}

impl From<CursorError> for DbError {
    fn from(err: CursorError) -> Self {
        match err {
            CursorError::InvalidKey { column, value } => DbError::InvalidKey { column, value },
        }
    }
}

/// Errors happening during adapter or connection setup.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The driver failed to establish the connection.
    #[error("MySQL connection failed: {0}")]
    MySql(#[from] mysql_async::Error),
}
