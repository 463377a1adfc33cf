use crate::config::ConfigError;
use connectors::{file::parquet::error::FileError, sql::base::error::DbError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error("File error: {0}")]
    File(#[from] FileError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
