use connectors::sql::base::error::ConnectorError;
use engine_core::{config::ConfigError, error::ExportError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid arguments: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to connect to the database: {0}")]
    Connector(#[from] ConnectorError),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error("Failed to write the report: {0}")]
    ReportWrite(#[from] std::io::Error),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),
}
