use crate::{args::Cli, error::CliError};
use clap::Parser;
use connectors::sql::mysql::adapter::MySqlAdapter;
use engine_core::export::export_table;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod args;
mod conn;
mod error;
mod output;

#[tokio::main]
async fn main() -> Result<(), CliError> {
    // Initialize logger
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.export_config()?;

    let mut adapter = MySqlAdapter::connect(conn::mysql_opts(&cli)).await?;

    // The session is closed whatever the export's outcome.
    let result = export_table(&mut adapter, &config).await;
    if let Err(err) = adapter.disconnect().await {
        warn!("Failed to close the MySQL connection: {}", err);
    }
    let summary = result?;

    info!(
        "Done: {} rows of `{}` in {} files",
        summary.rows,
        summary.table,
        summary.files.len()
    );

    if let Some(path) = &cli.report {
        output::write_report(&summary, path).await?;
    }

    Ok(())
}
