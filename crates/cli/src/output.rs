use crate::error::CliError;
use engine_core::export::ExportSummary;
use std::path::Path;
use tracing::info;

fn generate_report_json(summary: &ExportSummary) -> Result<String, CliError> {
    let json = serde_json::to_string_pretty(summary)?;
    Ok(json)
}

pub async fn write_report(summary: &ExportSummary, path: &Path) -> Result<(), CliError> {
    let json = generate_report_json(summary)?;
    tokio::fs::write(path, json).await?;
    info!("Report written to {}", path.display());
    Ok(())
}
