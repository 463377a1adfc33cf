use clap::{Parser, ValueEnum};
use connectors::file::parquet::sink::ExistingFilePolicy;
use engine_core::config::{ConfigError, ExportConfig, ExportMode};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "tabledump",
    version = "0.1.0",
    about = "Fetch records from a MySQL table in batches and save them as Parquet"
)]
pub struct Cli {
    /// The host of the MySQL database.
    #[arg(long)]
    pub host: String,

    #[arg(long, default_value_t = 3306)]
    pub port: u16,

    /// The MySQL user to connect with.
    #[arg(long)]
    pub user: String,

    /// The password for the MySQL user.
    #[arg(long)]
    pub password: String,

    /// The name of the database to connect to.
    #[arg(long)]
    pub database: String,

    /// The name of the table to export.
    #[arg(long)]
    pub table: String,

    /// `split` writes one file per batch, `append` one file per table.
    #[arg(long, value_enum, default_value_t = Mode::Split)]
    pub mode: Mode,

    /// Target file in append mode; base file name in split mode.
    #[arg(long)]
    pub output_file: Option<String>,

    /// Directory the output is written under.
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Rows per batch (default: 10000 in append mode, 100000 in split mode).
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// What to do when the append target already exists.
    #[arg(long, value_enum, default_value_t = OnExisting::Abort)]
    pub on_existing: OnExisting,

    /// Connect without TLS.
    #[arg(long)]
    pub no_tls: bool,

    /// Write a JSON summary of the run to this path.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Split,
    Append,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnExisting {
    Abort,
    Overwrite,
    Append,
}

impl From<Mode> for ExportMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Split => ExportMode::Split,
            Mode::Append => ExportMode::Append,
        }
    }
}

impl From<OnExisting> for ExistingFilePolicy {
    fn from(policy: OnExisting) -> Self {
        match policy {
            OnExisting::Abort => ExistingFilePolicy::Abort,
            OnExisting::Overwrite => ExistingFilePolicy::Overwrite,
            OnExisting::Append => ExistingFilePolicy::Append,
        }
    }
}

impl Cli {
    pub fn export_config(&self) -> Result<ExportConfig, ConfigError> {
        ExportConfig::builder(self.table.clone())
            .mode(self.mode.into())
            .batch_size(self.batch_size)
            .output_dir(self.output_dir.clone())
            .output_file(self.output_file.clone())
            .on_existing(self.on_existing.into())
            .build()
    }
}
