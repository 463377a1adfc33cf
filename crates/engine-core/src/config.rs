use connectors::file::parquet::sink::ExistingFilePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_APPEND_BATCH_SIZE: usize = 10_000;
pub const DEFAULT_SPLIT_BATCH_SIZE: usize = 100_000;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Batch size must be a positive integer, got {0}")]
    InvalidBatchSize(usize),

    #[error("Missing required setting: {0}")]
    MissingField(&'static str),

    #[error("Split mode takes a bare file name, not a path: {0}")]
    InvalidBaseName(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportMode {
    /// One file per batch.
    #[default]
    Split,
    /// One file per table.
    Append,
}

impl ExportMode {
    pub fn default_batch_size(&self) -> usize {
        match self {
            ExportMode::Split => DEFAULT_SPLIT_BATCH_SIZE,
            ExportMode::Append => DEFAULT_APPEND_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputTarget {
    /// Files go to `<dir>/<table>/<base_name>_<index>.parquet`.
    Split {
        dir: PathBuf,
        base_name: Option<String>,
    },
    Append {
        path: PathBuf,
        on_existing: ExistingFilePolicy,
    },
}

impl OutputTarget {
    pub fn mode(&self) -> ExportMode {
        match self {
            OutputTarget::Split { .. } => ExportMode::Split,
            OutputTarget::Append { .. } => ExportMode::Append,
        }
    }
}

/// Settings for a single table export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    pub table_name: String,
    pub batch_size: usize,
    pub output: OutputTarget,
}

impl ExportConfig {
    pub fn builder(table_name: impl Into<String>) -> ExportConfigBuilder {
        ExportConfigBuilder::new(table_name)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.table_name.trim().is_empty() {
            return Err(ConfigError::MissingField("table"));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }
        if let OutputTarget::Split {
            base_name: Some(name),
            ..
        } = &self.output
        {
            // Files land in `<dir>/<table>/`; a separator would point elsewhere.
            let mut components = Path::new(name).components();
            if !matches!(
                (components.next(), components.next()),
                (Some(Component::Normal(_)), None)
            ) {
                return Err(ConfigError::InvalidBaseName(name.clone()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ExportConfigBuilder {
    table_name: String,
    mode: ExportMode,
    batch_size: Option<usize>,
    output_dir: Option<PathBuf>,
    output_file: Option<String>,
    on_existing: ExistingFilePolicy,
}

impl ExportConfigBuilder {
    pub fn new(table_name: impl Into<String>) -> Self {
        ExportConfigBuilder {
            table_name: table_name.into(),
            mode: ExportMode::default(),
            batch_size: None,
            output_dir: None,
            output_file: None,
            on_existing: ExistingFilePolicy::default(),
        }
    }

    pub fn mode(mut self, mode: ExportMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn batch_size(mut self, batch_size: Option<usize>) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn output_file(mut self, file: Option<String>) -> Self {
        self.output_file = file;
        self
    }

    pub fn on_existing(mut self, policy: ExistingFilePolicy) -> Self {
        self.on_existing = policy;
        self
    }

    pub fn build(self) -> Result<ExportConfig, ConfigError> {
        let batch_size = self
            .batch_size
            .unwrap_or_else(|| self.mode.default_batch_size());

        let output = match self.mode {
            ExportMode::Split => OutputTarget::Split {
                dir: self.output_dir.unwrap_or_else(|| PathBuf::from(".")),
                base_name: self.output_file,
            },
            ExportMode::Append => {
                let file = self
                    .output_file
                    .ok_or(ConfigError::MissingField("output-file"))?;
                // A relative file name lands under the output directory when one is given.
                let path = match self.output_dir {
                    Some(dir) => dir.join(file),
                    None => PathBuf::from(file),
                };
                OutputTarget::Append {
                    path,
                    on_existing: self.on_existing,
                }
            }
        };

        let config = ExportConfig {
            table_name: self.table_name,
            batch_size,
            output,
        };
        config.validate()?;
        Ok(config)
    }
}
