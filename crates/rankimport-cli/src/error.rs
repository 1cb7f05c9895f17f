use rankimport_warehouse::{ColumnarError, PipelineError, WarehouseError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] rankimport_core::ValidationError),

    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Config(#[from] rankimport_core::ConfigError),

    #[error("no records parsed from {source_name}")]
    NoRecords { source_name: String },

    #[error(transparent)]
    Warehouse(#[from] WarehouseError),

    #[error(transparent)]
    Columnar(#[from] ColumnarError),

    #[error("upload failed: {0}")]
    Storage(#[from] object_store::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to initialize tracing subscriber: {0}")]
    Tracing(String),
}

impl From<PipelineError> for CliError {
    fn from(error: PipelineError) -> Self {
        match error {
            PipelineError::NoRecords { source_name } => Self::NoRecords { source_name },
            PipelineError::Validation(error) => Self::Validation(error),
            PipelineError::Warehouse(error) => Self::Warehouse(error),
            PipelineError::Columnar(error) => Self::Columnar(error),
        }
    }
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Usage(_) => 2,
            Self::Config(_) => 3,
            Self::NoRecords { .. } => 4,
            Self::Warehouse(_)
            | Self::Columnar(_)
            | Self::Storage(_)
            | Self::Serialization(_)
            | Self::Io(_)
            | Self::Tracing(_) => 10,
        }
    }
}
