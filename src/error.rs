use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Schema mismatch: column '{column}' required by {operation} is not present")]
    SchemaMismatch { column: String, operation: &'static str },

    #[error("Failed to read source table '{}': {source}", path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to write table to '{}': {source}", path.display())]
    SinkWrite {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EtlError {
    pub fn schema_mismatch(column: impl Into<String>, operation: &'static str) -> Self {
        EtlError::SchemaMismatch {
            column: column.into(),
            operation,
        }
    }

    pub fn source_read(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        EtlError::SourceRead {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn sink_write(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        EtlError::SinkWrite {
            path: path.into(),
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
