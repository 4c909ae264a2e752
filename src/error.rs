use std::path::PathBuf;

/// Failures talking to the ledger.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger connection failed: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("ledger query failed: {0}")]
    Query(#[source] sqlx::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum RollupError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("snapshot error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("snapshot column {0} is missing or has an unexpected type")]
    SnapshotColumn(&'static str),

    #[error("export serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl RollupError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, RollupError>;
