//! JSON export artifacts and response envelopes

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::error::{Result, RollupError};
use crate::snapshot::ensure_parent;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// A single JSON array of row objects
    #[default]
    Array,
    /// One JSON object per line
    Ndjson,
}

/// Render rows in `format`. Identical input gives identical bytes.
pub fn render<T: Serialize>(rows: &[T], format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Array => Ok(serde_json::to_vec(rows)?),
        ExportFormat::Ndjson => {
            let mut out = Vec::new();
            for row in rows {
                serde_json::to_writer(&mut out, row)?;
                out.push(b'\n');
            }
            Ok(out)
        }
    }
}

/// Overwrite the artifact at `path`, creating its directory if needed.
pub fn write_export<T: Serialize>(path: &Path, rows: &[T], format: ExportFormat) -> Result<()> {
    let dir = ensure_parent(path)?;
    let bytes = render(rows, format)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| RollupError::io(dir, e))?;
    tmp.write_all(&bytes).map_err(|e| RollupError::io(path, e))?;
    tmp.persist(path).map_err(|e| RollupError::io(path, e.error))?;

    info!("Exported {} rows to {:?}", rows.len(), path);
    Ok(())
}

/// Outcome of one service call as the dashboard sees it.
///
/// Serializes as `{"ok": true, ...fields of T}` or, on failure, as
/// `{"ok": false, ...fields of T::default(), "error": "..."}` so the data
/// keys are present either way.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    Success(T),
    Failure(String),
}

impl<T> Envelope<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl<T> From<std::result::Result<T, RollupError>> for Envelope<T> {
    fn from(result: std::result::Result<T, RollupError>) -> Self {
        match result {
            Ok(data) => Self::Success(data),
            Err(e) => Self::Failure(e.to_string()),
        }
    }
}

#[derive(Serialize)]
struct Wire<'a, T> {
    ok: bool,
    #[serde(flatten)]
    data: &'a T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl<T: Serialize + Default> Serialize for Envelope<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let empty;
        let wire = match self {
            Self::Success(data) => Wire {
                ok: true,
                data,
                error: None,
            },
            Self::Failure(error) => {
                empty = T::default();
                Wire {
                    ok: false,
                    data: &empty,
                    error: Some(error.as_str()),
                }
            }
        };
        wire.serialize(serializer)
    }
}
