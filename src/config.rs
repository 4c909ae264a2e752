//! Process configuration
//!
//! Built once at startup from flags and environment (a `.env` file is loaded
//! first by the binaries) and passed to every component that needs it.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::export::ExportFormat;
use crate::types::TimeColumn;

#[derive(Parser, Debug, Clone)]
pub struct Settings {
    /// Ledger MySQL host
    #[arg(long, env = "DB_HOST", default_value = "127.0.0.1")]
    pub db_host: String,

    /// Ledger MySQL port
    #[arg(long, env = "DB_PORT", default_value = "3306")]
    pub db_port: u16,

    #[arg(long, env = "DB_USER", default_value = "root")]
    pub db_user: String,

    #[arg(long, env = "DB_PASSWORD", default_value = "", hide_env_values = true)]
    pub db_password: String,

    /// Database selected on connect
    #[arg(long, env = "DB_NAME", default_value = "mt4_live")]
    pub db_name: String,

    #[arg(long, env = "DB_CHARSET", default_value = "utf8mb4")]
    pub db_charset: String,

    /// Schema holding mt4_trades and mt4_users
    #[arg(long, env = "LEDGER_SCHEMA", default_value = "mt4_live")]
    pub ledger_schema: String,

    /// Directory for parquet snapshots of raw query results
    #[arg(long, env = "PARQUET_DIR", default_value = "data")]
    pub parquet_dir: PathBuf,

    /// Directory the dashboard reads exported JSON from
    #[arg(long, env = "PUBLIC_EXPORT_DIR", default_value = "public")]
    pub public_export_dir: PathBuf,

    /// Export layout: a JSON array or one object per line
    #[arg(long, env = "EXPORT_FORMAT", value_enum, default_value = "array")]
    pub export_format: ExportFormat,

    /// Allowed CORS origins (comma-separated, "*" for any)
    #[arg(long, env = "CORS_ORIGINS", default_value = "*", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Address the HTTP server listens on
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8000")]
    pub bind_addr: SocketAddr,
}

impl Settings {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !is_identifier(&self.ledger_schema) {
            anyhow::bail!(
                "LEDGER_SCHEMA must be a plain identifier, got {:?}",
                self.ledger_schema
            );
        }
        for origin in self.cors_origins() {
            if origin != "*" {
                origin
                    .parse::<axum::http::HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("invalid CORS origin {:?}: {}", origin, e))?;
            }
        }
        Ok(())
    }

    /// Configured origins with blanks dropped.
    pub fn cors_origins(&self) -> Vec<&str> {
        self.cors_origins
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .collect()
    }

    pub fn snapshot_path(&self, column: TimeColumn) -> PathBuf {
        self.parquet_dir.join(column.snapshot_file_name())
    }

    pub fn export_path(&self, column: TimeColumn) -> PathBuf {
        self.public_export_dir.join(column.export_file_name())
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 64
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
