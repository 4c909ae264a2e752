// Library crate - pipeline stages, service and HTTP surface

pub mod aggregate;
pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod ledger;
pub mod query;
pub mod service;
pub mod snapshot;
pub mod types;

// Re-export commonly used types
pub use config::Settings;
pub use error::{LedgerError, RollupError};
pub use export::{Envelope, ExportFormat};
pub use ledger::{MySqlLedger, TradeLedger};
pub use service::RollupService;
pub use types::*;
