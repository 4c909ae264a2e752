//! Ledger access
//!
//! The ledger is read through the [`TradeLedger`] trait. [`MySqlLedger`]
//! opens a fresh connection for every call and always closes it before
//! returning.

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::Connection;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::LedgerError;
use crate::query::{QueryParam, TradeQuery};
use crate::types::TradeRecord;

#[async_trait]
pub trait TradeLedger: Send + Sync {
    /// All trades qualifying for `query`, in ledger order.
    async fn fetch_trades(&self, query: &TradeQuery) -> Result<Vec<TradeRecord>, LedgerError>;
}

pub struct MySqlLedger {
    options: MySqlConnectOptions,
    schema: String,
}

impl MySqlLedger {
    pub fn new(settings: &Settings) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&settings.db_host)
            .port(settings.db_port)
            .username(&settings.db_user)
            .password(&settings.db_password)
            .database(&settings.db_name)
            .charset(&settings.db_charset);

        Self {
            options,
            schema: settings.ledger_schema.clone(),
        }
    }
}

#[async_trait]
impl TradeLedger for MySqlLedger {
    async fn fetch_trades(&self, query: &TradeQuery) -> Result<Vec<TradeRecord>, LedgerError> {
        let built = query.to_sql(&self.schema);
        debug!(sql = %built.sql, params = built.params.len(), "Querying ledger");

        let mut conn = MySqlConnection::connect_with(&self.options)
            .await
            .map_err(LedgerError::Connect)?;

        let mut statement = sqlx::query_as::<_, TradeRecord>(&built.sql);
        for param in &built.params {
            statement = match param {
                QueryParam::Text(value) => statement.bind(value.clone()),
                QueryParam::DateTime(value) => statement.bind(*value),
            };
        }
        let result = statement.fetch_all(&mut conn).await.map_err(LedgerError::Query);

        if let Err(e) = conn.close().await {
            warn!("Failed to close ledger connection: {}", e);
        }

        result
    }
}
