#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDateTime;
use clap::Parser;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use trade_rollup::query::TradeQuery;
use trade_rollup::{Account, LedgerError, Settings, TradeLedger, TradeRecord, SENTINEL_EPOCH};

/// In-memory ledger evaluating queries with `TradeQuery::matches`. A
/// `failing` ledger refuses every connection.
#[derive(Default)]
pub struct MemoryLedger {
    trades: Vec<TradeRecord>,
    accounts: HashMap<i64, Account>,
    fail_with: Option<String>,
    pub queries: Mutex<Vec<TradeQuery>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trade(mut self, trade: TradeRecord) -> Self {
        self.trades.push(trade);
        self
    }

    pub fn with_account(mut self, login: i64, group: &str, name: &str) -> Self {
        self.accounts.insert(
            login,
            Account {
                login,
                group: group.to_string(),
                name: name.to_string(),
            },
        );
        self
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl TradeLedger for MemoryLedger {
    async fn fetch_trades(&self, query: &TradeQuery) -> Result<Vec<TradeRecord>, LedgerError> {
        self.queries.lock().unwrap().push(query.clone());
        if let Some(message) = &self.fail_with {
            let refused = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, message.clone());
            return Err(LedgerError::Connect(sqlx::Error::Io(refused)));
        }
        Ok(self
            .trades
            .iter()
            .filter(|t| query.matches(t, self.accounts.get(&t.login)))
            .cloned()
            .collect())
    }
}

pub fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

pub struct TradeBuilder(TradeRecord);

impl TradeBuilder {
    pub fn new(ticket: i64, login: i64) -> Self {
        Self(TradeRecord {
            ticket,
            login,
            symbol: "XAUUSD".to_string(),
            cmd: 0,
            volume: 100,
            open_time: dt("2025-06-01 08:00:00"),
            open_price: 2320.0,
            close_time: SENTINEL_EPOCH,
            close_price: 0.0,
            swaps: 0.0,
            profit: 0.0,
        })
    }

    pub fn symbol(mut self, symbol: &str) -> Self {
        self.0.symbol = symbol.to_string();
        self
    }

    pub fn opened(mut self, at: &str) -> Self {
        self.0.open_time = dt(at);
        self
    }

    pub fn closed(mut self, at: &str) -> Self {
        self.0.close_time = dt(at);
        self.0.close_price = self.0.open_price + 1.0;
        self
    }

    pub fn sell(mut self) -> Self {
        self.0.cmd = 1;
        self
    }

    pub fn volume(mut self, volume: i64) -> Self {
        self.0.volume = volume;
        self
    }

    pub fn swaps(mut self, swaps: f64) -> Self {
        self.0.swaps = swaps;
        self
    }

    pub fn profit(mut self, profit: f64) -> Self {
        self.0.profit = profit;
        self
    }

    pub fn build(self) -> TradeRecord {
        self.0
    }
}

pub fn test_settings(root: &Path) -> Settings {
    test_settings_with(root, &[])
}

/// Test settings rooted at `root`, with `extra` command-line flags appended.
pub fn test_settings_with(root: &Path, extra: &[&str]) -> Settings {
    let parquet_dir = root.join("data");
    let public_dir = root.join("public");
    let mut args = vec![
        "trade-rollup",
        "--parquet-dir",
        parquet_dir.to_str().unwrap(),
        "--public-export-dir",
        public_dir.to_str().unwrap(),
        "--ledger-schema",
        "mt4_live",
        "--export-format",
        "array",
    ];
    args.extend_from_slice(extra);
    Settings::try_parse_from(args).unwrap()
}
