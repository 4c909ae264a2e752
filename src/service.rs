//! Aggregation runs
//!
//! Each call runs the full pipeline (query, materialize, aggregate, export)
//! to completion and reports the result as an [`Envelope`]. Ledger and
//! filesystem failures end the run and become `Envelope::Failure`; they
//! never escape as errors.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::aggregate::{hourly_profit, trade_summary};
use crate::config::Settings;
use crate::error::{Result, RollupError};
use crate::export::{write_export, Envelope, ExportFormat};
use crate::ledger::TradeLedger;
use crate::query::TradeQuery;
use crate::snapshot::{read_snapshot, write_snapshot};
use crate::types::{wall_clock, HourlyProfit, TimeColumn, TradeRecord, TradeSummaryRow};

fn default_symbol() -> String {
    "XAUUSD".to_string()
}

/// Hourly profit request for one symbol over an inclusive window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowRequest {
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(with = "wall_clock")]
    pub start: NaiveDateTime,
    #[serde(with = "wall_clock")]
    pub end: NaiveDateTime,
    #[serde(default)]
    pub time_column: TimeColumn,
    /// Return the rows in the response instead of writing the export file
    #[serde(default)]
    pub inline: bool,
    /// Export layout for this run; falls back to the configured format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ExportFormat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub date: NaiveDate,
    pub symbol: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WindowExport {
    /// Path of the written export artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<HourlyProfit>>,
    /// Number of raw trades that went into the aggregate
    pub rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TradeSummary {
    pub rows: Vec<TradeSummaryRow>,
}

pub struct RollupService {
    settings: Arc<Settings>,
    ledger: Arc<dyn TradeLedger>,
}

impl RollupService {
    pub fn new(settings: Arc<Settings>, ledger: Arc<dyn TradeLedger>) -> Self {
        Self { settings, ledger }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Fetch qualifying trades and, when `snapshot` is given, persist them
    /// there before returning.
    pub async fn materialize(&self, query: &TradeQuery, snapshot: Option<&Path>) -> Result<Vec<TradeRecord>> {
        let trades = self.ledger.fetch_trades(query).await?;
        if let Some(path) = snapshot {
            write_snapshot(path, &trades)?;
        }
        Ok(trades)
    }

    /// Hourly profit for `request`, exported to the well-known path unless
    /// the request asks for inline data.
    pub async fn hourly(&self, request: &WindowRequest) -> Envelope<WindowExport> {
        let span = info_span!(
            "hourly",
            run_id = %Uuid::new_v4(),
            symbol = %request.symbol,
            column = %request.time_column,
        );
        let result = self.try_hourly(request).instrument(span.clone()).await;
        span.in_scope(|| report(result))
    }

    async fn try_hourly(&self, request: &WindowRequest) -> Result<WindowExport> {
        let column = request.time_column;
        let query = TradeQuery::window(&request.symbol, column, request.start, request.end)?;
        info!("Aggregating {} to {}", request.start, request.end);

        let snapshot = self.settings.snapshot_path(column);
        let trades = self.materialize(&query, Some(&snapshot)).await?;
        let hourly = hourly_profit(&trades, column);
        info!(trades = trades.len(), buckets = hourly.len(), "Hourly roll-up complete");

        if request.inline {
            return Ok(WindowExport {
                json: None,
                data: Some(hourly),
                rows: trades.len(),
            });
        }

        let path = self.settings.export_path(column);
        let format = request.format.unwrap_or(self.settings.export_format);
        write_export(&path, &hourly, format)?;
        Ok(WindowExport {
            json: Some(path.display().to_string()),
            data: None,
            rows: trades.len(),
        })
    }

    /// Rebuild the hourly export from the last snapshot without querying
    /// the ledger.
    pub fn reaggregate(&self, column: TimeColumn) -> Envelope<WindowExport> {
        let span = info_span!("reaggregate", run_id = %Uuid::new_v4(), column = %column);
        span.in_scope(|| report(self.try_reaggregate(column)))
    }

    fn try_reaggregate(&self, column: TimeColumn) -> Result<WindowExport> {
        let trades = read_snapshot(&self.settings.snapshot_path(column))?;
        let hourly = hourly_profit(&trades, column);
        info!(trades = trades.len(), buckets = hourly.len(), "Re-aggregated snapshot");

        let path = self.settings.export_path(column);
        write_export(&path, &hourly, self.settings.export_format)?;
        Ok(WindowExport {
            json: Some(path.display().to_string()),
            data: None,
            rows: trades.len(),
        })
    }

    /// Open / closed-today / closed-yesterday breakdown for `request.date`.
    pub async fn summary(&self, request: &SummaryRequest) -> Envelope<TradeSummary> {
        let span = info_span!(
            "summary",
            run_id = %Uuid::new_v4(),
            symbol = %request.symbol,
            date = %request.date,
        );
        let result = self.try_summary(request).instrument(span.clone()).await;
        span.in_scope(|| report(result))
    }

    async fn try_summary(&self, request: &SummaryRequest) -> Result<TradeSummary> {
        let query = TradeQuery::daily(&request.symbol, request.date)?;
        let trades = self.materialize(&query, None).await?;

        let bounds = query
            .day_bounds()
            .ok_or_else(|| RollupError::InvalidRequest("daily query without bounds".into()))?;
        let rows = trade_summary(&trades, bounds);
        info!(trades = trades.len(), groups = rows.len(), "Trade summary complete");
        Ok(TradeSummary { rows })
    }
}

fn report<T>(result: Result<T>) -> Envelope<T> {
    if let Err(e) = &result {
        warn!("Run failed: {}", e);
    }
    result.into()
}
