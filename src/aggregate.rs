//! Roll-ups over materialized trades
//!
//! Both aggregates use ordered maps so output order is stable: hourly rows by
//! (date, hour), summary rows by (status, settlement, direction). Sums keep
//! the source precision; nothing is rounded here.

use chrono::Timelike;
use std::collections::BTreeMap;

use crate::types::{
    DayBounds, Direction, HourlyProfit, Settlement, StatusGroup, TimeColumn, TradeRecord,
    TradeSummaryRow,
};

/// Profit per wall-clock (date, hour) of `column`, ascending.
pub fn hourly_profit(trades: &[TradeRecord], column: TimeColumn) -> Vec<HourlyProfit> {
    let mut buckets: BTreeMap<_, f64> = BTreeMap::new();

    for trade in trades {
        let at = column.of(trade);
        *buckets.entry((at.date(), at.hour())).or_default() += trade.profit;
    }

    buckets
        .into_iter()
        .map(|((date, hour), profit)| HourlyProfit { date, hour, profit })
        .collect()
}

#[derive(Default)]
struct SummaryTotals {
    volume: i64,
    profit: f64,
}

/// Volume and profit per (status, settlement, direction). Trades that fall
/// outside `bounds` are ignored.
pub fn trade_summary(trades: &[TradeRecord], bounds: &DayBounds) -> Vec<TradeSummaryRow> {
    let mut groups: BTreeMap<(StatusGroup, Settlement, Direction), SummaryTotals> = BTreeMap::new();

    for trade in trades {
        let Some(status) = bounds.classify(trade) else {
            continue;
        };
        let totals = groups
            .entry((status, trade.settlement(), trade.direction()))
            .or_default();
        totals.volume += trade.volume;
        totals.profit += trade.profit;
    }

    groups
        .into_iter()
        .map(|((group, settlement, direction), totals)| TradeSummaryRow {
            group,
            settlement,
            direction,
            total_volume: totals.volume as f64 / 100.0,
            total_profit: totals.profit,
        })
        .collect()
}
