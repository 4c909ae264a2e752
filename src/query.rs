//! Trade query construction
//!
//! A [`TradeQuery`] describes which ledger trades qualify for an aggregation.
//! It renders to a fully parameterized MySQL statement and can also be
//! evaluated against in-memory records.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::RollupError;
use crate::filter::ExclusionPolicy;
use crate::types::{Account, DayBounds, TimeColumn, TradeRecord, SENTINEL_EPOCH};

const TRADE_COLUMNS: &str = "t.ticket AS ticket, t.login AS login, t.symbol AS symbol, \
     t.cmd AS cmd, t.volume AS volume, t.OPEN_TIME AS open_time, t.OPEN_PRICE AS open_price, \
     t.CLOSE_TIME AS close_time, t.CLOSE_PRICE AS close_price, t.swaps AS swaps, t.profit AS profit";

/// A positional parameter for a `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    Text(String),
    DateTime(NaiveDateTime),
}

/// SQL text plus its parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<QueryParam>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryScope {
    /// `column BETWEEN start AND end`, inclusive.
    Window {
        column: TimeColumn,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    /// Still open, or closed between yesterday's and tomorrow's midnight.
    Daily(DayBounds),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeQuery {
    pub symbol: String,
    pub scope: QueryScope,
    pub exclusion: ExclusionPolicy,
}

impl TradeQuery {
    pub fn window(
        symbol: impl Into<String>,
        column: TimeColumn,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Self, RollupError> {
        if start > end {
            return Err(RollupError::InvalidRequest(format!(
                "start {} is after end {}",
                start, end
            )));
        }
        Ok(Self {
            symbol: symbol.into(),
            scope: QueryScope::Window { column, start, end },
            exclusion: ExclusionPolicy::default(),
        })
    }

    pub fn daily(symbol: impl Into<String>, date: NaiveDate) -> Result<Self, RollupError> {
        Ok(Self {
            symbol: symbol.into(),
            scope: QueryScope::Daily(DayBounds::for_date(date)?),
            exclusion: ExclusionPolicy::default(),
        })
    }

    /// Render against `schema`, which must already be a validated identifier.
    pub fn to_sql(&self, schema: &str) -> BuiltQuery {
        let mut params = vec![QueryParam::Text(self.symbol.clone())];
        let mut sql = format!(
            "SELECT {TRADE_COLUMNS} FROM {schema}.mt4_trades t WHERE t.symbol = ?"
        );

        match &self.scope {
            QueryScope::Window { column, start, end } => {
                sql.push_str(&format!(" AND t.{} BETWEEN ? AND ?", column.sql_name()));
                params.push(QueryParam::DateTime(*start));
                params.push(QueryParam::DateTime(*end));
                if *column == TimeColumn::Open {
                    sql.push_str(" AND t.CLOSE_TIME <> ?");
                    params.push(QueryParam::DateTime(SENTINEL_EPOCH));
                }
            }
            QueryScope::Daily(bounds) => {
                sql.push_str(" AND (t.CLOSE_TIME = ? OR (t.CLOSE_TIME >= ? AND t.CLOSE_TIME < ?))");
                params.push(QueryParam::DateTime(SENTINEL_EPOCH));
                params.push(QueryParam::DateTime(bounds.yesterday_start));
                params.push(QueryParam::DateTime(bounds.tomorrow_start));
            }
        }

        sql.push_str(" AND ");
        sql.push_str(&self.exclusion.not_exists_sql(schema, "t"));
        params.extend(
            self.exclusion
                .params()
                .into_iter()
                .map(|p| QueryParam::Text(p.to_string())),
        );

        if let QueryScope::Window { column, .. } = &self.scope {
            sql.push_str(&format!(" ORDER BY t.{}, t.ticket", column.sql_name()));
        }

        BuiltQuery { sql, params }
    }

    /// Whether `trade` qualifies. `account` is the owner's `mt4_users` row, if
    /// any; trades without one are never excluded, as with `NOT EXISTS`.
    pub fn matches(&self, trade: &TradeRecord, account: Option<&Account>) -> bool {
        if trade.symbol != self.symbol {
            return false;
        }

        let in_scope = match &self.scope {
            QueryScope::Window { column, start, end } => {
                let at = column.of(trade);
                at >= *start
                    && at <= *end
                    && (*column == TimeColumn::Close || !trade.is_open())
            }
            QueryScope::Daily(bounds) => {
                trade.is_open()
                    || (trade.close_time >= bounds.yesterday_start
                        && trade.close_time < bounds.tomorrow_start)
            }
        };

        in_scope && !account.is_some_and(|a| self.exclusion.excludes(a))
    }

    pub fn day_bounds(&self) -> Option<&DayBounds> {
        match &self.scope {
            QueryScope::Daily(bounds) => Some(bounds),
            QueryScope::Window { .. } => None,
        }
    }
}
