use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::RollupError;

/// Close time the ledger stores for positions that are still open.
pub const SENTINEL_EPOCH: NaiveDateTime = NaiveDateTime::UNIX_EPOCH;

/// One row of `mt4_trades`, exactly as the ledger stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TradeRecord {
    pub ticket: i64,
    pub login: i64,
    pub symbol: String,
    pub cmd: i32, // 0 = buy, 1 = sell
    pub volume: i64, // lots x 100
    pub open_time: NaiveDateTime,
    pub open_price: f64,
    pub close_time: NaiveDateTime,
    pub close_price: f64,
    pub swaps: f64,
    pub profit: f64,
}

impl TradeRecord {
    pub fn is_open(&self) -> bool {
        self.close_time == SENTINEL_EPOCH
    }

    pub fn direction(&self) -> Direction {
        if self.cmd == 0 {
            Direction::Buy
        } else {
            Direction::Sell
        }
    }

    pub fn settlement(&self) -> Settlement {
        if self.swaps == 0.0 {
            Settlement::SameDay
        } else {
            Settlement::Overnight
        }
    }
}

/// One row of `mt4_users`. Only consulted for exclusion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub login: i64,
    pub group: String,
    pub name: String,
}

/// Which timestamp column drives windowing and hourly bucketing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TimeColumn {
    #[default]
    Open,
    Close,
}

impl TimeColumn {
    pub fn sql_name(self) -> &'static str {
        match self {
            Self::Open => "OPEN_TIME",
            Self::Close => "CLOSE_TIME",
        }
    }

    pub fn of(self, trade: &TradeRecord) -> NaiveDateTime {
        match self {
            Self::Open => trade.open_time,
            Self::Close => trade.close_time,
        }
    }

    pub fn snapshot_file_name(self) -> &'static str {
        match self {
            Self::Open => "orders.parquet",
            Self::Close => "orders_close.parquet",
        }
    }

    pub fn export_file_name(self) -> &'static str {
        match self {
            Self::Open => "profit_xauusd_hourly.json",
            Self::Close => "profit_xauusd_hourly_close.json",
        }
    }
}

impl std::fmt::Display for TimeColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Close => write!(f, "close"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusGroup {
    Open,
    ClosedToday,
    ClosedYesterday,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Settlement {
    SameDay,
    Overnight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
}

/// Day boundaries used by the daily classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBounds {
    pub yesterday_start: NaiveDateTime,
    pub today_start: NaiveDateTime,
    pub tomorrow_start: NaiveDateTime,
}

impl DayBounds {
    /// Bounds around `date`. Fails for the first and last representable
    /// days, whose neighbours do not exist.
    pub fn for_date(date: NaiveDate) -> Result<Self, RollupError> {
        let today_start = date.and_time(chrono::NaiveTime::MIN);
        let day = chrono::Duration::days(1);
        let out_of_range = || RollupError::InvalidRequest(format!("date {date} is out of range"));
        Ok(Self {
            yesterday_start: today_start.checked_sub_signed(day).ok_or_else(out_of_range)?,
            today_start,
            tomorrow_start: today_start.checked_add_signed(day).ok_or_else(out_of_range)?,
        })
    }

    /// Status of a trade relative to these bounds, or `None` when the trade
    /// closed outside `[yesterday_start, tomorrow_start)`.
    pub fn classify(&self, trade: &TradeRecord) -> Option<StatusGroup> {
        let close = trade.close_time;
        if trade.is_open() {
            Some(StatusGroup::Open)
        } else if close >= self.today_start && close < self.tomorrow_start {
            Some(StatusGroup::ClosedToday)
        } else if close >= self.yesterday_start && close < self.today_start {
            Some(StatusGroup::ClosedYesterday)
        } else {
            None
        }
    }
}

/// Parse a ledger-style timestamp, `YYYY-MM-DD HH:MM:SS` or with a `T`
/// separator.
pub fn parse_wall_clock(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
}

/// Serde adapter for [`parse_wall_clock`] timestamps.
pub mod wall_clock {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_wall_clock(&raw).map_err(serde::de::Error::custom)
    }
}

/// Profit summed over one wall-clock hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyProfit {
    pub date: NaiveDate,
    pub hour: u32,
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSummaryRow {
    pub group: StatusGroup,
    pub settlement: Settlement,
    pub direction: Direction,
    pub total_volume: f64,
    pub total_profit: f64,
}
