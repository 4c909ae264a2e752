//! Parquet snapshots of raw query results
//!
//! Each run overwrites a fixed file per time-column variant. The file is
//! written to a temporary name in the same directory and renamed into place,
//! so concurrent runs resolve to whichever finished last and readers never
//! see a partial file.

use arrow::array::{
    Array, ArrayRef, Float64Array, Int32Array, Int64Array, StringArray, TimestampMillisecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::error::{Result, RollupError};
use crate::types::TradeRecord;

fn trade_schema() -> SchemaRef {
    let timestamp = DataType::Timestamp(TimeUnit::Millisecond, None);
    Arc::new(Schema::new(vec![
        Field::new("ticket", DataType::Int64, false),
        Field::new("login", DataType::Int64, false),
        Field::new("symbol", DataType::Utf8, false),
        Field::new("cmd", DataType::Int32, false),
        Field::new("volume", DataType::Int64, false),
        Field::new("open_time", timestamp.clone(), false),
        Field::new("open_price", DataType::Float64, false),
        Field::new("close_time", timestamp, false),
        Field::new("close_price", DataType::Float64, false),
        Field::new("swaps", DataType::Float64, false),
        Field::new("profit", DataType::Float64, false),
    ]))
}

fn to_batch(trades: &[TradeRecord]) -> Result<RecordBatch> {
    let millis = |f: fn(&TradeRecord) -> NaiveDateTime| -> TimestampMillisecondArray {
        trades.iter().map(|t| f(t).and_utc().timestamp_millis()).collect::<Vec<_>>().into()
    };

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(trades.iter().map(|t| t.ticket))),
        Arc::new(Int64Array::from_iter_values(trades.iter().map(|t| t.login))),
        Arc::new(StringArray::from_iter_values(trades.iter().map(|t| t.symbol.as_str()))),
        Arc::new(Int32Array::from_iter_values(trades.iter().map(|t| t.cmd))),
        Arc::new(Int64Array::from_iter_values(trades.iter().map(|t| t.volume))),
        Arc::new(millis(|t| t.open_time)),
        Arc::new(Float64Array::from_iter_values(trades.iter().map(|t| t.open_price))),
        Arc::new(millis(|t| t.close_time)),
        Arc::new(Float64Array::from_iter_values(trades.iter().map(|t| t.close_price))),
        Arc::new(Float64Array::from_iter_values(trades.iter().map(|t| t.swaps))),
        Arc::new(Float64Array::from_iter_values(trades.iter().map(|t| t.profit))),
    ];

    Ok(RecordBatch::try_new(trade_schema(), columns)?)
}

/// Create the directory `path` lives in and return it.
pub(crate) fn ensure_parent(path: &Path) -> Result<&Path> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| RollupError::io(dir, e))?;
    Ok(dir)
}

/// Overwrite `path` with `trades`, creating the parent directory if needed.
pub fn write_snapshot(path: &Path, trades: &[TradeRecord]) -> Result<()> {
    let dir = ensure_parent(path)?;

    let batch = to_batch(trades)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| RollupError::io(dir, e))?;
    let mut writer = ArrowWriter::try_new(tmp, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    let tmp = writer.into_inner()?;
    tmp.persist(path).map_err(|e| RollupError::io(path, e.error))?;

    info!("Wrote {} trades to {:?}", trades.len(), path);
    Ok(())
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &'static str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or(RollupError::SnapshotColumn(name))
}

fn naive(millis: i64, name: &'static str) -> Result<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis)
        .map(|d| d.naive_utc())
        .ok_or(RollupError::SnapshotColumn(name))
}

/// Read back a snapshot written by [`write_snapshot`].
pub fn read_snapshot(path: &Path) -> Result<Vec<TradeRecord>> {
    let file = File::open(path).map_err(|e| RollupError::io(path, e))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut trades = Vec::new();
    for batch in reader {
        let batch = batch?;
        let tickets = column::<Int64Array>(&batch, "ticket")?;
        let logins = column::<Int64Array>(&batch, "login")?;
        let symbols = column::<StringArray>(&batch, "symbol")?;
        let cmds = column::<Int32Array>(&batch, "cmd")?;
        let volumes = column::<Int64Array>(&batch, "volume")?;
        let open_times = column::<TimestampMillisecondArray>(&batch, "open_time")?;
        let open_prices = column::<Float64Array>(&batch, "open_price")?;
        let close_times = column::<TimestampMillisecondArray>(&batch, "close_time")?;
        let close_prices = column::<Float64Array>(&batch, "close_price")?;
        let swaps = column::<Float64Array>(&batch, "swaps")?;
        let profits = column::<Float64Array>(&batch, "profit")?;

        for i in 0..batch.num_rows() {
            if symbols.is_null(i) {
                return Err(RollupError::SnapshotColumn("symbol"));
            }
            trades.push(TradeRecord {
                ticket: tickets.value(i),
                login: logins.value(i),
                symbol: symbols.value(i).to_string(),
                cmd: cmds.value(i),
                volume: volumes.value(i),
                open_time: naive(open_times.value(i), "open_time")?,
                open_price: open_prices.value(i),
                close_time: naive(close_times.value(i), "close_time")?,
                close_price: close_prices.value(i),
                swaps: swaps.value(i),
                profit: profits.value(i),
            });
        }
    }

    Ok(trades)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SENTINEL_EPOCH;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn sample() -> Vec<TradeRecord> {
        vec![
            TradeRecord {
                ticket: 501,
                login: 9001,
                symbol: "XAUUSD".into(),
                cmd: 0,
                volume: 150,
                open_time: dt("2025-06-01 08:59:00"),
                open_price: 2331.25,
                close_time: dt("2025-06-01 09:10:00"),
                close_price: 2335.5,
                swaps: 0.0,
                profit: 10.0,
            },
            TradeRecord {
                ticket: 502,
                login: 9002,
                symbol: "XAUUSD".into(),
                cmd: 1,
                volume: 20,
                open_time: dt("2025-06-01 10:00:00"),
                open_price: 2340.0,
                close_time: SENTINEL_EPOCH,
                close_price: 0.0,
                swaps: -1.75,
                profit: -3.0,
            },
        ]
    }

    #[test]
    fn test_snapshot_preserves_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("orders.parquet");

        write_snapshot(&path, &sample()).unwrap();
        let back = read_snapshot(&path).unwrap();

        assert_eq!(back, sample());
        assert!(back[1].is_open());
    }

    #[test]
    fn test_snapshot_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.parquet");

        write_snapshot(&path, &sample()).unwrap();
        write_snapshot(&path, &sample()[..1]).unwrap();

        assert_eq!(read_snapshot(&path).unwrap().len(), 1);
        // only the snapshot itself remains, no leftover temp files
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.parquet");

        write_snapshot(&path, &[]).unwrap();
        assert!(read_snapshot(&path).unwrap().is_empty());
    }

    #[test]
    fn test_missing_snapshot_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_snapshot(&dir.path().join("absent.parquet"));
        assert!(matches!(result, Err(RollupError::Io { .. })));
    }
}
