//! NSE Bhavcopy CSV adapter
//!
//! Reads the `sec_bhavdata_full` daily file into [`RawBar`]s and writes
//! tagged bars back out as CSV.

use std::io::{Read, Write};

use chrono::NaiveDate;

use crate::{pipeline::TaggedBar, RawBar, OHLCV};

/// Failures reading or writing CSV
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Daily file name published by NSE, e.g. `sec_bhavdata_full_02012025.csv`
pub fn bhavcopy_file_name(date: NaiveDate) -> String {
    format!("sec_bhavdata_full_{}.csv", date.format("%d%m%Y"))
}

/// Parse a Bhavcopy full file and keep the `EQ` series.
///
/// Headers and fields are whitespace-trimmed (the published file pads them
/// with spaces). Unknown columns are ignored. Field contents are left as text
/// for [`normalize`](crate::normalize) to validate.
pub fn read_bhavcopy<R: Read>(reader: R) -> Result<Vec<RawBar>, IngestError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut bars = Vec::new();
    let mut dropped = 0usize;
    for record in rdr.deserialize::<RawBar>() {
        let raw = record?;
        if raw.is_equity() {
            bars.push(raw);
        } else {
            dropped += 1;
        }
    }

    tracing::info!(kept = bars.len(), dropped, "bhavcopy parsed");
    Ok(bars)
}

/// One output row; `matched_patterns` is joined with `|`
#[derive(serde::Serialize)]
struct TaggedRow<'a> {
    symbol: &'a str,
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
    prev_close: Option<f64>,
    avg_price: Option<f64>,
    pattern_value: u32,
    matched_patterns: String,
}

/// Write tagged bars as CSV with a header row
pub fn write_tagged_csv<W: Write>(writer: W, tagged: &[TaggedBar]) -> Result<(), IngestError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for t in tagged {
        let bar = t.bar();
        wtr.serialize(TaggedRow {
            symbol: bar.symbol(),
            date: bar.date(),
            open: bar.open(),
            high: bar.high(),
            low: bar.low(),
            close: bar.close(),
            volume: bar.volume_qty(),
            prev_close: bar.prev_close(),
            avg_price: bar.avg_price(),
            pattern_value: t.pattern_value().get(),
            matched_patterns: t.matched_patterns().names().join("|"),
        })?;
    }
    wtr.flush()?;
    Ok(())
}
