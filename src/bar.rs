//! Bar normalization
//!
//! Turns a raw, all-text OHLCV record into an immutable [`Bar`] whose prices
//! satisfy `low <= min(open, close) <= max(open, close) <= high`.

use chrono::NaiveDate;

use crate::OHLCV;

/// Series code for cash-market equities in NSE feeds
pub const EQUITY_SERIES: &str = "EQ";

/// Date layouts accepted by [`normalize`], tried in order.
/// `DATE1` in the Bhavcopy full file uses the first one (`01-Jan-2025`).
const DATE_FORMATS: [&str; 3] = ["%d-%b-%Y", "%Y-%m-%d", "%d-%m-%Y"];

// ============================================================
// ERRORS
// ============================================================

/// What exactly is wrong with a rejected record
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BarDefect {
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' is not numeric: '{value}'")]
    NotNumeric { field: &'static str, value: String },

    #[error("field '{0}' is not finite")]
    NotFinite(&'static str),

    #[error("field '{field}' must be > 0, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("unrecognised date '{0}'")]
    BadDate(String),

    #[error("high {high} < low {low}")]
    HighBelowLow { high: f64, low: f64 },

    #[error("open/close outside [low, high]")]
    BodyOutsideRange,
}

/// A record that cannot be normalized. Symbol and date are reported as
/// received so the caller can log the offending line.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid bar {symbol} @ {date}: {defect}")]
pub struct InvalidBarError {
    pub symbol: String,
    pub date: String,
    pub defect: BarDefect,
}

// ============================================================
// RAW RECORD
// ============================================================

/// Raw OHLCV record as delivered by ingestion.
///
/// Deserializes from the Bhavcopy `sec_bhavdata_full` header
/// (`SYMBOL`, `SERIES`, `DATE1`, `OPEN_PRICE`, ...) as well as plain lowercase
/// column names.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RawBar {
    #[serde(default, alias = "SYMBOL")]
    pub symbol: Option<String>,
    #[serde(default, alias = "SERIES")]
    pub series: Option<String>,
    #[serde(default, alias = "DATE1")]
    pub date: Option<String>,
    #[serde(default, alias = "OPEN_PRICE")]
    pub open: Option<String>,
    #[serde(default, alias = "HIGH_PRICE")]
    pub high: Option<String>,
    #[serde(default, alias = "LOW_PRICE")]
    pub low: Option<String>,
    #[serde(default, alias = "CLOSE_PRICE")]
    pub close: Option<String>,
    #[serde(default, alias = "TTL_TRD_QNTY")]
    pub volume: Option<String>,
    #[serde(default, alias = "PREV_CLOSE")]
    pub prev_close: Option<String>,
    #[serde(default, alias = "AVG_PRICE")]
    pub avg_price: Option<String>,
}

impl RawBar {
    /// Convenience constructor for an equity record with the required fields
    pub fn new(
        symbol: &str,
        date: &str,
        open: &str,
        high: &str,
        low: &str,
        close: &str,
        volume: &str,
    ) -> Self {
        Self {
            symbol: Some(symbol.to_string()),
            series: Some(EQUITY_SERIES.to_string()),
            date: Some(date.to_string()),
            open: Some(open.to_string()),
            high: Some(high.to_string()),
            low: Some(low.to_string()),
            close: Some(close.to_string()),
            volume: Some(volume.to_string()),
            prev_close: None,
            avg_price: None,
        }
    }

    /// True for the cash-equity series (`EQ`)
    pub fn is_equity(&self) -> bool {
        text(&self.series) == Some(EQUITY_SERIES)
    }

    /// Symbol as received, for diagnostics
    pub fn symbol_text(&self) -> &str {
        text(&self.symbol).unwrap_or("?")
    }

    /// Date as received, for diagnostics
    pub fn date_text(&self) -> &str {
        text(&self.date).unwrap_or("?")
    }
}

/// Trimmed, non-empty view of an optional field
fn text(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// ============================================================
// NORMALIZED BAR
// ============================================================

/// Validated end-of-day bar. Only obtainable through [`normalize`].
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Bar {
    symbol: String,
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
    prev_close: Option<f64>,
    avg_price: Option<f64>,
}

impl Bar {
    #[inline]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    #[inline]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    #[inline]
    pub fn volume_qty(&self) -> u64 {
        self.volume
    }

    #[inline]
    pub fn prev_close(&self) -> Option<f64> {
        self.prev_close
    }

    #[inline]
    pub fn avg_price(&self) -> Option<f64> {
        self.avg_price
    }
}

impl OHLCV for Bar {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume as f64
    }
}

// ============================================================
// NORMALIZER
// ============================================================

/// Validate and canonicalize one raw record.
///
/// Series filtering is not done here; see [`RawBar::is_equity`].
pub fn normalize(raw: &RawBar) -> Result<Bar, InvalidBarError> {
    let fail = |defect| InvalidBarError {
        symbol: raw.symbol_text().to_string(),
        date: raw.date_text().to_string(),
        defect,
    };

    let symbol = text(&raw.symbol)
        .map(canonical_symbol)
        .ok_or(BarDefect::MissingField("symbol"))
        .map_err(fail)?;
    let date = parse_date(&raw.date).map_err(fail)?;

    let open = parse_price("open", &raw.open).map_err(fail)?;
    let high = parse_price("high", &raw.high).map_err(fail)?;
    let low = parse_price("low", &raw.low).map_err(fail)?;
    let close = parse_price("close", &raw.close).map_err(fail)?;
    let volume = parse_volume(&raw.volume).map_err(fail)?;

    if high < low {
        return Err(fail(BarDefect::HighBelowLow { high, low }));
    }
    if open.min(close) < low || open.max(close) > high {
        return Err(fail(BarDefect::BodyOutsideRange));
    }

    let prev_close = parse_optional_price("prev_close", &raw.prev_close).map_err(fail)?;
    let avg_price = parse_optional_price("avg_price", &raw.avg_price).map_err(fail)?;

    Ok(Bar {
        symbol,
        date,
        open,
        high,
        low,
        close,
        volume,
        prev_close,
        avg_price,
    })
}

/// Trimmed, upper-case ticker as stored on a [`Bar`]
pub fn canonical_symbol(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}

fn parse_date(field: &Option<String>) -> Result<NaiveDate, BarDefect> {
    let value = text(field).ok_or(BarDefect::MissingField("date"))?;
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .ok_or_else(|| BarDefect::BadDate(value.to_string()))
}

fn parse_number(name: &'static str, value: &str) -> Result<f64, BarDefect> {
    let parsed: f64 = value.parse().map_err(|_| BarDefect::NotNumeric {
        field: name,
        value: value.to_string(),
    })?;
    if !parsed.is_finite() {
        return Err(BarDefect::NotFinite(name));
    }
    Ok(parsed)
}

fn parse_price(name: &'static str, field: &Option<String>) -> Result<f64, BarDefect> {
    let value = text(field).ok_or(BarDefect::MissingField(name))?;
    let price = parse_number(name, value)?;
    if price <= 0.0 {
        return Err(BarDefect::NonPositive { field: name, value: price });
    }
    Ok(price)
}

/// Bhavcopy writes `-` for prices that do not apply
fn parse_optional_price(
    name: &'static str,
    field: &Option<String>,
) -> Result<Option<f64>, BarDefect> {
    match text(field) {
        None | Some("-") => Ok(None),
        Some(_) => parse_price(name, field).map(Some),
    }
}

fn parse_volume(field: &Option<String>) -> Result<u64, BarDefect> {
    let value = text(field).ok_or(BarDefect::MissingField("volume"))?;
    if let Ok(qty) = value.parse::<u64>() {
        return Ok(qty);
    }
    // Quantities exported through spreadsheets come back as "1200.0"
    let not_numeric = || BarDefect::NotNumeric {
        field: "volume",
        value: value.to_string(),
    };
    let qty = value.parse::<f64>().map_err(|_| not_numeric())?;
    if qty.is_finite() && qty >= 0.0 && qty.fract() == 0.0 && qty <= u64::MAX as f64 {
        Ok(qty as u64)
    } else {
        Err(not_numeric())
    }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OHLCVExt;

    fn raw(o: &str, h: &str, l: &str, c: &str) -> RawBar {
        RawBar::new("INFY", "02-Jan-2025", o, h, l, c, "1000")
    }

    #[test]
    fn test_normalize_valid() {
        let bar = normalize(&raw("100", "110", "95", "105")).unwrap();
        assert_eq!(bar.symbol(), "INFY");
        assert_eq!(bar.date(), NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
        assert_eq!(bar.volume_qty(), 1000);
        assert_eq!(bar.body(), 5.0);
        assert!(bar.validate().is_ok());
    }

    #[test]
    fn test_normalize_trims_and_uppercases() {
        let mut r = RawBar::new(" tcs ", " 2025-01-03 ", " 10.5", "11 ", "10", "10.75", " 42 ");
        r.prev_close = Some(" - ".to_string());
        r.avg_price = Some("10.61".to_string());
        let bar = normalize(&r).unwrap();
        assert_eq!(bar.symbol(), "TCS");
        assert_eq!(bar.prev_close(), None);
        assert_eq!(bar.avg_price(), Some(10.61));
    }

    #[test]
    fn test_date_formats() {
        for d in ["03-Jan-2025", "2025-01-03", "03-01-2025"] {
            let r = RawBar::new("X", d, "1", "1", "1", "1", "0");
            assert_eq!(
                normalize(&r).unwrap().date(),
                NaiveDate::from_ymd_opt(2025, 1, 3).unwrap()
            );
        }
    }

    #[test]
    fn test_high_below_low() {
        let err = normalize(&raw("100", "90", "95", "92")).unwrap_err();
        assert_eq!(err.symbol, "INFY");
        assert_eq!(err.date, "02-Jan-2025");
        assert!(matches!(err.defect, BarDefect::HighBelowLow { .. }));
    }

    #[test]
    fn test_body_outside_range() {
        let err = normalize(&raw("100", "105", "95", "106")).unwrap_err();
        assert_eq!(err.defect, BarDefect::BodyOutsideRange);
    }

    #[test]
    fn test_missing_and_non_numeric() {
        let mut r = raw("100", "105", "95", "101");
        r.close = Some("  ".to_string());
        assert_eq!(
            normalize(&r).unwrap_err().defect,
            BarDefect::MissingField("close")
        );

        let r = raw("abc", "105", "95", "101");
        assert!(matches!(
            normalize(&r).unwrap_err().defect,
            BarDefect::NotNumeric { field: "open", .. }
        ));

        let r = raw("NaN", "105", "95", "101");
        assert_eq!(normalize(&r).unwrap_err().defect, BarDefect::NotFinite("open"));
    }

    #[test]
    fn test_non_positive_price() {
        let err = normalize(&raw("0", "105", "0", "101")).unwrap_err();
        assert!(matches!(err.defect, BarDefect::NonPositive { field: "open", .. }));
    }

    #[test]
    fn test_volume_parsing() {
        let mut r = raw("100", "105", "95", "101");
        r.volume = Some("1200.0".to_string());
        assert_eq!(normalize(&r).unwrap().volume_qty(), 1200);

        r.volume = Some("-5".to_string());
        assert!(normalize(&r).is_err());

        r.volume = Some("12.5".to_string());
        assert!(normalize(&r).is_err());
    }

    #[test]
    fn test_bad_date() {
        let r = RawBar::new("X", "2025/01/03", "1", "1", "1", "1", "0");
        assert_eq!(
            normalize(&r).unwrap_err().defect,
            BarDefect::BadDate("2025/01/03".to_string())
        );
    }

    #[test]
    fn test_is_equity() {
        let mut r = raw("1", "1", "1", "1");
        assert!(r.is_equity());
        r.series = Some(" BE".to_string());
        assert!(!r.is_equity());
        r.series = None;
        assert!(!r.is_equity());
    }
}
