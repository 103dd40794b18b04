//! End-to-end: Bhavcopy text -> raw records -> tagged bars.

use candlesage::prelude::*;

const DAY_ONE: &str = "\
SYMBOL, SERIES, DATE1, PREV_CLOSE, OPEN_PRICE, HIGH_PRICE, LOW_PRICE, LAST_PRICE, CLOSE_PRICE, AVG_PRICE, TTL_TRD_QNTY, TURNOVER_LACS, NO_OF_TRADES, DELIV_QTY, DELIV_PER
ABC, EQ, 01-Jan-2025, 106.00, 105.00, 106.00, 99.00, 100.00, 100.00, 102.00, 50000, 51.00, 900, 20000, 40.00
XYZ, EQ, 01-Jan-2025, 50.00, 50.00, 51.00, 49.00, 50.00, 50.00, 50.00, 1000, 0.50, 10, 500, 50.00
XYZ, BL, 01-Jan-2025, 50.00, 50.00, 50.00, 50.00, 50.00, 50.00, 50.00, 10, 0.01, 1, -, -
";

const DAY_TWO: &str = "\
SYMBOL, SERIES, DATE1, PREV_CLOSE, OPEN_PRICE, HIGH_PRICE, LOW_PRICE, LAST_PRICE, CLOSE_PRICE, AVG_PRICE, TTL_TRD_QNTY, TURNOVER_LACS, NO_OF_TRADES, DELIV_QTY, DELIV_PER
ABC, EQ, 02-Jan-2025, 100.00, 99.00, 107.00, 98.00, 106.00, 106.00, 103.00, 80000, 82.40, 1500, 30000, 37.50
XYZ, EQ, 02-Jan-2025, 50.00, 52.00, 51.00, 49.00, 50.00, 50.00, 50.00, 1000, 0.50, 10, 500, 50.00
";

fn load() -> Vec<RawBar> {
    let mut raws = read_bhavcopy(DAY_TWO.as_bytes()).unwrap();
    raws.extend(read_bhavcopy(DAY_ONE.as_bytes()).unwrap());
    raws
}

#[test]
fn test_tag_records_end_to_end() {
    let outcome = tag_records(Matcher::global(), &load());

    // XYZ on day two opens above its high
    assert_eq!(outcome.rejected.len(), 1);
    assert_eq!(outcome.rejected[0].symbol, "XYZ");
    assert_eq!(outcome.rejected[0].defect, BarDefect::BodyOutsideRange);
    assert!(outcome.failed.is_empty());

    let keys: Vec<(&str, String)> = outcome
        .tagged
        .iter()
        .map(|t| (t.bar().symbol(), t.bar().date().to_string()))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("ABC", "2025-01-01".to_string()),
            ("ABC", "2025-01-02".to_string()),
            ("XYZ", "2025-01-01".to_string()),
        ]
    );

    // day-two ABC engulfs day one even though the files arrived out of order
    let abc_two = &outcome.tagged[1];
    assert!(abc_two.pattern_value().contains(PatternTag::BullishEngulfing));
    assert!(abc_two.has_patterns());
    assert_eq!(abc_two.bar().prev_close(), Some(100.0));
}

#[test]
fn test_duplicate_dates_keep_first() {
    let mut raws = load();
    raws.push(RawBar::new("ABC", "01-Jan-2025", "100", "110", "100", "110", "1"));

    let outcome = tag_records(Matcher::global(), &raws);
    let abc: Vec<_> = outcome
        .tagged
        .iter()
        .filter(|t| t.bar().symbol() == "ABC")
        .collect();
    assert_eq!(abc.len(), 2);
    assert_eq!(abc[0].bar().volume_qty(), 50_000);
}

#[test]
fn test_parallel_matches_sequential() {
    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    for day in 1..=28 {
        let change = ((day * 7 + 13) % 11) as f64 / 2.0 - 2.5;
        let open = price;
        let close = price + change;
        let raw = RawBar::new(
            "SEQ",
            &format!("2025-02-{day:02}"),
            &open.to_string(),
            &(open.max(close) + 1.0).to_string(),
            &(open.min(close) - 1.0).to_string(),
            &close.to_string(),
            "100",
        );
        bars.push(normalize(&raw).unwrap());
        price = close;
    }

    let sequential = tag_series(Matcher::global(), &bars).unwrap();
    let (series, errors) = tag_parallel(
        Matcher::global(),
        vec![("SEQ", bars.as_slice()), ("SEQ", bars.as_slice())],
    );
    assert!(errors.is_empty());
    assert_eq!(series.len(), 2);
    for s in &series {
        assert_eq!(s.bars, sequential);
    }
}

#[test]
fn test_unsorted_series_is_reported() {
    let a = normalize(&RawBar::new("ABC", "2025-01-02", "10", "11", "9", "10", "1")).unwrap();
    let b = normalize(&RawBar::new("ABC", "2025-01-01", "10", "11", "9", "10", "1")).unwrap();
    let bars = [a, b];
    let (series, errors) = tag_parallel(Matcher::global(), vec![("ABC", &bars[..])]);
    assert!(series.is_empty());
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0].error, PatternError::OutOfOrder { .. }));
}

#[test]
fn test_csv_output_keeps_only_matches() {
    let outcome = tag_records(Matcher::global(), &load());
    let kept: Vec<TaggedBar> = outcome.tagged.into_iter().filter(TaggedBar::has_patterns).collect();
    let mut out = Vec::new();
    write_tagged_csv(&mut out, &kept).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), kept.len() + 1);
    assert!(text.contains("Bullish Engulfing"));
}
