//! Normalizer laws over arbitrary price quadruples.

use candlesage::prelude::*;
use proptest::prelude::*;

/// Half-point grid so equal prices come up often
fn price() -> impl Strategy<Value = f64> {
    (2u32..=40).prop_map(|half_points| f64::from(half_points) / 2.0)
}

fn raw(o: f64, h: f64, l: f64, c: f64) -> RawBar {
    RawBar::new(
        "abc",
        "2025-01-02",
        &o.to_string(),
        &h.to_string(),
        &l.to_string(),
        &c.to_string(),
        "100",
    )
}

proptest! {
    #[test]
    fn accepted_bars_sit_inside_their_range(o in price(), h in price(), l in price(), c in price()) {
        let result = normalize(&raw(o, h, l, c));

        if h < l {
            let err = result.unwrap_err();
            prop_assert_eq!(err.defect, BarDefect::HighBelowLow { high: h, low: l });
        } else if o.min(c) < l || o.max(c) > h {
            let err = result.unwrap_err();
            prop_assert_eq!(err.defect, BarDefect::BodyOutsideRange);
            prop_assert_eq!(err.symbol, "abc");
        } else {
            let bar = result.unwrap();
            prop_assert!(bar.low() <= bar.body_bottom());
            prop_assert!(bar.body_bottom() <= bar.body_top());
            prop_assert!(bar.body_top() <= bar.high());
            prop_assert_eq!((bar.open(), bar.high(), bar.low(), bar.close()), (o, h, l, c));
            prop_assert_eq!(bar.symbol(), "ABC");
        }
    }
}

#[test]
fn test_degenerate_bar_is_valid() {
    let bar = normalize(&raw(10.0, 10.0, 10.0, 10.0)).unwrap();
    assert_eq!(bar.range(), 0.0);
}
