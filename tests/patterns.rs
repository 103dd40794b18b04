//! Integration tests for the pattern matcher.

use std::collections::HashMap;

use candlesage::prelude::*;

/// Simple test bar structure
#[derive(Debug, Clone, Copy)]
struct TestBar {
    o: f64,
    h: f64,
    l: f64,
    c: f64,
}

impl TestBar {
    fn new(o: f64, h: f64, l: f64, c: f64) -> Self {
        Self { o, h, l, c }
    }
}

impl OHLCV for TestBar {
    fn open(&self) -> f64 {
        self.o
    }

    fn high(&self) -> f64 {
        self.h
    }

    fn low(&self) -> f64 {
        self.l
    }

    fn close(&self) -> f64 {
        self.c
    }

    fn volume(&self) -> f64 {
        1000.0
    }
}

fn tags_of(bar: TestBar, context: &[TestBar]) -> PatternSet {
    Matcher::global().match_bar(&bar, context)
}

// ============================================================
// SINGLE BAR
// ============================================================

#[test]
fn test_doji_is_not_marubozu() {
    let tags = tags_of(TestBar::new(100.0, 101.0, 99.0, 100.0), &[]);
    assert!(tags.contains(PatternTag::Doji));
    assert!(!tags.contains(PatternTag::BullishMarubozu));
}

#[test]
fn test_shooting_star() {
    let tags = tags_of(TestBar::new(100.0, 150.0, 99.0, 100.0), &[]);
    assert!(tags.contains(PatternTag::ShootingStar));
    assert!(!tags.contains(PatternTag::Hammer));
}

#[test]
fn test_overlapping_matches_are_all_reported() {
    // A symmetric doji with long legs is also a spinning top and a high wave
    let tags = tags_of(TestBar::new(100.0, 105.0, 95.0, 100.0), &[]);
    for tag in [
        PatternTag::Doji,
        PatternTag::LongLeggedDoji,
        PatternTag::SpinningTop,
        PatternTag::HighWave,
    ] {
        assert!(tags.contains(tag), "missing {tag}");
    }
    // close == open counts as the bullish colour
    assert!(tags.contains(PatternTag::BullishSpinningTop));
    assert!(!tags.contains(PatternTag::BearishSpinningTop));
}

#[test]
fn test_bullish_marubozu() {
    let tags = tags_of(TestBar::new(100.0, 110.0, 100.0, 110.0), &[]);
    assert!(tags.contains(PatternTag::BullishMarubozu));
    assert!(!tags.contains(PatternTag::Doji));
    assert_eq!(tags.len(), 1);
}

#[test]
fn test_flat_bar_is_only_a_doji() {
    let tags = tags_of(TestBar::new(10.0, 10.0, 10.0, 10.0), &[]);
    assert_eq!(tags.iter().collect::<Vec<_>>(), vec![PatternTag::Doji]);
}

#[test]
fn test_matching_is_deterministic() {
    let bar = TestBar::new(99.0, 100.2, 90.0, 100.0);
    let context = [TestBar::new(95.0, 100.0, 94.0, 99.0)];
    let first = tags_of(bar, &context);
    for _ in 0..10 {
        assert_eq!(tags_of(bar, &context), first);
    }
    let custom = MatcherBuilder::new().build().unwrap();
    assert_eq!(custom.match_bar(&bar, &context), first);
}

// ============================================================
// CONTEXT
// ============================================================

#[test]
fn test_short_context_skips_multi_bar_rules() {
    let black = TestBar::new(105.0, 106.0, 99.0, 100.0);
    let white = TestBar::new(99.0, 107.0, 98.0, 106.0);

    assert!(tags_of(white, &[black]).contains(PatternTag::BullishEngulfing));
    assert!(!tags_of(white, &[]).contains(PatternTag::BullishEngulfing));

    let err = Matcher::global()
        .evaluate(PatternTag::BullishEngulfing, &white, &[])
        .unwrap_err();
    assert!(matches!(
        err,
        PatternError::InsufficientContext { need: 1, got: 0, .. }
    ));
}

#[test]
fn test_longer_context_uses_trailing_bars() {
    let first = TestBar::new(110.0, 111.0, 99.0, 100.0);
    let star = TestBar::new(98.0, 99.0, 95.0, 97.0);
    let third = TestBar::new(99.0, 108.0, 98.0, 107.0);
    let noise = TestBar::new(150.0, 151.0, 149.0, 150.5);

    let tags = tags_of(third, &[noise, noise, first, star]);
    assert!(tags.contains(PatternTag::MorningStar));
    assert!(!tags_of(third, &[first, star, noise]).contains(PatternTag::MorningStar));
}

#[test]
fn test_context_rules_declare_their_window() {
    let matcher = Matcher::global();
    for tag in PatternTag::ALL {
        let need = matcher.rule(*tag).context_len();
        assert!(need <= MAX_CONTEXT);
        if need > 0 {
            let bar = TestBar::new(100.0, 101.0, 99.0, 100.0);
            assert!(matcher.evaluate(*tag, &bar, &[]).is_err(), "{tag}");
        }
    }
}

// ============================================================
// CONFIGURATION
// ============================================================

#[test]
fn test_rule_table_from_json() {
    let mut table = RuleTable::default();
    table.rules[PatternTag::Doji.index()] = BuiltinRule::Doji(DojiDetector {
        max_body_ratio: Ratio::new(0.02).unwrap(),
    });
    let json = serde_json::to_string_pretty(&table).unwrap();
    let loaded: RuleTable = serde_json::from_str(&json).unwrap();
    let matcher = Matcher::from_table(loaded).unwrap();

    // body 5% of range
    let bar = TestBar::new(100.0, 110.0, 90.0, 101.0);
    assert!(!matcher.match_bar(&bar, &[]).contains(PatternTag::Doji));
    assert!(Matcher::global().match_bar(&bar, &[]).contains(PatternTag::Doji));
}

#[test]
fn test_partial_detector_config_uses_defaults() {
    let hammer: HammerDetector = serde_json::from_str(r#"{"max_body_ratio": 0.2}"#).unwrap();
    assert_eq!(hammer.max_body_ratio.get(), 0.2);
    assert_eq!(hammer.min_lower_ratio, HammerDetector::default().min_lower_ratio);

    assert!(serde_json::from_str::<HammerDetector>(r#"{"max_body_ratio": 1.5}"#).is_err());
}

#[test]
fn test_tune_rejects_unknown_threshold() {
    let params = HashMap::from([("max_body", 0.2)]);
    let err = MatcherBuilder::new().tune(PatternTag::Hammer, &params);
    assert!(matches!(err, Err(PatternError::InvalidConfig(_))));
}

#[test]
fn test_param_meta_covers_every_tag() {
    for tag in PatternTag::ALL {
        let defaults: HashMap<&str, f64> =
            tag.param_meta().iter().map(|m| (m.name, m.default)).collect();
        let rule = tag.rule_with_params(&defaults).unwrap();
        assert_eq!(rule, tag.default_rule(), "{tag}");
    }
}
