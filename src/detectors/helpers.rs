//! Common helper functions for candlestick pattern rules
//!
//! All thresholds are fractions of the bar's own high-low range, so a rule
//! never depends on history it was not given.

use crate::{OHLCVExt, OHLCV};

// ============================================================
// DEFAULT THRESHOLDS (rule table version 1)
// ============================================================

/// Doji: body <= range * DOJI_RATIO
pub const DOJI_RATIO: f64 = 0.1;
/// Short body: body <= range * BODY_SHORT_RATIO
pub const BODY_SHORT_RATIO: f64 = 0.3;
/// Long body: body >= range * BODY_LONG_RATIO
pub const BODY_LONG_RATIO: f64 = 0.6;
/// Marubozu body: body >= range * MARUBOZU_BODY_RATIO
pub const MARUBOZU_BODY_RATIO: f64 = 0.9;
/// Marubozu shadows: each shadow <= range * MARUBOZU_SHADOW_RATIO
pub const MARUBOZU_SHADOW_RATIO: f64 = 0.05;
/// Very short shadow: shadow <= range * SHADOW_SHORT_RATIO
pub const SHADOW_SHORT_RATIO: f64 = 0.1;
/// Dominant shadow of hammer/star shapes: shadow >= range * SHADOW_LONG_RATIO
pub const SHADOW_LONG_RATIO: f64 = 0.6;
/// Long-legged doji legs: each shadow >= range * LONG_LEG_RATIO
pub const LONG_LEG_RATIO: f64 = 0.3;
/// Spinning top shadows: each shadow >= range * SPINNING_SHADOW_RATIO
pub const SPINNING_SHADOW_RATIO: f64 = 0.2;
/// High wave shadows: each shadow >= range * HIGH_WAVE_SHADOW_RATIO
pub const HIGH_WAVE_SHADOW_RATIO: f64 = 0.35;
/// Body may be at most this fraction of the dominant shadow (shadow >= 2x body)
pub const BODY_TO_SHADOW_RATIO: f64 = 0.5;
/// Near: within NEAR_RATIO of the reference bar's range
pub const NEAR_RATIO: f64 = 0.2;
/// Penetration into the prior body for piercing/star patterns
pub const PENETRATION_RATIO: f64 = 0.5;

// ============================================================
// SHAPE
// ============================================================

/// Body and shadows of one bar as fractions of its range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shape {
    pub body: f64,
    pub upper: f64,
    pub lower: f64,
}

impl Shape {
    /// None for a zero-range bar (open = high = low = close)
    #[inline]
    pub fn of<T: OHLCV>(bar: &T) -> Option<Self> {
        Some(Self {
            body: bar.body_ratio()?,
            upper: bar.upper_shadow_ratio()?,
            lower: bar.lower_shadow_ratio()?,
        })
    }

    /// Body no larger than `ratio` of the given shadow fraction
    #[inline]
    pub fn body_within(&self, shadow: f64, ratio: f64) -> bool {
        self.body <= shadow * ratio
    }
}

// ============================================================
// HELPER FUNCTIONS
// ============================================================

/// Doji body. A zero-range bar is a (four-price) doji.
#[inline]
pub fn is_doji<T: OHLCV>(bar: &T, max_body_ratio: f64) -> bool {
    match bar.body_ratio() {
        Some(ratio) => ratio <= max_body_ratio,
        None => bar.body() <= 0.0,
    }
}

/// Body is at least `min_ratio` of the range
#[inline]
pub fn is_body_long<T: OHLCV>(bar: &T, min_ratio: f64) -> bool {
    bar.body_ratio().is_some_and(|r| r >= min_ratio)
}

/// Body is at most `max_ratio` of the range (zero-range bars excluded)
#[inline]
pub fn is_body_short<T: OHLCV>(bar: &T, max_ratio: f64) -> bool {
    bar.body_ratio().is_some_and(|r| r <= max_ratio)
}

/// Real-body gap up: `bar`'s body entirely above `prev`'s body
#[inline]
pub fn body_gap_up<T: OHLCV>(prev: &T, bar: &T) -> bool {
    bar.body_bottom() > prev.body_top()
}

/// Real-body gap down: `bar`'s body entirely below `prev`'s body
#[inline]
pub fn body_gap_down<T: OHLCV>(prev: &T, bar: &T) -> bool {
    bar.body_top() < prev.body_bottom()
}

/// Small body on top of a long lower shadow (hammer / hanging man)
#[inline]
pub fn is_hammer_shape(
    shape: &Shape,
    max_body: f64,
    min_lower: f64,
    max_upper: f64,
    body_to_shadow: f64,
) -> bool {
    shape.body <= max_body
        && shape.lower >= min_lower
        && shape.upper <= max_upper
        && shape.body_within(shape.lower, body_to_shadow)
}

/// Small body under a long upper shadow (shooting star / inverted hammer)
#[inline]
pub fn is_star_shape(
    shape: &Shape,
    max_body: f64,
    min_upper: f64,
    max_lower: f64,
    body_to_shadow: f64,
) -> bool {
    shape.body <= max_body
        && shape.upper >= min_upper
        && shape.lower <= max_lower
        && shape.body_within(shape.upper, body_to_shadow)
}

/// Short body with both shadows longer than the body
#[inline]
pub fn is_spinning_top_shape(shape: &Shape, max_body: f64, min_shadow: f64) -> bool {
    shape.body <= max_body
        && shape.upper > shape.body
        && shape.lower > shape.body
        && shape.upper >= min_shadow
        && shape.lower >= min_shadow
}

/// Near-full-range body with negligible shadows
#[inline]
pub fn is_marubozu_shape(shape: &Shape, min_body: f64, max_shadow: f64) -> bool {
    shape.body >= min_body && shape.upper <= max_shadow && shape.lower <= max_shadow
}
