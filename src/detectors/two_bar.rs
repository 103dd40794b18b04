//! Two-bar pattern rules
//!
//! Piercing Line, Dark Cloud Cover and the two engulfing patterns. Each rule
//! reads exactly one context bar: the previous session.

use std::collections::HashMap;

use super::helpers::{self, is_body_long};
use crate::{
    params::{get_ratio, ParamMeta, ParameterizedDetector},
    OHLCVExt, PatternRule, PatternTag, Ratio, Result, OHLCV,
};

impl_with_defaults!(
    PiercingLineDetector,
    DarkCloudCoverDetector,
    BullishEngulfingDetector,
    BearishEngulfingDetector,
);

// ============================================================
// PIERCING / DARK CLOUD
// ============================================================

/// Piercing Line: long black bar, then a white bar opening below its low and
/// closing above the middle of its body
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PiercingLineDetector {
    pub min_prev_body_ratio: Ratio,
    /// Fraction of the first body the second close must recover
    pub min_pierce_ratio: Ratio,
}

impl Default for PiercingLineDetector {
    fn default() -> Self {
        Self {
            min_prev_body_ratio: Ratio::new_const(helpers::BODY_LONG_RATIO),
            min_pierce_ratio: Ratio::new_const(helpers::PENETRATION_RATIO),
        }
    }
}

impl PatternRule for PiercingLineDetector {
    fn tag(&self) -> PatternTag {
        PatternTag::PiercingLine
    }

    fn context_len(&self) -> usize {
        1
    }

    fn matches<T: OHLCV>(&self, bar: &T, context: &[T]) -> bool {
        let Some(prev) = context.last() else {
            return false;
        };
        prev.is_bearish()
            && is_body_long(prev, self.min_prev_body_ratio.get())
            && bar.is_bullish()
            && bar.open() < prev.low()
            && bar.close() > prev.close() + prev.body() * self.min_pierce_ratio.get()
            && bar.close() < prev.open()
    }
}

/// Dark Cloud Cover: long white bar, then a black bar opening above its high
/// and closing below the middle of its body
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DarkCloudCoverDetector {
    pub min_prev_body_ratio: Ratio,
    pub min_pierce_ratio: Ratio,
}

impl Default for DarkCloudCoverDetector {
    fn default() -> Self {
        Self {
            min_prev_body_ratio: Ratio::new_const(helpers::BODY_LONG_RATIO),
            min_pierce_ratio: Ratio::new_const(helpers::PENETRATION_RATIO),
        }
    }
}

impl PatternRule for DarkCloudCoverDetector {
    fn tag(&self) -> PatternTag {
        PatternTag::DarkCloudCover
    }

    fn context_len(&self) -> usize {
        1
    }

    fn matches<T: OHLCV>(&self, bar: &T, context: &[T]) -> bool {
        let Some(prev) = context.last() else {
            return false;
        };
        prev.is_bullish()
            && is_body_long(prev, self.min_prev_body_ratio.get())
            && bar.is_bearish()
            && bar.open() > prev.high()
            && bar.close() < prev.close() - prev.body() * self.min_pierce_ratio.get()
            && bar.close() > prev.open()
    }
}

// ============================================================
// ENGULFING
// ============================================================

/// Real body covers the previous real body, at least one side strictly
#[inline]
fn engulfs<T: OHLCV>(prev: &T, bar: &T) -> bool {
    bar.body_top() >= prev.body_top()
        && bar.body_bottom() <= prev.body_bottom()
        && (bar.body_top() > prev.body_top() || bar.body_bottom() < prev.body_bottom())
}

/// Bullish Engulfing: black bar followed by a white body that engulfs it
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct BullishEngulfingDetector {}

impl PatternRule for BullishEngulfingDetector {
    fn tag(&self) -> PatternTag {
        PatternTag::BullishEngulfing
    }

    fn context_len(&self) -> usize {
        1
    }

    fn matches<T: OHLCV>(&self, bar: &T, context: &[T]) -> bool {
        context
            .last()
            .is_some_and(|prev| prev.is_bearish() && bar.is_bullish() && engulfs(prev, bar))
    }
}

/// Bearish Engulfing: white bar followed by a black body that engulfs it
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct BearishEngulfingDetector {}

impl PatternRule for BearishEngulfingDetector {
    fn tag(&self) -> PatternTag {
        PatternTag::BearishEngulfing
    }

    fn context_len(&self) -> usize {
        1
    }

    fn matches<T: OHLCV>(&self, bar: &T, context: &[T]) -> bool {
        context
            .last()
            .is_some_and(|prev| prev.is_bullish() && bar.is_bearish() && engulfs(prev, bar))
    }
}

// ============================================================
// PARAMETER METADATA
// ============================================================

static PIERCING_PARAMS: &[ParamMeta] = &[
    ParamMeta::ratio(
        "min_prev_body_ratio",
        helpers::BODY_LONG_RATIO,
        (0.4, 0.9, 0.05),
        "Minimum first body / first range",
    ),
    ParamMeta::ratio(
        "min_pierce_ratio",
        helpers::PENETRATION_RATIO,
        (0.3, 0.8, 0.05),
        "Fraction of the first body the second close must cross",
    ),
];

static ENGULFING_PARAMS: &[ParamMeta] = &[];

fn piercing_params(params: &HashMap<&str, f64>) -> Result<(Ratio, Ratio)> {
    Ok((
        get_ratio(params, "min_prev_body_ratio", helpers::BODY_LONG_RATIO)?,
        get_ratio(params, "min_pierce_ratio", helpers::PENETRATION_RATIO)?,
    ))
}

impl ParameterizedDetector for PiercingLineDetector {
    fn param_meta() -> &'static [ParamMeta] {
        PIERCING_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let (min_prev_body_ratio, min_pierce_ratio) = piercing_params(params)?;
        Ok(Self { min_prev_body_ratio, min_pierce_ratio })
    }

    fn pattern_tag() -> PatternTag {
        PatternTag::PiercingLine
    }
}

impl ParameterizedDetector for DarkCloudCoverDetector {
    fn param_meta() -> &'static [ParamMeta] {
        PIERCING_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let (min_prev_body_ratio, min_pierce_ratio) = piercing_params(params)?;
        Ok(Self { min_prev_body_ratio, min_pierce_ratio })
    }

    fn pattern_tag() -> PatternTag {
        PatternTag::DarkCloudCover
    }
}

impl ParameterizedDetector for BullishEngulfingDetector {
    fn param_meta() -> &'static [ParamMeta] {
        ENGULFING_PARAMS
    }

    fn with_params(_params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {})
    }

    fn pattern_tag() -> PatternTag {
        PatternTag::BullishEngulfing
    }
}

impl ParameterizedDetector for BearishEngulfingDetector {
    fn param_meta() -> &'static [ParamMeta] {
        ENGULFING_PARAMS
    }

    fn with_params(_params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {})
    }

    fn pattern_tag() -> PatternTag {
        PatternTag::BearishEngulfing
    }
}
