//! Three-bar pattern rules
//!
//! Morning/Evening Star and Three White Soldiers/Black Crows. Each rule reads
//! two context bars: `context[0]` is the first bar of the pattern and
//! `context[1]` the middle one.

use std::collections::HashMap;

use super::helpers::{self, body_gap_down, body_gap_up, is_body_long, is_body_short};
use crate::{
    params::{get_ratio, ParamMeta, ParameterizedDetector},
    OHLCVExt, PatternRule, PatternTag, Ratio, Result, OHLCV,
};

impl_with_defaults!(
    MorningStarDetector,
    EveningStarDetector,
    ThreeWhiteSoldiersDetector,
    ThreeBlackCrowsDetector,
);

// ============================================================
// STARS
// ============================================================

/// Morning Star: long black bar, a small body gapping below it, then a long
/// white bar closing well into the first body
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MorningStarDetector {
    pub min_long_body_ratio: Ratio,
    pub max_star_body_ratio: Ratio,
    pub min_penetration_ratio: Ratio,
}

impl Default for MorningStarDetector {
    fn default() -> Self {
        Self {
            min_long_body_ratio: Ratio::new_const(helpers::BODY_LONG_RATIO),
            max_star_body_ratio: Ratio::new_const(helpers::BODY_SHORT_RATIO),
            min_penetration_ratio: Ratio::new_const(helpers::PENETRATION_RATIO),
        }
    }
}

impl PatternRule for MorningStarDetector {
    fn tag(&self) -> PatternTag {
        PatternTag::MorningStar
    }

    fn context_len(&self) -> usize {
        2
    }

    fn matches<T: OHLCV>(&self, bar: &T, context: &[T]) -> bool {
        let [first, star] = context else {
            return false;
        };
        first.is_bearish()
            && is_body_long(first, self.min_long_body_ratio.get())
            && is_body_short(star, self.max_star_body_ratio.get())
            && body_gap_down(first, star)
            && bar.is_bullish()
            && is_body_long(bar, self.min_long_body_ratio.get())
            && bar.close() > first.close() + first.body() * self.min_penetration_ratio.get()
    }
}

/// Evening Star: long white bar, a small body gapping above it, then a long
/// black bar closing well into the first body
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EveningStarDetector {
    pub min_long_body_ratio: Ratio,
    pub max_star_body_ratio: Ratio,
    pub min_penetration_ratio: Ratio,
}

impl Default for EveningStarDetector {
    fn default() -> Self {
        Self {
            min_long_body_ratio: Ratio::new_const(helpers::BODY_LONG_RATIO),
            max_star_body_ratio: Ratio::new_const(helpers::BODY_SHORT_RATIO),
            min_penetration_ratio: Ratio::new_const(helpers::PENETRATION_RATIO),
        }
    }
}

impl PatternRule for EveningStarDetector {
    fn tag(&self) -> PatternTag {
        PatternTag::EveningStar
    }

    fn context_len(&self) -> usize {
        2
    }

    fn matches<T: OHLCV>(&self, bar: &T, context: &[T]) -> bool {
        let [first, star] = context else {
            return false;
        };
        first.is_bullish()
            && is_body_long(first, self.min_long_body_ratio.get())
            && is_body_short(star, self.max_star_body_ratio.get())
            && body_gap_up(first, star)
            && bar.is_bearish()
            && is_body_long(bar, self.min_long_body_ratio.get())
            && bar.close() < first.close() - first.body() * self.min_penetration_ratio.get()
    }
}

// ============================================================
// THREE SOLDIERS / CROWS
// ============================================================

/// Three White Soldiers: three long white bars, each opening inside the prior
/// body and closing higher, near its high
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ThreeWhiteSoldiersDetector {
    pub min_body_ratio: Ratio,
    /// Shadow beyond the close, as a fraction of the range
    pub max_close_shadow_ratio: Ratio,
}

impl Default for ThreeWhiteSoldiersDetector {
    fn default() -> Self {
        Self {
            min_body_ratio: Ratio::new_const(helpers::BODY_LONG_RATIO),
            max_close_shadow_ratio: Ratio::new_const(helpers::SHADOW_SHORT_RATIO),
        }
    }
}

impl ThreeWhiteSoldiersDetector {
    fn soldier<T: OHLCV>(&self, bar: &T) -> bool {
        bar.is_bullish()
            && is_body_long(bar, self.min_body_ratio.get())
            && bar
                .upper_shadow_ratio()
                .is_some_and(|r| r <= self.max_close_shadow_ratio.get())
    }

    fn advances<T: OHLCV>(prev: &T, bar: &T) -> bool {
        bar.open() > prev.open() && bar.open() <= prev.close() && bar.close() > prev.close()
    }
}

impl PatternRule for ThreeWhiteSoldiersDetector {
    fn tag(&self) -> PatternTag {
        PatternTag::ThreeWhiteSoldiers
    }

    fn context_len(&self) -> usize {
        2
    }

    fn matches<T: OHLCV>(&self, bar: &T, context: &[T]) -> bool {
        let [first, second] = context else {
            return false;
        };
        self.soldier(first)
            && self.soldier(second)
            && self.soldier(bar)
            && Self::advances(first, second)
            && Self::advances(second, bar)
    }
}

/// Three Black Crows: three long black bars, each opening inside the prior
/// body and closing lower, near its low
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ThreeBlackCrowsDetector {
    pub min_body_ratio: Ratio,
    pub max_close_shadow_ratio: Ratio,
}

impl Default for ThreeBlackCrowsDetector {
    fn default() -> Self {
        Self {
            min_body_ratio: Ratio::new_const(helpers::BODY_LONG_RATIO),
            max_close_shadow_ratio: Ratio::new_const(helpers::SHADOW_SHORT_RATIO),
        }
    }
}

impl ThreeBlackCrowsDetector {
    fn crow<T: OHLCV>(&self, bar: &T) -> bool {
        bar.is_bearish()
            && is_body_long(bar, self.min_body_ratio.get())
            && bar
                .lower_shadow_ratio()
                .is_some_and(|r| r <= self.max_close_shadow_ratio.get())
    }

    fn declines<T: OHLCV>(prev: &T, bar: &T) -> bool {
        bar.open() < prev.open() && bar.open() >= prev.close() && bar.close() < prev.close()
    }
}

impl PatternRule for ThreeBlackCrowsDetector {
    fn tag(&self) -> PatternTag {
        PatternTag::ThreeBlackCrows
    }

    fn context_len(&self) -> usize {
        2
    }

    fn matches<T: OHLCV>(&self, bar: &T, context: &[T]) -> bool {
        let [first, second] = context else {
            return false;
        };
        self.crow(first)
            && self.crow(second)
            && self.crow(bar)
            && Self::declines(first, second)
            && Self::declines(second, bar)
    }
}

// ============================================================
// PARAMETER METADATA
// ============================================================

static STAR_PARAMS: &[ParamMeta] = &[
    ParamMeta::ratio(
        "min_long_body_ratio",
        helpers::BODY_LONG_RATIO,
        (0.4, 0.9, 0.05),
        "Minimum first body / first range",
    ),
    ParamMeta::ratio(
        "max_star_body_ratio",
        helpers::BODY_SHORT_RATIO,
        (0.1, 0.5, 0.05),
        "Maximum star body / star range",
    ),
    ParamMeta::ratio(
        "min_penetration_ratio",
        helpers::PENETRATION_RATIO,
        (0.2, 0.8, 0.1),
        "Fraction of the first body the third close must cross",
    ),
];

static THREE_LINE_PARAMS: &[ParamMeta] = &[
    ParamMeta::ratio(
        "min_body_ratio",
        helpers::BODY_LONG_RATIO,
        (0.4, 0.9, 0.05),
        "Minimum body / range of each bar",
    ),
    ParamMeta::ratio(
        "max_close_shadow_ratio",
        helpers::SHADOW_SHORT_RATIO,
        (0.0, 0.3, 0.05),
        "Maximum shadow beyond the close / range",
    ),
];

fn star_params(params: &HashMap<&str, f64>) -> Result<(Ratio, Ratio, Ratio)> {
    Ok((
        get_ratio(params, "min_long_body_ratio", helpers::BODY_LONG_RATIO)?,
        get_ratio(params, "max_star_body_ratio", helpers::BODY_SHORT_RATIO)?,
        get_ratio(params, "min_penetration_ratio", helpers::PENETRATION_RATIO)?,
    ))
}

fn three_line_params(params: &HashMap<&str, f64>) -> Result<(Ratio, Ratio)> {
    Ok((
        get_ratio(params, "min_body_ratio", helpers::BODY_LONG_RATIO)?,
        get_ratio(params, "max_close_shadow_ratio", helpers::SHADOW_SHORT_RATIO)?,
    ))
}

impl ParameterizedDetector for MorningStarDetector {
    fn param_meta() -> &'static [ParamMeta] {
        STAR_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let (min_long_body_ratio, max_star_body_ratio, min_penetration_ratio) =
            star_params(params)?;
        Ok(Self { min_long_body_ratio, max_star_body_ratio, min_penetration_ratio })
    }

    fn pattern_tag() -> PatternTag {
        PatternTag::MorningStar
    }
}

impl ParameterizedDetector for EveningStarDetector {
    fn param_meta() -> &'static [ParamMeta] {
        STAR_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let (min_long_body_ratio, max_star_body_ratio, min_penetration_ratio) =
            star_params(params)?;
        Ok(Self { min_long_body_ratio, max_star_body_ratio, min_penetration_ratio })
    }

    fn pattern_tag() -> PatternTag {
        PatternTag::EveningStar
    }
}

impl ParameterizedDetector for ThreeWhiteSoldiersDetector {
    fn param_meta() -> &'static [ParamMeta] {
        THREE_LINE_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let (min_body_ratio, max_close_shadow_ratio) = three_line_params(params)?;
        Ok(Self { min_body_ratio, max_close_shadow_ratio })
    }

    fn pattern_tag() -> PatternTag {
        PatternTag::ThreeWhiteSoldiers
    }
}

impl ParameterizedDetector for ThreeBlackCrowsDetector {
    fn param_meta() -> &'static [ParamMeta] {
        THREE_LINE_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let (min_body_ratio, max_close_shadow_ratio) = three_line_params(params)?;
        Ok(Self { min_body_ratio, max_close_shadow_ratio })
    }

    fn pattern_tag() -> PatternTag {
        PatternTag::ThreeBlackCrows
    }
}
