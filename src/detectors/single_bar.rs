//! Single-candle pattern rules
//!
//! Doji family, spinning tops, high wave, hammer/star shapes and marubozu.
//! Hanging Man and Inverted Hammer share their shape with Hammer and
//! Shooting Star and additionally look at the previous session.

use std::collections::HashMap;

use super::helpers::{
    self, body_gap_down, is_doji, is_hammer_shape, is_marubozu_shape, is_spinning_top_shape,
    is_star_shape, Shape,
};
use crate::{
    params::{get_ratio, ParamMeta, ParameterizedDetector},
    OHLCVExt, PatternError, PatternRule, PatternTag, Ratio, Result, OHLCV,
};

impl_with_defaults!(
    DojiDetector,
    LongLeggedDojiDetector,
    DragonflyDojiDetector,
    GravestoneDojiDetector,
    SpinningTopDetector,
    BullishSpinningTopDetector,
    BearishSpinningTopDetector,
    HighWaveDetector,
    HammerDetector,
    ShootingStarDetector,
    HangingManDetector,
    InvertedHammerDetector,
    BullishMarubozuDetector,
    BearishMarubozuDetector,
);

/// Both shadows at `min_shadow` of the range must leave room for a body
fn check_both_shadows(tag: PatternTag, min_shadow: Ratio) -> Result<()> {
    if 2.0 * min_shadow.get() > 1.0 {
        return Err(PatternError::InvalidConfig(format!(
            "{}: min_shadow_ratio {} leaves no room for a body",
            tag.key(),
            min_shadow.get()
        )));
    }
    Ok(())
}

// ============================================================
// DOJI FAMILY
// ============================================================

/// Doji: open and close (almost) equal
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DojiDetector {
    pub max_body_ratio: Ratio,
}

impl Default for DojiDetector {
    fn default() -> Self {
        Self {
            max_body_ratio: Ratio::new_const(helpers::DOJI_RATIO),
        }
    }
}

impl PatternRule for DojiDetector {
    fn tag(&self) -> PatternTag {
        PatternTag::Doji
    }

    fn matches<T: OHLCV>(&self, bar: &T, _context: &[T]) -> bool {
        is_doji(bar, self.max_body_ratio.get())
    }
}

/// Long Legged Doji: doji with long shadows on both sides
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LongLeggedDojiDetector {
    pub max_body_ratio: Ratio,
    pub min_shadow_ratio: Ratio,
}

impl Default for LongLeggedDojiDetector {
    fn default() -> Self {
        Self {
            max_body_ratio: Ratio::new_const(helpers::DOJI_RATIO),
            min_shadow_ratio: Ratio::new_const(helpers::LONG_LEG_RATIO),
        }
    }
}

impl PatternRule for LongLeggedDojiDetector {
    fn tag(&self) -> PatternTag {
        PatternTag::LongLeggedDoji
    }

    fn matches<T: OHLCV>(&self, bar: &T, _context: &[T]) -> bool {
        let Some(shape) = Shape::of(bar) else {
            return false;
        };
        let legs = self.min_shadow_ratio.get();
        shape.body <= self.max_body_ratio.get() && shape.upper >= legs && shape.lower >= legs
    }

    fn validate_config(&self) -> Result<()> {
        check_both_shadows(self.tag(), self.min_shadow_ratio)
    }
}

/// Dragonfly Doji: open = close at the high, long lower shadow
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DragonflyDojiDetector {
    pub max_body_ratio: Ratio,
    pub max_upper_ratio: Ratio,
    pub min_lower_ratio: Ratio,
}

impl Default for DragonflyDojiDetector {
    fn default() -> Self {
        Self {
            max_body_ratio: Ratio::new_const(helpers::DOJI_RATIO),
            max_upper_ratio: Ratio::new_const(helpers::SHADOW_SHORT_RATIO),
            min_lower_ratio: Ratio::new_const(helpers::SHADOW_LONG_RATIO),
        }
    }
}

impl PatternRule for DragonflyDojiDetector {
    fn tag(&self) -> PatternTag {
        PatternTag::DragonflyDoji
    }

    fn matches<T: OHLCV>(&self, bar: &T, _context: &[T]) -> bool {
        let Some(shape) = Shape::of(bar) else {
            return false;
        };
        shape.body <= self.max_body_ratio.get()
            && shape.upper <= self.max_upper_ratio.get()
            && shape.lower >= self.min_lower_ratio.get()
    }
}

/// Gravestone Doji: open = close at the low, long upper shadow
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GravestoneDojiDetector {
    pub max_body_ratio: Ratio,
    pub max_lower_ratio: Ratio,
    pub min_upper_ratio: Ratio,
}

impl Default for GravestoneDojiDetector {
    fn default() -> Self {
        Self {
            max_body_ratio: Ratio::new_const(helpers::DOJI_RATIO),
            max_lower_ratio: Ratio::new_const(helpers::SHADOW_SHORT_RATIO),
            min_upper_ratio: Ratio::new_const(helpers::SHADOW_LONG_RATIO),
        }
    }
}

impl PatternRule for GravestoneDojiDetector {
    fn tag(&self) -> PatternTag {
        PatternTag::GravestoneDoji
    }

    fn matches<T: OHLCV>(&self, bar: &T, _context: &[T]) -> bool {
        let Some(shape) = Shape::of(bar) else {
            return false;
        };
        shape.body <= self.max_body_ratio.get()
            && shape.lower <= self.max_lower_ratio.get()
            && shape.upper >= self.min_upper_ratio.get()
    }
}

// ============================================================
// SPINNING TOP / HIGH WAVE
// ============================================================

/// Spinning Top: short body, shadows on both sides longer than the body
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SpinningTopDetector {
    pub max_body_ratio: Ratio,
    pub min_shadow_ratio: Ratio,
}

impl Default for SpinningTopDetector {
    fn default() -> Self {
        Self {
            max_body_ratio: Ratio::new_const(helpers::BODY_SHORT_RATIO),
            min_shadow_ratio: Ratio::new_const(helpers::SPINNING_SHADOW_RATIO),
        }
    }
}

impl PatternRule for SpinningTopDetector {
    fn tag(&self) -> PatternTag {
        PatternTag::SpinningTop
    }

    fn matches<T: OHLCV>(&self, bar: &T, _context: &[T]) -> bool {
        Shape::of(bar).is_some_and(|s| {
            is_spinning_top_shape(&s, self.max_body_ratio.get(), self.min_shadow_ratio.get())
        })
    }

    fn validate_config(&self) -> Result<()> {
        check_both_shadows(self.tag(), self.min_shadow_ratio)
    }
}

/// Spinning top with close at or above open
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BullishSpinningTopDetector {
    pub max_body_ratio: Ratio,
    pub min_shadow_ratio: Ratio,
}

impl Default for BullishSpinningTopDetector {
    fn default() -> Self {
        Self {
            max_body_ratio: Ratio::new_const(helpers::BODY_SHORT_RATIO),
            min_shadow_ratio: Ratio::new_const(helpers::SPINNING_SHADOW_RATIO),
        }
    }
}

impl PatternRule for BullishSpinningTopDetector {
    fn tag(&self) -> PatternTag {
        PatternTag::BullishSpinningTop
    }

    fn matches<T: OHLCV>(&self, bar: &T, _context: &[T]) -> bool {
        bar.close() >= bar.open()
            && Shape::of(bar).is_some_and(|s| {
                is_spinning_top_shape(&s, self.max_body_ratio.get(), self.min_shadow_ratio.get())
            })
    }

    fn validate_config(&self) -> Result<()> {
        check_both_shadows(self.tag(), self.min_shadow_ratio)
    }
}

/// Spinning top with close below open
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BearishSpinningTopDetector {
    pub max_body_ratio: Ratio,
    pub min_shadow_ratio: Ratio,
}

impl Default for BearishSpinningTopDetector {
    fn default() -> Self {
        Self {
            max_body_ratio: Ratio::new_const(helpers::BODY_SHORT_RATIO),
            min_shadow_ratio: Ratio::new_const(helpers::SPINNING_SHADOW_RATIO),
        }
    }
}

impl PatternRule for BearishSpinningTopDetector {
    fn tag(&self) -> PatternTag {
        PatternTag::BearishSpinningTop
    }

    fn matches<T: OHLCV>(&self, bar: &T, _context: &[T]) -> bool {
        bar.is_bearish()
            && Shape::of(bar).is_some_and(|s| {
                is_spinning_top_shape(&s, self.max_body_ratio.get(), self.min_shadow_ratio.get())
            })
    }

    fn validate_config(&self) -> Result<()> {
        check_both_shadows(self.tag(), self.min_shadow_ratio)
    }
}

/// High Wave: short body, both shadows very long
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HighWaveDetector {
    pub max_body_ratio: Ratio,
    pub min_shadow_ratio: Ratio,
    pub body_to_shadow_ratio: Ratio,
}

impl Default for HighWaveDetector {
    fn default() -> Self {
        Self {
            max_body_ratio: Ratio::new_const(helpers::BODY_SHORT_RATIO),
            min_shadow_ratio: Ratio::new_const(helpers::HIGH_WAVE_SHADOW_RATIO),
            body_to_shadow_ratio: Ratio::new_const(helpers::BODY_TO_SHADOW_RATIO),
        }
    }
}

impl PatternRule for HighWaveDetector {
    fn tag(&self) -> PatternTag {
        PatternTag::HighWave
    }

    fn matches<T: OHLCV>(&self, bar: &T, _context: &[T]) -> bool {
        let Some(shape) = Shape::of(bar) else {
            return false;
        };
        let k = self.body_to_shadow_ratio.get();
        let min_shadow = self.min_shadow_ratio.get();
        shape.body <= self.max_body_ratio.get()
            && shape.upper >= min_shadow
            && shape.lower >= min_shadow
            && shape.body_within(shape.upper, k)
            && shape.body_within(shape.lower, k)
    }

    fn validate_config(&self) -> Result<()> {
        check_both_shadows(self.tag(), self.min_shadow_ratio)
    }
}

// ============================================================
// HAMMER FAMILY
// ============================================================

/// Hammer: small body at the top, lower shadow at least twice the body
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HammerDetector {
    pub max_body_ratio: Ratio,
    pub min_lower_ratio: Ratio,
    pub max_upper_ratio: Ratio,
    pub body_to_shadow_ratio: Ratio,
}

impl Default for HammerDetector {
    fn default() -> Self {
        Self {
            max_body_ratio: Ratio::new_const(helpers::BODY_SHORT_RATIO),
            min_lower_ratio: Ratio::new_const(helpers::SHADOW_LONG_RATIO),
            max_upper_ratio: Ratio::new_const(helpers::SHADOW_SHORT_RATIO),
            body_to_shadow_ratio: Ratio::new_const(helpers::BODY_TO_SHADOW_RATIO),
        }
    }
}

impl HammerDetector {
    fn shape_matches<T: OHLCV>(&self, bar: &T) -> bool {
        Shape::of(bar).is_some_and(|s| {
            is_hammer_shape(
                &s,
                self.max_body_ratio.get(),
                self.min_lower_ratio.get(),
                self.max_upper_ratio.get(),
                self.body_to_shadow_ratio.get(),
            )
        })
    }
}

impl PatternRule for HammerDetector {
    fn tag(&self) -> PatternTag {
        PatternTag::Hammer
    }

    fn matches<T: OHLCV>(&self, bar: &T, _context: &[T]) -> bool {
        self.shape_matches(bar)
    }
}

/// Shooting Star: small body at the bottom, upper shadow at least twice the body
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ShootingStarDetector {
    pub max_body_ratio: Ratio,
    pub min_upper_ratio: Ratio,
    pub max_lower_ratio: Ratio,
    pub body_to_shadow_ratio: Ratio,
}

impl Default for ShootingStarDetector {
    fn default() -> Self {
        Self {
            max_body_ratio: Ratio::new_const(helpers::BODY_SHORT_RATIO),
            min_upper_ratio: Ratio::new_const(helpers::SHADOW_LONG_RATIO),
            max_lower_ratio: Ratio::new_const(helpers::SHADOW_SHORT_RATIO),
            body_to_shadow_ratio: Ratio::new_const(helpers::BODY_TO_SHADOW_RATIO),
        }
    }
}

impl ShootingStarDetector {
    fn shape_matches<T: OHLCV>(&self, bar: &T) -> bool {
        Shape::of(bar).is_some_and(|s| {
            is_star_shape(
                &s,
                self.max_body_ratio.get(),
                self.min_upper_ratio.get(),
                self.max_lower_ratio.get(),
                self.body_to_shadow_ratio.get(),
            )
        })
    }
}

impl PatternRule for ShootingStarDetector {
    fn tag(&self) -> PatternTag {
        PatternTag::ShootingStar
    }

    fn matches<T: OHLCV>(&self, bar: &T, _context: &[T]) -> bool {
        self.shape_matches(bar)
    }
}

/// Hanging Man: hammer shape printed at the top of the previous session
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HangingManDetector {
    #[serde(flatten)]
    pub shape: HammerDetector,
    /// Body low may sit this fraction of the previous range below its high
    pub near_ratio: Ratio,
}

impl Default for HangingManDetector {
    fn default() -> Self {
        Self {
            shape: HammerDetector::default(),
            near_ratio: Ratio::new_const(helpers::NEAR_RATIO),
        }
    }
}

impl PatternRule for HangingManDetector {
    fn tag(&self) -> PatternTag {
        PatternTag::HangingMan
    }

    fn context_len(&self) -> usize {
        1
    }

    fn matches<T: OHLCV>(&self, bar: &T, context: &[T]) -> bool {
        let Some(prev) = context.last() else {
            return false;
        };
        let floor = prev.high() - prev.range() * self.near_ratio.get();
        self.shape.shape_matches(bar) && bar.body_bottom() >= floor
    }
}

/// Inverted Hammer: shooting-star shape whose body gaps below the previous body
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct InvertedHammerDetector {
    #[serde(flatten)]
    pub shape: ShootingStarDetector,
}

impl PatternRule for InvertedHammerDetector {
    fn tag(&self) -> PatternTag {
        PatternTag::InvertedHammer
    }

    fn context_len(&self) -> usize {
        1
    }

    fn matches<T: OHLCV>(&self, bar: &T, context: &[T]) -> bool {
        let Some(prev) = context.last() else {
            return false;
        };
        self.shape.shape_matches(bar) && body_gap_down(prev, bar)
    }
}

// ============================================================
// MARUBOZU FAMILY
// ============================================================

/// Bullish Marubozu: long white body, (almost) no shadows
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BullishMarubozuDetector {
    pub min_body_ratio: Ratio,
    pub max_shadow_ratio: Ratio,
}

impl Default for BullishMarubozuDetector {
    fn default() -> Self {
        Self {
            min_body_ratio: Ratio::new_const(helpers::MARUBOZU_BODY_RATIO),
            max_shadow_ratio: Ratio::new_const(helpers::MARUBOZU_SHADOW_RATIO),
        }
    }
}

impl PatternRule for BullishMarubozuDetector {
    fn tag(&self) -> PatternTag {
        PatternTag::BullishMarubozu
    }

    fn matches<T: OHLCV>(&self, bar: &T, _context: &[T]) -> bool {
        bar.is_bullish()
            && Shape::of(bar).is_some_and(|s| {
                is_marubozu_shape(&s, self.min_body_ratio.get(), self.max_shadow_ratio.get())
            })
    }
}

/// Bearish Marubozu: long black body, (almost) no shadows
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BearishMarubozuDetector {
    pub min_body_ratio: Ratio,
    pub max_shadow_ratio: Ratio,
}

impl Default for BearishMarubozuDetector {
    fn default() -> Self {
        Self {
            min_body_ratio: Ratio::new_const(helpers::MARUBOZU_BODY_RATIO),
            max_shadow_ratio: Ratio::new_const(helpers::MARUBOZU_SHADOW_RATIO),
        }
    }
}

impl PatternRule for BearishMarubozuDetector {
    fn tag(&self) -> PatternTag {
        PatternTag::BearishMarubozu
    }

    fn matches<T: OHLCV>(&self, bar: &T, _context: &[T]) -> bool {
        bar.is_bearish()
            && Shape::of(bar).is_some_and(|s| {
                is_marubozu_shape(&s, self.min_body_ratio.get(), self.max_shadow_ratio.get())
            })
    }
}

// ============================================================
// PARAMETER METADATA
// ============================================================

const MAX_BODY_DOJI: ParamMeta =
    ParamMeta::ratio("max_body_ratio", helpers::DOJI_RATIO, (0.02, 0.2, 0.02), "Maximum body / range");
const MAX_BODY_SHORT: ParamMeta = ParamMeta::ratio(
    "max_body_ratio",
    helpers::BODY_SHORT_RATIO,
    (0.1, 0.5, 0.05),
    "Maximum body / range",
);
const BODY_TO_SHADOW: ParamMeta = ParamMeta::ratio(
    "body_to_shadow_ratio",
    helpers::BODY_TO_SHADOW_RATIO,
    (0.2, 1.0, 0.1),
    "Maximum body / dominant shadow",
);

static DOJI_PARAMS: &[ParamMeta] = &[MAX_BODY_DOJI];

static LONG_LEGGED_DOJI_PARAMS: &[ParamMeta] = &[
    MAX_BODY_DOJI,
    ParamMeta::ratio(
        "min_shadow_ratio",
        helpers::LONG_LEG_RATIO,
        (0.2, 0.45, 0.05),
        "Minimum length of each shadow / range",
    ),
];

static DRAGONFLY_DOJI_PARAMS: &[ParamMeta] = &[
    MAX_BODY_DOJI,
    ParamMeta::ratio(
        "max_upper_ratio",
        helpers::SHADOW_SHORT_RATIO,
        (0.0, 0.2, 0.05),
        "Maximum upper shadow / range",
    ),
    ParamMeta::ratio(
        "min_lower_ratio",
        helpers::SHADOW_LONG_RATIO,
        (0.5, 0.9, 0.1),
        "Minimum lower shadow / range",
    ),
];

static GRAVESTONE_DOJI_PARAMS: &[ParamMeta] = &[
    MAX_BODY_DOJI,
    ParamMeta::ratio(
        "max_lower_ratio",
        helpers::SHADOW_SHORT_RATIO,
        (0.0, 0.2, 0.05),
        "Maximum lower shadow / range",
    ),
    ParamMeta::ratio(
        "min_upper_ratio",
        helpers::SHADOW_LONG_RATIO,
        (0.5, 0.9, 0.1),
        "Minimum upper shadow / range",
    ),
];

static SPINNING_TOP_PARAMS: &[ParamMeta] = &[
    MAX_BODY_SHORT,
    ParamMeta::ratio(
        "min_shadow_ratio",
        helpers::SPINNING_SHADOW_RATIO,
        (0.1, 0.4, 0.05),
        "Minimum length of each shadow / range",
    ),
];

static HIGH_WAVE_PARAMS: &[ParamMeta] = &[
    MAX_BODY_SHORT,
    ParamMeta::ratio(
        "min_shadow_ratio",
        helpers::HIGH_WAVE_SHADOW_RATIO,
        (0.25, 0.45, 0.05),
        "Minimum length of each shadow / range",
    ),
    BODY_TO_SHADOW,
];

static HAMMER_PARAMS: &[ParamMeta] = &[
    MAX_BODY_SHORT,
    ParamMeta::ratio(
        "min_lower_ratio",
        helpers::SHADOW_LONG_RATIO,
        (0.5, 0.8, 0.05),
        "Minimum lower shadow / range",
    ),
    ParamMeta::ratio(
        "max_upper_ratio",
        helpers::SHADOW_SHORT_RATIO,
        (0.0, 0.2, 0.05),
        "Maximum upper shadow / range",
    ),
    BODY_TO_SHADOW,
];

static SHOOTING_STAR_PARAMS: &[ParamMeta] = &[
    MAX_BODY_SHORT,
    ParamMeta::ratio(
        "min_upper_ratio",
        helpers::SHADOW_LONG_RATIO,
        (0.5, 0.8, 0.05),
        "Minimum upper shadow / range",
    ),
    ParamMeta::ratio(
        "max_lower_ratio",
        helpers::SHADOW_SHORT_RATIO,
        (0.0, 0.2, 0.05),
        "Maximum lower shadow / range",
    ),
    BODY_TO_SHADOW,
];

static HANGING_MAN_PARAMS: &[ParamMeta] = &[
    MAX_BODY_SHORT,
    ParamMeta::ratio(
        "min_lower_ratio",
        helpers::SHADOW_LONG_RATIO,
        (0.5, 0.8, 0.05),
        "Minimum lower shadow / range",
    ),
    ParamMeta::ratio(
        "max_upper_ratio",
        helpers::SHADOW_SHORT_RATIO,
        (0.0, 0.2, 0.05),
        "Maximum upper shadow / range",
    ),
    BODY_TO_SHADOW,
    ParamMeta::ratio(
        "near_ratio",
        helpers::NEAR_RATIO,
        (0.0, 0.5, 0.05),
        "Allowed distance of body low below the previous high / previous range",
    ),
];

static MARUBOZU_PARAMS: &[ParamMeta] = &[
    ParamMeta::ratio(
        "min_body_ratio",
        helpers::MARUBOZU_BODY_RATIO,
        (0.8, 1.0, 0.02),
        "Minimum body / range",
    ),
    ParamMeta::ratio(
        "max_shadow_ratio",
        helpers::MARUBOZU_SHADOW_RATIO,
        (0.0, 0.1, 0.01),
        "Maximum length of each shadow / range",
    ),
];

impl ParameterizedDetector for DojiDetector {
    fn param_meta() -> &'static [ParamMeta] {
        DOJI_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            max_body_ratio: get_ratio(params, "max_body_ratio", helpers::DOJI_RATIO)?,
        })
    }

    fn pattern_tag() -> PatternTag {
        PatternTag::Doji
    }
}

impl ParameterizedDetector for LongLeggedDojiDetector {
    fn param_meta() -> &'static [ParamMeta] {
        LONG_LEGGED_DOJI_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            max_body_ratio: get_ratio(params, "max_body_ratio", helpers::DOJI_RATIO)?,
            min_shadow_ratio: get_ratio(params, "min_shadow_ratio", helpers::LONG_LEG_RATIO)?,
        })
    }

    fn pattern_tag() -> PatternTag {
        PatternTag::LongLeggedDoji
    }
}

impl ParameterizedDetector for DragonflyDojiDetector {
    fn param_meta() -> &'static [ParamMeta] {
        DRAGONFLY_DOJI_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            max_body_ratio: get_ratio(params, "max_body_ratio", helpers::DOJI_RATIO)?,
            max_upper_ratio: get_ratio(params, "max_upper_ratio", helpers::SHADOW_SHORT_RATIO)?,
            min_lower_ratio: get_ratio(params, "min_lower_ratio", helpers::SHADOW_LONG_RATIO)?,
        })
    }

    fn pattern_tag() -> PatternTag {
        PatternTag::DragonflyDoji
    }
}

impl ParameterizedDetector for GravestoneDojiDetector {
    fn param_meta() -> &'static [ParamMeta] {
        GRAVESTONE_DOJI_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            max_body_ratio: get_ratio(params, "max_body_ratio", helpers::DOJI_RATIO)?,
            max_lower_ratio: get_ratio(params, "max_lower_ratio", helpers::SHADOW_SHORT_RATIO)?,
            min_upper_ratio: get_ratio(params, "min_upper_ratio", helpers::SHADOW_LONG_RATIO)?,
        })
    }

    fn pattern_tag() -> PatternTag {
        PatternTag::GravestoneDoji
    }
}

/// The three spinning-top rules share thresholds
fn spinning_top_params(params: &HashMap<&str, f64>) -> Result<(Ratio, Ratio)> {
    Ok((
        get_ratio(params, "max_body_ratio", helpers::BODY_SHORT_RATIO)?,
        get_ratio(params, "min_shadow_ratio", helpers::SPINNING_SHADOW_RATIO)?,
    ))
}

impl ParameterizedDetector for SpinningTopDetector {
    fn param_meta() -> &'static [ParamMeta] {
        SPINNING_TOP_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let (max_body_ratio, min_shadow_ratio) = spinning_top_params(params)?;
        Ok(Self { max_body_ratio, min_shadow_ratio })
    }

    fn pattern_tag() -> PatternTag {
        PatternTag::SpinningTop
    }
}

impl ParameterizedDetector for BullishSpinningTopDetector {
    fn param_meta() -> &'static [ParamMeta] {
        SPINNING_TOP_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let (max_body_ratio, min_shadow_ratio) = spinning_top_params(params)?;
        Ok(Self { max_body_ratio, min_shadow_ratio })
    }

    fn pattern_tag() -> PatternTag {
        PatternTag::BullishSpinningTop
    }
}

impl ParameterizedDetector for BearishSpinningTopDetector {
    fn param_meta() -> &'static [ParamMeta] {
        SPINNING_TOP_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let (max_body_ratio, min_shadow_ratio) = spinning_top_params(params)?;
        Ok(Self { max_body_ratio, min_shadow_ratio })
    }

    fn pattern_tag() -> PatternTag {
        PatternTag::BearishSpinningTop
    }
}

impl ParameterizedDetector for HighWaveDetector {
    fn param_meta() -> &'static [ParamMeta] {
        HIGH_WAVE_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            max_body_ratio: get_ratio(params, "max_body_ratio", helpers::BODY_SHORT_RATIO)?,
            min_shadow_ratio: get_ratio(
                params,
                "min_shadow_ratio",
                helpers::HIGH_WAVE_SHADOW_RATIO,
            )?,
            body_to_shadow_ratio: get_ratio(
                params,
                "body_to_shadow_ratio",
                helpers::BODY_TO_SHADOW_RATIO,
            )?,
        })
    }

    fn pattern_tag() -> PatternTag {
        PatternTag::HighWave
    }
}

impl ParameterizedDetector for HammerDetector {
    fn param_meta() -> &'static [ParamMeta] {
        HAMMER_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            max_body_ratio: get_ratio(params, "max_body_ratio", helpers::BODY_SHORT_RATIO)?,
            min_lower_ratio: get_ratio(params, "min_lower_ratio", helpers::SHADOW_LONG_RATIO)?,
            max_upper_ratio: get_ratio(params, "max_upper_ratio", helpers::SHADOW_SHORT_RATIO)?,
            body_to_shadow_ratio: get_ratio(
                params,
                "body_to_shadow_ratio",
                helpers::BODY_TO_SHADOW_RATIO,
            )?,
        })
    }

    fn pattern_tag() -> PatternTag {
        PatternTag::Hammer
    }
}

impl ParameterizedDetector for ShootingStarDetector {
    fn param_meta() -> &'static [ParamMeta] {
        SHOOTING_STAR_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            max_body_ratio: get_ratio(params, "max_body_ratio", helpers::BODY_SHORT_RATIO)?,
            min_upper_ratio: get_ratio(params, "min_upper_ratio", helpers::SHADOW_LONG_RATIO)?,
            max_lower_ratio: get_ratio(params, "max_lower_ratio", helpers::SHADOW_SHORT_RATIO)?,
            body_to_shadow_ratio: get_ratio(
                params,
                "body_to_shadow_ratio",
                helpers::BODY_TO_SHADOW_RATIO,
            )?,
        })
    }

    fn pattern_tag() -> PatternTag {
        PatternTag::ShootingStar
    }
}

impl ParameterizedDetector for HangingManDetector {
    fn param_meta() -> &'static [ParamMeta] {
        HANGING_MAN_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            shape: HammerDetector::with_params(params)?,
            near_ratio: get_ratio(params, "near_ratio", helpers::NEAR_RATIO)?,
        })
    }

    fn pattern_tag() -> PatternTag {
        PatternTag::HangingMan
    }
}

impl ParameterizedDetector for InvertedHammerDetector {
    fn param_meta() -> &'static [ParamMeta] {
        SHOOTING_STAR_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            shape: ShootingStarDetector::with_params(params)?,
        })
    }

    fn pattern_tag() -> PatternTag {
        PatternTag::InvertedHammer
    }
}

impl ParameterizedDetector for BullishMarubozuDetector {
    fn param_meta() -> &'static [ParamMeta] {
        MARUBOZU_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            min_body_ratio: get_ratio(params, "min_body_ratio", helpers::MARUBOZU_BODY_RATIO)?,
            max_shadow_ratio: get_ratio(params, "max_shadow_ratio", helpers::MARUBOZU_SHADOW_RATIO)?,
        })
    }

    fn pattern_tag() -> PatternTag {
        PatternTag::BullishMarubozu
    }
}

impl ParameterizedDetector for BearishMarubozuDetector {
    fn param_meta() -> &'static [ParamMeta] {
        MARUBOZU_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            min_body_ratio: get_ratio(params, "min_body_ratio", helpers::MARUBOZU_BODY_RATIO)?,
            max_shadow_ratio: get_ratio(params, "max_shadow_ratio", helpers::MARUBOZU_SHADOW_RATIO)?,
        })
    }

    fn pattern_tag() -> PatternTag {
        PatternTag::BearishMarubozu
    }
}

// ============================================================
// TESTS
// ============================================================
