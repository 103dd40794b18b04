//! # CandleSage
//!
//! Candlestick pattern detection and bit-encoding for NSE Bhavcopy end-of-day data.
//!
//! ## Quick Start
//!
//! ```rust
//! use candlesage::prelude::*;
//!
//! let raw = RawBar::new("INFY", "02-Jan-2025", "100", "101", "99", "100", "125000");
//! let bar = normalize(&raw).unwrap();
//!
//! // Process-wide default rule table
//! let matcher = Matcher::global();
//! let tags = matcher.match_bar(&bar, &[]);
//! assert!(tags.contains(PatternTag::Doji));
//!
//! // Pack for storage and unpack at query time
//! let value = encode(&tags);
//! assert_eq!(decode(value.get() as u64).unwrap(), tags);
//! ```

use std::collections::HashMap;
use std::sync::OnceLock;

pub mod bar;
pub mod bhavcopy;
pub mod detectors;
pub mod encoding;
pub mod params;
pub mod pipeline;

pub use bar::{canonical_symbol, normalize, Bar, BarDefect, InvalidBarError, RawBar};
pub use encoding::{decode, encode, PatternSet, PatternValue};

pub mod prelude {
    pub use crate::{
        // Ingestion
        bhavcopy::{bhavcopy_file_name, read_bhavcopy, write_tagged_csv, IngestError},
        // Detectors
        detectors::*,
        // Parameters
        params::{get_ratio, ParamMeta, ParameterizedDetector},
        // Pipeline
        pipeline::{
            tag_parallel, tag_records, tag_series, RecordsOutcome, SeriesError, SymbolStream,
            TaggedBar, TaggedSeries,
        },
        // Normalizer
        canonical_symbol,
        normalize,
        Bar,
        BarDefect,
        // Rules
        BuiltinRule,
        // Encoder
        decode,
        encode,
        Direction,
        InvalidBarError,
        // Matcher
        Matcher,
        MatcherBuilder,
        OHLCVExt,
        // Errors
        PatternError,
        PatternRule,
        PatternSet,
        PatternTag,
        PatternValue,
        Ratio,
        RawBar,
        Result,
        RuleTable,
        MAX_CONTEXT,
        OHLCV,
        RULES_VERSION,
    };
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, PatternError>;

/// Errors raised by the pattern core
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatternError {
    #[error(transparent)]
    InvalidBar(#[from] InvalidBarError),

    #[error("{tag} needs {need} prior bars, got {got}")]
    InsufficientContext {
        tag: PatternTag,
        need: usize,
        got: usize,
    },

    #[error("pattern value {value:#x} has bits outside the tag table (mask {mask:#x})")]
    UnknownBits { value: u64, mask: u64 },

    #[error("{symbol}: bar dated {date} does not follow {last}")]
    OutOfOrder {
        symbol: String,
        date: chrono::NaiveDate,
        last: chrono::NaiveDate,
    },

    #[error("{symbol} @ {date} pushed into the stream for {expected}")]
    SymbolMismatch {
        expected: String,
        symbol: String,
        date: chrono::NaiveDate,
    },

    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(PatternError::InvalidValue(
                "Ratio cannot be NaN or infinite",
            ));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(PatternError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    /// Create a Ratio from a compile-time constant (library internal use)
    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Core OHLCV data trait
pub trait OHLCV {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;
}

/// Extension trait with computed candle geometry
pub trait OHLCVExt: OHLCV {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn upper_shadow(&self) -> f64 {
        self.high() - self.open().max(self.close())
    }

    #[inline]
    fn lower_shadow(&self) -> f64 {
        self.open().min(self.close()) - self.low()
    }

    #[inline]
    fn body_top(&self) -> f64 {
        self.open().max(self.close())
    }

    #[inline]
    fn body_bottom(&self) -> f64 {
        self.open().min(self.close())
    }

    #[inline]
    fn body_midpoint(&self) -> f64 {
        (self.open() + self.close()) / 2.0
    }

    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// Body as ratio of range. Returns None if range is ~0
    #[inline]
    fn body_ratio(&self) -> Option<f64> {
        let range = self.range();
        (range > f64::EPSILON).then(|| self.body() / range)
    }

    #[inline]
    fn upper_shadow_ratio(&self) -> Option<f64> {
        let range = self.range();
        (range > f64::EPSILON).then(|| self.upper_shadow() / range)
    }

    #[inline]
    fn lower_shadow_ratio(&self) -> Option<f64> {
        let range = self.range();
        (range > f64::EPSILON).then(|| self.lower_shadow() / range)
    }

    /// Check OHLC consistency of an already-built candle
    fn validate(&self) -> Result<()> {
        let prices = [self.open(), self.high(), self.low(), self.close()];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(PatternError::InvalidValue("non-finite price in OHLC"));
        }
        if self.high() < self.low() {
            return Err(PatternError::InvalidValue("high < low"));
        }
        if self.body_bottom() < self.low() || self.body_top() > self.high() {
            return Err(PatternError::InvalidValue("open/close outside [low, high]"));
        }
        Ok(())
    }
}

impl<T: OHLCV> OHLCVExt for T {}

// ============================================================
// DIRECTION
// ============================================================

/// Direction/bias of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    Bullish,
    Neutral,
    Bearish,
}

impl Direction {
    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(self, Direction::Bullish)
    }

    #[inline]
    pub fn is_bearish(self) -> bool {
        matches!(self, Direction::Bearish)
    }
}

// ============================================================
// PATTERN RULE TRAIT
// ============================================================

/// Longest trailing window any builtin rule asks for
pub const MAX_CONTEXT: usize = 3;

/// A single deterministic pattern predicate.
///
/// `context` holds exactly [`context_len`](PatternRule::context_len) bars in
/// chronological order, the last one being the session right before `bar`.
pub trait PatternRule: Send + Sync {
    fn tag(&self) -> PatternTag;

    fn context_len(&self) -> usize {
        0
    }

    fn matches<T: OHLCV>(&self, bar: &T, context: &[T]) -> bool;

    fn validate_config(&self) -> Result<()> {
        Ok(())
    }
}

// ============================================================
// TAG + RULE TABLE - generated via macro
// ============================================================

use detectors::*;
use params::{ParamMeta, ParameterizedDetector};

/// Generates `PatternTag` (with fixed discriminants) and the matching
/// `BuiltinRule` enum from one list, so a tag can never exist without its rule.
macro_rules! define_pattern_table {
    (
        $(
            $index:literal => $variant:ident($detector:ty), $name:literal, $key:literal, $dir:ident
        ),* $(,)?
    ) => {
        /// Canonical pattern identifiers.
        ///
        /// The discriminant is the bit position inside a [`PatternValue`].
        /// Never reorder or reuse an index: stored values depend on it.
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[repr(u8)]
        pub enum PatternTag {
            $($variant = $index),*
        }

        impl PatternTag {
            /// All tags in canonical index order
            pub const ALL: &'static [PatternTag] = &[$(PatternTag::$variant),*];

            /// Number of tags (= number of meaningful bits)
            pub const COUNT: usize = Self::ALL.len();

            #[inline]
            pub const fn index(self) -> usize {
                self as usize
            }

            #[inline]
            pub const fn bit(self) -> u32 {
                1 << (self as u32)
            }

            pub fn from_index(index: usize) -> Option<Self> {
                Self::ALL.get(index).copied()
            }

            /// Human-readable name, as written to `matched_patterns`
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),*
                }
            }

            /// Stable snake_case key used in configuration files
            pub fn key(self) -> &'static str {
                match self {
                    $(Self::$variant => $key),*
                }
            }

            pub fn from_key(key: &str) -> Option<Self> {
                match key {
                    $($key => Some(Self::$variant),)*
                    _ => None,
                }
            }

            /// Typical bias of the pattern
            pub fn direction(self) -> Direction {
                match self {
                    $(Self::$variant => Direction::$dir),*
                }
            }

            /// Builtin rule with default thresholds
            pub fn default_rule(self) -> BuiltinRule {
                match self {
                    $(Self::$variant => BuiltinRule::$variant(<$detector>::default())),*
                }
            }

            /// Thresholds of this tag's rule
            pub fn param_meta(self) -> &'static [ParamMeta] {
                match self {
                    $(Self::$variant => <$detector as ParameterizedDetector>::param_meta()),*
                }
            }

            /// Rule for this tag with thresholds taken from `params`
            pub fn rule_with_params(self, params: &HashMap<&str, f64>) -> Result<BuiltinRule> {
                params::check_known_keys(self, self.param_meta(), params)?;
                match self {
                    $(Self::$variant => {
                        <$detector as ParameterizedDetector>::with_params(params)
                            .map(BuiltinRule::$variant)
                    }),*
                }
            }
        }

        /// All builtin rules - fast path via enum dispatch
        #[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
        pub enum BuiltinRule {
            $($variant($detector)),*
        }

        impl BuiltinRule {
            #[inline]
            pub fn matches<T: OHLCV>(&self, bar: &T, context: &[T]) -> bool {
                match self {
                    $(Self::$variant(d) => PatternRule::matches(d, bar, context)),*
                }
            }

            #[inline]
            pub fn tag(&self) -> PatternTag {
                match self {
                    $(Self::$variant(d) => PatternRule::tag(d)),*
                }
            }

            #[inline]
            pub fn context_len(&self) -> usize {
                match self {
                    $(Self::$variant(d) => PatternRule::context_len(d)),*
                }
            }

            pub fn validate_config(&self) -> Result<()> {
                match self {
                    $(Self::$variant(d) => PatternRule::validate_config(d)),*
                }
            }
        }
    };
}

define_pattern_table! {
    // Indices 0..=11 match the bit layout of pattern_value columns written
    // by the legacy loader (names packed most-significant first).
    0 => LongLeggedDoji(LongLeggedDojiDetector), "Long Legged Doji", "long_legged_doji", Neutral,
    1 => Doji(DojiDetector), "Doji", "doji", Neutral,
    2 => BearishSpinningTop(BearishSpinningTopDetector), "Bearish Spinning Top", "bearish_spinning_top", Bearish,
    3 => GravestoneDoji(GravestoneDojiDetector), "Gravestone Doji", "gravestone_doji", Bearish,
    4 => ShootingStar(ShootingStarDetector), "Shooting Star", "shooting_star", Bearish,
    5 => HangingMan(HangingManDetector), "Hanging Man", "hanging_man", Bearish,
    6 => BullishSpinningTop(BullishSpinningTopDetector), "Bullish Spinning Top", "bullish_spinning_top", Bullish,
    7 => BullishMarubozu(BullishMarubozuDetector), "Bullish Marubozu", "bullish_marubozu", Bullish,
    8 => PiercingLine(PiercingLineDetector), "Piercing Line", "piercing_line", Bullish,
    9 => DragonflyDoji(DragonflyDojiDetector), "Dragonfly Doji", "dragonfly_doji", Bullish,
    10 => InvertedHammer(InvertedHammerDetector), "Inverted Hammer", "inverted_hammer", Bullish,
    11 => Hammer(HammerDetector), "Hammer", "hammer", Bullish,

    12 => BearishMarubozu(BearishMarubozuDetector), "Bearish Marubozu", "bearish_marubozu", Bearish,
    13 => SpinningTop(SpinningTopDetector), "Spinning Top", "spinning_top", Neutral,
    14 => HighWave(HighWaveDetector), "High Wave", "high_wave", Neutral,
    15 => DarkCloudCover(DarkCloudCoverDetector), "Dark Cloud Cover", "dark_cloud_cover", Bearish,
    16 => BullishEngulfing(BullishEngulfingDetector), "Bullish Engulfing", "bullish_engulfing", Bullish,
    17 => BearishEngulfing(BearishEngulfingDetector), "Bearish Engulfing", "bearish_engulfing", Bearish,
    18 => MorningStar(MorningStarDetector), "Morning Star", "morning_star", Bullish,
    19 => EveningStar(EveningStarDetector), "Evening Star", "evening_star", Bearish,
    20 => ThreeWhiteSoldiers(ThreeWhiteSoldiersDetector), "Three White Soldiers", "three_white_soldiers", Bullish,
    21 => ThreeBlackCrows(ThreeBlackCrowsDetector), "Three Black Crows", "three_black_crows", Bearish,
}

// `PatternValue` is a u32
const _: () = assert!(PatternTag::COUNT <= 32);

impl std::fmt::Display for PatternTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================
// RULE TABLE (serializable configuration)
// ============================================================

/// Version of the default threshold set. Bump whenever a default changes so
/// stored values can be traced back to the thresholds that produced them.
pub const RULES_VERSION: u32 = 1;

/// One rule per tag, in canonical index order
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RuleTable {
    pub version: u32,
    pub rules: Vec<BuiltinRule>,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self {
            version: RULES_VERSION,
            rules: PatternTag::ALL.iter().map(|t| t.default_rule()).collect(),
        }
    }
}

impl RuleTable {
    /// Check version, slot order and every rule's thresholds
    pub fn validate(&self) -> Result<()> {
        if self.version != RULES_VERSION {
            return Err(PatternError::InvalidConfig(format!(
                "rule table version {} is not supported (expected {})",
                self.version, RULES_VERSION
            )));
        }
        if self.rules.len() != PatternTag::COUNT {
            return Err(PatternError::InvalidConfig(format!(
                "rule table has {} rules, expected {}",
                self.rules.len(),
                PatternTag::COUNT
            )));
        }
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.tag().index() != index {
                return Err(PatternError::InvalidConfig(format!(
                    "slot {} holds the rule for {}",
                    index,
                    rule.tag()
                )));
            }
            if rule.context_len() > MAX_CONTEXT {
                return Err(PatternError::InvalidConfig(format!(
                    "{} asks for {} context bars, max is {}",
                    rule.tag(),
                    rule.context_len(),
                    MAX_CONTEXT
                )));
            }
            rule.validate_config()?;
        }
        Ok(())
    }
}

// ============================================================
// MATCHER
// ============================================================

/// Immutable pattern matcher. Cheap to share across threads by reference.
#[derive(Debug, Clone)]
pub struct Matcher {
    rules: Vec<BuiltinRule>,
    enabled: PatternValue,
    version: u32,
}

impl Default for Matcher {
    fn default() -> Self {
        let table = RuleTable::default();
        Self {
            rules: table.rules,
            enabled: PatternValue::ALL,
            version: table.version,
        }
    }
}

static GLOBAL: OnceLock<Matcher> = OnceLock::new();

impl Matcher {
    /// Process-wide matcher with the default rule table, built on first use
    pub fn global() -> &'static Matcher {
        GLOBAL.get_or_init(|| {
            tracing::debug!(
                version = RULES_VERSION,
                rules = PatternTag::COUNT,
                "initialising default pattern matcher"
            );
            Matcher::default()
        })
    }

    /// Build from a (possibly deserialized) rule table
    pub fn from_table(table: RuleTable) -> Result<Self> {
        MatcherBuilder::from_table(table).build()
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Rule currently configured for `tag`
    pub fn rule(&self, tag: PatternTag) -> &BuiltinRule {
        &self.rules[tag.index()]
    }

    /// Tags this matcher evaluates
    pub fn enabled(&self) -> PatternValue {
        self.enabled
    }

    /// Snapshot of the rule table, e.g. for persisting next to stored values
    pub fn table(&self) -> RuleTable {
        RuleTable {
            version: self.version,
            rules: self.rules.clone(),
        }
    }

    /// Evaluate every enabled rule against `bar`.
    ///
    /// `context` is the chronological run of bars before `bar` (last element
    /// is the previous session). Rules that need more history than supplied
    /// are skipped; they never fail the whole match.
    pub fn match_bar<T: OHLCV>(&self, bar: &T, context: &[T]) -> PatternSet {
        let mut set = PatternSet::new();
        for rule in &self.rules {
            let tag = rule.tag();
            if !self.enabled.contains(tag) {
                continue;
            }
            match Self::evaluate_rule(rule, bar, context) {
                Ok(true) => {
                    set.insert(tag);
                },
                Ok(false) => {},
                Err(e) => tracing::trace!(%tag, error = %e, "rule skipped"),
            }
        }
        set
    }

    /// Match and encode in one step
    pub fn match_value<T: OHLCV>(&self, bar: &T, context: &[T]) -> PatternValue {
        encode(&self.match_bar(bar, context))
    }

    /// Evaluate a single rule, reporting a short window as an error.
    ///
    /// Tags outside [`enabled`](Matcher::enabled) never match.
    pub fn evaluate<T: OHLCV>(&self, tag: PatternTag, bar: &T, context: &[T]) -> Result<bool> {
        if !self.enabled.contains(tag) {
            return Ok(false);
        }
        Self::evaluate_rule(self.rule(tag), bar, context)
    }

    fn evaluate_rule<T: OHLCV>(rule: &BuiltinRule, bar: &T, context: &[T]) -> Result<bool> {
        let need = rule.context_len();
        if context.len() < need {
            return Err(PatternError::InsufficientContext {
                tag: rule.tag(),
                need,
                got: context.len(),
            });
        }
        let window = &context[context.len() - need..];
        Ok(rule.matches(bar, window))
    }
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for custom matchers
pub struct MatcherBuilder {
    table: RuleTable,
    enabled: PatternValue,
}

impl Default for MatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MatcherBuilder {
    /// Start from the default rule table with every tag enabled
    pub fn new() -> Self {
        Self::from_table(RuleTable::default())
    }

    pub fn from_table(table: RuleTable) -> Self {
        Self {
            table,
            enabled: PatternValue::ALL,
        }
    }

    /// Replace the rule for its tag
    #[allow(clippy::should_implement_trait)]
    pub fn rule(mut self, rule: BuiltinRule) -> Self {
        let index = rule.tag().index();
        if let Some(slot) = self.table.rules.get_mut(index) {
            *slot = rule;
        }
        self
    }

    /// Replace with config validation
    pub fn rule_checked(self, rule: BuiltinRule) -> Result<Self> {
        rule.validate_config()?;
        Ok(self.rule(rule))
    }

    /// Replace a rule's thresholds from a name -> value map
    pub fn tune(self, tag: PatternTag, params: &HashMap<&str, f64>) -> Result<Self> {
        let rule = tag.rule_with_params(params)?;
        self.rule_checked(rule)
    }

    /// Evaluate only these tags; the others never match
    pub fn only_tags(mut self, tags: impl IntoIterator<Item = PatternTag>) -> Self {
        self.enabled = encode(tags);
        self
    }

    /// Build the matcher
    pub fn build(self) -> Result<Matcher> {
        self.table.validate()?;
        tracing::debug!(
            version = self.table.version,
            enabled = self.enabled.get(),
            "pattern matcher built"
        );
        Ok(Matcher {
            rules: self.table.rules,
            enabled: self.enabled,
            version: self.table.version,
        })
    }
}

// ============================================================
// TESTS
// ============================================================
