//! Threshold metadata for pattern rules
//!
//! Every rule's thresholds are ratios in `0.0..=1.0`. This module describes
//! them so that a rule table can be:
//! - documented next to stored `pattern_value`s
//! - tuned from a flat `name -> value` map (config files, grid search)
//! - validated before a matcher is built
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use candlesage::prelude::*;
//!
//! for param in HammerDetector::param_meta() {
//!     println!("{}: default {} {:?}", param.name, param.default, param.range);
//! }
//!
//! let params = HashMap::from([("max_body_ratio", 0.2)]);
//! let hammer = HammerDetector::with_params(&params).unwrap();
//! assert_eq!(hammer.max_body_ratio.get(), 0.2);
//! ```

use std::collections::HashMap;

use crate::{PatternError, PatternTag, Ratio, Result};

// ============================================================
// PARAMETER METADATA
// ============================================================

/// Metadata for a single rule threshold
#[derive(Debug, Clone)]
pub struct ParamMeta {
  /// Parameter name (e.g., "max_body_ratio")
  pub name: &'static str,
  /// Default value
  pub default: f64,
  /// Range for optimization: (min, max, step)
  pub range: (f64, f64, f64),
  /// Human-readable description
  pub description: &'static str,
}

impl ParamMeta {
  /// Create a new ParamMeta for a ratio threshold
  pub const fn ratio(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, default, range, description }
  }

  /// Validate a value for this parameter
  pub fn validate(&self, value: f64) -> Result<()> {
    let (min, max, _) = self.range;
    if value < min || value > max {
      return Err(PatternError::OutOfRange { field: self.name, value, min, max });
    }
    Ratio::new(value).map(|_| ())
  }
}

// ============================================================
// PARAMETERIZED DETECTOR TRAIT
// ============================================================

/// Detectors whose thresholds can be listed and set by name
pub trait ParameterizedDetector: Sized {
  /// Returns metadata for all configurable thresholds
  fn param_meta() -> &'static [ParamMeta];

  /// Creates a detector from a name -> value map.
  ///
  /// Missing parameters use their default values.
  fn with_params(params: &HashMap<&str, f64>) -> Result<Self>;

  /// Tag this detector decides
  fn pattern_tag() -> PatternTag;
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

/// Helper to get a Ratio from params with default fallback
pub fn get_ratio(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<Ratio> {
  let value = params.get(key).copied().unwrap_or(default);
  Ratio::new(value)
}

/// Reject keys that no threshold of `meta` answers to, so typos in a config
/// file do not silently fall back to defaults
pub fn check_known_keys(
  tag: PatternTag,
  meta: &[ParamMeta],
  params: &HashMap<&str, f64>,
) -> Result<()> {
  match params.keys().find(|k| !meta.iter().any(|m| m.name == **k)) {
    Some(unknown) => {
      Err(PatternError::InvalidConfig(format!("{} has no threshold named '{}'", tag.key(), unknown)))
    },
    None => Ok(()),
  }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
  use super::*;
  use crate::detectors::HammerDetector;

  #[test]
  fn test_param_meta_ratio() {
    let meta = ParamMeta::ratio("test_ratio", 0.5, (0.3, 0.7, 0.1), "Test ratio parameter");

    assert_eq!(meta.name, "test_ratio");
    assert_eq!(meta.default, 0.5);
  }

  #[test]
  fn test_validate_ratio() {
    let meta = ParamMeta::ratio("test", 0.5, (0.3, 0.7, 0.1), "Test");

    assert!(meta.validate(0.5).is_ok());
    assert!(meta.validate(0.3).is_ok());
    assert!(meta.validate(0.7).is_ok());
    assert!(meta.validate(0.2).is_err());
    assert!(meta.validate(0.8).is_err());
  }

  #[test]
  fn test_get_ratio_helper() {
    let mut params = HashMap::new();
    params.insert("key1", 0.8);

    assert!((get_ratio(&params, "key1", 0.5).unwrap().get() - 0.8).abs() < f64::EPSILON);
    assert!((get_ratio(&params, "key2", 0.5).unwrap().get() - 0.5).abs() < f64::EPSILON);
    params.insert("key3", 1.5);
    assert!(get_ratio(&params, "key3", 0.5).is_err());
  }

  #[test]
  fn test_defaults_within_ranges() {
    for tag in PatternTag::ALL {
      for meta in tag.param_meta() {
        assert!(meta.validate(meta.default).is_ok(), "{} {}", tag.key(), meta.name);
      }
    }
  }

  #[test]
  fn test_unknown_key_rejected() {
    let params = HashMap::from([("max_body_ratoi", 0.2)]);
    let err = check_known_keys(PatternTag::Hammer, HammerDetector::param_meta(), &params);
    assert!(matches!(err, Err(PatternError::InvalidConfig(_))));
    assert!(PatternTag::Hammer.rule_with_params(&params).is_err());
  }
}
