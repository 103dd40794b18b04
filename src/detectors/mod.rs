//! Candlestick pattern rules
//!
//! One detector struct per [`PatternTag`](crate::PatternTag). Thresholds are
//! plain fields so a rule table can be serialized, tuned and compared.
//!
//! # Pattern Categories
//!
//! - **Single-bar (14)**: Doji variants, spinning tops, hammer family, marubozu
//! - **Two-bar (4)**: Piercing Line, Dark Cloud Cover, engulfing
//! - **Three-bar (4)**: Morning/Evening Star, Three Soldiers/Crows

pub mod helpers;

/// Generate `with_defaults()` -> `Self::default()` for multiple detector types.
macro_rules! impl_with_defaults {
  ($($detector:ty),* $(,)?) => {
    $(impl $detector {
      pub fn with_defaults() -> Self { Self::default() }
    })*
  };
}

pub mod single_bar;
pub mod three_bar;
pub mod two_bar;

pub use helpers::*;
pub use single_bar::*;
pub use three_bar::*;
pub use two_bar::*;
