//! Per-symbol tagging
//!
//! Feeds bars through a [`Matcher`] in chronological order so multi-bar rules
//! see the right trailing window, and fans independent symbols out over rayon.

use std::collections::{BTreeMap, VecDeque};

use rayon::prelude::*;
use serde::ser::SerializeStruct;

use crate::{
    canonical_symbol, Bar, InvalidBarError, Matcher, PatternError, PatternSet, PatternValue, RawBar, Result,
    MAX_CONTEXT, OHLCV,
};

// ============================================================
// TAGGED BAR
// ============================================================

/// A bar with its encoded pattern set, ready for storage.
///
/// Only built by matching, so the value always belongs to the bar.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedBar {
    bar: Bar,
    pattern_value: PatternValue,
}

impl TaggedBar {
    /// Match `bar` against `context` (chronological, previous session last)
    pub fn new(matcher: &Matcher, bar: Bar, context: &[Bar]) -> Self {
        let pattern_value = matcher.match_value(&bar, context);
        Self { bar, pattern_value }
    }

    #[inline]
    pub fn bar(&self) -> &Bar {
        &self.bar
    }

    #[inline]
    pub fn pattern_value(&self) -> PatternValue {
        self.pattern_value
    }

    pub fn matched_patterns(&self) -> PatternSet {
        self.pattern_value.tags()
    }

    /// Storage keeps only bars where something matched
    #[inline]
    pub fn has_patterns(&self) -> bool {
        !self.pattern_value.is_empty()
    }
}

impl serde::Serialize for TaggedBar {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        let bar = &self.bar;
        let mut st = s.serialize_struct("TaggedBar", 11)?;
        st.serialize_field("symbol", bar.symbol())?;
        st.serialize_field("date", &bar.date())?;
        st.serialize_field("open", &bar.open())?;
        st.serialize_field("high", &bar.high())?;
        st.serialize_field("low", &bar.low())?;
        st.serialize_field("close", &bar.close())?;
        st.serialize_field("volume", &bar.volume_qty())?;
        st.serialize_field("prev_close", &bar.prev_close())?;
        st.serialize_field("avg_price", &bar.avg_price())?;
        st.serialize_field("pattern_value", &self.pattern_value)?;
        st.serialize_field("matched_patterns", &self.matched_patterns())?;
        st.end()
    }
}

// ============================================================
// STREAMING
// ============================================================

/// Stateful tagger for one symbol.
///
/// Keeps the last [`MAX_CONTEXT`] bars; dates must strictly increase.
#[derive(Debug)]
pub struct SymbolStream<'m> {
    matcher: &'m Matcher,
    symbol: String,
    window: VecDeque<Bar>,
}

impl<'m> SymbolStream<'m> {
    /// `symbol` is canonicalized like [`normalize`](crate::normalize) does
    pub fn new(matcher: &'m Matcher, symbol: &str) -> Self {
        Self {
            matcher,
            symbol: canonical_symbol(symbol),
            window: VecDeque::with_capacity(MAX_CONTEXT + 1),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Bars currently available as context
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Tag the next session and slide the window
    pub fn push(&mut self, bar: Bar) -> Result<TaggedBar> {
        if bar.symbol() != self.symbol {
            return Err(PatternError::SymbolMismatch {
                expected: self.symbol.clone(),
                symbol: bar.symbol().to_string(),
                date: bar.date(),
            });
        }
        if let Some(last) = self.window.back() {
            if bar.date() <= last.date() {
                return Err(PatternError::OutOfOrder {
                    symbol: self.symbol.clone(),
                    date: bar.date(),
                    last: last.date(),
                });
            }
        }

        let tagged = TaggedBar::new(self.matcher, bar.clone(), self.window.make_contiguous());
        self.window.push_back(bar);
        if self.window.len() > MAX_CONTEXT {
            self.window.pop_front();
        }
        Ok(tagged)
    }
}

/// Tag one chronological series. All bars must share the first bar's symbol.
pub fn tag_series(matcher: &Matcher, bars: &[Bar]) -> Result<Vec<TaggedBar>> {
    let Some(first) = bars.first() else {
        return Ok(Vec::new());
    };
    let mut stream = SymbolStream::new(matcher, first.symbol());
    bars.iter().map(|bar| stream.push(bar.clone())).collect()
}

// ============================================================
// PARALLEL TAGGING
// ============================================================

/// Tagged bars of a single instrument
#[derive(Debug, Clone)]
pub struct TaggedSeries {
    pub symbol: String,
    pub bars: Vec<TaggedBar>,
}

/// Error from tagging a single instrument
#[derive(Debug, Clone, thiserror::Error)]
#[error("{symbol}: {error}")]
pub struct SeriesError {
    pub symbol: String,
    pub error: PatternError,
}

/// Tag many instruments in parallel. Output keeps input order.
pub fn tag_parallel<'a, I>(matcher: &Matcher, instruments: I) -> (Vec<TaggedSeries>, Vec<SeriesError>)
where
    I: IntoParallelIterator<Item = (&'a str, &'a [Bar])>,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, bars)| {
            tag_series(matcher, bars)
                .map(|bars| TaggedSeries {
                    symbol: symbol.to_string(),
                    bars,
                })
                .map_err(|error| SeriesError {
                    symbol: symbol.to_string(),
                    error,
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => errors.push(e),
        }
    }

    (successes, errors)
}

/// Outcome of [`tag_records`]
#[derive(Debug, Default)]
pub struct RecordsOutcome {
    /// Ordered by symbol, then date
    pub tagged: Vec<TaggedBar>,
    /// Records that failed normalization
    pub rejected: Vec<InvalidBarError>,
    pub failed: Vec<SeriesError>,
}

/// Normalize and tag a day-mixed batch of raw records.
///
/// Non-`EQ` rows are ignored. Invalid rows are logged and reported in
/// `rejected`; the remaining bars are grouped per symbol, sorted by date and
/// de-duplicated (first record for a date wins) before tagging.
pub fn tag_records(matcher: &Matcher, raws: &[RawBar]) -> RecordsOutcome {
    let mut outcome = RecordsOutcome::default();
    let mut groups: BTreeMap<String, Vec<Bar>> = BTreeMap::new();

    for raw in raws.iter().filter(|r| r.is_equity()) {
        match crate::normalize(raw) {
            Ok(bar) => groups.entry(bar.symbol().to_string()).or_default().push(bar),
            Err(e) => {
                tracing::warn!(symbol = %e.symbol, date = %e.date, defect = %e.defect, "skipping record");
                outcome.rejected.push(e);
            },
        }
    }

    for (symbol, bars) in groups.iter_mut() {
        bars.sort_by_key(Bar::date);
        let before = bars.len();
        bars.dedup_by_key(|b| b.date());
        if bars.len() != before {
            tracing::warn!(%symbol, duplicates = before - bars.len(), "dropped duplicate dates");
        }
    }

    let instruments: Vec<(&str, &[Bar])> =
        groups.iter().map(|(s, b)| (s.as_str(), b.as_slice())).collect();
    let (series, failed) = tag_parallel(matcher, instruments);

    outcome.tagged = series.into_iter().flat_map(|s| s.bars).collect();
    outcome.failed = failed;

    tracing::info!(
        symbols = groups.len(),
        tagged = outcome.tagged.len(),
        with_patterns = outcome.tagged.iter().filter(|t| t.has_patterns()).count(),
        rejected = outcome.rejected.len(),
        "records tagged"
    );
    outcome
}
