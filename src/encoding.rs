//! Pattern set encoding
//!
//! A bar's matched tags are stored as one integer: bit `i` is set iff
//! the tag with canonical index `i` matched. The mapping is a bijection
//! between tag subsets and `[0, 2^PatternTag::COUNT)`.

use std::collections::BTreeSet;

use crate::{PatternError, PatternTag, Result};

// ============================================================
// PATTERN SET
// ============================================================

/// Order-insensitive set of matched tags; iterates in canonical index order
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PatternSet(BTreeSet<PatternTag>);

impl PatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the tag was not already present
    pub fn insert(&mut self, tag: PatternTag) -> bool {
        self.0.insert(tag)
    }

    pub fn remove(&mut self, tag: PatternTag) -> bool {
        self.0.remove(&tag)
    }

    #[inline]
    pub fn contains(&self, tag: PatternTag) -> bool {
        self.0.contains(&tag)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = PatternTag> + '_ {
        self.0.iter().copied()
    }

    pub fn union(&self, other: &PatternSet) -> PatternSet {
        self.0.union(&other.0).copied().collect()
    }

    /// Display names, the `matched_patterns` column
    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(PatternTag::name).collect()
    }
}

impl FromIterator<PatternTag> for PatternSet {
    fn from_iter<I: IntoIterator<Item = PatternTag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<PatternTag> for PatternSet {
    fn extend<I: IntoIterator<Item = PatternTag>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}

impl<'a> IntoIterator for &'a PatternSet {
    type Item = PatternTag;
    type IntoIter = std::iter::Copied<std::collections::btree_set::Iter<'a, PatternTag>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

impl IntoIterator for PatternSet {
    type Item = PatternTag;
    type IntoIter = std::collections::btree_set::IntoIter<PatternTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl serde::Serialize for PatternSet {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.collect_seq(self.iter().map(PatternTag::name))
    }
}

// ============================================================
// PATTERN VALUE
// ============================================================

/// Bit-packed pattern set as stored next to the bar
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize,
)]
#[serde(transparent)]
pub struct PatternValue(u32);

impl PatternValue {
    /// No pattern matched
    pub const EMPTY: PatternValue = PatternValue(0);

    /// Every known tag
    pub const ALL: PatternValue = PatternValue(Self::MASK);

    const MASK: u32 = if PatternTag::COUNT == 32 {
        u32::MAX
    } else {
        (1u32 << PatternTag::COUNT) - 1
    };

    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn contains(self, tag: PatternTag) -> bool {
        self.0 & tag.bit() != 0
    }

    /// True if any tag of `mask` is present
    #[inline]
    pub fn intersects(self, mask: PatternValue) -> bool {
        self.0 & mask.0 != 0
    }

    /// True if every tag of `mask` is present
    #[inline]
    pub fn contains_all(self, mask: PatternValue) -> bool {
        self.0 & mask.0 == mask.0
    }

    /// Filter mask for a group of tags, e.g. all doji variants
    pub fn mask(tags: impl IntoIterator<Item = PatternTag>) -> PatternValue {
        encode(tags)
    }

    /// Number of tags set
    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Unpack into a tag set
    pub fn tags(self) -> PatternSet {
        PatternTag::ALL
            .iter()
            .copied()
            .filter(|t| self.contains(*t))
            .collect()
    }
}

impl std::ops::BitOr for PatternValue {
    type Output = PatternValue;

    fn bitor(self, rhs: PatternValue) -> PatternValue {
        PatternValue(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for PatternValue {
    fn bitor_assign(&mut self, rhs: PatternValue) {
        self.0 |= rhs.0;
    }
}

impl From<PatternValue> for u64 {
    fn from(v: PatternValue) -> u64 {
        u64::from(v.0)
    }
}

impl From<PatternValue> for i64 {
    fn from(v: PatternValue) -> i64 {
        i64::from(v.0)
    }
}

impl TryFrom<u64> for PatternValue {
    type Error = PatternError;

    fn try_from(value: u64) -> Result<Self> {
        let mask = u64::from(Self::MASK);
        if value & !mask != 0 {
            return Err(PatternError::UnknownBits { value, mask });
        }
        Ok(PatternValue(value as u32))
    }
}

impl<'de> serde::Deserialize<'de> for PatternValue {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = u64::deserialize(d)?;
        PatternValue::try_from(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// ENCODE / DECODE
// ============================================================

/// Pack tags into their bit positions. Duplicates are harmless.
pub fn encode(tags: impl IntoIterator<Item = PatternTag>) -> PatternValue {
    PatternValue(tags.into_iter().fold(0, |acc, tag| acc | tag.bit()))
}

/// Exact inverse of [`encode`]. Values with bits beyond the tag table are
/// rejected rather than silently truncated.
pub fn decode(value: u64) -> Result<PatternSet> {
    PatternValue::try_from(value).map(PatternValue::tags)
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(encode(PatternSet::new()), PatternValue::EMPTY);
        assert_eq!(decode(0).unwrap(), PatternSet::new());
    }

    #[test]
    fn test_single_tags() {
        for tag in PatternTag::ALL {
            let v = encode([*tag]);
            assert_eq!(v.get(), 1 << tag.index());
            assert!(v.contains(*tag));
            assert_eq!(v.count(), 1);
        }
    }

    #[test]
    fn test_all_mask() {
        assert_eq!(encode(PatternTag::ALL.iter().copied()), PatternValue::ALL);
        assert_eq!(PatternValue::ALL.count() as usize, PatternTag::COUNT);
    }

    #[test]
    fn test_unknown_bits_rejected() {
        let bad = 1u64 << PatternTag::COUNT;
        assert!(matches!(
            decode(bad),
            Err(PatternError::UnknownBits { value, .. }) if value == bad
        ));
        assert!(decode(u64::MAX).is_err());
    }

    #[test]
    fn test_legacy_value_decodes() {
        // "000000000011": Doji + LongLeggedDoji in the twelve-column layout
        let set = decode(0b0000_0000_0011).unwrap();
        assert_eq!(set.names(), vec!["Long Legged Doji", "Doji"]);

        // "100000010000": Hammer (bit 11) + ShootingStar (bit 4)
        let set = decode(0b1000_0001_0000).unwrap();
        assert!(set.contains(PatternTag::Hammer));
        assert!(set.contains(PatternTag::ShootingStar));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_filter_masks() {
        let dojis = PatternValue::mask([
            PatternTag::Doji,
            PatternTag::DragonflyDoji,
            PatternTag::GravestoneDoji,
        ]);
        let v = encode([PatternTag::GravestoneDoji, PatternTag::ShootingStar]);
        assert!(v.intersects(dojis));
        assert!(!v.contains_all(dojis));
        assert!(!encode([PatternTag::Hammer]).intersects(dojis));
    }

    #[test]
    fn test_serde_transparent() {
        let v = encode([PatternTag::Doji]);
        assert_eq!(serde_json::to_string(&v).unwrap(), "2");
        let back: PatternValue = serde_json::from_str("2").unwrap();
        assert_eq!(back, v);
        assert!(serde_json::from_str::<PatternValue>("4294967295").is_err());
    }

    #[test]
    fn test_set_serializes_as_names() {
        let set: PatternSet = [PatternTag::Hammer, PatternTag::Doji].into_iter().collect();
        assert_eq!(
            serde_json::to_string(&set).unwrap(),
            r#"["Doji","Hammer"]"#
        );
    }
}
