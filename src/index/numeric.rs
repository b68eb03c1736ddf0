//! Ordered index over numeric fields.
//!
//! Values are kept in a `BTreeMap` keyed by [`Number`], so point and range
//! lookups are a single ordered range scan.

use std::collections::{BTreeMap, BTreeSet};

use crate::document::field_value::I64_LIMIT;
use crate::document::{DocId, Number, NumericType};

/// Postings from numeric value to the documents holding it.
#[derive(Debug, Clone, Default)]
pub struct NumericIndex {
    numeric_type: NumericType,
    postings: BTreeMap<Number, BTreeSet<DocId>>,
}

impl NumericIndex {
    /// Create a new empty numeric index for values of `numeric_type`.
    pub fn new(numeric_type: NumericType) -> Self {
        NumericIndex {
            numeric_type,
            postings: BTreeMap::new(),
        }
    }

    /// Get the numeric type of this index.
    pub fn numeric_type(&self) -> NumericType {
        self.numeric_type
    }

    fn key(&self, value: Number) -> Number {
        value.coerce(self.numeric_type).unwrap_or(value)
    }

    /// Add `id` to the postings of `value`.
    pub fn add(&mut self, value: Number, id: DocId) {
        let key = self.key(value);
        self.postings.entry(key).or_default().insert(id);
    }

    /// Remove `id` from the postings of `value`. Returns whether it was present.
    pub fn remove(&mut self, value: Number, id: DocId) -> bool {
        let key = self.key(value);
        let Some(ids) = self.postings.get_mut(&key) else {
            return false;
        };
        let removed = ids.remove(&id);
        if ids.is_empty() {
            self.postings.remove(&key);
        }
        removed
    }

    /// Bring a query bound into the key representation of this index.
    ///
    /// On an integer index a fractional lower bound rounds up and a fractional
    /// upper bound rounds down. `None` means no key can satisfy the bound.
    fn bound_key(&self, bound: Number, lower: bool) -> Option<Number> {
        match (self.numeric_type, bound) {
            (_, Number::Float(f)) if f.is_nan() => None,
            (NumericType::Integer, Number::Float(f)) => {
                let rounded = if lower { f.ceil() } else { f.floor() };
                if rounded >= I64_LIMIT {
                    (!lower).then_some(Number::Integer(i64::MAX))
                } else if rounded < -I64_LIMIT {
                    lower.then_some(Number::Integer(i64::MIN))
                } else {
                    Some(Number::Integer(rounded as i64))
                }
            }
            _ => Some(self.key(bound)),
        }
    }

    /// Documents whose value lies in `[lo, hi]`, both bounds inclusive.
    ///
    /// Bounds are coerced to the index's numeric type first. An inverted
    /// range (`lo > hi`) or an empty index yields the empty set.
    pub fn range(&self, lo: Number, hi: Number) -> BTreeSet<DocId> {
        let (Some(lo), Some(hi)) = (self.bound_key(lo, true), self.bound_key(hi, false)) else {
            return BTreeSet::new();
        };
        if lo > hi || self.postings.is_empty() {
            return BTreeSet::new();
        }
        self.postings
            .range(lo..=hi)
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect()
    }

    /// Documents whose value equals `value`.
    pub fn point(&self, value: Number) -> BTreeSet<DocId> {
        self.range(value, value)
    }

    /// Check whether `id` is posted under `value`.
    pub fn contains(&self, value: Number, id: DocId) -> bool {
        self.postings
            .get(&self.key(value))
            .map(|ids| ids.contains(&id))
            .unwrap_or(false)
    }

    /// Number of distinct values.
    pub fn key_count(&self) -> usize {
        self.postings.len()
    }

    /// Total number of (value, id) postings.
    pub fn posting_count(&self) -> usize {
        self.postings.values().map(BTreeSet::len).sum()
    }

    /// Drop every posting.
    pub fn clear(&mut self) {
        self.postings.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_index() -> NumericIndex {
        let mut index = NumericIndex::new(NumericType::Float);
        for (value, id) in [(1.0, 10), (3.0, 20), (2.0, 30), (5.0, 40), (4.0, 50), (1.5, 60)] {
            index.add(Number::float(value), id);
        }
        index
    }

    #[test]
    fn test_range_is_inclusive() {
        let index = create_test_index();
        assert_eq!(
            index.range(Number::float(1.5), Number::float(3.0)),
            BTreeSet::from([20, 30, 60])
        );
        assert_eq!(
            index.range(Number::float(f64::NEG_INFINITY), Number::float(f64::INFINITY)).len(),
            6
        );
    }

    #[test]
    fn test_point_and_inverted_range() {
        let index = create_test_index();
        assert_eq!(index.point(Number::float(5.0)), BTreeSet::from([40]));
        assert_eq!(index.point(Number::Integer(5)), BTreeSet::from([40]));
        assert!(index.point(Number::float(2.5)).is_empty());
        assert!(index.range(Number::float(4.0), Number::float(2.0)).is_empty());
    }

    #[test]
    fn test_empty_index_range() {
        let index = NumericIndex::new(NumericType::Integer);
        assert!(index.range(Number::Integer(i64::MIN), Number::Integer(i64::MAX)).is_empty());
    }

    #[test]
    fn test_integer_values_in_float_index() {
        let mut index = NumericIndex::new(NumericType::Float);
        index.add(Number::Integer(3), 1);
        assert!(index.contains(Number::float(3.0), 1));
        assert!(index.remove(Number::Integer(3), 1));
        assert_eq!(index.key_count(), 0);
    }

    #[test]
    fn test_float_bounds_on_integer_index() {
        let two_53 = 1i64 << 53;
        let mut index = NumericIndex::new(NumericType::Integer);
        index.add(Number::Integer(two_53), 1);
        index.add(Number::Integer(two_53 + 1), 2);
        for value in 1..=4 {
            index.add(Number::Integer(value), 10 + value as DocId);
        }

        assert_eq!(
            index.range(Number::float(two_53 as f64), Number::Integer(two_53)),
            BTreeSet::from([1])
        );
        assert_eq!(
            index.range(Number::Integer(two_53 + 1), Number::float(f64::INFINITY)),
            BTreeSet::from([2])
        );
        assert_eq!(index.point(Number::Integer(two_53 + 1)), BTreeSet::from([2]));
        assert_eq!(
            index.range(Number::float(1.5), Number::float(3.5)),
            BTreeSet::from([12, 13])
        );
        assert!(index.point(Number::float(2.5)).is_empty());
        assert_eq!(
            index.range(Number::float(f64::NEG_INFINITY), Number::float(f64::INFINITY)).len(),
            6
        );
        assert!(index.range(Number::float(f64::NAN), Number::Integer(4)).is_empty());
        assert!(index.range(Number::float(1e19), Number::float(f64::INFINITY)).is_empty());
    }

    #[test]
    fn test_shared_values() {
        let mut index = NumericIndex::new(NumericType::Integer);
        index.add(Number::Integer(111), 1);
        index.add(Number::Integer(222), 2);
        index.add(Number::Integer(111), 3);

        assert_eq!(index.point(Number::Integer(111)), BTreeSet::from([1, 3]));
        assert_eq!(index.key_count(), 2);
        assert_eq!(index.posting_count(), 3);
        index.remove(Number::Integer(111), 1);
        assert_eq!(index.point(Number::Integer(111)), BTreeSet::from([3]));
    }
}
