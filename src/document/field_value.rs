//! Field value types for documents.
//!
//! This module defines the [`FieldValue`] enum, the explicit tagged union every
//! document field holds, and [`Number`], the totally ordered numeric key used by
//! numeric field indexes.
//!
//! # Supported Types
//!
//! - **Tag** - Categorical string matched by exact equality
//! - **Integer** - 64-bit signed integers
//! - **Float** - 64-bit floating-point numbers
//! - **Text** - Free text, tokenized into terms for term queries
//! - **Vector** - Fixed-length `f32` embedding
//!
//! # Examples
//!
//! ```
//! use pilum::document::FieldValue;
//!
//! let tag = FieldValue::Tag("Phone".to_string());
//! assert_eq!(tag.as_tag(), Some("Phone"));
//!
//! let agent = FieldValue::Integer(111);
//! assert_eq!(agent.as_number().map(|n| n.as_f64()), Some(111.0));
//! ```

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric type classification for numeric fields and range queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NumericType {
    /// Integer type (i64).
    #[default]
    Integer,
    /// Float type (f64).
    Float,
}

impl NumericType {
    /// Get the name of this numeric type.
    pub fn name(&self) -> &'static str {
        match self {
            NumericType::Integer => "integer",
            NumericType::Float => "float",
        }
    }
}

/// A numeric value with a total order.
///
/// Mixed integer and float pairs compare by exact numeric value. Floats compare
/// through `f64::total_cmp`, except that the two zeros are equal. Negative zero is folded into positive zero on construction
/// so that a point query on `0` matches both.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    /// Create a float number, normalizing `-0.0` to `0.0`.
    pub fn float(value: f64) -> Self {
        if value == 0.0 {
            Number::Float(0.0)
        } else {
            Number::Float(value)
        }
    }

    /// Lossy view as `f64`.
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => *i as f64,
            Number::Float(f) => *f,
        }
    }

    /// Whether the value is finite (integers always are).
    pub fn is_finite(&self) -> bool {
        match self {
            Number::Integer(_) => true,
            Number::Float(f) => f.is_finite(),
        }
    }

    /// The numeric type this value carries.
    pub fn numeric_type(&self) -> NumericType {
        match self {
            Number::Integer(_) => NumericType::Integer,
            Number::Float(_) => NumericType::Float,
        }
    }

    /// Convert this value into the representation of `target`.
    ///
    /// Integers widen to floats; floats only narrow to integers when they hold
    /// an exact integral value inside the `i64` range.
    pub fn coerce(self, target: NumericType) -> Option<Number> {
        match (self, target) {
            (Number::Integer(i), NumericType::Integer) => Some(Number::Integer(i)),
            (Number::Integer(i), NumericType::Float) => Some(Number::float(i as f64)),
            (Number::Float(f), NumericType::Float) => Some(Number::float(f)),
            (Number::Float(f), NumericType::Integer) => {
                if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64
                {
                    Some(Number::Integer(f as i64))
                } else {
                    None
                }
            }
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => a.cmp(b),
            (Number::Float(a), Number::Float(b)) => {
                if a == b {
                    Ordering::Equal
                } else {
                    a.total_cmp(b)
                }
            }
            (Number::Integer(a), Number::Float(b)) => compare_integer_float(*a, *b),
            (Number::Float(a), Number::Integer(b)) => compare_integer_float(*b, *a).reverse(),
        }
    }
}

/// 2^63, the first float above the `i64` range.
pub(crate) const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// Compare without rounding `i` to `f64`, which is lossy above 2^53.
fn compare_integer_float(i: i64, f: f64) -> Ordering {
    if f.is_nan() {
        return if f.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if f >= I64_LIMIT {
        return Ordering::Less;
    }
    if f < -I64_LIMIT {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal if f > whole => Ordering::Less,
        Ordering::Equal if f < whole => Ordering::Greater,
        ordering => ordering,
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Integer(value)
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::Integer(i64::from(value))
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::float(value)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{i}"),
            Number::Float(v) => write!(f, "{v}"),
        }
    }
}

/// Represents a value for a field in a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Categorical tag value
    Tag(String),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// Free text value
    Text(String),
    /// Dense embedding vector
    Vector(Vec<f32>),
}

impl FieldValue {
    /// Get the tag string if this is a tag value.
    pub fn as_tag(&self) -> Option<&str> {
        match self {
            FieldValue::Tag(s) => Some(s),
            _ => None,
        }
    }

    /// Get the text if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the number if this is an integer or float value.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            FieldValue::Integer(i) => Some(Number::Integer(*i)),
            FieldValue::Float(f) => Some(Number::float(*f)),
            _ => None,
        }
    }

    /// Get the vector data if this is a vector value.
    pub fn as_vector(&self) -> Option<&[f32]> {
        match self {
            FieldValue::Vector(v) => Some(v),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Tag(_) => "tag",
            FieldValue::Integer(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::Text(_) => "text",
            FieldValue::Vector(_) => "vector",
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<Vec<f32>> for FieldValue {
    fn from(value: Vec<f32>) -> Self {
        FieldValue::Vector(value)
    }
}
