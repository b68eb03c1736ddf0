//! Structured query expressions.
//!
//! A [`QueryExpr`] is a conjunction of field [`Predicate`]s with an optional
//! [`KnnClause`]. With no predicates every live document is a candidate.
//!
//! ```
//! use pilum::query::{QueryExpr, SortBy};
//!
//! let query = QueryExpr::new()
//!     .tag("channel", "Phone")
//!     .equals("agentId", 111)
//!     .text("transcript", "insurance")
//!     .knn("embedding", vec![1.0, 0.0], 2);
//! assert_eq!(query.predicates.len(), 3);
//!
//! let sorted = QueryExpr::new().sort_by(SortBy::desc("agentId")).limit(10);
//! assert!(sorted.knn.is_none());
//! ```

use serde::{Deserialize, Serialize};

use crate::document::Number;

/// A filter on a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Exact, case-sensitive tag equality.
    Tag { field: String, value: String },
    /// Inclusive numeric range; a point query has `min == max`.
    Numeric {
        field: String,
        min: Number,
        max: Number,
    },
    /// Every term of every entry must appear in the field after analysis.
    Text { field: String, terms: Vec<String> },
}

impl Predicate {
    /// Tag equality predicate.
    pub fn tag<S: Into<String>, T: Into<String>>(field: S, value: T) -> Self {
        Predicate::Tag {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Inclusive numeric range predicate.
    pub fn range<S: Into<String>, N: Into<Number>>(field: S, min: N, max: N) -> Self {
        Predicate::Numeric {
            field: field.into(),
            min: min.into(),
            max: max.into(),
        }
    }

    /// Numeric equality predicate.
    pub fn equals<S: Into<String>, N: Into<Number>>(field: S, value: N) -> Self {
        let value = value.into();
        Predicate::Numeric {
            field: field.into(),
            min: value,
            max: value,
        }
    }

    /// Text predicate over one or more query strings.
    pub fn text<S, I, T>(field: S, terms: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Predicate::Text {
            field: field.into(),
            terms: terms.into_iter().map(Into::into).collect(),
        }
    }

    /// Name of the field this predicate filters on.
    pub fn field(&self) -> &str {
        match self {
            Predicate::Tag { field, .. }
            | Predicate::Numeric { field, .. }
            | Predicate::Text { field, .. } => field,
        }
    }
}

/// Rank candidates by distance to a query vector and keep the closest `k`.
#[derive(Debug, Clone, PartialEq)]
pub struct KnnClause {
    pub field: String,
    pub vector: Vec<f32>,
    pub k: usize,
}

impl KnnClause {
    pub fn new<S: Into<String>>(field: S, vector: Vec<f32>, k: usize) -> Self {
        KnnClause {
            field: field.into(),
            vector,
            k,
        }
    }
}

/// Direction of a field sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Order filter-only results by a field value. Ties fall back to ascending id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortBy {
    pub field: String,
    #[serde(default)]
    pub order: SortOrder,
}

impl SortBy {
    pub fn asc<S: Into<String>>(field: S) -> Self {
        SortBy {
            field: field.into(),
            order: SortOrder::Ascending,
        }
    }

    pub fn desc<S: Into<String>>(field: S) -> Self {
        SortBy {
            field: field.into(),
            order: SortOrder::Descending,
        }
    }
}

/// A complete query: filters, optional ranking, ordering and paging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryExpr {
    pub predicates: Vec<Predicate>,
    pub knn: Option<KnnClause>,
    /// Ignored when a KNN clause is present.
    pub sort_by: Option<SortBy>,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl QueryExpr {
    /// A query matching every document.
    pub fn new() -> Self {
        QueryExpr::default()
    }

    /// Add a predicate.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn tag<S: Into<String>, T: Into<String>>(self, field: S, value: T) -> Self {
        self.filter(Predicate::tag(field, value))
    }

    pub fn range<S: Into<String>, N: Into<Number>>(self, field: S, min: N, max: N) -> Self {
        self.filter(Predicate::range(field, min, max))
    }

    pub fn equals<S: Into<String>, N: Into<Number>>(self, field: S, value: N) -> Self {
        self.filter(Predicate::equals(field, value))
    }

    pub fn text<S: Into<String>, T: Into<String>>(self, field: S, text: T) -> Self {
        self.filter(Predicate::text(field, [text]))
    }

    /// Rank the filtered candidates by vector distance.
    pub fn knn<S: Into<String>>(mut self, field: S, vector: Vec<f32>, k: usize) -> Self {
        self.knn = Some(KnnClause::new(field, vector, k));
        self
    }

    pub fn sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = Some(sort_by);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether this query has no filter predicates.
    pub fn is_unfiltered(&self) -> bool {
        self.predicates.is_empty()
    }
}
