//! Query evaluation against the field indexes.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use log::debug;

use crate::document::{DocId, FieldValue};
use crate::error::{PilumError, Result};
use crate::index::IndexManager;
use crate::query::{Hit, KnnClause, Predicate, QueryExpr, RankedResults, SortBy, SortOrder};
use crate::store::DocumentStore;
use crate::vector::is_finite_vector;

/// Evaluates queries over one consistent view of the store and its indexes.
#[derive(Debug, Clone, Copy)]
pub struct QueryExecutor<'a> {
    manager: &'a IndexManager,
    store: &'a DocumentStore,
    default_limit: Option<usize>,
}

impl<'a> QueryExecutor<'a> {
    /// Create an executor over an index manager and its document store.
    pub fn new(manager: &'a IndexManager, store: &'a DocumentStore) -> Self {
        QueryExecutor {
            manager,
            store,
            default_limit: None,
        }
    }

    /// Page size for queries that set no limit.
    pub fn with_default_limit(mut self, limit: Option<usize>) -> Self {
        self.default_limit = limit;
        self
    }

    /// Run a query.
    ///
    /// Predicates are intersected; with none, every live document is a
    /// candidate. A KNN clause ranks the candidates by distance, otherwise they
    /// are ordered by the sort field or by ascending id. Errors are reported
    /// before any result is produced.
    pub fn execute(&self, query: &QueryExpr) -> Result<RankedResults> {
        if let Some(knn) = &query.knn {
            self.check_knn(knn)?;
        } else if let Some(sort_by) = &query.sort_by {
            self.check_sort(sort_by)?;
        }

        let candidates = self.filter(&query.predicates)?;

        let ranked: Vec<(DocId, Option<f32>)> = match &query.knn {
            Some(knn) => self.rank(knn, candidates.as_ref())?,
            None => {
                let ids = candidates.unwrap_or_else(|| self.store.ids());
                self.order(ids, query.sort_by.as_ref())
                    .into_iter()
                    .map(|id| (id, None))
                    .collect()
            }
        };

        let total = ranked.len();
        let limit = query.limit.or(self.default_limit).unwrap_or(usize::MAX);
        let hits = ranked
            .into_iter()
            .skip(query.offset)
            .take(limit)
            .map(|(id, distance)| {
                let document = self.store.get(id).cloned().ok_or_else(|| {
                    PilumError::index(format!("Document {id} is indexed but not stored"))
                })?;
                Ok(Hit {
                    id,
                    distance,
                    document,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Query with {} predicate(s){} matched {total}, returning {}",
            query.predicates.len(),
            if query.knn.is_some() { " and KNN" } else { "" },
            hits.len()
        );
        Ok(RankedResults { hits, total })
    }

    fn check_knn(&self, knn: &KnnClause) -> Result<()> {
        let index = self.manager.vector_index(&knn.field)?;
        if knn.vector.len() != index.dimension() {
            return Err(PilumError::dimension_mismatch(
                knn.field.clone(),
                index.dimension(),
                knn.vector.len(),
            ));
        }
        if !is_finite_vector(&knn.vector) {
            return Err(PilumError::parse(format!(
                "Query vector for '{}' has non-finite components",
                knn.field
            )));
        }
        Ok(())
    }

    fn check_sort(&self, sort_by: &SortBy) -> Result<()> {
        let kind = self.manager.schema().require_field(&sort_by.field)?;
        if !kind.is_sortable() {
            return Err(PilumError::schema(format!(
                "Cannot sort by {} field '{}'",
                kind.name(),
                sort_by.field
            )));
        }
        Ok(())
    }

    /// Intersect all predicate sets. `None` means no predicate was given.
    fn filter(&self, predicates: &[Predicate]) -> Result<Option<BTreeSet<DocId>>> {
        let mut sets = predicates
            .iter()
            .map(|predicate| self.evaluate(predicate))
            .collect::<Result<Vec<_>>>()?;
        if sets.is_empty() {
            return Ok(None);
        }

        sets.sort_by_key(BTreeSet::len);
        let mut iter = sets.into_iter();
        let mut result = iter.next().unwrap_or_default();
        for set in iter {
            if result.is_empty() {
                break;
            }
            result.retain(|id| set.contains(id));
        }
        Ok(Some(result))
    }

    /// Evaluate one predicate against its field index.
    pub fn evaluate(&self, predicate: &Predicate) -> Result<BTreeSet<DocId>> {
        match predicate {
            Predicate::Tag { field, value } => Ok(self.manager.tag_index(field)?.lookup(value)),
            Predicate::Numeric { field, min, max } => {
                let index = self.manager.numeric_index(field)?;
                if let Some(bad) = [min, max].into_iter().find(|n| n.as_f64().is_nan()) {
                    return Err(PilumError::parse(format!(
                        "Invalid bound {bad} for field '{field}'"
                    )));
                }
                Ok(index.range(*min, *max))
            }
            Predicate::Text { field, terms } => {
                let index = self.manager.text_index(field)?;
                let mut normalized = Vec::new();
                for term in terms {
                    for analyzed in index.analyze(term)? {
                        if !normalized.contains(&analyzed) {
                            normalized.push(analyzed);
                        }
                    }
                }
                if normalized.is_empty() {
                    return Err(PilumError::parse(format!(
                        "Text predicate on '{field}' has no searchable terms"
                    )));
                }
                Ok(index.search_terms(&normalized))
            }
        }
    }

    fn rank(
        &self,
        knn: &KnnClause,
        candidates: Option<&BTreeSet<DocId>>,
    ) -> Result<Vec<(DocId, Option<f32>)>> {
        if candidates.is_some_and(BTreeSet::is_empty) {
            return Ok(Vec::new());
        }
        let index = self.manager.vector_index(&knn.field)?;
        Ok(index
            .knn(&knn.vector, knn.k, candidates)?
            .into_iter()
            .map(|(id, distance)| (id, Some(distance)))
            .collect())
    }

    fn order(&self, ids: BTreeSet<DocId>, sort_by: Option<&SortBy>) -> Vec<DocId> {
        let Some(sort_by) = sort_by else {
            return ids.into_iter().collect();
        };

        let mut keyed: Vec<(DocId, Option<&FieldValue>)> = ids
            .into_iter()
            .map(|id| {
                let value = self.store.get(id).and_then(|doc| doc.get_field(&sort_by.field));
                (id, value)
            })
            .collect();

        // Stable sort over ascending ids keeps ties in id order; missing values go last.
        keyed.sort_by(|a, b| match (a.1, b.1) {
            (Some(x), Some(y)) => {
                let ordering = compare_values(x, y);
                match sort_by.order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        keyed.into_iter().map(|(id, _)| id).collect()
    }
}

/// Order two values of the same field.
fn compare_values(a: &FieldValue, b: &FieldValue) -> Ordering {
    match (a.as_number(), b.as_number()) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => {
            let x = a.as_tag().or_else(|| a.as_text()).unwrap_or_default();
            let y = b.as_tag().or_else(|| b.as_text()).unwrap_or_default();
            x.cmp(y)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use crate::document::{Document, NumericType};
    use crate::ingest::IngestionPipeline;
    use crate::schema::Schema;
    use crate::vector::DistanceMetric;

    fn create_test_state() -> (IndexManager, DocumentStore) {
        let schema = Schema::builder()
            .tag_field("channel")
            .numeric_field("agentId", NumericType::Integer)
            .text_field("transcript")
            .vector_field("embedding", 2, DistanceMetric::Cosine)
            .build()
            .unwrap();
        let mut manager = IndexManager::new(schema, &IndexConfig::default()).unwrap();
        let mut store = DocumentStore::new();
        let mut pipeline = IngestionPipeline::new(&mut manager, &mut store);
        for (id, channel, agent, transcript, embedding) in [
            (1, "Phone", 111, "I'd like to ask about insurance", vec![1.0, 0.0]),
            (2, "Phone", 222, "billing question", vec![0.9, 0.1]),
            (3, "Phone", 111, "insurance claim", vec![0.0, 1.0]),
            (4, "Chat", 333, "insurance renewal", vec![0.7, 0.7]),
        ] {
            let doc = Document::builder()
                .add_tag("channel", channel)
                .add_integer("agentId", agent)
                .add_text("transcript", transcript)
                .add_vector("embedding", embedding)
                .build();
            pipeline.upsert(id, doc).unwrap();
        }
        (manager, store)
    }

    #[test]
    fn test_filter_intersection() {
        let (manager, store) = create_test_state();
        let executor = QueryExecutor::new(&manager, &store);
        let query = QueryExpr::new().equals("agentId", 111).tag("channel", "Phone");
        assert_eq!(executor.execute(&query).unwrap().ids(), vec![1, 3]);

        let query = QueryExpr::new().text("transcript", "insurance").tag("channel", "Chat");
        assert_eq!(executor.execute(&query).unwrap().ids(), vec![4]);
    }

    #[test]
    fn test_unfiltered_query_returns_all_by_id() {
        let (manager, store) = create_test_state();
        let executor = QueryExecutor::new(&manager, &store);
        let results = executor.execute(&QueryExpr::new()).unwrap();
        assert_eq!(results.ids(), vec![1, 2, 3, 4]);
        assert!(results.iter().all(|hit| hit.distance.is_none()));
    }

    #[test]
    fn test_knn_over_filtered_candidates() {
        let (manager, store) = create_test_state();
        let executor = QueryExecutor::new(&manager, &store);

        let query = QueryExpr::new().tag("channel", "Phone").knn("embedding", vec![1.0, 0.0], 2);
        let results = executor.execute(&query).unwrap();
        assert_eq!(results.ids(), vec![1, 2]);
        assert!(results.hits[0].distance.unwrap().abs() < 1e-6);

        let query = QueryExpr::new().tag("channel", "Fax").knn("embedding", vec![1.0, 0.0], 2);
        assert!(executor.execute(&query).unwrap().is_empty());
    }

    #[test]
    fn test_sort_and_paging() {
        let (manager, store) = create_test_state();
        let executor = QueryExecutor::new(&manager, &store);

        let query = QueryExpr::new().sort_by(SortBy::desc("agentId"));
        assert_eq!(executor.execute(&query).unwrap().ids(), vec![4, 2, 1, 3]);

        let query = QueryExpr::new().sort_by(SortBy::asc("channel")).offset(1).limit(2);
        let results = executor.execute(&query).unwrap();
        assert_eq!(results.ids(), vec![1, 2]);
        assert_eq!(results.total, 4);

        let executor = executor.with_default_limit(Some(1));
        assert_eq!(executor.execute(&QueryExpr::new()).unwrap().ids(), vec![1]);
    }

    #[test]
    fn test_query_errors() {
        let (manager, store) = create_test_state();
        let executor = QueryExecutor::new(&manager, &store);
        let run = |query: QueryExpr| executor.execute(&query);

        assert!(matches!(run(QueryExpr::new().tag("missing", "x")), Err(PilumError::Schema(_))));
        assert!(matches!(run(QueryExpr::new().tag("agentId", "x")), Err(PilumError::Schema(_))));
        assert!(matches!(
            run(QueryExpr::new().knn("embedding", vec![1.0, 0.0, 0.0], 1)),
            Err(PilumError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            run(QueryExpr::new().knn("embedding", vec![f32::NAN, 0.0], 1)),
            Err(PilumError::Parse(_))
        ));
        assert!(matches!(
            run(QueryExpr::new().knn("channel", vec![1.0, 0.0], 1)),
            Err(PilumError::Schema(_))
        ));
        assert!(matches!(
            run(QueryExpr::new().sort_by(SortBy::asc("embedding"))),
            Err(PilumError::Schema(_))
        ));
        assert!(matches!(
            run(QueryExpr::new().sort_by(SortBy::desc("missing"))),
            Err(PilumError::Schema(_))
        ));
        assert!(matches!(run(QueryExpr::new().text("transcript", "!!")), Err(PilumError::Parse(_))));
    }
}
