use std::collections::BTreeSet;

use pilum::config::IndexConfig;
use pilum::document::{DocId, Document, NumericType};
use pilum::engine::HybridIndex;
use pilum::error::PilumError;
use pilum::query::{QueryExpr, SortBy};
use pilum::schema::Schema;
use pilum::vector::DistanceMetric;

fn call_center_schema() -> Schema {
    Schema::builder()
        .tag_field("channel")
        .numeric_field("agentId", NumericType::Integer)
        .numeric_field("duration", NumericType::Float)
        .text_field("transcript")
        .vector_field("embedding", 2, DistanceMetric::Cosine)
        .build()
        .unwrap()
}

fn call(channel: &str, agent: i64, duration: f64, transcript: &str, embedding: [f32; 2]) -> Document {
    Document::builder()
        .add_tag("channel", channel)
        .add_integer("agentId", agent)
        .add_float("duration", duration)
        .add_text("transcript", transcript)
        .add_vector("embedding", embedding.to_vec())
        .build()
}

fn populated_index() -> HybridIndex {
    let index = HybridIndex::with_schema(call_center_schema(), IndexConfig::default()).unwrap();
    index
        .upsert_document(1, call("Phone", 111, 30.0, "health insurance options", [1.0, 0.0]))
        .unwrap();
    index
        .upsert_document(2, call("Phone", 222, 45.5, "billing question", [0.9, 0.1]))
        .unwrap();
    index
        .upsert_document(3, call("Phone", 111, 12.0, "insurance claim denied", [-1.0, 0.0]))
        .unwrap();
    index
        .upsert_document(4, call("Chat", 333, 5.0, "Insurance renewal", [0.0, 1.0]))
        .unwrap();
    index
}

fn ids(index: &HybridIndex, query: &QueryExpr) -> BTreeSet<DocId> {
    index.query(query).unwrap().ids().into_iter().collect()
}

#[test]
fn test_agent_and_channel_intersection() {
    let index = populated_index();
    let results = index
        .query(&QueryExpr::new().equals("agentId", 111).tag("channel", "Phone"))
        .unwrap();
    assert_eq!(results.ids(), vec![1, 3]);

    let results = index.query_str("agentId:111 AND channel:Phone").unwrap();
    assert_eq!(results.ids(), vec![1, 3]);
}

#[test]
fn test_knn_scenario() {
    let index = populated_index();

    let top = index
        .query(&QueryExpr::new().knn("embedding", vec![1.0, 0.0], 1))
        .unwrap();
    assert_eq!(top.ids(), vec![1]);
    assert!(top.hits[0].distance.unwrap().abs() < 1e-6);

    let top = index
        .query(&QueryExpr::new().knn("embedding", vec![1.0, 0.0], 2))
        .unwrap();
    assert_eq!(top.ids(), vec![1, 2]);
    let second = top.hits[1].distance.unwrap();
    assert!(second > 0.004 && second < 0.007, "distance was {second}");

    let all = index
        .query(&QueryExpr::new().knn("embedding", vec![1.0, 0.0], 10))
        .unwrap();
    assert_eq!(all.ids(), vec![1, 2, 4, 3]);
    assert!((all.hits[3].distance.unwrap() - 2.0).abs() < 1e-6);
}

#[test]
fn test_text_is_word_exact() {
    let index = populated_index();
    assert_eq!(
        ids(&index, &QueryExpr::new().text("transcript", "insurance")),
        BTreeSet::from([1, 3, 4])
    );
    assert!(ids(&index, &QueryExpr::new().text("transcript", "insuranc")).is_empty());
    assert_eq!(
        ids(&index, &QueryExpr::new().text("transcript", "insurance claim")),
        BTreeSet::from([3])
    );
}

#[test]
fn test_intersection_matches_independent_sets() {
    let index = populated_index();
    let predicates = [
        QueryExpr::new().tag("channel", "Phone"),
        QueryExpr::new().equals("agentId", 111),
        QueryExpr::new().range("duration", 10.0, 40.0),
        QueryExpr::new().text("transcript", "insurance"),
    ];

    for a in &predicates {
        for b in &predicates {
            let both = QueryExpr::new()
                .filter(a.predicates[0].clone())
                .filter(b.predicates[0].clone());
            let expected: BTreeSet<DocId> = ids(&index, a).intersection(&ids(&index, b)).copied().collect();
            assert_eq!(ids(&index, &both), expected);
        }
    }
}

#[test]
fn test_filtered_knn_ranks_only_candidates() {
    let index = populated_index();
    let results = index
        .query(
            &QueryExpr::new()
                .text("transcript", "insurance")
                .knn("embedding", vec![1.0, 0.0], 2),
        )
        .unwrap();
    assert_eq!(results.ids(), vec![1, 4]);

    let results = index
        .query(&QueryExpr::new().tag("channel", "Fax").knn("embedding", vec![1.0, 0.0], 2))
        .unwrap();
    assert!(results.is_empty());
    assert_eq!(results.total, 0);
}

#[test]
fn test_numeric_ranges() {
    let index = populated_index();
    assert_eq!(
        index.query_str("duration:[10, 31]").unwrap().ids(),
        vec![1, 3]
    );
    assert_eq!(index.query_str("duration:[-inf 10]").unwrap().ids(), vec![4]);
    assert_eq!(index.query_str("agentId:[200 +inf]").unwrap().ids(), vec![2, 4]);
    assert!(index.query_str("duration:[40 10]").unwrap().is_empty());
    assert!(matches!(index.query_str("agentId:1.5"), Err(PilumError::Parse(_))));
    assert!(matches!(index.query_str("duration:[a b]"), Err(PilumError::Parse(_))));
}

#[test]
fn test_delete_completeness() {
    let index = populated_index();
    assert!(index.delete_document(1).unwrap());

    assert!(index.get_document(1).is_none());
    for query in [
        QueryExpr::new(),
        QueryExpr::new().tag("channel", "Phone"),
        QueryExpr::new().equals("agentId", 111),
        QueryExpr::new().text("transcript", "health"),
        QueryExpr::new().knn("embedding", vec![1.0, 0.0], 10),
    ] {
        assert!(!index.query(&query).unwrap().ids().contains(&1));
    }
    index.verify().unwrap();

    assert!(!index.delete_document(1).unwrap());
}

#[test]
fn test_dimension_enforcement_leaves_index_unchanged() {
    let index = populated_index();
    let before = index.stats();

    let bad = Document::builder()
        .add_tag("channel", "Chat")
        .add_integer("agentId", 999)
        .add_float("duration", 1.0)
        .add_text("transcript", "brand new words")
        .add_vector("embedding", vec![1.0, 0.0, 0.0])
        .build();
    assert!(matches!(
        index.upsert_document(1, bad.clone()),
        Err(PilumError::DimensionMismatch { expected: 2, actual: 3, .. })
    ));
    assert!(matches!(
        index.upsert_document(9, bad),
        Err(PilumError::DimensionMismatch { .. })
    ));

    assert_eq!(index.stats(), before);
    assert!(index.query_str("transcript:brand").unwrap().is_empty());
    assert_eq!(index.query_str("agentId:111").unwrap().ids(), vec![1, 3]);
    index.verify().unwrap();
}

#[test]
fn test_schema_violations() {
    let index = populated_index();

    let missing = Document::builder().add_tag("channel", "Chat").build();
    assert!(matches!(index.upsert_document(5, missing), Err(PilumError::Schema(_))));

    let mut wrong_kind = call("Chat", 1, 1.0, "x", [1.0, 0.0]);
    wrong_kind.add_field("agentId", pilum::document::FieldValue::Text("one".into()));
    assert!(matches!(index.upsert_document(5, wrong_kind), Err(PilumError::Schema(_))));

    let nan = call("Chat", 1, 1.0, "x", [f32::NAN, 0.0]);
    assert!(matches!(index.upsert_document(5, nan), Err(PilumError::Schema(_))));

    assert!(matches!(index.query_str("unknown:1"), Err(PilumError::Schema(_))));
    assert!(matches!(
        index.query(&QueryExpr::new().knn("embedding", vec![1.0], 1)),
        Err(PilumError::DimensionMismatch { .. })
    ));
    assert_eq!(index.len(), 4);
}

#[test]
fn test_extra_fields_are_stored_not_indexed() {
    let index = populated_index();
    let mut doc = call("Chat", 444, 2.0, "greeting", [0.5, 0.5]);
    doc.add_field("note", pilum::document::FieldValue::Text("vip caller".into()));
    index.upsert_document(5, doc.clone()).unwrap();

    assert_eq!(index.get_document(5), Some(doc));
    assert!(matches!(index.query_str("note:vip"), Err(PilumError::Schema(_))));
    index.verify().unwrap();
}

#[test]
fn test_sorting_and_paging() {
    let index = populated_index();

    let results = index
        .query(&QueryExpr::new().sort_by(SortBy::desc("duration")))
        .unwrap();
    assert_eq!(results.ids(), vec![2, 1, 3, 4]);

    let results = index
        .query(
            &QueryExpr::new()
                .tag("channel", "Phone")
                .sort_by(SortBy::asc("agentId"))
                .offset(1)
                .limit(5),
        )
        .unwrap();
    assert_eq!(results.ids(), vec![3, 2]);
    assert_eq!(results.total, 3);

    let results = index
        .query(
            &QueryExpr::new()
                .sort_by(SortBy::desc("agentId"))
                .knn("embedding", vec![1.0, 0.0], 2),
        )
        .unwrap();
    assert_eq!(results.ids(), vec![1, 2]);
}

#[test]
fn test_tags_are_case_sensitive() {
    let index = populated_index();
    assert!(index.query_str("channel:phone").unwrap().is_empty());
    assert_eq!(index.query_str("channel:Chat").unwrap().ids(), vec![4]);
}

#[test]
fn test_k_zero_returns_empty() {
    let index = populated_index();
    let results = index
        .query(&QueryExpr::new().knn("embedding", vec![1.0, 0.0], 0))
        .unwrap();
    assert!(results.is_empty());
}
