//! Readers running alongside writers must only ever see whole documents.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use pilum::config::IndexConfig;
use pilum::document::{Document, NumericType};
use pilum::engine::HybridIndex;
use pilum::query::QueryExpr;
use pilum::schema::Schema;
use pilum::vector::DistanceMetric;

fn versioned(version: i64) -> Document {
    // Every field encodes the same version, so a torn read would show up as a
    // document whose fields disagree with the predicate that found it.
    let tag = format!("v{}", version % 2);
    Document::builder()
        .add_tag("parity", tag.clone())
        .add_integer("version", version)
        .add_text("transcript", format!("word{}", version % 2))
        .add_vector("embedding", vec![(version % 2) as f32, 1.0 - (version % 2) as f32])
        .build()
}

#[test]
fn test_concurrent_readers_and_writers() {
    let schema = Schema::builder()
        .tag_field("parity")
        .numeric_field("version", NumericType::Integer)
        .text_field("transcript")
        .vector_field("embedding", 2, DistanceMetric::Euclidean)
        .build()
        .unwrap();
    let index = Arc::new(HybridIndex::with_schema(schema, IndexConfig::default()).unwrap());
    for id in 0..20u64 {
        index.upsert_document(id, versioned(0)).unwrap();
    }

    let done = Arc::new(AtomicBool::new(false));

    let writers: Vec<_> = (0..2)
        .map(|w| {
            let index = Arc::clone(&index);
            thread::spawn(move || {
                for version in 1..300i64 {
                    let id = ((version as u64) * 7 + w) % 20;
                    index.upsert_document(id, versioned(version)).unwrap();
                    if version % 50 == 0 {
                        index.delete_document(id).unwrap();
                        index.upsert_document(id, versioned(version)).unwrap();
                    }
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let index = Arc::clone(&index);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut checks = 0usize;
                while !done.load(Ordering::Acquire) || checks < 50 {
                    for parity in 0..2i64 {
                        let results = index
                            .query(
                                &QueryExpr::new()
                                    .tag("parity", format!("v{parity}"))
                                    .text("transcript", format!("word{parity}"))
                                    .knn("embedding", vec![parity as f32, 1.0 - parity as f32], 20),
                            )
                            .unwrap();
                        for hit in results.iter() {
                            let version = hit
                                .document
                                .get_field("version")
                                .and_then(|v| v.as_number())
                                .map(|n| n.as_f64() as i64)
                                .unwrap();
                            assert_eq!(version % 2, parity);
                            assert_eq!(hit.distance, Some(0.0));
                        }
                    }
                    checks += 1;
                }
            })
        })
        .collect();

    for writer in writers {
        writer.join().unwrap();
    }
    done.store(true, Ordering::Release);
    for reader in readers {
        reader.join().unwrap();
    }

    index.verify().unwrap();
    assert_eq!(index.len(), 20);
}
