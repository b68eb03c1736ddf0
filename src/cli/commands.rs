//! Command implementations for the Pilum CLI.

use std::time::Instant;

use log::{info, warn};

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::IndexConfig;
use crate::document::converter::{JsonlDocumentConverter, to_json};
use crate::engine::HybridIndex;
use crate::error::{PilumError, Result};
use crate::query::{SortBy, SortOrder};
use crate::schema::Schema;

/// Execute a CLI command.
pub fn execute_command(args: PilumArgs) -> Result<()> {
    match &args.command {
        Command::Query(query_args) => run_query(query_args, &args),
        Command::Stats(stats_args) => show_stats(stats_args, &args),
        Command::Validate(validate_args) => validate_documents(validate_args, &args),
    }
}

fn load_config(source: &IndexSourceArgs) -> Result<IndexConfig> {
    match &source.config {
        Some(path) => IndexConfig::from_json_file(path),
        None => Ok(IndexConfig::default()),
    }
}

fn converter_for(index: &HybridIndex, source: &IndexSourceArgs) -> Result<JsonlDocumentConverter> {
    let schema = index
        .schema()
        .ok_or_else(|| PilumError::schema("No schema has been published"))?;
    Ok(JsonlDocumentConverter::new(schema).with_id_field(source.id_field.clone()))
}

/// Build an in-memory index from a schema file and a JSONL documents file.
pub fn load_index(source: &IndexSourceArgs) -> Result<(HybridIndex, LoadSummary)> {
    let config = load_config(source)?;
    let schema = Schema::from_json_file(&source.schema)?;
    let index = HybridIndex::with_schema(schema, config)?;
    let converter = converter_for(&index, source)?;

    let mut summary = LoadSummary::default();
    for item in converter.convert(&source.documents)? {
        match item.and_then(|(id, doc)| index.upsert_document(id, doc)) {
            Ok(()) => summary.loaded += 1,
            Err(e) if source.skip_invalid && e.is_client_error() => {
                warn!("Skipping document: {e}");
                summary.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "Loaded {} document(s) from {} ({} skipped)",
        summary.loaded,
        source.documents.display(),
        summary.skipped
    );
    Ok((index, summary))
}

/// Load the index and run one query against it.
fn run_query(args: &QueryArgs, cli_args: &PilumArgs) -> Result<()> {
    let (index, load) = load_index(&args.source)?;

    let mut query = index.parse_query(&args.query)?;
    if let Some(field) = &args.knn_field {
        query = query.knn(field.clone(), args.vector.clone(), args.k);
    }
    if let Some(field) = &args.sort_by {
        query = query.sort_by(SortBy {
            field: field.clone(),
            order: if args.desc {
                SortOrder::Descending
            } else {
                SortOrder::Ascending
            },
        });
    }
    query = query.offset(args.offset);
    if let Some(limit) = args.limit {
        query = query.limit(limit);
    }

    let start_time = Instant::now();
    let results = index.query(&query)?;
    let duration = start_time.elapsed();

    let hits = results
        .hits
        .iter()
        .map(|hit| HitOutput {
            id: hit.id,
            distance: hit.distance,
            fields: match to_json(&hit.document) {
                serde_json::Value::Object(map) => map,
                _ => serde_json::Map::new(),
            },
        })
        .collect();

    output_result(
        "Query executed",
        &QueryOutput {
            hits,
            total: results.total,
            duration_ms: duration.as_millis() as u64,
            load,
        },
        cli_args,
    )
}

/// Load the index and print its statistics.
fn show_stats(args: &StatsArgs, cli_args: &PilumArgs) -> Result<()> {
    let (index, load) = load_index(&args.source)?;
    output_result(
        "Index statistics",
        &StatsOutput {
            stats: index.stats(),
            load,
        },
        cli_args,
    )
}

/// Check every line of the documents file and verify the resulting index.
fn validate_documents(args: &ValidateArgs, cli_args: &PilumArgs) -> Result<()> {
    let config = load_config(&args.source)?;
    let schema = Schema::from_json_file(&args.source.schema)?;
    let index = HybridIndex::with_schema(schema, config)?;
    let converter = converter_for(&index, &args.source)?;

    let mut accepted = 0;
    let mut rejected = Vec::new();
    for (line, item) in converter.convert(&args.source.documents)?.enumerate() {
        match item.and_then(|(id, doc)| index.upsert_document(id, doc)) {
            Ok(()) => accepted += 1,
            Err(e) if e.is_client_error() => rejected.push(Rejection {
                line: line + 1,
                error: e.to_string(),
            }),
            Err(e) => return Err(e),
        }
    }

    let consistent = match index.verify() {
        Ok(()) => true,
        Err(e) => {
            warn!("Index verification failed: {e}");
            false
        }
    };

    output_result(
        "Validation finished",
        &ValidationOutput {
            accepted,
            rejected,
            consistent,
        },
        cli_args,
    )
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    fn create_test_source(dir: &TempDir, skip_invalid: bool) -> IndexSourceArgs {
        let schema = write_file(
            dir,
            "schema.json",
            r#"{"fields": [
                {"name": "channel", "type": "tag"},
                {"name": "agentId", "type": "numeric", "numeric_type": "integer"},
                {"name": "embedding", "type": "vector", "dimension": 2}
            ]}"#,
        );
        let documents = write_file(
            dir,
            "calls.jsonl",
            concat!(
                r#"{"id": 1, "channel": "Phone", "agentId": 111, "embedding": [1.0, 0.0]}"#,
                "\n",
                r#"{"id": 2, "channel": "Phone", "agentId": 222, "embedding": [0.9, 0.1]}"#,
                "\n",
                r#"{"id": 3, "channel": "Phone", "agentId": 111, "embedding": [0.0, 1.0, 0.0]}"#,
                "\n",
            ),
        );
        IndexSourceArgs {
            schema,
            documents,
            config: None,
            id_field: "id".to_string(),
            skip_invalid,
        }
    }

    #[test]
    fn test_load_index_skips_invalid() {
        let dir = TempDir::new().unwrap();
        let (index, summary) = load_index(&create_test_source(&dir, true)).unwrap();
        assert_eq!(summary, LoadSummary { loaded: 2, skipped: 1 });
        assert_eq!(index.query_str("agentId:111").unwrap().ids(), vec![1]);
    }

    #[test]
    fn test_load_index_fails_on_invalid() {
        let dir = TempDir::new().unwrap();
        let result = load_index(&create_test_source(&dir, false));
        assert!(matches!(result, Err(PilumError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_load_index_with_config() {
        let dir = TempDir::new().unwrap();
        let mut source = create_test_source(&dir, true);
        source.config = Some(write_file(
            &dir,
            "config.json",
            r#"{"name": "calls", "default_limit": 1}"#,
        ));
        let (index, _) = load_index(&source).unwrap();
        assert_eq!(index.stats().name, "calls");
        assert_eq!(index.query_str("*").unwrap().len(), 1);
    }
}
