//! Output formatting for CLI commands.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::cli::args::{OutputFormat, PilumArgs};
use crate::document::DocId;
use crate::engine::IndexStats;
use crate::error::Result;

/// Summary of loading a documents file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub loaded: usize,
    pub skipped: usize,
}

/// One hit as printed by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct HitOutput {
    pub id: DocId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
    pub fields: Map<String, Value>,
}

/// Result structure for query operations.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutput {
    pub hits: Vec<HitOutput>,
    pub total: usize,
    pub duration_ms: u64,
    pub load: LoadSummary,
}

/// Result structure for statistics.
#[derive(Debug, Clone, Serialize)]
pub struct StatsOutput {
    #[serde(flatten)]
    pub stats: IndexStats,
    pub load: LoadSummary,
}

/// A document rejected during validation.
#[derive(Debug, Clone, Serialize)]
pub struct Rejection {
    pub line: usize,
    pub error: String,
}

/// Result structure for validation.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationOutput {
    pub accepted: usize,
    pub rejected: Vec<Rejection>,
    pub consistent: bool,
}

/// Types that know how to print themselves for humans.
pub trait HumanOutput {
    fn print_human(&self);
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize + HumanOutput>(
    message: &str,
    result: &T,
    args: &PilumArgs,
) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => {
            if args.verbosity() > 1 {
                println!("{message}");
                println!();
            }
            result.print_human();
            Ok(())
        }
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &PilumArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{json}");
    Ok(())
}

/// Render a JSON field value on one line, shortening long vectors.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) if items.len() > 8 => {
            let head: Vec<String> = items.iter().take(8).map(Value::to_string).collect();
            format!("[{}, ... ({} dims)]", head.join(", "), items.len())
        }
        other => other.to_string(),
    }
}

impl HumanOutput for QueryOutput {
    fn print_human(&self) {
        println!("Query Results:");
        println!("══════════════");

        for (i, hit) in self.hits.iter().enumerate() {
            println!();
            match hit.distance {
                Some(distance) => {
                    println!("Result {}: id {} (Distance: {distance:.4})", i + 1, hit.id)
                }
                None => println!("Result {}: id {}", i + 1, hit.id),
            }
            println!("─────────────");
            for (name, value) in &hit.fields {
                println!("{name}: {}", format_value(value));
            }
        }

        println!();
        println!("Total matches: {}", self.total);
        println!("Query time: {}ms", self.duration_ms);
        if self.load.skipped > 0 {
            println!("Skipped documents: {}", self.load.skipped);
        }
    }
}

impl HumanOutput for StatsOutput {
    fn print_human(&self) {
        println!("Index Statistics:");
        println!("════════════════");
        println!("Name: {}", self.stats.name);
        println!("Total documents: {}", self.stats.documents);
        if self.load.skipped > 0 {
            println!("Skipped documents: {}", self.load.skipped);
        }

        println!();
        println!("Field Statistics:");
        println!("────────────────");
        for field in &self.stats.fields {
            println!();
            println!("Field: {} ({})", field.name, field.kind);
            println!("  Distinct keys: {}", field.keys);
            println!("  Postings: {}", field.postings);
        }
    }
}

impl HumanOutput for ValidationOutput {
    fn print_human(&self) {
        println!("Validation Results:");
        println!("══════════════════");
        println!("Accepted documents: {}", self.accepted);
        println!("Rejected documents: {}", self.rejected.len());
        for rejection in &self.rejected {
            println!("  line {}: {}", rejection.line, rejection.error);
        }
        println!(
            "Index consistency: {}",
            if self.consistent { "ok" } else { "FAILED" }
        );
    }
}
