//! Command line argument parsing for the Pilum CLI using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Pilum - an in-memory hybrid document index
#[derive(Parser, Debug, Clone)]
#[command(name = "pilum")]
#[command(about = "Filter documents by tag, number and text, then rank them by vector distance")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct PilumArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl PilumArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Load documents and run a query
    Query(QueryArgs),

    /// Load documents and show index statistics
    Stats(StatsArgs),

    /// Check documents against a schema and verify the resulting index
    Validate(ValidateArgs),
}

/// Where the in-memory index is loaded from
#[derive(Args, Debug, Clone)]
pub struct IndexSourceArgs {
    /// Schema definition file (JSON)
    #[arg(short, long, value_name = "SCHEMA_FILE", env = "PILUM_SCHEMA")]
    pub schema: PathBuf,

    /// Documents file (JSON Lines)
    #[arg(short, long, value_name = "DOCUMENTS_FILE")]
    pub documents: PathBuf,

    /// Index configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE", env = "PILUM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Key holding each document's id
    #[arg(long, default_value = "id")]
    pub id_field: String,

    /// Skip documents that fail to parse or validate instead of aborting
    #[arg(long)]
    pub skip_invalid: bool,
}

/// Arguments for querying
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    #[command(flatten)]
    pub source: IndexSourceArgs,

    /// Filter query string, e.g. 'channel:Phone AND agentId:[100 200]'
    #[arg(value_name = "QUERY", default_value = "*")]
    pub query: String,

    /// Vector field to rank by
    #[arg(long, requires = "vector")]
    pub knn_field: Option<String>,

    /// Query vector (comma-separated)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, requires = "knn_field")]
    pub vector: Vec<f32>,

    /// Number of nearest neighbours to return
    #[arg(short, long, default_value = "10")]
    pub k: usize,

    /// Field to sort filter-only results by
    #[arg(long)]
    pub sort_by: Option<String>,

    /// Sort in descending order
    #[arg(long, requires = "sort_by")]
    pub desc: bool,

    /// Maximum number of results to return
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Offset for pagination
    #[arg(short, long, default_value = "0")]
    pub offset: usize,
}

/// Arguments for statistics
#[derive(Args, Debug, Clone)]
pub struct StatsArgs {
    #[command(flatten)]
    pub source: IndexSourceArgs,
}

/// Arguments for validation
#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub source: IndexSourceArgs,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}
