//! Index configuration.
//!
//! Configuration is plain serde data with defaults for every field, so a JSON
//! file only needs to name the settings it changes:
//!
//! ```
//! use pilum::config::IndexConfig;
//!
//! let config: IndexConfig = serde_json::from_str(r#"{"parallel_threshold": 64}"#).unwrap();
//! assert_eq!(config.parallel_threshold, 64);
//! assert!(config.text.lowercase);
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::tokenizer::DEFAULT_TOKEN_PATTERN;
use crate::analysis::{Analyzer, LowercaseFilter, MinLengthFilter, PipelineAnalyzer, RegexTokenizer};
use crate::error::{PilumError, Result};

/// Settings for the analyzer shared by every text field index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextAnalysisConfig {
    /// Regular expression whose matches become tokens.
    pub token_pattern: String,
    /// Whether tokens are lowercased.
    pub lowercase: bool,
    /// Tokens shorter than this many characters are not indexed.
    pub min_token_length: usize,
}

impl Default for TextAnalysisConfig {
    fn default() -> Self {
        TextAnalysisConfig {
            token_pattern: DEFAULT_TOKEN_PATTERN.to_string(),
            lowercase: true,
            min_token_length: 1,
        }
    }
}

impl TextAnalysisConfig {
    /// Build the analyzer described by this configuration.
    pub fn build_analyzer(&self) -> Result<Arc<dyn Analyzer>> {
        let tokenizer = Arc::new(RegexTokenizer::with_pattern(&self.token_pattern)?);
        let mut analyzer = PipelineAnalyzer::new(tokenizer);
        if self.lowercase {
            analyzer = analyzer.add_filter(Arc::new(LowercaseFilter::new()));
        }
        if self.min_token_length > 1 {
            analyzer = analyzer.add_filter(Arc::new(MinLengthFilter::new(self.min_token_length)));
        }
        Ok(Arc::new(analyzer))
    }
}

/// Configuration for a [`HybridIndex`](crate::engine::HybridIndex).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Index name, used in log output.
    pub name: String,
    /// Text analysis settings.
    pub text: TextAnalysisConfig,
    /// Candidate count from which vector distances are computed in parallel.
    pub parallel_threshold: usize,
    /// Page size applied to queries that set no limit of their own.
    pub default_limit: Option<usize>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            name: "default".to_string(),
            text: TextAnalysisConfig::default(),
            parallel_threshold: 1024,
            default_limit: None,
        }
    }
}

impl IndexConfig {
    /// Load a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: IndexConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.parallel_threshold == 0 {
            return Err(PilumError::invalid_config(
                "parallel_threshold must be greater than zero",
            ));
        }
        if self.default_limit == Some(0) {
            return Err(PilumError::invalid_config(
                "default_limit must be greater than zero when set",
            ));
        }
        self.text.build_analyzer().map(|_| ())
    }
}
