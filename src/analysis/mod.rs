//! Text analysis for free-text fields.
//!
//! Free text is turned into index terms by an [`Analyzer`]: a [`Tokenizer`]
//! splits the text, then a chain of [`Filter`]s normalizes the tokens.
//!
//! ```text
//! Raw Text → Tokenizer → Lowercase → MinLength → Terms
//! ```
//!
//! # Examples
//!
//! ```
//! use pilum::analysis::{Analyzer, StandardAnalyzer};
//!
//! let analyzer = StandardAnalyzer::new().unwrap();
//! let terms = analyzer.analyze_terms("Health-Insurance options!").unwrap();
//! assert_eq!(terms, vec!["health", "insurance", "options"]);
//! ```

pub mod analyzer;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

pub use analyzer::{Analyzer, PipelineAnalyzer, StandardAnalyzer};
pub use token::{Token, TokenStream};
pub use token_filter::{Filter, LowercaseFilter, MinLengthFilter};
pub use tokenizer::{RegexTokenizer, Tokenizer};
