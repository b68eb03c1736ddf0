//! Query construction and execution.
//!
//! Queries are built either programmatically through [`QueryExpr`] or from a
//! string with [`QueryParser`], then run by a [`QueryExecutor`] over one
//! consistent view of the index.

pub mod executor;
pub mod expr;
pub mod parser;
pub mod results;

pub use executor::QueryExecutor;
pub use expr::{KnnClause, Predicate, QueryExpr, SortBy, SortOrder};
pub use parser::QueryParser;
pub use results::{Hit, RankedResults};
