//! Query parser for converting query strings into [`QueryExpr`] filters.
//!
//! The parser resolves every clause against the schema, so the same
//! `field:value` syntax becomes a tag, numeric or text predicate depending on
//! how the field was declared.

use std::iter::Peekable;
use std::str::Chars;
use std::sync::Arc;

use crate::document::{Number, NumericType};
use crate::error::{PilumError, Result};
use crate::query::{Predicate, QueryExpr};
use crate::schema::{FieldKind, Schema};

/// Schema-aware parser for filter query strings.
#[derive(Debug, Clone)]
pub struct QueryParser {
    schema: Arc<Schema>,
}

impl QueryParser {
    /// Create a new query parser for `schema`.
    pub fn new(schema: Arc<Schema>) -> Self {
        QueryParser { schema }
    }

    /// Parse a query string into a filter-only query.
    ///
    /// Supported syntax:
    /// - Tag or text terms: `channel:Phone`, `transcript:insurance`
    /// - Quoted values: `transcript:"health insurance"`, `channel:{Phone}`
    /// - Numeric points and ranges: `agentId:111`, `duration:[10, 60]`,
    ///   `duration:[-inf 30]`
    /// - Conjunction by juxtaposition or `AND`: `channel:Phone AND agentId:111`
    /// - `*` alone (or an empty string) matches every document
    ///
    /// Field names may carry a leading `@`.
    pub fn parse(&self, query_str: &str) -> Result<QueryExpr> {
        let predicates = self.parse_predicates(query_str)?;
        Ok(QueryExpr {
            predicates,
            ..QueryExpr::default()
        })
    }

    /// Parse a query string into its list of predicates.
    pub fn parse_predicates(&self, query_str: &str) -> Result<Vec<Predicate>> {
        let trimmed = query_str.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }
        QueryStringParser::new(trimmed, &self.schema).parse()
    }

    /// Get the schema clauses are resolved against.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
}

/// A raw clause value before it is resolved against the field kind.
#[derive(Debug, Clone, PartialEq)]
enum RawValue {
    Word(String),
    Quoted(String),
    Range(String, String),
}

struct QueryStringParser<'a> {
    chars: Peekable<Chars<'a>>,
    schema: &'a Schema,
}

impl<'a> QueryStringParser<'a> {
    fn new(query_str: &'a str, schema: &'a Schema) -> Self {
        QueryStringParser {
            chars: query_str.chars().peekable(),
            schema,
        }
    }

    fn parse(&mut self) -> Result<Vec<Predicate>> {
        let mut predicates = Vec::new();
        let mut expect_clause = false;
        let mut seen_clause = false;

        loop {
            self.skip_whitespace();
            if self.chars.peek().is_none() {
                break;
            }

            if self.peek_keyword("AND") {
                if !seen_clause || expect_clause {
                    return Err(PilumError::parse("'AND' must sit between two clauses"));
                }
                self.consume_word();
                expect_clause = true;
                continue;
            }

            if let Some(predicate) = self.parse_clause()? {
                predicates.push(predicate);
            }
            seen_clause = true;
            expect_clause = false;
        }

        if expect_clause {
            return Err(PilumError::parse("Query ends with a dangling 'AND'"));
        }
        Ok(predicates)
    }

    /// Parse one clause. `*` yields `None`, since it filters nothing.
    fn parse_clause(&mut self) -> Result<Option<Predicate>> {
        if self.chars.peek() == Some(&'*') {
            self.chars.next();
            if self.chars.peek().is_some_and(|ch| !ch.is_whitespace()) {
                return Err(PilumError::parse("Unexpected characters after '*'"));
            }
            return Ok(None);
        }

        let field = self.parse_field_name()?;
        let kind = self.schema.require_field(&field)?;
        let value = self.parse_value(&field)?;
        resolve(field, kind, value).map(Some)
    }

    fn parse_field_name(&mut self) -> Result<String> {
        if self.chars.peek() == Some(&'@') {
            self.chars.next();
        }

        let mut field = String::new();
        while let Some(&ch) = self.chars.peek() {
            if ch == ':' {
                self.chars.next();
                if field.is_empty() {
                    return Err(PilumError::parse("Missing field name before ':'"));
                }
                return Ok(field);
            }
            if ch.is_whitespace() {
                break;
            }
            field.push(ch);
            self.chars.next();
        }
        Err(PilumError::parse(format!(
            "Expected 'field:value', found '{field}'"
        )))
    }

    fn parse_value(&mut self, field: &str) -> Result<RawValue> {
        match self.chars.peek() {
            Some('"') => {
                self.chars.next();
                self.consume_until('"', field).map(RawValue::Quoted)
            }
            Some('{') => {
                self.chars.next();
                self.consume_until('}', field)
                    .map(|value| RawValue::Quoted(value.trim().to_string()))
            }
            Some('[') => {
                self.chars.next();
                let body = self.consume_until(']', field)?;
                let bounds: Vec<&str> = body
                    .split(|ch: char| ch == ',' || ch.is_whitespace())
                    .filter(|part| !part.is_empty())
                    .collect();
                match bounds.as_slice() {
                    [lo, hi] => Ok(RawValue::Range(lo.to_string(), hi.to_string())),
                    _ => Err(PilumError::parse(format!(
                        "Range on '{field}' needs exactly two bounds, got '[{body}]'"
                    ))),
                }
            }
            _ => {
                let word = self.consume_word();
                if word.is_empty() {
                    Err(PilumError::parse(format!("Missing value after '{field}:'")))
                } else {
                    Ok(RawValue::Word(word))
                }
            }
        }
    }

    fn consume_until(&mut self, close: char, field: &str) -> Result<String> {
        let mut value = String::new();
        while let Some(ch) = self.chars.next() {
            if ch == close {
                return Ok(value);
            }
            if ch == '\\' {
                if let Some(escaped) = self.chars.next() {
                    value.push(escaped);
                    continue;
                }
            }
            value.push(ch);
        }
        Err(PilumError::parse(format!(
            "Unterminated value for '{field}': missing '{close}'"
        )))
    }

    fn consume_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() {
                break;
            }
            word.push(ch);
            self.chars.next();
        }
        word
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        let mut lookahead = self.chars.clone();
        for expected in keyword.chars() {
            if lookahead.next() != Some(expected) {
                return false;
            }
        }
        lookahead.peek().is_none_or(|ch| ch.is_whitespace())
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.chars.peek() {
            if ch.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }
    }
}

fn resolve(field: String, kind: FieldKind, value: RawValue) -> Result<Predicate> {
    match (kind, value) {
        (FieldKind::Tag, RawValue::Word(tag) | RawValue::Quoted(tag)) => {
            Ok(Predicate::Tag { field, value: tag })
        }
        (FieldKind::Text, RawValue::Word(text) | RawValue::Quoted(text)) => Ok(Predicate::Text {
            field,
            terms: vec![text],
        }),
        (FieldKind::Numeric { numeric_type }, RawValue::Word(literal) | RawValue::Quoted(literal)) => {
            let value = parse_number(&field, &literal, numeric_type)?;
            Ok(Predicate::Numeric {
                field,
                min: value,
                max: value,
            })
        }
        (FieldKind::Numeric { numeric_type }, RawValue::Range(lo, hi)) => {
            let min = parse_bound(&field, &lo, numeric_type)?;
            let max = parse_bound(&field, &hi, numeric_type)?;
            Ok(Predicate::Numeric { field, min, max })
        }
        (FieldKind::Vector { .. }, _) => Err(PilumError::schema(format!(
            "Vector field '{field}' can only be queried through a KNN clause"
        ))),
        (kind, RawValue::Range(..)) => Err(PilumError::parse(format!(
            "Range given for {} field '{field}'",
            kind.name()
        ))),
    }
}

/// Parse a range bound, accepting `-inf`, `inf` and `+inf`.
fn parse_bound(field: &str, literal: &str, numeric_type: NumericType) -> Result<Number> {
    let infinite = match literal.to_ascii_lowercase().as_str() {
        "-inf" => Some(false),
        "inf" | "+inf" => Some(true),
        _ => None,
    };
    match (infinite, numeric_type) {
        (Some(positive), NumericType::Integer) => Ok(Number::Integer(if positive {
            i64::MAX
        } else {
            i64::MIN
        })),
        (Some(positive), NumericType::Float) => Ok(Number::float(if positive {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        })),
        (None, _) => parse_number(field, literal, numeric_type),
    }
}

/// Parse a finite numeric literal for a field of `numeric_type`.
fn parse_number(field: &str, literal: &str, numeric_type: NumericType) -> Result<Number> {
    match numeric_type {
        NumericType::Integer => literal.parse::<i64>().map(Number::Integer).map_err(|_| {
            if literal.parse::<f64>().is_ok() {
                PilumError::parse(format!(
                    "Integer field '{field}' cannot be compared with '{literal}'"
                ))
            } else {
                PilumError::parse(format!("Invalid number '{literal}' for field '{field}'"))
            }
        }),
        NumericType::Float => match literal.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Number::float(value)),
            _ => Err(PilumError::parse(format!(
                "Invalid number '{literal}' for field '{field}'"
            ))),
        },
    }
}
