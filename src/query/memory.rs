//! In-process executor over a snapshot of rows
//!
//! Evaluates the same structured [`Query`] the MySQL executor renders, which
//! keeps listing semantics testable without a database.

use super::{Predicate, Query, QueryError, QueryExecutor, QuerySession, Value};
use crate::domain::SortDirection;
use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Int(i64),
    Text(String),
}

impl FieldValue {
    fn as_text(&self) -> String {
        match self {
            FieldValue::Int(v) => v.to_string(),
            FieldValue::Text(v) => v.clone(),
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (FieldValue::Int(a), Value::Int(b)) => a == b,
            (FieldValue::Text(a), Value::Text(b)) => a == b,
            (FieldValue::Int(a), Value::Text(b)) => a.to_string() == *b,
            (FieldValue::Text(a), Value::Int(b)) => *a == b.to_string(),
        }
    }

    fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Int(a), FieldValue::Int(b)) => a.cmp(b),
            _ => self.as_text().cmp(&other.as_text()),
        }
    }
}

/// A row the in-memory executor can filter and order.
pub trait Record: Clone + Send + Sync + 'static {
    /// Value of a qualified column (`posts.title`), `None` when NULL or unknown.
    fn field(&self, column: &str) -> Option<FieldValue>;
}

#[derive(Clone)]
pub struct MemoryExecutor<T> {
    rows: Arc<Vec<T>>,
}

impl<T: Record> MemoryExecutor<T> {
    pub fn new(rows: Vec<T>) -> Self {
        Self {
            rows: Arc::new(rows),
        }
    }

    fn matching(rows: &[T], query: &Query) -> Vec<T> {
        rows.iter()
            .filter(|row| query.filters.iter().all(|p| evaluate(*row, p)))
            .cloned()
            .collect()
    }
}

pub struct MemorySession<T> {
    rows: Arc<Vec<T>>,
}

#[async_trait]
impl<T: Record> QueryExecutor<T> for MemoryExecutor<T> {
    type Session = MemorySession<T>;

    async fn begin(&self) -> Result<MemorySession<T>, QueryError> {
        Ok(MemorySession {
            rows: Arc::clone(&self.rows),
        })
    }
}

#[async_trait]
impl<T: Record> QuerySession<T> for MemorySession<T> {
    async fn count(&mut self, query: &Query) -> Result<i64, QueryError> {
        Ok(MemoryExecutor::matching(&self.rows, query).len() as i64)
    }

    async fn fetch(&mut self, query: &Query) -> Result<Vec<T>, QueryError> {
        let mut rows = MemoryExecutor::matching(&self.rows, query);

        rows.sort_by(|a, b| {
            query
                .order
                .iter()
                .map(|(column, direction)| {
                    let ord = match (a.field(column), b.field(column)) {
                        (Some(x), Some(y)) => x.compare(&y),
                        (None, Some(_)) => Ordering::Less,
                        (Some(_), None) => Ordering::Greater,
                        (None, None) => Ordering::Equal,
                    };
                    match direction {
                        SortDirection::Asc => ord,
                        SortDirection::Desc => ord.reverse(),
                    }
                })
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        let rows = match query.window {
            Some(window) => rows
                .into_iter()
                .skip(window.offset.max(0) as usize)
                .take(window.limit.max(0) as usize)
                .collect(),
            None => rows,
        };
        Ok(rows)
    }

    async fn finish(self) -> Result<(), QueryError> {
        Ok(())
    }
}

fn contains(row: &impl Record, column: &str, needle: &str) -> bool {
    row.field(column)
        .map(|value| value.as_text().to_lowercase().contains(needle))
        .unwrap_or(false)
}

fn evaluate(row: &impl Record, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Eq { column, value } => row
            .field(column)
            .map(|field| field.matches(value))
            .unwrap_or(false),
        Predicate::Contains { column, needle } => contains(row, column, needle),
        Predicate::AnyContains { columns, needle } => {
            columns.iter().any(|column| contains(row, column, needle))
        }
    }
}
