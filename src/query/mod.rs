//! Generic paginated/filterable listing engine
//!
//! A listing starts from a [`BaseQuery`] for some record type implementing
//! [`Listing`], is refined by a caller-supplied
//! [`PaginationSpec`](crate::domain::PaginationSpec) and is executed by a
//! [`QueryExecutor`] as two branches: a count branch producing the total and a
//! fetch branch producing the requested window.
//!
//! Caller-supplied field names never reach SQL text. They are resolved
//! against [`Listing::FIELDS`] and rejected with
//! [`QueryError::UnknownField`] when they are not listed there.

pub mod engine;
pub mod memory;
pub mod mysql;

use crate::domain::SortDirection;
use async_trait::async_trait;
use std::marker::PhantomData;
use thiserror::Error;

pub use engine::QueryEngine;
pub use memory::{FieldValue, MemoryExecutor, Record};
pub use mysql::MySqlExecutor;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("page_size must be at least 1")]
    InvalidPageSize,

    #[error("{0} exceeded the query time budget")]
    Timeout(&'static str),

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}

/// Describes how a record type is listed.
pub trait Listing {
    /// `FROM` clause, joins included.
    const SOURCE: &'static str;
    /// Select list of the fetch branch.
    const SELECT: &'static str;
    /// Qualified primary key, used to make ordering total.
    const PRIMARY_KEY: &'static str;
    /// Allow-list of `(public name, qualified column)` pairs usable for
    /// searching and ordering.
    const FIELDS: &'static [(&'static str, &'static str)];

    /// Resolve a caller-supplied field name to a trusted column.
    ///
    /// Both the public name (`title`) and the qualified column
    /// (`posts.title`) are accepted.
    fn resolve(field: &str) -> Result<&'static str, QueryError> {
        Self::FIELDS
            .iter()
            .find(|(name, column)| *name == field || *column == field)
            .map(|(_, column)| *column)
            .ok_or_else(|| QueryError::UnknownField(field.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Text(String),
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

/// A filter applied identically to the count and fetch branches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `column = value`
    Eq { column: &'static str, value: Value },
    /// Case-insensitive substring match on the textual form of `column`.
    Contains { column: &'static str, needle: String },
    /// Disjunction of [`Predicate::Contains`] over several columns sharing one needle.
    AnyContains {
        columns: &'static [&'static str],
        needle: String,
    },
}

impl Predicate {
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Predicate::Eq {
            column,
            value: value.into(),
        }
    }

    pub fn contains(column: &'static str, needle: &str) -> Self {
        Predicate::Contains {
            column,
            needle: needle.to_lowercase(),
        }
    }
}

/// A fixed "search everywhere" disjunction over trusted columns.
///
/// Each column contributes one positional placeholder; binding a search term
/// puts the same `%term%` token behind every one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchAllClause {
    columns: &'static [&'static str],
}

impl SearchAllClause {
    pub const fn new(columns: &'static [&'static str]) -> Self {
        Self { columns }
    }

    pub fn bind(&self, term: &str) -> Predicate {
        Predicate::AnyContains {
            columns: self.columns,
            needle: term.to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: i64,
    pub offset: i64,
}

/// Structured query handed to an executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub source: &'static str,
    pub select: &'static str,
    pub filters: Vec<Predicate>,
    pub order: Vec<(&'static str, SortDirection)>,
    pub window: Option<Window>,
}

/// Scope of a listing before the caller's pagination intent is applied.
#[derive(Debug, Clone)]
pub struct BaseQuery<T> {
    filters: Vec<Predicate>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Listing> BaseQuery<T> {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
            _record: PhantomData,
        }
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }

    pub(crate) fn into_query(self) -> Query {
        Query {
            source: T::SOURCE,
            select: T::SELECT,
            filters: self.filters,
            order: Vec::new(),
            window: None,
        }
    }
}

impl<T: Listing> Default for BaseQuery<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the two branches of a listing.
///
/// `begin` opens a session; both branches of one listing run on the same
/// session so an executor can give them a consistent view of the data.
#[async_trait]
pub trait QueryExecutor<T>: Send + Sync {
    type Session: QuerySession<T>;

    async fn begin(&self) -> Result<Self::Session, QueryError>;
}

#[async_trait]
pub trait QuerySession<T>: Send {
    async fn count(&mut self, query: &Query) -> Result<i64, QueryError>;
    async fn fetch(&mut self, query: &Query) -> Result<Vec<T>, QueryError>;
    async fn finish(self) -> Result<(), QueryError>;
}
