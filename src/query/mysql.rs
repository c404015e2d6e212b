//! MySQL executor: renders structured queries with `sqlx::QueryBuilder`

use super::{Predicate, Query, QueryError, QueryExecutor, QuerySession, Value};
use async_trait::async_trait;
use sqlx::{mysql::MySqlRow, FromRow, MySql, MySqlPool, QueryBuilder, Transaction};

/// Executes listings against MySQL.
///
/// Each listing runs inside one transaction. Under InnoDB's default
/// REPEATABLE READ isolation the count and fetch branches therefore read from
/// the same snapshot, so `total_data` always describes the set the page was
/// cut from.
#[derive(Clone)]
pub struct MySqlExecutor {
    pool: MySqlPool,
}

impl MySqlExecutor {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

pub struct MySqlSession {
    tx: Transaction<'static, MySql>,
}

#[async_trait]
impl<T> QueryExecutor<T> for MySqlExecutor
where
    T: for<'r> FromRow<'r, MySqlRow> + Send + Unpin + 'static,
{
    type Session = MySqlSession;

    async fn begin(&self) -> Result<MySqlSession, QueryError> {
        let tx = self.pool.begin().await?;
        Ok(MySqlSession { tx })
    }
}

#[async_trait]
impl<T> QuerySession<T> for MySqlSession
where
    T: for<'r> FromRow<'r, MySqlRow> + Send + Unpin + 'static,
{
    async fn count(&mut self, query: &Query) -> Result<i64, QueryError> {
        let mut builder = count_sql(query);
        let total = builder
            .build_query_scalar::<i64>()
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(total)
    }

    async fn fetch(&mut self, query: &Query) -> Result<Vec<T>, QueryError> {
        let mut builder = fetch_sql(query);
        let rows = builder
            .build_query_as::<T>()
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }

    async fn finish(self) -> Result<(), QueryError> {
        self.tx.commit().await?;
        Ok(())
    }
}

/// Left-hand side of a case-insensitive substring match, up to `LIKE`.
pub(crate) fn like_expr(column: &str) -> String {
    format!("LOWER(CAST({} AS CHAR)) LIKE", column)
}

/// `%needle%` with LIKE metacharacters in the needle escaped.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

pub(crate) fn count_sql(query: &Query) -> QueryBuilder<'static, MySql> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM ");
    builder.push(query.source);
    push_filters(&mut builder, &query.filters);
    builder
}

pub(crate) fn fetch_sql(query: &Query) -> QueryBuilder<'static, MySql> {
    let mut builder = QueryBuilder::new("SELECT ");
    builder.push(query.select).push(" FROM ").push(query.source);
    push_filters(&mut builder, &query.filters);

    for (i, (column, direction)) in query.order.iter().enumerate() {
        builder.push(if i == 0 { " ORDER BY " } else { ", " });
        builder.push(*column).push(" ").push(direction.as_sql());
    }

    if let Some(window) = query.window {
        builder.push(" LIMIT ").push_bind(window.limit);
        builder.push(" OFFSET ").push_bind(window.offset);
    }
    builder
}

fn push_filters(builder: &mut QueryBuilder<'static, MySql>, filters: &[Predicate]) {
    for (i, predicate) in filters.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        match predicate {
            Predicate::Eq { column, value } => {
                builder.push(*column).push(" = ");
                match value {
                    Value::Int(v) => builder.push_bind(*v),
                    Value::Text(v) => builder.push_bind(v.clone()),
                };
            }
            Predicate::Contains { column, needle } => {
                builder
                    .push(like_expr(column))
                    .push(" ")
                    .push_bind(like_pattern(needle));
            }
            Predicate::AnyContains { columns, needle } => {
                let pattern = like_pattern(needle);
                builder.push("(");
                for (j, column) in columns.iter().enumerate() {
                    if j > 0 {
                        builder.push(" OR ");
                    }
                    builder
                        .push(like_expr(column))
                        .push(" ")
                        .push_bind(pattern.clone());
                }
                builder.push(")");
            }
        }
    }
}
