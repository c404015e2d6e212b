//! Applies a pagination spec to a base query

use super::{
    BaseQuery, Listing, Predicate, QueryError, QueryExecutor, QuerySession, SearchAllClause,
    Window,
};
use crate::domain::{Page, PaginationMeta, PaginationSpec};
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct QueryEngine {
    timeout: Duration,
}

impl QueryEngine {
    /// `timeout` bounds every individual store round trip of a listing.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Produce one page of `T` and the size of the whole filtered set.
    ///
    /// Filters from `base`, the single-field search in `spec` and the
    /// `search_all` clause are applied to both the count and the fetch
    /// branch. Ordering and windowing only apply to the fetch branch. Any
    /// failure aborts the listing; a partially filled page is never returned.
    pub async fn paginate<T, E>(
        &self,
        executor: &E,
        base: BaseQuery<T>,
        spec: &PaginationSpec,
        search_all: Option<&SearchAllClause>,
    ) -> Result<Page<T>, QueryError>
    where
        T: Listing + Send,
        E: QueryExecutor<T>,
    {
        let page_size = spec.page_size();
        if page_size < 1 {
            return Err(QueryError::InvalidPageSize);
        }

        let mut count_query = base.into_query();

        if let Some((field, value)) = spec.field_search() {
            let column = T::resolve(field)?;
            count_query.filters.push(Predicate::contains(column, value));
        }

        if let (Some(term), Some(clause)) = (spec.search_all(), search_all) {
            count_query.filters.push(clause.bind(term));
        }

        let order_column = T::resolve(spec.order_by())?;
        let mut fetch_query = count_query.clone();
        fetch_query.order.push((order_column, spec.sort()));
        if order_column != T::PRIMARY_KEY {
            fetch_query.order.push((T::PRIMARY_KEY, spec.sort()));
        }
        fetch_query.window = Some(Window {
            limit: page_size,
            offset: spec.offset(),
        });

        let mut session = self.bounded("begin", executor.begin()).await?;
        let total_data = self.bounded("count", session.count(&count_query)).await?;
        let data = self.bounded("fetch", session.fetch(&fetch_query)).await?;
        self.bounded("commit", session.finish()).await?;

        tracing::debug!(
            source = T::SOURCE,
            page = spec.page(),
            page_size,
            total_data,
            returned = data.len(),
            "Listing paginated"
        );

        Ok(Page {
            data,
            pagination: PaginationMeta::new(spec.page(), page_size, total_data),
        })
    }

    async fn bounded<F, R>(&self, operation: &'static str, fut: F) -> Result<R, QueryError>
    where
        F: Future<Output = Result<R, QueryError>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| QueryError::Timeout(operation))?
    }
}
