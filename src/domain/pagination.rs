//! Pagination, sorting and search intent for record listings

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Upper bound applied to `page_size`; larger values are clamped, not rejected.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Column used for ordering when the caller does not pick one.
pub const DEFAULT_ORDER_BY: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Anything other than a case-insensitive "desc" sorts ascending.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Pagination parameters exactly as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub search_field: Option<String>,
    pub search_value: Option<String>,
    pub search_all: Option<String>,
    pub order_by: Option<String>,
    pub sort: Option<String>,
}

/// Validated caller intent for paging, sorting and filtering a listing.
///
/// `page` and `page_size` are always positive once a value of this type
/// exists. Field names are still untrusted here; they are resolved against a
/// per-entity allow-list by the query engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationSpec {
    page: i64,
    page_size: i64,
    search_field: Option<String>,
    search_value: Option<String>,
    search_all: Option<String>,
    order_by: String,
    sort: SortDirection,
}

impl PaginationSpec {
    pub fn new(page: i64, page_size: i64) -> Result<Self> {
        if page < 1 {
            return Err(AppError::Validation(
                "page must be a positive integer (>= 1)".to_string(),
            ));
        }
        if page_size < 1 {
            return Err(AppError::Validation(
                "page_size must be a positive integer (>= 1)".to_string(),
            ));
        }

        let page_size = page_size.min(MAX_PAGE_SIZE);
        if (page - 1).checked_mul(page_size).is_none() {
            return Err(AppError::Validation("page is out of range".to_string()));
        }

        Ok(Self {
            page,
            page_size,
            search_field: None,
            search_value: None,
            search_all: None,
            order_by: DEFAULT_ORDER_BY.to_string(),
            sort: SortDirection::Asc,
        })
    }

    pub fn with_search(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.search_field = Some(field.into());
        self.search_value = Some(value.into());
        self
    }

    pub fn with_search_all(mut self, value: impl Into<String>) -> Self {
        self.search_all = Some(value.into());
        self
    }

    pub fn with_order(mut self, order_by: impl Into<String>, sort: SortDirection) -> Self {
        let order_by = order_by.into();
        if !order_by.is_empty() {
            self.order_by = order_by;
        }
        self.sort = sort;
        self
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }

    /// The single-column search, only when both field and value are non-empty.
    pub fn field_search(&self) -> Option<(&str, &str)> {
        match (self.search_field.as_deref(), self.search_value.as_deref()) {
            (Some(field), Some(value)) if !field.is_empty() && !value.is_empty() => {
                Some((field, value))
            }
            _ => None,
        }
    }

    pub fn search_all(&self) -> Option<&str> {
        self.search_all.as_deref().filter(|value| !value.is_empty())
    }

    pub fn order_by(&self) -> &str {
        &self.order_by
    }

    pub fn sort(&self) -> SortDirection {
        self.sort
    }
}

impl TryFrom<PaginationQuery> for PaginationSpec {
    type Error = AppError;

    fn try_from(query: PaginationQuery) -> Result<Self> {
        let page = query
            .page
            .ok_or_else(|| AppError::Validation("page is required".to_string()))?;
        let page_size = query
            .page_size
            .ok_or_else(|| AppError::Validation("page_size is required".to_string()))?;

        let mut spec = PaginationSpec::new(page, page_size)?;
        if let (Some(field), Some(value)) = (query.search_field, query.search_value) {
            spec = spec.with_search(field, value);
        }
        if let Some(value) = query.search_all {
            spec = spec.with_search_all(value);
        }
        let sort = query
            .sort
            .as_deref()
            .map(SortDirection::parse)
            .unwrap_or_default();
        Ok(spec.with_order(query.order_by.unwrap_or_default(), sort))
    }
}

/// Pagination metadata returned alongside every listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: i64,
    pub page_size: i64,
    pub total_page: i64,
    pub total_data: i64,
}

impl PaginationMeta {
    pub fn new(page: i64, page_size: i64, total_data: i64) -> Self {
        let total_page = if page_size > 0 {
            (total_data + page_size - 1) / page_size
        } else {
            0
        };
        Self {
            page,
            page_size,
            total_page,
            total_data,
        }
    }
}

/// One page of a listing together with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}
