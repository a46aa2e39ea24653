//! Page windows over a collection.

use crate::constants::{DEFAULT_PAGE, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crate::store::{Collection, Document, Filter, Query, Sort, StoreResult};
use serde::{Deserialize, Serialize};

/// `?page=&limit=` as sent by clients. Missing values fall back to page 1 of 10.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageRequest {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl PageRequest {
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// 1-based page number, never zero.
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(DEFAULT_PAGE).max(1)
    }

    /// Page size clamped to `1..=MAX_PAGE_LIMIT`.
    pub fn limit(&self) -> u64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }

    pub fn skip(&self) -> u64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

/// One page of results plus the numbers a pager needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: u64, request: &PageRequest) -> Self {
        let page = request.page();
        let limit = request.limit();
        let total_pages = total.div_ceil(limit);
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }

    /// Replace the items, keeping the counts. Used to attach populated references.
    pub fn with_items<U>(self, items: Vec<U>) -> Paginated<U> {
        Paginated {
            items,
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
            has_next_page: self.has_next_page,
            has_prev_page: self.has_prev_page,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        let items = self.items.into_iter().map(f).collect();
        Paginated {
            items,
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
            has_next_page: self.has_next_page,
            has_prev_page: self.has_prev_page,
        }
    }
}

/// Fetch one page of `collection` matching `filter`, ordered by `sort`.
pub async fn paginate<T: Document>(
    collection: &Collection<T>,
    filter: Filter,
    sort: Sort,
    request: &PageRequest,
) -> StoreResult<Paginated<T>> {
    let total = collection.count(&filter).await?;
    let query = Query::new(filter)
        .sort(sort)
        .skip(request.skip())
        .limit(request.limit());
    let items = collection.find(&query).await?;
    Ok(Paginated::new(items, total, request))
}
