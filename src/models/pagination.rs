use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_LIMIT: u64 = 10;
pub const DEFAULT_FUNDING_PAGE_LIMIT: u64 = 5;

/// `?page=&limit=` as sent by the client.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    /// Page defaults to 1, limit to `default_limit`, and limit never exceeds `max_limit`.
    /// Values below 1 fall back to those defaults.
    pub fn resolve(query: &PageQuery, default_limit: u64, max_limit: u64) -> Self {
        let limit = match query.limit {
            Some(limit) if limit >= 1 => limit as u64,
            _ => default_limit,
        }
        .min(max_limit.max(1))
        .max(1);

        // The driver encodes skip as i64.
        let last_page = i64::MAX as u64 / limit + 1;
        let page = query.page.unwrap_or(1).max(1) as u64;

        Self {
            page: page.min(last_page),
            limit,
        }
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total_count: u64) -> u64 {
        total_count.div_ceil(self.limit)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub limit: u64,
    pub total_count: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, request: PageRequest, total_count: u64) -> Self {
        Self {
            data,
            page: request.page,
            limit: request.limit,
            total_count,
            total_pages: request.total_pages(total_count),
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total_count: self.total_count,
            total_pages: self.total_pages,
        }
    }
}
