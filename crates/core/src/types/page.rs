//! Offset pagination envelope.
//!
//! Every list endpoint answers with the same wire shape:
//!
//! ```json
//! { "pagination": { "current": 1, "limit": 20, "records": 41, "pages": 3 },
//!   "data": [ ... ] }
//! ```
//!
//! `records` is the total match count ignoring pagination and
//! `pages = max(1, ceil(records / limit))`, uniformly 1-based across every
//! endpoint. The count and the page fetch are two independent reads, so the
//! envelope can be momentarily inconsistent with `data` under concurrent
//! writes; callers treat it as an eventually-consistent snapshot.

use serde::{Deserialize, Serialize};

/// Page/limit fields accepted by every list request body.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageRequest {
    /// 1-based page number. Absent or zero means page 1.
    pub page: Option<u32>,
    /// Page size. Absent means the endpoint default; clamped to [`Self::MAX_LIMIT`].
    pub limit: Option<u32>,
}

impl PageRequest {
    /// Hard cap on page size for any endpoint.
    pub const MAX_LIMIT: u32 = 100;

    /// Resolve optional fields into a concrete page/limit pair.
    #[must_use]
    pub fn resolve(&self, default_limit: u32) -> ResolvedPage {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self
            .limit
            .unwrap_or(default_limit)
            .clamp(1, Self::MAX_LIMIT);
        ResolvedPage { page, limit }
    }
}

/// A resolved page/limit pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPage {
    /// 1-based page number.
    pub page: u32,
    /// Page size, at least 1.
    pub limit: u32,
}

impl ResolvedPage {
    /// Rows to skip.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }

    /// Rows to fetch.
    #[must_use]
    pub const fn take(&self) -> i64 {
        self.limit as i64
    }
}

/// The `pagination` object of the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page number of this response.
    pub current: u32,
    /// Page size used.
    pub limit: u32,
    /// Total matching records ignoring pagination.
    pub records: u64,
    /// Total pages, floored at 1.
    pub pages: u64,
}

/// A page of results with its envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Pagination envelope.
    pub pagination: Pagination,
    /// The page slice.
    pub data: Vec<T>,
}

impl<T> Page<T> {
    /// Assemble the envelope from a resolved request, a total count, and the
    /// fetched slice.
    #[must_use]
    pub fn new(resolved: ResolvedPage, records: u64, data: Vec<T>) -> Self {
        let pages = records.div_ceil(u64::from(resolved.limit)).max(1);
        Self {
            pagination: Pagination {
                current: resolved.page,
                limit: resolved.limit,
                records,
                pages,
            },
            data,
        }
    }

    /// Map the data slice, keeping the envelope.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            pagination: self.pagination,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_one_based() {
        let resolved = PageRequest::default().resolve(20);
        assert_eq!(resolved, ResolvedPage { page: 1, limit: 20 });
        assert_eq!(resolved.offset(), 0);
    }

    #[test]
    fn test_zero_page_is_treated_as_first() {
        let req = PageRequest {
            page: Some(0),
            limit: Some(10),
        };
        assert_eq!(req.resolve(20).page, 1);
    }

    #[test]
    fn test_limit_is_clamped() {
        let req = PageRequest {
            page: None,
            limit: Some(100_000),
        };
        assert_eq!(req.resolve(20).limit, PageRequest::MAX_LIMIT);

        let req = PageRequest {
            page: None,
            limit: Some(0),
        };
        assert_eq!(req.resolve(20).limit, 1);
    }

    #[test]
    fn test_offset_arithmetic() {
        let resolved = ResolvedPage { page: 3, limit: 25 };
        assert_eq!(resolved.offset(), 50);
        assert_eq!(resolved.take(), 25);
    }

    #[test]
    fn test_pages_formula() {
        let resolved = ResolvedPage { page: 1, limit: 10 };
        assert_eq!(Page::new(resolved, 0, Vec::<u8>::new()).pagination.pages, 1);
        assert_eq!(Page::new(resolved, 1, Vec::<u8>::new()).pagination.pages, 1);
        assert_eq!(Page::new(resolved, 10, Vec::<u8>::new()).pagination.pages, 1);
        assert_eq!(Page::new(resolved, 11, Vec::<u8>::new()).pagination.pages, 2);
        assert_eq!(
            Page::new(resolved, 101, Vec::<u8>::new()).pagination.pages,
            11
        );
    }

    #[test]
    fn test_envelope_wire_shape() {
        let page = Page::new(ResolvedPage { page: 2, limit: 2 }, 5, vec!["a", "b"]);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "pagination": { "current": 2, "limit": 2, "records": 5, "pages": 3 },
                "data": ["a", "b"],
            })
        );
    }
}
