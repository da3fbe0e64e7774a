//! Page-number pagination over an over-fetch-by-one query.
//!
//! A page of `page_size` rows is served by fetching `page_size + 1` rows at
//! `offset = (page - 1) * page_size`. The extra row, if it arrives, only
//! signals that another page exists and is never returned. No count query
//! is issued.

use serde::Deserialize;

use crate::error::{CoreError, FieldError};

/// Page served when `?page=` is omitted.
pub const DEFAULT_PAGE: i64 = 1;

/// Page size used when `?page_size=` is omitted.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Largest page a client may request.
pub const MAX_PAGE_SIZE: i64 = 50;

/// A validated 1-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    page_size: i64,
}

/// Raw `?page=&page_size=` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PageRequest {
    /// Build a request, rejecting `page < 1` and page sizes outside
    /// `1..=MAX_PAGE_SIZE`.
    pub fn new(page: i64, page_size: i64) -> Result<Self, CoreError> {
        let mut errors = Vec::new();
        if page < 1 {
            errors.push(FieldError::new(
                "greater_than_equal",
                &["query", "page"],
                "Input should be greater than or equal to 1",
            ));
        }
        if page_size < 1 {
            errors.push(FieldError::new(
                "greater_than_equal",
                &["query", "page_size"],
                "Input should be greater than or equal to 1",
            ));
        } else if page_size > MAX_PAGE_SIZE {
            errors.push(FieldError::new(
                "less_than_equal",
                &["query", "page_size"],
                format!("Input should be less than or equal to {MAX_PAGE_SIZE}"),
            ));
        }

        if errors.is_empty() {
            Ok(Self { page, page_size })
        } else {
            Err(CoreError::Validation(errors))
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    /// Rows to skip before this page.
    ///
    /// Saturates at `i64::MAX` when the page lies beyond any addressable
    /// row, so the store returns an empty page instead of overflowing.
    pub fn offset(&self) -> i64 {
        (self.page - 1)
            .checked_mul(self.page_size)
            .unwrap_or(i64::MAX)
    }

    /// Rows to ask the store for: one more than the page holds.
    pub fn fetch_limit(&self) -> i64 {
        self.page_size + 1
    }

    /// Trim an over-fetched result to the page and report whether a further
    /// page exists.
    pub fn split<T>(&self, mut rows: Vec<T>) -> (Vec<T>, bool) {
        let page_size = self.page_size as usize;
        let has_next_page = rows.len() == page_size + 1;
        rows.truncate(page_size);
        (rows, has_next_page)
    }
}

impl TryFrom<PageParams> for PageRequest {
    type Error = CoreError;

    fn try_from(params: PageParams) -> Result<Self, Self::Error> {
        Self::new(
            params.page.unwrap_or(DEFAULT_PAGE),
            params.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
