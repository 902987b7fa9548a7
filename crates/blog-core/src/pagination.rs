//! Page-number pagination for post listings.

use serde::Serialize;

use crate::error::DomainError;

/// Posts shown per listing page.
pub const POSTS_PER_PAGE: u64 = 10;

/// A 1-based page number plus page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: u64,
    pub size: u64,
}

impl PageRequest {
    /// Page numbers below 1 are clamped to the first page.
    pub fn new(number: u64) -> Self {
        Self {
            number: number.max(1),
            size: POSTS_PER_PAGE,
        }
    }

    /// `None` when the page starts past any offset a SQL `OFFSET` can hold.
    pub fn checked(number: u64) -> Option<Self> {
        let request = Self::new(number);
        (request.number - 1)
            .checked_mul(request.size)
            .filter(|offset| *offset <= i64::MAX as u64)
            .map(|_| request)
    }

    pub fn offset(&self) -> u64 {
        (self.number - 1).saturating_mul(self.size)
    }

    pub fn limit(&self) -> u64 {
        self.size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1)
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        // An empty listing still has one (empty) page.
        let num_pages = total.div_ceil(request.size).max(1);

        Self {
            items,
            number: request.number,
            num_pages,
            total,
            has_next: request.number < num_pages,
            has_previous: request.number > 1,
        }
    }

    /// Requests past the last page are not found.
    pub fn ensure_exists(self) -> Result<Self, DomainError> {
        if self.number > self.num_pages {
            return Err(DomainError::not_found("page", self.number));
        }
        Ok(self)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}
