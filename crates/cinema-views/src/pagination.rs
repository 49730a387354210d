//! Page arithmetic for the public movie lists.
//!
//! The catalog pages in SQL (`LIMIT`/`OFFSET`), so [`Paginator`] only needs
//! the total row count. It resolves the raw `?page=` value the way a list
//! view does: `"last"` is accepted, anything else must be a page number that
//! exists. Page 1 of an empty list is valid.
//!
//! # Examples
//!
//! ```
//! use cinema_views::pagination::Paginator;
//!
//! let paginator = Paginator::new(14, 6);
//! assert_eq!(paginator.num_pages(), 3);
//!
//! let page = paginator.page_from_query(Some("last")).unwrap();
//! assert_eq!(page.number, 3);
//! assert_eq!(page.offset(), 12);
//! assert_eq!((page.start_index, page.end_index), (13, 14));
//! ```

use cinema_core::CinemaError;
use serde::Serialize;
use thiserror::Error;

/// Why a page could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    /// The `page` value was neither a number nor `"last"`.
    #[error("That page number is not an integer")]
    PageNotAnInteger,
    /// Page numbers start at 1.
    #[error("That page number is less than 1")]
    InvalidPage,
    /// The page lies past the last page.
    #[error("That page contains no results")]
    EmptyPage,
}

impl From<PaginationError> for CinemaError {
    fn from(err: PaginationError) -> Self {
        Self::NotFound(format!("Invalid page ({err})"))
    }
}

/// Splits `count` rows into pages of `per_page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: usize,
    per_page: usize,
    allow_empty_first_page: bool,
}

impl Paginator {
    /// Creates a paginator. A `per_page` of 0 is treated as 1.
    pub fn new(count: usize, per_page: usize) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
            allow_empty_first_page: true,
        }
    }

    /// Sets whether page 1 of an empty list is valid.
    #[must_use]
    pub const fn allow_empty_first_page(mut self, allow: bool) -> Self {
        self.allow_empty_first_page = allow;
        self
    }

    /// Returns the total number of rows.
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Returns the number of pages.
    pub fn num_pages(&self) -> usize {
        if self.count == 0 {
            return usize::from(self.allow_empty_first_page);
        }
        self.count.div_ceil(self.per_page)
    }

    /// Parses and checks a raw page number.
    pub fn validate_number(&self, raw: Option<&str>) -> Result<usize, PaginationError> {
        let number = match raw.map(str::trim) {
            None | Some("") => 1,
            Some("last") => self.num_pages(),
            Some(value) => value
                .parse::<usize>()
                .map_err(|_| PaginationError::PageNotAnInteger)?,
        };
        if number == 0 {
            return Err(PaginationError::InvalidPage);
        }
        if number > self.num_pages() {
            if number == 1 && self.allow_empty_first_page {
                return Ok(1);
            }
            return Err(PaginationError::EmptyPage);
        }
        Ok(number)
    }

    /// Returns page `number` (1-based).
    pub fn page(&self, number: usize) -> Result<Page, PaginationError> {
        let number = self.validate_number(Some(&number.to_string()))?;
        let num_pages = self.num_pages();
        let (start_index, end_index) = if self.count == 0 {
            (0, 0)
        } else {
            let start = (number - 1) * self.per_page;
            (start + 1, (start + self.per_page).min(self.count))
        };
        Ok(Page {
            number,
            num_pages,
            count: self.count,
            per_page: self.per_page,
            has_next: number < num_pages,
            has_previous: number > 1,
            next_page_number: (number < num_pages).then_some(number + 1),
            previous_page_number: (number > 1).then(|| number - 1),
            start_index,
            end_index,
        })
    }

    /// Resolves the `?page=` query value to a page.
    pub fn page_from_query(&self, raw: Option<&str>) -> Result<Page, PaginationError> {
        let number = self.validate_number(raw)?;
        self.page(number)
    }
}

/// One page of a list, as exposed to templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub number: usize,
    pub num_pages: usize,
    pub count: usize,
    pub per_page: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<usize>,
    pub previous_page_number: Option<usize>,
    /// 1-based index of the first row on this page, 0 for an empty list.
    pub start_index: usize,
    pub end_index: usize,
}

impl Page {
    /// Returns the SQL offset of this page.
    pub const fn offset(&self) -> usize {
        (self.number - 1) * self.per_page
    }
}
