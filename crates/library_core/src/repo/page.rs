//! Search queries and the page envelope returned by list gateways.
//!
//! # Invariants
//! - Pages are zero-based.
//! - `per_page` of 0 falls back to 10; larger values are capped at 50.
//! - Sort fields are resolved against a whitelist before reaching SQL.

use crate::repo::error::{RepoError, RepoResult};
use serde::Serialize;

const PER_PAGE_DEFAULT: u32 = 10;
const PER_PAGE_MAX: u32 = 50;

/// Book listing options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub page: u32,
    pub per_page: u32,
    /// Case-insensitive substring matched against title, author and isbn.
    pub terms: Option<String>,
    pub sort: String,
    pub direction: String,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            page: 0,
            per_page: PER_PAGE_DEFAULT,
            terms: None,
            sort: "title".to_string(),
            direction: "asc".to_string(),
        }
    }
}

/// Loan listing options. Absent filters match every row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanSearchQuery {
    pub page: u32,
    pub per_page: u32,
    pub isbn: Option<String>,
    pub customer_id: Option<String>,
    pub sort: String,
    pub direction: String,
}

impl Default for LoanSearchQuery {
    fn default() -> Self {
        Self {
            page: 0,
            per_page: PER_PAGE_DEFAULT,
            isbn: None,
            customer_id: None,
            sort: "loan_date".to_string(),
            direction: "asc".to_string(),
        }
    }
}

/// One page of results plus the total row count across all pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub current_page: u32,
    pub per_page: u32,
    pub total: u64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            current_page: self.current_page,
            per_page: self.per_page,
            total: self.total,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(value: &str) -> RepoResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(RepoError::InvalidQuery(format!(
                "unsupported sort direction `{other}`; expected asc|desc"
            ))),
        }
    }

    pub(crate) fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSortField {
    Id,
    Title,
    Author,
    Isbn,
}

impl BookSortField {
    pub fn parse(value: &str) -> RepoResult<Self> {
        match value.trim() {
            "id" => Ok(Self::Id),
            "title" => Ok(Self::Title),
            "author" => Ok(Self::Author),
            "isbn" => Ok(Self::Isbn),
            other => Err(RepoError::InvalidQuery(format!(
                "unsupported book sort field `{other}`"
            ))),
        }
    }

    pub(crate) fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Author => "author",
            Self::Isbn => "isbn",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanSortField {
    Id,
    LoanDate,
    ReturnDate,
    Returned,
    CustomerId,
    BookId,
}

impl LoanSortField {
    /// Accepts snake_case columns and their camelCase aliases.
    pub fn parse(value: &str) -> RepoResult<Self> {
        match value.trim() {
            "id" => Ok(Self::Id),
            "loan_date" | "loanDate" => Ok(Self::LoanDate),
            "return_date" | "returnDate" => Ok(Self::ReturnDate),
            "returned" => Ok(Self::Returned),
            "customer_id" | "customerId" => Ok(Self::CustomerId),
            "book_id" | "bookId" => Ok(Self::BookId),
            other => Err(RepoError::InvalidQuery(format!(
                "unsupported loan sort field `{other}`"
            ))),
        }
    }

    pub(crate) fn column(self) -> &'static str {
        match self {
            Self::Id => "l.id",
            Self::LoanDate => "l.loan_date",
            Self::ReturnDate => "l.return_date",
            Self::Returned => "l.returned",
            Self::CustomerId => "l.customer_id",
            Self::BookId => "l.book_id",
        }
    }
}

/// Normalizes page size according to the listing contract.
pub fn normalize_per_page(per_page: u32) -> u32 {
    match per_page {
        0 => PER_PAGE_DEFAULT,
        value if value > PER_PAGE_MAX => PER_PAGE_MAX,
        value => value,
    }
}

/// Row offset for a zero-based page.
pub(crate) fn page_offset(page: u32, per_page: u32) -> u64 {
    u64::from(page) * u64::from(per_page)
}

/// Trimmed, non-empty filter value.
pub(crate) fn active_filter(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
