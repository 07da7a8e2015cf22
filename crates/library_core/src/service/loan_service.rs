//! Loan checkout, return and listing.
//!
//! # Invariants
//! - A book has at most one open loan. The pre-check and the storage
//!   constraint both report `Book with ID {id} is already on loan`.
//! - `loan_date` comes from the injected clock, never from callers.

use crate::model::loan::Loan;
use crate::model::runtime::{Clock, IdGenerator, SystemClock, UuidIdGenerator};
use crate::repo::book_repo::BookGateway;
use crate::repo::customer_repo::CustomerGateway;
use crate::repo::loan_repo::LoanGateway;
use crate::repo::page::{LoanSearchQuery, Page};
use crate::service::error::{conflict_as_validation, settle, ServiceError, ServiceResult};
use crate::service::CreatedId;
use crate::validation::{Notification, ValidationError};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateLoanInput {
    pub isbn: String,
    pub customer_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoanListItem {
    pub id: String,
    pub customer_id: String,
    pub book_id: String,
    pub loan_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub returned: bool,
}

impl From<&Loan> for LoanListItem {
    fn from(loan: &Loan) -> Self {
        Self {
            id: loan.id().to_string(),
            customer_id: loan.customer_id().to_string(),
            book_id: loan.book_id().to_string(),
            loan_date: loan.loan_date(),
            return_date: loan.return_date(),
            returned: loan.is_returned(),
        }
    }
}

pub struct LoanService<L, B, C, K = SystemClock, I = UuidIdGenerator> {
    loans: L,
    books: B,
    customers: C,
    clock: K,
    ids: I,
}

impl<L: LoanGateway, B: BookGateway, C: CustomerGateway> LoanService<L, B, C> {
    pub fn new(loans: L, books: B, customers: C) -> Self {
        Self::with_runtime(loans, books, customers, SystemClock, UuidIdGenerator)
    }
}

impl<L, B, C, K, I> LoanService<L, B, C, K, I>
where
    L: LoanGateway,
    B: BookGateway,
    C: CustomerGateway,
    K: Clock,
    I: IdGenerator,
{
    pub fn with_runtime(loans: L, books: B, customers: C, clock: K, ids: I) -> Self {
        Self {
            loans,
            books,
            customers,
            clock,
            ids,
        }
    }

    /// Lends the book identified by `isbn` to a customer.
    ///
    /// Checks run in order: book exists, customer exists, book not on loan.
    ///
    /// # Errors
    /// - `NotFound` for an unknown isbn or customer.
    /// - `ValidationFailed("Invalid loan")` when the book is already on loan.
    pub fn create_loan(&self, input: &CreateLoanInput) -> ServiceResult<CreatedId> {
        let book = self
            .books
            .find_by_isbn(&input.isbn)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Book with ISBN {} was not found", input.isbn))
            })?;
        let customer = self
            .customers
            .find_by_id(&input.customer_id)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Customer with ID {} was not found",
                    input.customer_id
                ))
            })?;

        if self.loans.exists_by_book_id_and_not_returned(book.id())? {
            warn!(
                "event=loan_create module=service status=rejected reason=already_on_loan book_id={}",
                book.id()
            );
            return Err(ServiceError::ValidationFailed(ValidationError::single(
                "Invalid loan",
                format!("Book with ID {} is already on loan", book.id()),
            )));
        }

        let mut notification = Notification::new();
        let loan = notification.validate(|| {
            Loan::create(&self.ids, &self.clock, Some(customer.id()), Some(book.id()))
        });
        let loan = settle(loan, notification, "Invalid loan")?;

        let stored = self
            .loans
            .create(&loan)
            .map_err(conflict_as_validation("Invalid loan"))?;
        info!(
            "event=loan_create module=service status=ok loan_id={} book_id={}",
            stored.id(),
            stored.book_id()
        );
        Ok(CreatedId::from(stored.id()))
    }

    /// Marks a loan returned as of now.
    ///
    /// Returning an already returned loan stamps a new `return_date`.
    pub fn return_loan(&self, loan_id: &str) -> ServiceResult<LoanListItem> {
        let mut loan = self
            .loans
            .find_by_id(loan_id)?
            .ok_or_else(|| ServiceError::NotFound(format!("Loan with ID {loan_id} was not found")))?;

        if loan.is_returned() {
            warn!(
                "event=loan_return module=service status=already_returned loan_id={}",
                loan.id()
            );
        }
        loan.mark_returned(&self.clock);

        let stored = self.loans.update(&loan)?;
        info!(
            "event=loan_return module=service status=ok loan_id={}",
            stored.id()
        );
        Ok(LoanListItem::from(&stored))
    }

    /// Lists loans with optional isbn and customer filters (both must match).
    pub fn list_loans(&self, query: &LoanSearchQuery) -> ServiceResult<Page<LoanListItem>> {
        let page = self.loans.find_all(query)?;
        Ok(page.map(|loan| LoanListItem::from(&loan)))
    }
}
