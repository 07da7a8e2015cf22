//! Use-case services orchestrating entities and gateways.
//!
//! # Responsibility
//! - Run validation passes and translate outcomes into `ServiceError`.
//! - Keep gateways and runtime capabilities injectable for tests.
//!
//! # Invariants
//! - Services never touch SQL; every persistence call goes through a gateway.

use serde::Serialize;

pub mod book_service;
pub mod customer_service;
pub mod error;
pub mod late_loan_service;
pub mod loan_service;

pub use book_service::{BookDetails, BookInput, BookListItem, BookLoans, BookService};
pub use customer_service::{CustomerDetails, CustomerInput, CustomerService};
pub use error::{ServiceError, ServiceResult};
pub use late_loan_service::{late_cutoff, LateLoanReport, LateLoanService, LATE_AFTER_DAYS};
pub use loan_service::{CreateLoanInput, LoanListItem, LoanService};

/// Id of a newly created or updated entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedId {
    pub id: String,
}

impl From<&str> for CreatedId {
    fn from(id: &str) -> Self {
        Self { id: id.to_string() }
    }
}
