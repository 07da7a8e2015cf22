//! Gateway contracts and their persistence implementations.
//!
//! # Responsibility
//! - Define the persistence ports consumed by use-case services.
//! - Isolate SQLite query details from service orchestration.
//! - Provide in-memory implementations with the same uniqueness rules.
//!
//! # Invariants
//! - Every read rebuilds entities through their validating constructors.
//! - Storage-level uniqueness violations surface as `RepoError::Conflict`.

pub mod book_repo;
pub mod customer_repo;
pub mod error;
pub mod loan_repo;
pub mod memory;
pub mod page;

pub use book_repo::{BookGateway, SqliteBookGateway};
pub use customer_repo::{CustomerGateway, SqliteCustomerGateway};
pub use error::{RepoError, RepoResult};
pub use loan_repo::{LoanGateway, SqliteLoanGateway};
pub use memory::{InMemoryBookGateway, InMemoryCustomerGateway, InMemoryLoanGateway};
pub use page::{LoanSearchQuery, Page, SearchQuery};
