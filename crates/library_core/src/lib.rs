//! Core domain logic for the library loan backend.
//! This crate is the single source of truth for lending invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod mail;
pub mod model;
pub mod repo;
pub mod service;
pub mod validation;

pub use config::{ConfigError, LibraryConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use mail::{EmailGateway, MailError, RecordingMailer, SqliteOutboxMailer};
pub use model::book::Book;
pub use model::customer::Customer;
pub use model::loan::Loan;
pub use model::runtime::{
    Clock, FixedClock, IdGenerator, SequentialIdGenerator, SystemClock, UuidIdGenerator,
};
pub use repo::{
    BookGateway, CustomerGateway, InMemoryBookGateway, InMemoryCustomerGateway,
    InMemoryLoanGateway, LoanGateway, LoanSearchQuery, Page, RepoError, RepoResult,
    SearchQuery, SqliteBookGateway, SqliteCustomerGateway, SqliteLoanGateway,
};
pub use service::{
    BookService, CreatedId, CustomerService, LateLoanService, LoanService, ServiceError,
    ServiceResult,
};
pub use validation::{FieldError, Notification, ValidationError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
