//! Library domain model.
//!
//! # Responsibility
//! - Define the Book, Customer and Loan aggregates.
//! - Enforce field invariants at construction and mutation.
//!
//! # Invariants
//! - Aggregates reference each other by id string only.
//! - Ids and timestamps come from injected `IdGenerator`/`Clock` values.

pub mod book;
pub mod customer;
pub mod loan;
pub mod runtime;
