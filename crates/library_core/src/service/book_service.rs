//! Book use cases.
//!
//! # Responsibility
//! - Create, update, delete, read and list books.
//! - Enforce isbn uniqueness before construction.
//!
//! # Invariants
//! - A duplicate isbn is reported before field validation runs, and no book
//!   is constructed or persisted.
//! - A rejected update leaves the stored book untouched.

use crate::model::book::Book;
use crate::model::runtime::{IdGenerator, UuidIdGenerator};
use crate::repo::book_repo::BookGateway;
use crate::repo::page::{Page, SearchQuery};
use crate::service::error::{conflict_as_validation, settle, ServiceError, ServiceResult};
use crate::service::CreatedId;
use crate::validation::{FieldError, Notification};
use log::{debug, info};
use serde::Serialize;

/// Writable book fields. Absent values fail validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookInput {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookDetails {
    pub id: String,
    pub title: String,
    pub author: String,
    pub isbn: String,
}

pub type BookListItem = BookDetails;

impl From<&Book> for BookDetails {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id().to_string(),
            title: book.title().to_string(),
            author: book.author().to_string(),
            isbn: book.isbn().to_string(),
        }
    }
}

/// A book together with the ids of every loan recorded against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookLoans {
    pub id: String,
    pub title: String,
    pub author: String,
    pub loans: Vec<String>,
}

pub struct BookService<B, I = UuidIdGenerator> {
    books: B,
    ids: I,
}

impl<B: BookGateway> BookService<B> {
    pub fn new(books: B) -> Self {
        Self::with_ids(books, UuidIdGenerator)
    }
}

impl<B: BookGateway, I: IdGenerator> BookService<B, I> {
    pub fn with_ids(books: B, ids: I) -> Self {
        Self { books, ids }
    }

    /// Registers a new book.
    ///
    /// # Errors
    /// - `ValidationFailed("Invalid book")` for a taken isbn or invalid fields.
    pub fn create_book(&self, input: &BookInput) -> ServiceResult<CreatedId> {
        let mut notification = Notification::new();
        if let Some(isbn) = input.isbn.as_deref() {
            if self.books.exists_by_isbn(isbn)? {
                notification.append(FieldError::new(format!(
                    "Already exists a book with isbn {isbn}"
                )));
            }
        }
        notification.check("Invalid book")?;

        let book = notification.validate(|| {
            Book::create(
                &self.ids,
                input.title.as_deref(),
                input.author.as_deref(),
                input.isbn.as_deref(),
            )
        });
        let book = settle(book, notification, "Invalid book")?;

        let stored = self
            .books
            .create(&book)
            .map_err(conflict_as_validation("Invalid book"))?;
        info!(
            "event=book_create module=service status=ok book_id={}",
            stored.id()
        );
        Ok(CreatedId::from(stored.id()))
    }

    /// Replaces title, author and isbn of an existing book.
    ///
    /// # Errors
    /// - `NotFound` when `id` is unknown.
    /// - `ValidationFailed("Could not update Book {id}")` for invalid fields or
    ///   an isbn owned by another book.
    pub fn update_book(&self, id: &str, input: &BookInput) -> ServiceResult<CreatedId> {
        let mut book = self
            .books
            .find_by_id(id)?
            .ok_or_else(|| book_not_found(id))?;

        let headline = format!("Could not update Book {id}");
        let mut notification = Notification::new();
        let updated = notification.validate(|| {
            book.update(
                input.title.as_deref(),
                input.author.as_deref(),
                input.isbn.as_deref(),
            )
        });
        settle(updated, notification, &headline)?;

        let stored = self
            .books
            .update(&book)
            .map_err(conflict_as_validation(&headline))?;
        debug!(
            "event=book_update module=service status=ok book_id={}",
            stored.id()
        );
        Ok(CreatedId::from(stored.id()))
    }

    /// Deletes a book. Unknown ids succeed without touching storage.
    pub fn delete_book(&self, id: &str) -> ServiceResult<()> {
        self.books.delete_by_id(id)?;
        Ok(())
    }

    pub fn get_book(&self, id: &str) -> ServiceResult<BookDetails> {
        let book = self
            .books
            .find_by_id(id)?
            .ok_or_else(|| book_not_found(id))?;
        Ok(BookDetails::from(&book))
    }

    /// Lists books matching `query`.
    ///
    /// # Errors
    /// - `ValidationFailed("Invalid search query")` for an unknown sort field
    ///   or direction.
    pub fn list_books(&self, query: &SearchQuery) -> ServiceResult<Page<BookListItem>> {
        let page = self.books.find_all(query)?;
        Ok(page.map(|book| BookListItem::from(&book)))
    }

    /// Returns a book with its loan history.
    pub fn get_book_loans(&self, id: &str) -> ServiceResult<BookLoans> {
        let book = self
            .books
            .find_by_id(id)?
            .ok_or_else(|| book_not_found(id))?;
        Ok(BookLoans {
            id: book.id().to_string(),
            title: book.title().to_string(),
            author: book.author().to_string(),
            loans: book.loans().to_vec(),
        })
    }
}

fn book_not_found(id: &str) -> ServiceError {
    ServiceError::NotFound(format!("Book with ID {id} was not found"))
}
