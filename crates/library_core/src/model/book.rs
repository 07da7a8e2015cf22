//! Book aggregate.
//!
//! # Invariants
//! - `id`, `title`, `author` and `isbn` are non-blank after construction and
//!   after every successful `update`.
//! - A failed `update` leaves the book untouched.
//! - `loans` is an informational backreference filled by persistence.

use crate::model::runtime::IdGenerator;
use crate::validation::{require_not_blank, Notification, ValidationError};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Book {
    id: String,
    title: String,
    author: String,
    isbn: String,
    loans: Vec<String>,
}

impl Book {
    /// Creates a new book with a generated id.
    pub fn create(
        ids: &dyn IdGenerator,
        title: Option<&str>,
        author: Option<&str>,
        isbn: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let id = ids.next_id();
        Self::checked(Some(id.as_str()), title, author, isbn, Vec::new())
    }

    /// Rebuilds a stored book, running the same validation as `create`.
    pub fn restore(
        id: &str,
        title: &str,
        author: &str,
        isbn: &str,
        loans: Vec<String>,
    ) -> Result<Self, ValidationError> {
        Self::checked(Some(id), Some(title), Some(author), Some(isbn), loans)
    }

    /// Replaces title, author and isbn.
    ///
    /// The staged values are validated before anything is assigned.
    pub fn update(
        &mut self,
        title: Option<&str>,
        author: Option<&str>,
        isbn: Option<&str>,
    ) -> Result<(), ValidationError> {
        let mut notification = Notification::new();
        check_fields(&mut notification, Some(&self.id), title, author, isbn);
        notification.into_result("Failed to update a Book")?;

        self.title = title.unwrap_or_default().to_string();
        self.author = author.unwrap_or_default().to_string();
        self.isbn = isbn.unwrap_or_default().to_string();
        Ok(())
    }

    pub fn add_loan(&mut self, loan_id: impl Into<String>) {
        self.loans.push(loan_id.into());
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn isbn(&self) -> &str {
        &self.isbn
    }

    pub fn loans(&self) -> &[String] {
        &self.loans
    }

    fn checked(
        id: Option<&str>,
        title: Option<&str>,
        author: Option<&str>,
        isbn: Option<&str>,
        loans: Vec<String>,
    ) -> Result<Self, ValidationError> {
        let mut notification = Notification::new();
        check_fields(&mut notification, id, title, author, isbn);
        notification.into_result("Failed to create a Book")?;

        Ok(Self {
            id: id.unwrap_or_default().to_string(),
            title: title.unwrap_or_default().to_string(),
            author: author.unwrap_or_default().to_string(),
            isbn: isbn.unwrap_or_default().to_string(),
            loans,
        })
    }
}

fn check_fields(
    notification: &mut Notification,
    id: Option<&str>,
    title: Option<&str>,
    author: Option<&str>,
    isbn: Option<&str>,
) {
    require_not_blank(notification, "id", id);
    require_not_blank(notification, "title", title);
    require_not_blank(notification, "author", author);
    require_not_blank(notification, "isbn", isbn);
}
