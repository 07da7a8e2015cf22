//! In-memory gateway implementations.
//!
//! # Responsibility
//! - Back services in tests and dry runs without a database.
//! - Count write calls so callers can assert what reached persistence.
//!
//! # Invariants
//! - Uniqueness rules match the SQLite adapters: unique isbn, one open loan
//!   per book.
//! - Seeding (`insert`) never touches the call counters.

use crate::model::book::Book;
use crate::model::customer::Customer;
use crate::model::loan::Loan;
use crate::repo::book_repo::BookGateway;
use crate::repo::customer_repo::CustomerGateway;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::loan_repo::LoanGateway;
use crate::repo::page::{
    active_filter, normalize_per_page, page_offset, BookSortField, LoanSearchQuery,
    LoanSortField, Page, SearchQuery, SortDirection,
};
use chrono::NaiveDate;
use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct InMemoryBookGateway {
    books: RefCell<Vec<Book>>,
    create_calls: Cell<usize>,
    update_calls: Cell<usize>,
    delete_calls: Cell<usize>,
}

impl InMemoryBookGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a book without counting it as a `create` call.
    pub fn insert(&self, book: Book) {
        self.books.borrow_mut().push(book);
    }

    pub fn len(&self) -> usize {
        self.books.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.borrow().is_empty()
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.get()
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.get()
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.get()
    }

    fn isbn_taken_by_other(&self, book: &Book) -> bool {
        self.books
            .borrow()
            .iter()
            .any(|stored| stored.isbn() == book.isbn() && stored.id() != book.id())
    }
}

impl BookGateway for InMemoryBookGateway {
    fn create(&self, book: &Book) -> RepoResult<Book> {
        self.create_calls.set(self.create_calls.get() + 1);
        if self.books.borrow().iter().any(|stored| stored.id() == book.id()) {
            return Err(RepoError::Conflict(format!(
                "book `{}` already exists",
                book.id()
            )));
        }
        if self.isbn_taken_by_other(book) {
            return Err(isbn_conflict(book));
        }
        self.books.borrow_mut().push(book.clone());
        Ok(book.clone())
    }

    fn update(&self, book: &Book) -> RepoResult<Book> {
        self.update_calls.set(self.update_calls.get() + 1);
        if self.isbn_taken_by_other(book) {
            return Err(isbn_conflict(book));
        }
        let mut books = self.books.borrow_mut();
        let stored = books
            .iter_mut()
            .find(|stored| stored.id() == book.id())
            .ok_or_else(|| RepoError::NotFound(book.id().to_string()))?;
        *stored = book.clone();
        Ok(book.clone())
    }

    fn find_by_id(&self, id: &str) -> RepoResult<Option<Book>> {
        Ok(self
            .books
            .borrow()
            .iter()
            .find(|book| book.id() == id)
            .cloned())
    }

    fn exists_by_isbn(&self, isbn: &str) -> RepoResult<bool> {
        Ok(self.books.borrow().iter().any(|book| book.isbn() == isbn))
    }

    fn delete_by_id(&self, id: &str) -> RepoResult<()> {
        let mut books = self.books.borrow_mut();
        if let Some(index) = books.iter().position(|book| book.id() == id) {
            self.delete_calls.set(self.delete_calls.get() + 1);
            books.remove(index);
        }
        Ok(())
    }

    fn find_all(&self, query: &SearchQuery) -> RepoResult<Page<Book>> {
        let sort = BookSortField::parse(&query.sort)?;
        let direction = SortDirection::parse(&query.direction)?;
        let terms = active_filter(query.terms.as_deref()).map(str::to_lowercase);

        let mut matches: Vec<Book> = self
            .books
            .borrow()
            .iter()
            .filter(|book| match &terms {
                Some(terms) => [book.title(), book.author(), book.isbn()]
                    .iter()
                    .any(|value| value.to_lowercase().contains(terms.as_str())),
                None => true,
            })
            .cloned()
            .collect();

        matches.sort_by(|left, right| {
            let ordering = match sort {
                BookSortField::Id => left.id().cmp(right.id()),
                BookSortField::Title => left.title().cmp(right.title()),
                BookSortField::Author => left.author().cmp(right.author()),
                BookSortField::Isbn => left.isbn().cmp(right.isbn()),
            };
            directed(ordering, direction).then_with(|| left.id().cmp(right.id()))
        });

        Ok(paginate(matches, query.page, query.per_page))
    }

    fn find_by_isbn(&self, isbn: &str) -> RepoResult<Option<Book>> {
        Ok(self
            .books
            .borrow()
            .iter()
            .find(|book| book.isbn() == isbn)
            .cloned())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCustomerGateway {
    customers: RefCell<Vec<Customer>>,
    create_calls: Cell<usize>,
}

impl InMemoryCustomerGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a customer without counting it as a `create` call.
    pub fn insert(&self, customer: Customer) {
        self.customers.borrow_mut().push(customer);
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.get()
    }
}

impl CustomerGateway for InMemoryCustomerGateway {
    fn create(&self, customer: &Customer) -> RepoResult<Customer> {
        self.create_calls.set(self.create_calls.get() + 1);
        if self
            .customers
            .borrow()
            .iter()
            .any(|stored| stored.id() == customer.id())
        {
            return Err(RepoError::Conflict(format!(
                "customer `{}` already exists",
                customer.id()
            )));
        }
        self.customers.borrow_mut().push(customer.clone());
        Ok(customer.clone())
    }

    fn find_by_id(&self, id: &str) -> RepoResult<Option<Customer>> {
        Ok(self
            .customers
            .borrow()
            .iter()
            .find(|customer| customer.id() == id)
            .cloned())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryLoanGateway {
    loans: RefCell<Vec<Loan>>,
    isbn_by_book: RefCell<HashMap<String, String>>,
    create_calls: Cell<usize>,
    update_calls: Cell<usize>,
}

impl InMemoryLoanGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a loan without counting it as a `create` call.
    pub fn insert(&self, loan: Loan) {
        self.loans.borrow_mut().push(loan);
    }

    /// Makes `book` visible to the isbn filter of `find_all`.
    ///
    /// An isbn-filtered `find_all` fails with `InvalidData` when it meets a
    /// loan whose book was never registered.
    pub fn register_book(&self, book: &Book) {
        self.isbn_by_book
            .borrow_mut()
            .insert(book.id().to_string(), book.isbn().to_string());
    }

    pub fn loans(&self) -> Vec<Loan> {
        self.loans.borrow().clone()
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.get()
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.get()
    }

    fn open_loan_conflict(&self, loan: &Loan) -> bool {
        !loan.is_returned()
            && self.loans.borrow().iter().any(|stored| {
                stored.book_id() == loan.book_id()
                    && !stored.is_returned()
                    && stored.id() != loan.id()
            })
    }
}

impl LoanGateway for InMemoryLoanGateway {
    fn create(&self, loan: &Loan) -> RepoResult<Loan> {
        self.create_calls.set(self.create_calls.get() + 1);
        if self.loans.borrow().iter().any(|stored| stored.id() == loan.id()) {
            return Err(RepoError::Conflict(format!(
                "loan `{}` already exists",
                loan.id()
            )));
        }
        if self.open_loan_conflict(loan) {
            return Err(open_loan_error(loan));
        }
        self.loans.borrow_mut().push(loan.clone());
        Ok(loan.clone())
    }

    fn update(&self, loan: &Loan) -> RepoResult<Loan> {
        self.update_calls.set(self.update_calls.get() + 1);
        if self.open_loan_conflict(loan) {
            return Err(open_loan_error(loan));
        }
        let mut loans = self.loans.borrow_mut();
        let stored = loans
            .iter_mut()
            .find(|stored| stored.id() == loan.id())
            .ok_or_else(|| RepoError::NotFound(loan.id().to_string()))?;
        *stored = loan.clone();
        Ok(loan.clone())
    }

    fn find_by_id(&self, id: &str) -> RepoResult<Option<Loan>> {
        Ok(self
            .loans
            .borrow()
            .iter()
            .find(|loan| loan.id() == id)
            .cloned())
    }

    fn exists_by_book_id_and_not_returned(&self, book_id: &str) -> RepoResult<bool> {
        Ok(self
            .loans
            .borrow()
            .iter()
            .any(|loan| loan.book_id() == book_id && !loan.is_returned()))
    }

    fn find_all(&self, query: &LoanSearchQuery) -> RepoResult<Page<Loan>> {
        let sort = LoanSortField::parse(&query.sort)?;
        let direction = SortDirection::parse(&query.direction)?;
        let isbn = active_filter(query.isbn.as_deref());
        let customer_id = active_filter(query.customer_id.as_deref());
        let isbn_by_book = self.isbn_by_book.borrow();

        let mut matches: Vec<Loan> = Vec::new();
        for loan in self.loans.borrow().iter() {
            if let Some(isbn) = isbn {
                let book_isbn = isbn_by_book.get(loan.book_id()).ok_or_else(|| {
                    RepoError::InvalidData(format!(
                        "loan `{}` references book `{}` that was never passed to register_book",
                        loan.id(),
                        loan.book_id()
                    ))
                })?;
                if book_isbn.as_str() != isbn {
                    continue;
                }
            }
            if customer_id.is_some_and(|id| loan.customer_id() != id) {
                continue;
            }
            matches.push(loan.clone());
        }

        matches.sort_by(|left, right| {
            let ordering = match sort {
                LoanSortField::Id => left.id().cmp(right.id()),
                LoanSortField::LoanDate => left.loan_date().cmp(&right.loan_date()),
                LoanSortField::ReturnDate => left.return_date().cmp(&right.return_date()),
                LoanSortField::Returned => left.is_returned().cmp(&right.is_returned()),
                LoanSortField::CustomerId => left.customer_id().cmp(right.customer_id()),
                LoanSortField::BookId => left.book_id().cmp(right.book_id()),
            };
            directed(ordering, direction).then_with(|| left.id().cmp(right.id()))
        });

        Ok(paginate(matches, query.page, query.per_page))
    }

    fn find_all_late_loans(&self, cutoff: NaiveDate) -> RepoResult<Vec<Loan>> {
        let mut late: Vec<Loan> = self
            .loans
            .borrow()
            .iter()
            .filter(|loan| loan.is_late(cutoff))
            .cloned()
            .collect();
        late.sort_by(|left, right| {
            left.loan_date()
                .cmp(&right.loan_date())
                .then_with(|| left.id().cmp(right.id()))
        });
        Ok(late)
    }
}

fn isbn_conflict(book: &Book) -> RepoError {
    RepoError::Conflict(format!("Already exists a book with isbn {}", book.isbn()))
}

fn open_loan_error(loan: &Loan) -> RepoError {
    RepoError::Conflict(format!(
        "Book with ID {} is already on loan",
        loan.book_id()
    ))
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

fn paginate<T>(items: Vec<T>, page: u32, per_page: u32) -> Page<T> {
    let per_page = normalize_per_page(per_page);
    let total = items.len() as u64;
    let offset = usize::try_from(page_offset(page, per_page)).unwrap_or(usize::MAX);
    Page {
        current_page: page,
        per_page,
        total,
        items: items
            .into_iter()
            .skip(offset)
            .take(per_page as usize)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::{InMemoryBookGateway, InMemoryLoanGateway};
    use crate::model::book::Book;
    use crate::model::loan::Loan;
    use crate::model::runtime::{FixedClock, SequentialIdGenerator};
    use crate::repo::book_repo::BookGateway;
    use crate::repo::error::RepoError;
    use crate::repo::loan_repo::LoanGateway;
    use crate::repo::page::{LoanSearchQuery, SearchQuery};
    use chrono::{TimeZone, Utc};

    fn book(ids: &SequentialIdGenerator, title: &str, isbn: &str) -> Book {
        Book::create(ids, Some(title), Some("Author"), Some(isbn)).unwrap()
    }

    #[test]
    fn delete_counts_only_existing_rows() {
        let ids = SequentialIdGenerator::new();
        let gateway = InMemoryBookGateway::new();
        let stored = book(&ids, "Dune", "111");
        gateway.insert(stored.clone());

        gateway.delete_by_id("missing").unwrap();
        assert_eq!(gateway.delete_calls(), 0);

        gateway.delete_by_id(stored.id()).unwrap();
        gateway.delete_by_id(stored.id()).unwrap();
        assert_eq!(gateway.delete_calls(), 1);
        assert!(gateway.is_empty());
    }

    #[test]
    fn update_rejects_isbn_owned_by_another_book() {
        let ids = SequentialIdGenerator::new();
        let gateway = InMemoryBookGateway::new();
        gateway.insert(book(&ids, "Dune", "111"));
        let mut second = book(&ids, "Emma", "222");
        gateway.insert(second.clone());

        second.update(Some("Emma"), Some("Austen"), Some("111")).unwrap();
        let err = gateway.update(&second).unwrap_err();
        assert!(matches!(err, RepoError::Conflict(message) if message.contains("111")));
    }

    #[test]
    fn find_all_pages_after_filtering() {
        let ids = SequentialIdGenerator::new();
        let gateway = InMemoryBookGateway::new();
        for (title, isbn) in [("Alpha", "1"), ("Beta", "2"), ("Gamma", "3"), ("alphabet", "4")] {
            gateway.insert(book(&ids, title, isbn));
        }

        let page = gateway
            .find_all(&SearchQuery {
                per_page: 1,
                page: 1,
                terms: Some("ALPHA".to_string()),
                ..SearchQuery::default()
            })
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].title(), "alphabet");
    }

    #[test]
    fn second_open_loan_for_same_book_conflicts() {
        let ids = SequentialIdGenerator::new();
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
        let gateway = InMemoryLoanGateway::new();

        let first = Loan::create(&ids, &clock, Some("c1"), Some("b1")).unwrap();
        gateway.create(&first).unwrap();
        let second = Loan::create(&ids, &clock, Some("c2"), Some("b1")).unwrap();
        let err = gateway.create(&second).unwrap_err();

        assert!(matches!(err, RepoError::Conflict(message) if message.contains("already on loan")));
        assert_eq!(gateway.create_calls(), 2);
        assert_eq!(gateway.loans().len(), 1);
    }

    #[test]
    fn isbn_filter_rejects_loans_of_unregistered_books() {
        let ids = SequentialIdGenerator::new();
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
        let gateway = InMemoryLoanGateway::new();
        let dune = book(&ids, "Dune", "111");
        gateway.register_book(&dune);
        gateway.insert(Loan::create(&ids, &clock, Some("c1"), Some(dune.id())).unwrap());
        gateway.insert(Loan::create(&ids, &clock, Some("c1"), Some("unregistered")).unwrap());

        let unfiltered = gateway.find_all(&LoanSearchQuery::default()).unwrap();
        assert_eq!(unfiltered.total, 2);

        let err = gateway
            .find_all(&LoanSearchQuery {
                isbn: Some("111".to_string()),
                ..LoanSearchQuery::default()
            })
            .unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(message) if message.contains("unregistered")));
    }
}
