use library_core::service::{BookInput, CustomerInput};
use library_core::{
    Book, BookGateway, BookService, CustomerService, InMemoryBookGateway,
    InMemoryCustomerGateway, SearchQuery, SequentialIdGenerator, ServiceError,
};

fn input(title: Option<&str>, author: Option<&str>, isbn: Option<&str>) -> BookInput {
    BookInput {
        title: title.map(str::to_string),
        author: author.map(str::to_string),
        isbn: isbn.map(str::to_string),
    }
}

fn seeded(books: &InMemoryBookGateway, title: &str, isbn: &str) -> Book {
    let ids = SequentialIdGenerator::starting_at(1000 + books.len() as u64);
    let book = Book::create(&ids, Some(title), Some("Author"), Some(isbn)).unwrap();
    books.insert(book.clone());
    book
}

fn error_messages(err: &ServiceError) -> Vec<String> {
    err.errors()
        .iter()
        .map(|error| error.message.clone())
        .collect()
}

#[test]
fn create_book_persists_and_returns_generated_id() {
    let books = InMemoryBookGateway::new();
    let service = BookService::with_ids(&books, SequentialIdGenerator::new());

    let created = service
        .create_book(&input(Some("Dune"), Some("Herbert"), Some("111")))
        .unwrap();

    assert_eq!(created.id, format!("{:032x}", 1));
    assert_eq!(books.create_calls(), 1);
    let stored = books.find_by_id(&created.id).unwrap().unwrap();
    assert_eq!(stored.title(), "Dune");
}

#[test]
fn duplicate_isbn_fails_before_construction_and_persistence() {
    let books = InMemoryBookGateway::new();
    seeded(&books, "Dune", "111");
    let service = BookService::with_ids(&books, SequentialIdGenerator::new());

    let err = service
        .create_book(&input(None, None, Some("111")))
        .unwrap_err();

    match &err {
        ServiceError::ValidationFailed(inner) => assert_eq!(inner.message(), "Invalid book"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        error_messages(&err),
        vec!["Already exists a book with isbn 111".to_string()]
    );
    assert_eq!(books.create_calls(), 0);
    assert_eq!(books.len(), 1);
}

#[test]
fn create_book_reports_every_blank_field() {
    let books = InMemoryBookGateway::new();
    let service = BookService::new(&books);

    let err = service.create_book(&input(Some(""), None, None)).unwrap_err();

    assert!(err.is_recoverable());
    assert_eq!(
        error_messages(&err),
        vec![
            "'title' should not be empty".to_string(),
            "'author' should not be empty".to_string(),
            "'isbn' should not be empty".to_string(),
        ]
    );
    assert_eq!(books.create_calls(), 0);
}

#[test]
fn update_book_replaces_fields() {
    let books = InMemoryBookGateway::new();
    let book = seeded(&books, "Dune", "111");
    let service = BookService::new(&books);

    let updated = service
        .update_book(book.id(), &input(Some("Dune Messiah"), Some("Herbert"), Some("112")))
        .unwrap();

    assert_eq!(updated.id, book.id());
    let details = service.get_book(book.id()).unwrap();
    assert_eq!(details.title, "Dune Messiah");
    assert_eq!(details.isbn, "112");
    assert_eq!(books.update_calls(), 1);
}

#[test]
fn update_book_with_invalid_fields_is_rejected_without_persisting() {
    let books = InMemoryBookGateway::new();
    let book = seeded(&books, "Dune", "111");
    let service = BookService::new(&books);

    let err = service
        .update_book(book.id(), &input(Some("Dune"), Some(" "), Some("111")))
        .unwrap_err();

    match &err {
        ServiceError::ValidationFailed(inner) => {
            assert_eq!(inner.message(), format!("Could not update Book {}", book.id()));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        error_messages(&err),
        vec!["'author' should not be empty".to_string()]
    );
    assert_eq!(books.update_calls(), 0);
    assert_eq!(service.get_book(book.id()).unwrap().author, "Author");
}

#[test]
fn update_book_to_taken_isbn_is_a_validation_failure() {
    let books = InMemoryBookGateway::new();
    seeded(&books, "Dune", "111");
    let emma = seeded(&books, "Emma", "222");
    let service = BookService::new(&books);

    let err = service
        .update_book(emma.id(), &input(Some("Emma"), Some("Austen"), Some("111")))
        .unwrap_err();

    assert!(matches!(err, ServiceError::ValidationFailed(_)));
    assert_eq!(
        error_messages(&err),
        vec!["Already exists a book with isbn 111".to_string()]
    );
    assert_eq!(service.get_book(emma.id()).unwrap().isbn, "222");
}

#[test]
fn update_missing_book_is_not_found() {
    let books = InMemoryBookGateway::new();
    let service = BookService::new(&books);

    let err = service
        .update_book("missing", &input(Some("a"), Some("b"), Some("c")))
        .unwrap_err();

    match err {
        ServiceError::NotFound(message) => {
            assert_eq!(message, "Book with ID missing was not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn delete_absent_book_issues_no_delete() {
    let books = InMemoryBookGateway::new();
    let service = BookService::new(&books);

    service.delete_book("missing").unwrap();

    assert_eq!(books.delete_calls(), 0);
}

#[test]
fn delete_present_book_issues_exactly_one_delete() {
    let books = InMemoryBookGateway::new();
    let book = seeded(&books, "Dune", "111");
    let service = BookService::new(&books);

    service.delete_book(book.id()).unwrap();

    assert_eq!(books.delete_calls(), 1);
    assert!(matches!(
        service.get_book(book.id()),
        Err(ServiceError::NotFound(_))
    ));
}

#[test]
fn list_books_filters_sorts_and_pages() {
    let books = InMemoryBookGateway::new();
    seeded(&books, "Dune", "111");
    seeded(&books, "Emma", "222");
    seeded(&books, "Dracula", "333");
    let service = BookService::new(&books);

    let page = service
        .list_books(&SearchQuery {
            terms: Some("d".to_string()),
            direction: "desc".to_string(),
            per_page: 1,
            ..SearchQuery::default()
        })
        .unwrap();

    assert_eq!(page.total, 2);
    assert_eq!(page.per_page, 1);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].title, "Dune");
}

#[test]
fn list_books_matches_accented_terms_in_any_case() {
    let books = InMemoryBookGateway::new();
    seeded(&books, "ÉMILE ZOLA: GERMINAL", "111");
    seeded(&books, "Emma", "222");
    let service = BookService::new(&books);

    let page = service
        .list_books(&SearchQuery {
            terms: Some("émile".to_string()),
            ..SearchQuery::default()
        })
        .unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].isbn, "111");
}

#[test]
fn list_books_with_unknown_sort_is_invalid_search_query() {
    let books = InMemoryBookGateway::new();
    let service = BookService::new(&books);

    let err = service
        .list_books(&SearchQuery {
            sort: "shelf".to_string(),
            ..SearchQuery::default()
        })
        .unwrap_err();

    match err {
        ServiceError::ValidationFailed(inner) => {
            assert_eq!(inner.message(), "Invalid search query");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn get_book_loans_exposes_backreference() {
    let books = InMemoryBookGateway::new();
    let ids = SequentialIdGenerator::new();
    let mut book = Book::create(&ids, Some("Dune"), Some("Herbert"), Some("111")).unwrap();
    book.add_loan("loan-1");
    book.add_loan("loan-2");
    books.insert(book.clone());
    let service = BookService::new(&books);

    let loans = service.get_book_loans(book.id()).unwrap();

    assert_eq!(loans.title, "Dune");
    assert_eq!(loans.loans, vec!["loan-1".to_string(), "loan-2".to_string()]);
    assert!(matches!(
        service.get_book_loans("missing"),
        Err(ServiceError::NotFound(_))
    ));
}

#[test]
fn book_details_serialize_with_snake_case_fields() {
    let books = InMemoryBookGateway::new();
    let book = seeded(&books, "Dune", "111");
    let service = BookService::new(&books);

    let value = serde_json::to_value(service.get_book(book.id()).unwrap()).unwrap();

    assert_eq!(value["id"], book.id());
    assert_eq!(value["title"], "Dune");
    assert_eq!(value["isbn"], "111");
}

#[test]
fn create_customer_validates_and_persists() {
    let customers = InMemoryCustomerGateway::new();
    let service = CustomerService::with_ids(&customers, SequentialIdGenerator::new());

    let err = service
        .create_customer(&CustomerInput {
            name: Some("Ada".to_string()),
            email: Some("ada".to_string()),
        })
        .unwrap_err();
    match &err {
        ServiceError::ValidationFailed(inner) => assert_eq!(inner.message(), "Invalid customer"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(customers.create_calls(), 0);

    let created = service
        .create_customer(&CustomerInput {
            name: Some("Ada".to_string()),
            email: Some("ada@example.com".to_string()),
        })
        .unwrap();
    let details = service.get_customer(&created.id).unwrap();
    assert_eq!(details.name, "Ada");
    assert_eq!(details.email, "ada@example.com");
}

#[test]
fn get_missing_customer_is_not_found() {
    let customers = InMemoryCustomerGateway::new();
    let service = CustomerService::new(&customers);

    match service.get_customer("nobody").unwrap_err() {
        ServiceError::NotFound(message) => {
            assert_eq!(message, "Customer with ID nobody was not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
