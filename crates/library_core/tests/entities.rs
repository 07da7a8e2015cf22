use chrono::{Duration, NaiveDate, TimeZone, Utc};
use library_core::{Book, Customer, FixedClock, Loan, SequentialIdGenerator, ValidationError};

fn messages(err: &ValidationError) -> Vec<&str> {
    err.errors()
        .iter()
        .map(|error| error.message.as_str())
        .collect()
}

#[test]
fn book_lists_one_error_per_blank_field_in_declaration_order() {
    let ids = SequentialIdGenerator::new();

    let err = Book::create(&ids, None, Some(""), Some("   ")).unwrap_err();

    assert_eq!(err.message(), "Failed to create a Book");
    assert_eq!(
        messages(&err),
        vec![
            "'title' should not be empty",
            "'author' should not be empty",
            "'isbn' should not be empty",
        ]
    );
}

#[test]
fn restored_book_with_blank_id_reports_id_first() {
    let err = Book::restore("", "Dune", "", "111", Vec::new()).unwrap_err();
    assert_eq!(
        messages(&err),
        vec!["'id' should not be empty", "'author' should not be empty"]
    );
}

#[test]
fn book_round_trips_inputs_and_generates_id() {
    let ids = SequentialIdGenerator::new();

    let book = Book::create(&ids, Some("Dune"), Some("Herbert"), Some("111")).unwrap();

    assert!(!book.id().is_empty());
    assert_eq!(book.title(), "Dune");
    assert_eq!(book.author(), "Herbert");
    assert_eq!(book.isbn(), "111");
    assert!(book.loans().is_empty());
}

#[test]
fn failed_book_update_leaves_prior_state_intact() {
    let ids = SequentialIdGenerator::new();
    let mut book = Book::create(&ids, Some("Dune"), Some("Herbert"), Some("111")).unwrap();
    let before = book.clone();

    let err = book.update(Some("Dune Messiah"), None, Some("222")).unwrap_err();

    assert_eq!(err.message(), "Failed to update a Book");
    assert_eq!(messages(&err), vec!["'author' should not be empty"]);
    assert_eq!(book, before);

    book.update(Some("Dune Messiah"), Some("Herbert"), Some("222"))
        .unwrap();
    assert_eq!(book.title(), "Dune Messiah");
    assert_eq!(book.isbn(), "222");
    assert_eq!(book.id(), before.id());
}

#[test]
fn customer_requires_name_and_well_formed_email() {
    let ids = SequentialIdGenerator::new();

    let err = Customer::create(&ids, Some(" "), Some("not-an-email")).unwrap_err();
    assert_eq!(err.message(), "Failed to create a Customer");
    assert_eq!(
        messages(&err),
        vec![
            "'name' should not be empty",
            "'email' should have a valid format",
        ]
    );

    let err = Customer::create(&ids, Some("Ada"), None).unwrap_err();
    assert_eq!(messages(&err), vec!["'email' should have a valid format"]);
}

#[test]
fn customer_round_trips_inputs() {
    let ids = SequentialIdGenerator::new();
    let customer = Customer::create(&ids, Some("Ada"), Some("ada@example.com")).unwrap();

    assert!(!customer.id().is_empty());
    assert_eq!(customer.name(), "Ada");
    assert_eq!(customer.email(), "ada@example.com");
}

#[test]
fn loan_lists_blank_references() {
    let ids = SequentialIdGenerator::new();
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());

    let err = Loan::create(&ids, &clock, None, Some("")).unwrap_err();

    assert_eq!(err.message(), "Failed to create a Loan");
    assert_eq!(
        messages(&err),
        vec!["'customerId' should not be empty", "'bookId' should not be empty"]
    );
}

#[test]
fn loan_starts_open_and_return_stamps_clock_time() {
    let ids = SequentialIdGenerator::new();
    let opened_at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let clock = FixedClock::new(opened_at);

    let mut loan = Loan::create(&ids, &clock, Some("c1"), Some("b1")).unwrap();
    assert_eq!(loan.loan_date(), opened_at);
    assert!(!loan.is_returned());
    assert_eq!(loan.return_date(), None);

    clock.advance(Duration::days(2));
    loan.mark_returned(&clock);
    assert!(loan.is_returned());
    assert_eq!(loan.return_date(), Some(opened_at + Duration::days(2)));
    assert_eq!(loan.loan_date(), opened_at);

    clock.advance(Duration::hours(1));
    loan.mark_returned(&clock);
    assert_eq!(
        loan.return_date(),
        Some(opened_at + Duration::days(2) + Duration::hours(1))
    );
}

#[test]
fn lateness_is_bounded_by_start_of_cutoff_day() {
    let ids = SequentialIdGenerator::new();
    let cutoff = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 6, 0, 0, 0).unwrap());
    let mut at_bound = Loan::create(&ids, &clock, Some("c1"), Some("b1")).unwrap();
    let later_same_day = Loan::create(
        &ids,
        &FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 6, 0, 0, 1).unwrap()),
        Some("c1"),
        Some("b2"),
    )
    .unwrap();

    assert!(at_bound.is_late(cutoff));
    assert!(!at_bound.is_late(cutoff.pred_opt().unwrap()));
    assert!(!later_same_day.is_late(cutoff));
    assert!(later_same_day.is_late(cutoff.succ_opt().unwrap()));

    at_bound.mark_returned(&clock);
    assert!(!at_bound.is_late(cutoff));
}
