//! Loan aggregate and its one-way lifecycle.
//!
//! # Invariants
//! - `id`, `customer_id` and `book_id` are non-blank.
//! - `loan_date` is fixed at creation.
//! - A new loan is not returned and has no `return_date`.

use crate::model::runtime::{Clock, IdGenerator};
use crate::validation::{require_not_blank, Notification, ValidationError};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Loan {
    id: String,
    customer_id: String,
    book_id: String,
    loan_date: DateTime<Utc>,
    return_date: Option<DateTime<Utc>>,
    returned: bool,
}

impl Loan {
    /// Opens a loan dated `clock.now()`.
    pub fn create(
        ids: &dyn IdGenerator,
        clock: &dyn Clock,
        customer_id: Option<&str>,
        book_id: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let id = ids.next_id();
        Self::checked(
            Some(id.as_str()),
            customer_id,
            book_id,
            clock.now(),
            None,
            false,
        )
    }

    /// Rebuilds a stored loan.
    pub fn restore(
        id: &str,
        customer_id: &str,
        book_id: &str,
        loan_date: DateTime<Utc>,
        return_date: Option<DateTime<Utc>>,
        returned: bool,
    ) -> Result<Self, ValidationError> {
        Self::checked(
            Some(id),
            Some(customer_id),
            Some(book_id),
            loan_date,
            return_date,
            returned,
        )
    }

    /// Moves the loan into the returned state stamped with `clock.now()`.
    ///
    /// Calling it on an already returned loan stamps a fresh `return_date`.
    pub fn mark_returned(&mut self, clock: &dyn Clock) {
        self.returned = true;
        self.return_date = Some(clock.now());
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn book_id(&self) -> &str {
        &self.book_id
    }

    pub fn loan_date(&self) -> DateTime<Utc> {
        self.loan_date
    }

    pub fn return_date(&self) -> Option<DateTime<Utc>> {
        self.return_date
    }

    pub fn is_returned(&self) -> bool {
        self.returned
    }

    /// Outstanding and taken out no later than the start of `cutoff` (UTC).
    pub fn is_late(&self, cutoff: NaiveDate) -> bool {
        !self.returned && self.loan_date <= late_bound(cutoff)
    }

    fn checked(
        id: Option<&str>,
        customer_id: Option<&str>,
        book_id: Option<&str>,
        loan_date: DateTime<Utc>,
        return_date: Option<DateTime<Utc>>,
        returned: bool,
    ) -> Result<Self, ValidationError> {
        let mut notification = Notification::new();
        check_fields(&mut notification, id, customer_id, book_id);
        notification.into_result("Failed to create a Loan")?;

        Ok(Self {
            id: id.unwrap_or_default().to_string(),
            customer_id: customer_id.unwrap_or_default().to_string(),
            book_id: book_id.unwrap_or_default().to_string(),
            loan_date,
            return_date,
            returned,
        })
    }
}

fn check_fields(
    notification: &mut Notification,
    id: Option<&str>,
    customer_id: Option<&str>,
    book_id: Option<&str>,
) {
    require_not_blank(notification, "id", id);
    require_not_blank(notification, "customerId", customer_id);
    require_not_blank(notification, "bookId", book_id);
}

/// Latest loan instant still counted late for `cutoff`: the start of that UTC day.
pub fn late_bound(cutoff: NaiveDate) -> DateTime<Utc> {
    cutoff.and_time(NaiveTime::MIN).and_utc()
}
