//! Injected id and clock capabilities.
//!
//! Entities never reach for global randomness or wall-clock time; every
//! constructor that needs either receives it from the caller.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::cell::Cell;
use uuid::Uuid;

/// Source of "now" for entity timestamps and overdue cutoffs.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Current UTC calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Source of opaque entity identifiers.
pub trait IdGenerator {
    fn next_id(&self) -> String;
}

impl<T: IdGenerator + ?Sized> IdGenerator for &T {
    fn next_id(&self) -> String {
        (**self).next_id()
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Random v4 UUIDs rendered as 32 lowercase hex chars.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// Manually driven clock for deterministic tests and replays.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Cell<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// Monotonic counter ids with the same 32-hex shape as production ids.
#[derive(Debug, Clone, Default)]
pub struct SequentialIdGenerator {
    next: Cell<u64>,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: Cell::new(first),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> String {
        let value = self.next.get();
        self.next.set(value + 1);
        format!("{value:032x}")
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, FixedClock, IdGenerator, SequentialIdGenerator, UuidIdGenerator};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn uuid_ids_are_lowercase_hex_without_separators() {
        let id = UuidIdGenerator.next_id();
        assert_eq!(id.len(), 32);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn sequential_ids_increment() {
        let ids = SequentialIdGenerator::new();
        assert_eq!(ids.next_id(), format!("{:032x}", 1));
        assert_eq!(ids.next_id(), format!("{:032x}", 2));
    }

    #[test]
    fn fixed_clock_advances_and_reports_utc_date() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 23, 0, 0).unwrap());
        clock.advance(Duration::hours(2));
        assert_eq!(clock.today().to_string(), "2024-03-02");
    }
}
