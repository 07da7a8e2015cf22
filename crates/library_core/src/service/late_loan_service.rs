//! Overdue sweep: notify customers whose loans are late.
//!
//! # Invariants
//! - A loan is late when it is open and its UTC loan day is on or before
//!   `today - LATE_AFTER_DAYS`.
//! - One notice per late loan; loans whose customer is gone are skipped.
//! - The first delivery failure aborts the sweep.

use crate::mail::EmailGateway;
use crate::model::runtime::{Clock, SystemClock};
use crate::repo::customer_repo::CustomerGateway;
use crate::repo::loan_repo::LoanGateway;
use crate::service::error::ServiceResult;
use chrono::{Days, NaiveDate};
use log::{debug, error, info};
use serde::Serialize;
use std::time::Instant;

pub const LATE_AFTER_DAYS: u64 = 4;

/// Latest loan day that counts as late on `today`.
pub fn late_cutoff(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_days(Days::new(LATE_AFTER_DAYS))
        .unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LateLoanReport {
    pub cutoff: NaiveDate,
    pub late_loans: usize,
    pub notified: usize,
    pub skipped: usize,
}

pub struct LateLoanService<L, C, M, K = SystemClock> {
    loans: L,
    customers: C,
    mailer: M,
    clock: K,
}

impl<L: LoanGateway, C: CustomerGateway, M: EmailGateway> LateLoanService<L, C, M> {
    pub fn new(loans: L, customers: C, mailer: M) -> Self {
        Self::with_clock(loans, customers, mailer, SystemClock)
    }
}

impl<L, C, M, K> LateLoanService<L, C, M, K>
where
    L: LoanGateway,
    C: CustomerGateway,
    M: EmailGateway,
    K: Clock,
{
    pub fn with_clock(loans: L, customers: C, mailer: M, clock: K) -> Self {
        Self {
            loans,
            customers,
            mailer,
            clock,
        }
    }

    /// Sends one overdue notice per late loan.
    ///
    /// # Errors
    /// - `Repo` when loans or customers cannot be read.
    /// - `Mail` on the first failed delivery; earlier notices stay sent.
    pub fn notify_late_loans(&self) -> ServiceResult<LateLoanReport> {
        let started_at = Instant::now();
        let cutoff = late_cutoff(self.clock.today());
        let late = self.loans.find_all_late_loans(cutoff)?;

        let mut notified = 0;
        let mut skipped = 0;
        for loan in &late {
            let Some(customer) = self.customers.find_by_id(loan.customer_id())? else {
                debug!(
                    "event=notify_late_loans module=service status=skipped reason=customer_missing loan_id={}",
                    loan.id()
                );
                skipped += 1;
                continue;
            };

            if let Err(err) = self.mailer.send(customer.email()) {
                error!(
                    "event=notify_late_loans module=service status=error loan_id={} notified={} error={}",
                    loan.id(),
                    notified,
                    err
                );
                return Err(err.into());
            }
            notified += 1;
        }

        info!(
            "event=notify_late_loans module=service status=ok cutoff={} late_loans={} notified={} skipped={} duration_ms={}",
            cutoff,
            late.len(),
            notified,
            skipped,
            started_at.elapsed().as_millis()
        );
        Ok(LateLoanReport {
            cutoff,
            late_loans: late.len(),
            notified,
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::late_cutoff;
    use chrono::NaiveDate;

    #[test]
    fn cutoff_is_four_days_before_today() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        assert_eq!(
            late_cutoff(today),
            NaiveDate::from_ymd_opt(2024, 2, 27).unwrap()
        );
    }

    #[test]
    fn cutoff_saturates_at_min_date() {
        assert_eq!(late_cutoff(NaiveDate::MIN), NaiveDate::MIN);
    }
}
