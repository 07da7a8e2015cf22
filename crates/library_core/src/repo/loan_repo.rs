//! Loan gateway contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist loans and answer the open-loan and overdue queries.
//!
//! # Invariants
//! - At most one open loan per book, enforced by `idx_loans_open_book`.
//!   Violations surface as `Conflict`.
//! - Timestamps are stored as epoch milliseconds (UTC).

use crate::model::loan::{late_bound, Loan};
use crate::repo::book_repo::to_sql_int;
use crate::repo::error::{ensure_connection_ready, unique_violation, RepoError, RepoResult};
use crate::repo::page::{
    active_filter, normalize_per_page, page_offset, LoanSearchQuery, LoanSortField, Page,
    SortDirection,
};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const LOAN_SELECT_SQL: &str = "SELECT l.id, l.customer_id, l.book_id, l.loan_date, l.return_date, l.returned
     FROM loans l";

/// Persistence port for loans.
pub trait LoanGateway {
    fn create(&self, loan: &Loan) -> RepoResult<Loan>;
    fn update(&self, loan: &Loan) -> RepoResult<Loan>;
    fn find_by_id(&self, id: &str) -> RepoResult<Option<Loan>>;
    fn exists_by_book_id_and_not_returned(&self, book_id: &str) -> RepoResult<bool>;
    /// Pages loans. The `isbn` and `customer_id` filters must both match when both are set.
    fn find_all(&self, query: &LoanSearchQuery) -> RepoResult<Page<Loan>>;
    /// Open loans taken out no later than the start of `cutoff` (UTC), oldest first.
    fn find_all_late_loans(&self, cutoff: NaiveDate) -> RepoResult<Vec<Loan>>;
}

impl<T: LoanGateway + ?Sized> LoanGateway for &T {
    fn create(&self, loan: &Loan) -> RepoResult<Loan> {
        (**self).create(loan)
    }

    fn update(&self, loan: &Loan) -> RepoResult<Loan> {
        (**self).update(loan)
    }

    fn find_by_id(&self, id: &str) -> RepoResult<Option<Loan>> {
        (**self).find_by_id(id)
    }

    fn exists_by_book_id_and_not_returned(&self, book_id: &str) -> RepoResult<bool> {
        (**self).exists_by_book_id_and_not_returned(book_id)
    }

    fn find_all(&self, query: &LoanSearchQuery) -> RepoResult<Page<Loan>> {
        (**self).find_all(query)
    }

    fn find_all_late_loans(&self, cutoff: NaiveDate) -> RepoResult<Vec<Loan>> {
        (**self).find_all_late_loans(cutoff)
    }
}

/// SQLite-backed loan gateway.
pub struct SqliteLoanGateway<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLoanGateway<'conn> {
    /// Constructs a gateway from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                (
                    "loans",
                    &[
                        "id",
                        "customer_id",
                        "book_id",
                        "loan_date",
                        "return_date",
                        "returned",
                    ],
                ),
                ("books", &["id", "isbn"]),
            ],
        )?;
        Ok(Self { conn })
    }

    fn read_back(&self, id: &str) -> RepoResult<Loan> {
        self.find_by_id(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("loan `{id}` missing in read-back after write"))
        })
    }

    fn collect(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Loan>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut loans = Vec::new();
        while let Some(row) = rows.next()? {
            loans.push(parse_loan(read_loan_columns(row)?)?);
        }
        Ok(loans)
    }
}

impl LoanGateway for SqliteLoanGateway<'_> {
    fn create(&self, loan: &Loan) -> RepoResult<Loan> {
        self.conn
            .execute(
                "INSERT INTO loans (id, customer_id, book_id, loan_date, return_date, returned)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    loan.id(),
                    loan.customer_id(),
                    loan.book_id(),
                    loan.loan_date().timestamp_millis(),
                    loan.return_date().map(|value| value.timestamp_millis()),
                    loan.is_returned(),
                ],
            )
            .map_err(|err| map_write_error(err, loan))?;

        self.read_back(loan.id())
    }

    fn update(&self, loan: &Loan) -> RepoResult<Loan> {
        let changed = self
            .conn
            .execute(
                "UPDATE loans
                 SET
                    customer_id = ?2,
                    book_id = ?3,
                    return_date = ?4,
                    returned = ?5
                 WHERE id = ?1;",
                params![
                    loan.id(),
                    loan.customer_id(),
                    loan.book_id(),
                    loan.return_date().map(|value| value.timestamp_millis()),
                    loan.is_returned(),
                ],
            )
            .map_err(|err| map_write_error(err, loan))?;

        if changed == 0 {
            return Err(RepoError::NotFound(loan.id().to_string()));
        }

        self.read_back(loan.id())
    }

    fn find_by_id(&self, id: &str) -> RepoResult<Option<Loan>> {
        let row = self
            .conn
            .query_row(
                &format!("{LOAN_SELECT_SQL} WHERE l.id = ?1;"),
                [id],
                read_loan_columns,
            )
            .optional()?;

        row.map(parse_loan).transpose()
    }

    fn exists_by_book_id_and_not_returned(&self, book_id: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM loans WHERE book_id = ?1 AND returned = 0);",
            [book_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn find_all(&self, query: &LoanSearchQuery) -> RepoResult<Page<Loan>> {
        let sort = LoanSortField::parse(&query.sort)?;
        let direction = SortDirection::parse(&query.direction)?;
        let per_page = normalize_per_page(query.per_page);

        let mut clauses: Vec<&str> = Vec::new();
        let mut filter_values: Vec<Value> = Vec::new();
        if let Some(isbn) = active_filter(query.isbn.as_deref()) {
            clauses.push("b.isbn = ?");
            filter_values.push(Value::Text(isbn.to_string()));
        }
        if let Some(customer_id) = active_filter(query.customer_id.as_deref()) {
            clauses.push("l.customer_id = ?");
            filter_values.push(Value::Text(customer_id.to_string()));
        }

        let mut from_sql = String::from(" JOIN books b ON b.id = l.book_id");
        if !clauses.is_empty() {
            from_sql.push_str(" WHERE ");
            from_sql.push_str(&clauses.join(" AND "));
        }

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM loans l{from_sql};"),
            params_from_iter(filter_values.iter()),
            |row| row.get(0),
        )?;

        let sql = format!(
            "{LOAN_SELECT_SQL}{from_sql} ORDER BY {} {}, l.id ASC LIMIT ? OFFSET ?;",
            sort.column(),
            direction.as_sql()
        );
        let mut bind_values = filter_values;
        bind_values.push(Value::Integer(i64::from(per_page)));
        bind_values.push(Value::Integer(to_sql_int(page_offset(query.page, per_page))?));

        Ok(Page {
            current_page: query.page,
            per_page,
            total: u64::try_from(total).unwrap_or_default(),
            items: self.collect(&sql, bind_values)?,
        })
    }

    fn find_all_late_loans(&self, cutoff: NaiveDate) -> RepoResult<Vec<Loan>> {
        let upper_bound = late_bound(cutoff).timestamp_millis();
        self.collect(
            &format!(
                "{LOAN_SELECT_SQL}
                 WHERE l.returned = 0 AND l.loan_date <= ?1
                 ORDER BY l.loan_date ASC, l.id ASC;"
            ),
            vec![Value::Integer(upper_bound)],
        )
    }
}

struct LoanColumns {
    id: String,
    customer_id: String,
    book_id: String,
    loan_date: i64,
    return_date: Option<i64>,
    returned: bool,
}

fn read_loan_columns(row: &Row<'_>) -> rusqlite::Result<LoanColumns> {
    Ok(LoanColumns {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        book_id: row.get(2)?,
        loan_date: row.get(3)?,
        return_date: row.get(4)?,
        returned: row.get(5)?,
    })
}

fn parse_loan(columns: LoanColumns) -> RepoResult<Loan> {
    let loan_date = millis_to_utc(columns.loan_date, "loan_date")?;
    let return_date = columns
        .return_date
        .map(|value| millis_to_utc(value, "return_date"))
        .transpose()?;

    Ok(Loan::restore(
        &columns.id,
        &columns.customer_id,
        &columns.book_id,
        loan_date,
        return_date,
        columns.returned,
    )?)
}

fn millis_to_utc(value: i64, column: &str) -> RepoResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(value)
        .ok_or_else(|| RepoError::InvalidData(format!("{column} out of range: {value}")))
}

fn map_write_error(err: rusqlite::Error, loan: &Loan) -> RepoError {
    match unique_violation(&err) {
        Some("loans.book_id") => RepoError::Conflict(format!(
            "Book with ID {} is already on loan",
            loan.book_id()
        )),
        Some(_) => RepoError::Conflict(format!("loan `{}` already exists", loan.id())),
        None => err.into(),
    }
}
