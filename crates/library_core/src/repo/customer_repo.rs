//! Customer gateway contract and SQLite implementation.

use crate::model::customer::Customer;
use crate::repo::error::{ensure_connection_ready, unique_violation, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Persistence port for customers.
pub trait CustomerGateway {
    fn create(&self, customer: &Customer) -> RepoResult<Customer>;
    fn find_by_id(&self, id: &str) -> RepoResult<Option<Customer>>;
}

impl<T: CustomerGateway + ?Sized> CustomerGateway for &T {
    fn create(&self, customer: &Customer) -> RepoResult<Customer> {
        (**self).create(customer)
    }

    fn find_by_id(&self, id: &str) -> RepoResult<Option<Customer>> {
        (**self).find_by_id(id)
    }
}

/// SQLite-backed customer gateway.
pub struct SqliteCustomerGateway<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCustomerGateway<'conn> {
    /// Constructs a gateway from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[("customers", &["id", "name", "email"])])?;
        Ok(Self { conn })
    }
}

impl CustomerGateway for SqliteCustomerGateway<'_> {
    fn create(&self, customer: &Customer) -> RepoResult<Customer> {
        self.conn
            .execute(
                "INSERT INTO customers (id, name, email) VALUES (?1, ?2, ?3);",
                params![customer.id(), customer.name(), customer.email()],
            )
            .map_err(|err| match unique_violation(&err) {
                Some(_) => {
                    RepoError::Conflict(format!("customer `{}` already exists", customer.id()))
                }
                None => err.into(),
            })?;

        self.find_by_id(customer.id())?.ok_or_else(|| {
            RepoError::InvalidData(format!(
                "customer `{}` missing in read-back after write",
                customer.id()
            ))
        })
    }

    fn find_by_id(&self, id: &str) -> RepoResult<Option<Customer>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, email FROM customers WHERE id = ?1;",
                [id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, name, email)| Ok(Customer::restore(&id, &name, &email)?))
            .transpose()
    }
}
