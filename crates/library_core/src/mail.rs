//! Overdue-notice delivery port and its implementations.
//!
//! # Responsibility
//! - Define the `EmailGateway` port used by the overdue sweep.
//! - Queue notices in the `mail_outbox` table for an external relay.
//!
//! # Invariants
//! - One call to `send` queues exactly one notice.
//! - Recipient addresses never reach the logs.

use crate::repo::error::{ensure_connection_ready, RepoError};
use log::debug;
use rusqlite::{params, Connection};
use std::cell::{Cell, RefCell};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const OVERDUE_SUBJECT: &str = "Book with overdue loan";
pub const OVERDUE_BODY: &str = "You have a book with overdue loan.";

#[derive(Debug)]
pub enum MailError {
    /// Delivery was refused by the transport.
    Transport(String),
    /// Outbox persistence failed.
    Repo(RepoError),
}

impl Display for MailError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "mail transport failed: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MailError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Transport(_) => None,
        }
    }
}

impl From<RepoError> for MailError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for MailError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

/// Delivery port for overdue notices.
pub trait EmailGateway {
    fn send(&self, email: &str) -> Result<(), MailError>;
}

impl<T: EmailGateway + ?Sized> EmailGateway for &T {
    fn send(&self, email: &str) -> Result<(), MailError> {
        (**self).send(email)
    }
}

/// Queues notices into `mail_outbox`.
pub struct SqliteOutboxMailer<'conn> {
    conn: &'conn Connection,
    sender: String,
}

impl<'conn> SqliteOutboxMailer<'conn> {
    pub fn try_new(conn: &'conn Connection, sender: impl Into<String>) -> Result<Self, MailError> {
        ensure_connection_ready(
            conn,
            &[(
                "mail_outbox",
                &["id", "sender", "recipient", "subject", "body"],
            )],
        )?;
        Ok(Self {
            conn,
            sender: sender.into(),
        })
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Number of queued notices.
    pub fn queued(&self) -> Result<u64, MailError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM mail_outbox;", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

impl EmailGateway for SqliteOutboxMailer<'_> {
    fn send(&self, email: &str) -> Result<(), MailError> {
        self.conn.execute(
            "INSERT INTO mail_outbox (sender, recipient, subject, body) VALUES (?1, ?2, ?3, ?4);",
            params![self.sender, email, OVERDUE_SUBJECT, OVERDUE_BODY],
        )?;
        debug!(
            "event=mail_send module=mail status=queued outbox_id={}",
            self.conn.last_insert_rowid()
        );
        Ok(())
    }
}

/// Records recipients instead of delivering.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: RefCell<Vec<String>>,
    fail_for: RefCell<Option<String>>,
    attempts: Cell<usize>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `send` to `email` fail with `MailError::Transport`.
    pub fn fail_for(&self, email: impl Into<String>) {
        *self.fail_for.borrow_mut() = Some(email.into());
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.borrow().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.get()
    }
}

impl EmailGateway for RecordingMailer {
    fn send(&self, email: &str) -> Result<(), MailError> {
        self.attempts.set(self.attempts.get() + 1);
        if self.fail_for.borrow().as_deref() == Some(email) {
            return Err(MailError::Transport("recipient rejected".to_string()));
        }
        self.sent.borrow_mut().push(email.to_string());
        Ok(())
    }
}
