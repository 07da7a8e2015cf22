//! Book gateway contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist books and answer isbn/id lookups.
//! - Derive each book's `loans` backreference from the `loans` table.
//!
//! # Invariants
//! - `isbn` is unique across books; violations surface as `Conflict`.
//! - `delete_by_id` never fails on absence and only deletes existing rows.
//! - Term search folds case with `fold_case`, registered by `open_db`.
//! - Read paths reject invalid persisted rows instead of masking them.

use crate::db::FOLD_CASE_FN;
use crate::model::book::Book;
use crate::repo::error::{ensure_connection_ready, unique_violation, RepoError, RepoResult};
use crate::repo::page::{
    active_filter, normalize_per_page, page_offset, BookSortField, Page, SearchQuery,
    SortDirection,
};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const BOOK_SELECT_SQL: &str = "SELECT id, title, author, isbn FROM books";

/// Persistence port for books.
pub trait BookGateway {
    fn create(&self, book: &Book) -> RepoResult<Book>;
    fn update(&self, book: &Book) -> RepoResult<Book>;
    fn find_by_id(&self, id: &str) -> RepoResult<Option<Book>>;
    fn exists_by_isbn(&self, isbn: &str) -> RepoResult<bool>;
    /// Deletes the book when present; absent ids are a no-op.
    fn delete_by_id(&self, id: &str) -> RepoResult<()>;
    fn find_all(&self, query: &SearchQuery) -> RepoResult<Page<Book>>;
    fn find_by_isbn(&self, isbn: &str) -> RepoResult<Option<Book>>;
}

impl<T: BookGateway + ?Sized> BookGateway for &T {
    fn create(&self, book: &Book) -> RepoResult<Book> {
        (**self).create(book)
    }

    fn update(&self, book: &Book) -> RepoResult<Book> {
        (**self).update(book)
    }

    fn find_by_id(&self, id: &str) -> RepoResult<Option<Book>> {
        (**self).find_by_id(id)
    }

    fn exists_by_isbn(&self, isbn: &str) -> RepoResult<bool> {
        (**self).exists_by_isbn(isbn)
    }

    fn delete_by_id(&self, id: &str) -> RepoResult<()> {
        (**self).delete_by_id(id)
    }

    fn find_all(&self, query: &SearchQuery) -> RepoResult<Page<Book>> {
        (**self).find_all(query)
    }

    fn find_by_isbn(&self, isbn: &str) -> RepoResult<Option<Book>> {
        (**self).find_by_isbn(isbn)
    }
}

/// SQLite-backed book gateway.
pub struct SqliteBookGateway<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBookGateway<'conn> {
    /// Constructs a gateway from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                ("books", &["id", "title", "author", "isbn", "updated_at"]),
                ("loans", &["id", "book_id", "loan_date"]),
            ],
        )?;
        Ok(Self { conn })
    }

    fn find_one(&self, column: &'static str, value: &str) -> RepoResult<Option<Book>> {
        let row = self
            .conn
            .query_row(
                &format!("{BOOK_SELECT_SQL} WHERE {column} = ?1;"),
                [value],
                read_book_columns,
            )
            .optional()?;

        row.map(|columns| self.hydrate(columns)).transpose()
    }

    fn hydrate(&self, columns: BookColumns) -> RepoResult<Book> {
        let loans = load_loan_ids(self.conn, &columns.id)?;
        Ok(Book::restore(
            &columns.id,
            &columns.title,
            &columns.author,
            &columns.isbn,
            loans,
        )?)
    }

    fn read_back(&self, id: &str) -> RepoResult<Book> {
        self.find_by_id(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("book `{id}` missing in read-back after write"))
        })
    }
}

impl BookGateway for SqliteBookGateway<'_> {
    fn create(&self, book: &Book) -> RepoResult<Book> {
        self.conn
            .execute(
                "INSERT INTO books (id, title, author, isbn) VALUES (?1, ?2, ?3, ?4);",
                params![book.id(), book.title(), book.author(), book.isbn()],
            )
            .map_err(|err| map_write_error(err, book))?;

        self.read_back(book.id())
    }

    fn update(&self, book: &Book) -> RepoResult<Book> {
        let changed = self
            .conn
            .execute(
                "UPDATE books
                 SET
                    title = ?2,
                    author = ?3,
                    isbn = ?4,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![book.id(), book.title(), book.author(), book.isbn()],
            )
            .map_err(|err| map_write_error(err, book))?;

        if changed == 0 {
            return Err(RepoError::NotFound(book.id().to_string()));
        }

        self.read_back(book.id())
    }

    fn find_by_id(&self, id: &str) -> RepoResult<Option<Book>> {
        self.find_one("id", id)
    }

    fn exists_by_isbn(&self, isbn: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM books WHERE isbn = ?1);",
            [isbn],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn delete_by_id(&self, id: &str) -> RepoResult<()> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM books WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        if !exists {
            debug!("event=book_delete module=repo status=skipped reason=absent");
            return Ok(());
        }

        self.conn.execute("DELETE FROM books WHERE id = ?1;", [id])?;
        debug!("event=book_delete module=repo status=ok");
        Ok(())
    }

    fn find_all(&self, query: &SearchQuery) -> RepoResult<Page<Book>> {
        let sort = BookSortField::parse(&query.sort)?;
        let direction = SortDirection::parse(&query.direction)?;
        let per_page = normalize_per_page(query.per_page);

        let mut where_sql = String::new();
        let mut filter_values: Vec<Value> = Vec::new();
        if let Some(terms) = active_filter(query.terms.as_deref()) {
            where_sql.push_str(&format!(
                " WHERE instr({FOLD_CASE_FN}(title), ?1) > 0
                   OR instr({FOLD_CASE_FN}(author), ?1) > 0
                   OR instr({FOLD_CASE_FN}(isbn), ?1) > 0"
            ));
            filter_values.push(Value::Text(terms.to_lowercase()));
        }

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM books{where_sql};"),
            params_from_iter(filter_values.iter()),
            |row| row.get(0),
        )?;

        let sql = format!(
            "{BOOK_SELECT_SQL}{where_sql} ORDER BY {} {}, id ASC LIMIT ? OFFSET ?;",
            sort.column(),
            direction.as_sql()
        );
        let mut bind_values = filter_values;
        bind_values.push(Value::Integer(i64::from(per_page)));
        bind_values.push(Value::Integer(to_sql_int(page_offset(query.page, per_page))?));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(self.hydrate(read_book_columns(row)?)?);
        }

        Ok(Page {
            current_page: query.page,
            per_page,
            total: u64::try_from(total).unwrap_or_default(),
            items,
        })
    }

    fn find_by_isbn(&self, isbn: &str) -> RepoResult<Option<Book>> {
        self.find_one("isbn", isbn)
    }
}

struct BookColumns {
    id: String,
    title: String,
    author: String,
    isbn: String,
}

fn read_book_columns(row: &Row<'_>) -> rusqlite::Result<BookColumns> {
    Ok(BookColumns {
        id: row.get("id")?,
        title: row.get("title")?,
        author: row.get("author")?,
        isbn: row.get("isbn")?,
    })
}

fn load_loan_ids(conn: &Connection, book_id: &str) -> RepoResult<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT id FROM loans WHERE book_id = ?1 ORDER BY loan_date ASC, id ASC;")?;
    let mut rows = stmt.query([book_id])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(row.get(0)?);
    }
    Ok(ids)
}

fn map_write_error(err: rusqlite::Error, book: &Book) -> RepoError {
    match unique_violation(&err) {
        Some("books.isbn") => RepoError::Conflict(format!(
            "Already exists a book with isbn {}",
            book.isbn()
        )),
        Some(_) => RepoError::Conflict(format!("book `{}` already exists", book.id())),
        None => err.into(),
    }
}

pub(crate) fn to_sql_int(value: u64) -> RepoResult<i64> {
    i64::try_from(value)
        .map_err(|_| RepoError::InvalidQuery(format!("offset {value} exceeds storage range")))
}
