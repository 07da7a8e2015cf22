//! Operator entry point for the library backend.
//!
//! # Responsibility
//! - Resolve configuration from flags, environment and `.env`.
//! - Wire SQLite gateways into services and print results as JSON.
//!
//! Exit codes: 0 ok, 2 validation failure, 3 not found, 1 anything else.

mod cli;
mod error;

use crate::cli::{BookCommand, BookFields, Cli, Command, CustomerCommand, LoanCommand};
use crate::error::AppError;
use clap::Parser;
use library_core::config::{ConfigError, DB_PATH_VAR, LOG_DIR_VAR, LOG_LEVEL_VAR};
use library_core::db::Connection;
use library_core::service::{BookInput, CreateLoanInput, CustomerInput};
use library_core::{
    init_logging, open_db, BookService, CustomerService, LateLoanService, LibraryConfig,
    LoanSearchQuery, LoanService, SearchQuery, SqliteBookGateway, SqliteCustomerGateway,
    SqliteLoanGateway, SqliteOutboxMailer,
};
use log::info;
use serde_json::{json, Value};
use std::process::ExitCode;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            let report = serde_json::to_string_pretty(&err.report())
                .unwrap_or_else(|_| err.to_string());
            eprintln!("{report}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<String, AppError> {
    let config = resolve_config(&cli)?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    let conn = open_db(&config.db_path)?;
    info!("event=cli_command module=cli status=start");
    let output = execute(cli.command, &conn, &config)?;
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Flags win over environment variables, which win over defaults.
fn resolve_config(cli: &Cli) -> Result<LibraryConfig, AppError> {
    let log_dir = cli
        .log_dir
        .as_deref()
        .map(std::path::absolute)
        .transpose()
        .map_err(|err| {
            AppError::Config(ConfigError::Invalid {
                var: LOG_DIR_VAR,
                reason: err.to_string(),
            })
        })?;

    let config = LibraryConfig::from_lookup(|key| {
        let flag = match key {
            DB_PATH_VAR => cli.db.as_ref().map(|path| path.display().to_string()),
            LOG_LEVEL_VAR => cli.log_level.clone(),
            LOG_DIR_VAR => log_dir.as_ref().map(|path| path.display().to_string()),
            _ => None,
        };
        flag.or_else(|| std::env::var(key).ok())
    })?;
    Ok(config)
}

fn execute(command: Command, conn: &Connection, config: &LibraryConfig) -> Result<Value, AppError> {
    let books = SqliteBookGateway::try_new(conn)?;
    let customers = SqliteCustomerGateway::try_new(conn)?;
    let loans = SqliteLoanGateway::try_new(conn)?;

    let output = match command {
        Command::Book { command } => {
            let service = BookService::new(&books);
            match command {
                BookCommand::Create(fields) => {
                    serde_json::to_value(service.create_book(&book_input(fields))?)?
                }
                BookCommand::Get { id } => serde_json::to_value(service.get_book(&id)?)?,
                BookCommand::Update { id, fields } => {
                    serde_json::to_value(service.update_book(&id, &book_input(fields))?)?
                }
                BookCommand::Delete { id } => {
                    service.delete_book(&id)?;
                    json!({ "deleted": id })
                }
                BookCommand::List {
                    terms,
                    sort,
                    paging,
                } => serde_json::to_value(service.list_books(&SearchQuery {
                    page: paging.page,
                    per_page: paging.per_page,
                    terms,
                    sort,
                    direction: paging.direction,
                })?)?,
                BookCommand::Loans { id } => serde_json::to_value(service.get_book_loans(&id)?)?,
            }
        }
        Command::Customer { command } => {
            let service = CustomerService::new(&customers);
            match command {
                CustomerCommand::Create { name, email } => {
                    serde_json::to_value(service.create_customer(&CustomerInput { name, email })?)?
                }
                CustomerCommand::Get { id } => serde_json::to_value(service.get_customer(&id)?)?,
            }
        }
        Command::Loan { command } => {
            let service = LoanService::new(&loans, &books, &customers);
            match command {
                LoanCommand::Create { isbn, customer_id } => serde_json::to_value(
                    service.create_loan(&CreateLoanInput { isbn, customer_id })?,
                )?,
                LoanCommand::Return { id } => serde_json::to_value(service.return_loan(&id)?)?,
                LoanCommand::List {
                    isbn,
                    customer_id,
                    sort,
                    paging,
                } => serde_json::to_value(service.list_loans(&LoanSearchQuery {
                    page: paging.page,
                    per_page: paging.per_page,
                    isbn,
                    customer_id,
                    sort,
                    direction: paging.direction,
                })?)?,
            }
        }
        Command::NotifyLate => {
            let mailer = SqliteOutboxMailer::try_new(conn, config.mail_from.clone())?;
            let service = LateLoanService::new(&loans, &customers, &mailer);
            serde_json::to_value(service.notify_late_loans()?)?
        }
    };
    Ok(output)
}

fn book_input(fields: BookFields) -> BookInput {
    BookInput {
        title: fields.title,
        author: fields.author,
        isbn: fields.isbn,
    }
}
