use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Library loan backend operator CLI
#[derive(Debug, Parser)]
#[command(
    name = "library",
    version,
    about = "Manage books, customers and loans; run the overdue sweep"
)]
pub struct Cli {
    /// SQLite database file (overrides LIBRARY_DB_PATH)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error (overrides LIBRARY_LOG_LEVEL)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Directory for rolling log files (overrides LIBRARY_LOG_DIR)
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Book catalogue operations
    Book {
        #[command(subcommand)]
        command: BookCommand,
    },
    /// Customer operations
    Customer {
        #[command(subcommand)]
        command: CustomerCommand,
    },
    /// Loan operations
    Loan {
        #[command(subcommand)]
        command: LoanCommand,
    },
    /// Queue overdue notices for every late loan
    NotifyLate,
}

#[derive(Debug, Args)]
pub struct BookFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub author: Option<String>,
    #[arg(long)]
    pub isbn: Option<String>,
}

#[derive(Debug, Args)]
pub struct Paging {
    /// Zero-based page number
    #[arg(long, default_value_t = 0)]
    pub page: u32,
    /// Rows per page (0 = default, capped at 50)
    #[arg(long, default_value_t = 10)]
    pub per_page: u32,
    #[arg(long, default_value = "asc")]
    pub direction: String,
}

#[derive(Debug, Subcommand)]
pub enum BookCommand {
    Create(BookFields),
    Get {
        id: String,
    },
    Update {
        id: String,
        #[command(flatten)]
        fields: BookFields,
    },
    Delete {
        id: String,
    },
    List {
        /// Case-insensitive match on title, author or isbn
        #[arg(long)]
        terms: Option<String>,
        #[arg(long, default_value = "title")]
        sort: String,
        #[command(flatten)]
        paging: Paging,
    },
    /// Show a book with its loan ids
    Loans {
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum CustomerCommand {
    Create {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    Get {
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum LoanCommand {
    Create {
        #[arg(long)]
        isbn: String,
        #[arg(long)]
        customer_id: String,
    },
    Return {
        id: String,
    },
    List {
        #[arg(long)]
        isbn: Option<String>,
        #[arg(long)]
        customer_id: Option<String>,
        #[arg(long, default_value = "loan_date")]
        sort: String,
        #[command(flatten)]
        paging: Paging,
    },
}
