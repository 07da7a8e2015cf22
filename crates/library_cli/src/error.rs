use library_core::{
    ConfigError, DbError, LoggingError, MailError, RepoError, ServiceError,
};
use serde::Serialize;
use std::fmt::{Display, Formatter};

const EXIT_FAILURE: u8 = 1;
const EXIT_INVALID: u8 = 2;
const EXIT_NOT_FOUND: u8 = 3;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Logging(LoggingError),
    Db(DbError),
    Repo(RepoError),
    Mail(MailError),
    Service(ServiceError),
    Output(serde_json::Error),
}

impl AppError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Service(ServiceError::ValidationFailed(_)) => EXIT_INVALID,
            Self::Service(ServiceError::NotFound(_)) => EXIT_NOT_FOUND,
            _ => EXIT_FAILURE,
        }
    }

    /// Machine-readable error body printed to stderr.
    pub fn report(&self) -> ErrorReport {
        let errors = match self {
            Self::Service(err) => err
                .errors()
                .iter()
                .map(|error| error.message.clone())
                .collect(),
            _ => Vec::new(),
        };
        let message = match self {
            Self::Service(ServiceError::ValidationFailed(err)) => err.message().to_string(),
            other => other.to_string(),
        };
        ErrorReport { message, errors }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Logging(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Mail(err) => write!(f, "{err}"),
            Self::Service(err) => write!(f, "{err}"),
            Self::Output(err) => write!(f, "failed to render output: {err}"),
        }
    }
}

impl std::error::Error for AppError {}

#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub message: String,
    pub errors: Vec<String>,
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<LoggingError> for AppError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<DbError> for AppError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for AppError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<MailError> for AppError {
    fn from(value: MailError) -> Self {
        Self::Mail(value)
    }
}

impl From<ServiceError> for AppError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Output(value)
    }
}
