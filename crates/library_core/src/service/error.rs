//! Error taxonomy shared by every use-case service.

use crate::mail::MailError;
use crate::repo::error::RepoError;
use crate::validation::{FieldError, Notification, ValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    /// Input or business rule rejected; carries every collected error.
    ValidationFailed(ValidationError),
    /// Referenced entity does not exist.
    NotFound(String),
    /// Persistence failure. Not retried.
    Repo(RepoError),
    /// Notice delivery failure. Not retried.
    Mail(MailError),
}

impl ServiceError {
    /// Whether the caller can fix the request and try again.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ValidationFailed(_) | Self::NotFound(_))
    }

    /// Collected validation errors; empty for every other variant.
    pub fn errors(&self) -> &[FieldError] {
        match self {
            Self::ValidationFailed(err) => err.errors(),
            _ => &[],
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ValidationFailed(err) => write!(f, "{err}"),
            Self::NotFound(message) => write!(f, "{message}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Mail(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ValidationFailed(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Repo(err) => Some(err),
            Self::Mail(err) => Some(err),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::ValidationFailed(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::InvalidQuery(message) => {
                Self::ValidationFailed(ValidationError::single("Invalid search query", message))
            }
            other => Self::Repo(other),
        }
    }
}

impl From<MailError> for ServiceError {
    fn from(value: MailError) -> Self {
        Self::Mail(value)
    }
}

/// Turns a finished validation pass into its value or `ValidationFailed`.
pub(crate) fn settle<T>(
    value: Option<T>,
    notification: Notification,
    message: &str,
) -> ServiceResult<T> {
    notification.into_result(message)?;
    value.ok_or_else(|| ServiceError::ValidationFailed(ValidationError::new(message, Vec::new())))
}

/// Maps a storage uniqueness conflict to a validation failure under `message`.
pub(crate) fn conflict_as_validation(message: &str) -> impl FnOnce(RepoError) -> ServiceError + '_ {
    move |err| match err {
        RepoError::Conflict(detail) => {
            ServiceError::ValidationFailed(ValidationError::single(message, detail))
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::ServiceError;
    use crate::mail::MailError;
    use crate::repo::error::RepoError;
    use crate::validation::ValidationError;

    #[test]
    fn recoverability_follows_taxonomy() {
        assert!(ServiceError::NotFound("x".to_string()).is_recoverable());
        assert!(ServiceError::ValidationFailed(ValidationError::single("a", "b")).is_recoverable());
        assert!(!ServiceError::Mail(MailError::Transport("down".to_string())).is_recoverable());
        assert!(!ServiceError::from(RepoError::NotFound("x".to_string())).is_recoverable());
    }

    #[test]
    fn invalid_query_becomes_validation_failure() {
        let err = ServiceError::from(RepoError::InvalidQuery("bad sort".to_string()));
        match err {
            ServiceError::ValidationFailed(inner) => {
                assert_eq!(inner.message(), "Invalid search query");
                assert_eq!(inner.errors()[0].message, "bad sort");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
