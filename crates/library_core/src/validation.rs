//! Error-accumulating validation primitives.
//!
//! # Responsibility
//! - Collect field/business errors across one validation pass.
//! - Merge errors from independent steps without early termination.
//!
//! # Invariants
//! - Errors keep append order; nothing is deduplicated.
//! - A `ValidationError` always carries at least one `FieldError`.

use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Single human-readable validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub message: String,
}

impl FieldError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Failure produced when a validation pass collected errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
    errors: Vec<FieldError>,
}

impl ValidationError {
    /// Builds a failure from a headline and a non-empty error list.
    ///
    /// An empty list is replaced by one error carrying the headline so the
    /// non-empty invariant holds for every caller.
    pub fn new(message: impl Into<String>, errors: Vec<FieldError>) -> Self {
        let message = message.into();
        let errors = if errors.is_empty() {
            vec![FieldError::new(message.clone())]
        } else {
            errors
        };
        Self { message, errors }
    }

    /// Builds a failure carrying exactly one error.
    pub fn single(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(message, vec![FieldError::new(error)])
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn first_error(&self) -> &FieldError {
        &self.errors[0]
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        for (index, error) in self.errors.iter().enumerate() {
            let separator = if index == 0 { ": " } else { "; " };
            write!(f, "{separator}{error}")?;
        }
        Ok(())
    }
}

impl Error for ValidationError {}

/// Mutable error collector used by entities and use cases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notification {
    errors: Vec<FieldError>,
}

impl Notification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one error.
    pub fn append(&mut self, error: FieldError) -> &mut Self {
        self.errors.push(error);
        self
    }

    /// Appends every error from another collector, preserving its order.
    pub fn append_all(&mut self, other: &Notification) -> &mut Self {
        self.errors.extend(other.errors.iter().cloned());
        self
    }

    /// Runs one validation step and merges its errors into this collector.
    ///
    /// Returns the produced value on success and `None` when the step failed.
    pub fn validate<T>(
        &mut self,
        step: impl FnOnce() -> Result<T, ValidationError>,
    ) -> Option<T> {
        match step() {
            Ok(value) => Some(value),
            Err(err) => {
                self.errors.extend(err.into_errors());
                None
            }
        }
    }

    /// Runs a step with an arbitrary error type, recording its message as a
    /// single error on failure.
    pub fn validate_with<T, E: Display>(
        &mut self,
        step: impl FnOnce() -> Result<T, E>,
    ) -> Option<T> {
        match step() {
            Ok(value) => Some(value),
            Err(err) => {
                self.errors.push(FieldError::new(err.to_string()));
                None
            }
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn first_error(&self) -> Option<&FieldError> {
        self.errors.first()
    }

    /// Converts collected errors into a failure with the given headline.
    pub fn into_result(self, message: impl Into<String>) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            return Ok(());
        }
        Err(ValidationError::new(message, self.errors))
    }

    /// Fails with the given headline when errors exist, without consuming.
    pub fn check(&self, message: impl Into<String>) -> Result<(), ValidationError> {
        self.clone().into_result(message)
    }
}

/// Appends `'field' should not be empty` when the value is absent or blank.
pub(crate) fn require_not_blank(
    notification: &mut Notification,
    field: &str,
    value: Option<&str>,
) {
    if is_blank(value) {
        notification.append(FieldError::new(format!("'{field}' should not be empty")));
    }
}

pub(crate) fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |value| value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::{FieldError, Notification, ValidationError};

    fn failing(message: &str, errors: &[&str]) -> Result<(), ValidationError> {
        Err(ValidationError::new(
            message,
            errors.iter().map(|value| FieldError::new(*value)).collect(),
        ))
    }

    #[test]
    fn validate_merges_errors_from_independent_steps_in_call_order() {
        let mut notification = Notification::new();
        notification.validate(|| failing("first", &["a", "b"]));
        notification.validate(|| failing("second", &["c"]));
        notification.validate(|| Ok::<_, ValidationError>(42));

        let messages: Vec<_> = notification
            .errors()
            .iter()
            .map(|error| error.message.as_str())
            .collect();
        assert_eq!(messages, vec!["a", "b", "c"]);
    }

    #[test]
    fn validate_returns_value_on_success() {
        let mut notification = Notification::new();
        let value = notification.validate(|| Ok::<_, ValidationError>("ok"));
        assert_eq!(value, Some("ok"));
        assert!(!notification.has_errors());
    }

    #[test]
    fn validate_with_records_foreign_error_message() {
        let mut notification = Notification::new();
        let value: Option<()> = notification.validate_with(|| Err("connection reset"));
        assert!(value.is_none());
        assert_eq!(
            notification.first_error(),
            Some(&FieldError::new("connection reset"))
        );
    }

    #[test]
    fn duplicates_are_kept() {
        let mut notification = Notification::new();
        notification.append(FieldError::new("same"));
        notification.append(FieldError::new("same"));
        let mut other = Notification::new();
        other.append(FieldError::new("same"));
        notification.append_all(&other);
        assert_eq!(notification.errors().len(), 3);
    }

    #[test]
    fn into_result_is_ok_without_errors() {
        assert!(Notification::new().into_result("unused").is_ok());
    }

    #[test]
    fn validation_error_display_lists_every_error() {
        let err = failing("Failed to create a Book", &["x", "y"]).unwrap_err();
        assert_eq!(err.to_string(), "Failed to create a Book: x; y");
    }

    #[test]
    fn validation_error_is_never_empty() {
        let err = ValidationError::new("Invalid loan", Vec::new());
        assert_eq!(err.errors().len(), 1);
        assert_eq!(err.first_error().message, "Invalid loan");
    }
}
