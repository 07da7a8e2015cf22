//! Customer aggregate.

use crate::model::runtime::IdGenerator;
use crate::validation::{is_blank, require_not_blank, FieldError, Notification, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+)@(.+)$").expect("valid email regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    id: String,
    name: String,
    email: String,
}

impl Customer {
    /// Creates a new customer with a generated id.
    pub fn create(
        ids: &dyn IdGenerator,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let id = ids.next_id();
        Self::checked(Some(id.as_str()), name, email)
    }

    /// Rebuilds a stored customer.
    pub fn restore(id: &str, name: &str, email: &str) -> Result<Self, ValidationError> {
        Self::checked(Some(id), Some(name), Some(email))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    fn checked(
        id: Option<&str>,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let mut notification = Notification::new();
        check_fields(&mut notification, id, name, email);
        notification.into_result("Failed to create a Customer")?;

        Ok(Self {
            id: id.unwrap_or_default().to_string(),
            name: name.unwrap_or_default().to_string(),
            email: email.unwrap_or_default().to_string(),
        })
    }
}

/// Returns whether `value` has the `local@domain` shape accepted for emails.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

fn check_fields(
    notification: &mut Notification,
    id: Option<&str>,
    name: Option<&str>,
    email: Option<&str>,
) {
    require_not_blank(notification, "id", id);
    require_not_blank(notification, "name", name);
    if is_blank(email) || !email.is_some_and(is_valid_email) {
        notification.append(FieldError::new("'email' should have a valid format"));
    }
}

#[cfg(test)]
mod tests {
    use super::is_valid_email;

    #[test]
    fn email_shape_requires_at_sign_with_both_sides() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("a@b"));
        assert!(!is_valid_email("ada.example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ada@"));
    }
}
