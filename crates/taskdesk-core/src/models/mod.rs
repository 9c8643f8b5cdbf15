//! Data models for the tasks/notes backend.
//!
//! - `Profile`, `UserId`, `Role`: the signed-in identity
//! - `Task`, `TaskCreate`, `TaskUpdate`, `TaskStatus`
//! - `Note`, `NoteCreate`, `NoteUpdate`, `NoteVisibility`
//!
//! Create/update payloads validate locally before anything is sent so the
//! obvious mistakes never cost a round trip.

pub mod note;
pub mod task;
pub mod timestamp;
pub mod user;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use note::{parse_recipients, Note, NoteCreate, NoteUpdate, NoteVisibility};
pub use task::{Task, TaskCreate, TaskStatus, TaskUpdate};
pub use user::{Credentials, Profile, Role, UserId};

/// Client-side validation failures for outgoing payloads
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Password must be at least {min} characters long")]
    PasswordTooShort { min: usize },

    #[error("Password must not exceed {max} bytes")]
    PasswordTooLong { max: usize },

    #[error("Shared notes require at least one recipient email")]
    MissingRecipients,

    #[error("Unknown {field}: {value}")]
    UnknownValue { field: &'static str, value: String },
}

/// Plain `{"message": "..."}` acknowledgement returned by mutations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

/// Loose shape check. The server does the real validation.
pub fn is_plausible_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::EmptyField(field))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_plausible_email() {
        assert!(is_plausible_email("a@x.com"));
        assert!(is_plausible_email("first.last@sub.example.org"));

        assert!(!is_plausible_email(""));
        assert!(!is_plausible_email("no-at-sign"));
        assert!(!is_plausible_email("@x.com"));
        assert!(!is_plausible_email("a@localhost"));
        assert!(!is_plausible_email("a@@x.com"));
        assert!(!is_plausible_email("a b@x.com"));
        assert!(!is_plausible_email("a@x.com."));
    }
}
