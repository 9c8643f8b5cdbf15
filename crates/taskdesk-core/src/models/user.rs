use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{is_plausible_email, ValidationError};

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_CHARS: usize = 8;

/// Maximum password size in bytes (bcrypt input limit on the server)
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Opaque user identifier.
///
/// The backend sends ids as strings; numeric ids are accepted and kept as
/// their decimal text so comparisons stay exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawUserId")]
pub struct UserId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawUserId {
    Text(String),
    Number(i64),
}

impl From<RawUserId> for UserId {
    fn from(raw: RawUserId) -> Self {
        match raw {
            RawUserId::Text(s) => UserId(s),
            RawUserId::Number(n) => UserId(n.to_string()),
        }
    }
}

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        UserId(s)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// Identity record of the signed-in user, as returned by `GET /users/me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::timestamp::deserialize_option"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn new(id: impl Into<UserId>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            role: Role::default(),
            created_at: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Email/password pair sent to `/auth/login` and `/auth/register`
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: password.into(),
        }
    }

    /// Rules the server applies to new accounts
    pub fn validate_for_registration(&self) -> Result<(), ValidationError> {
        self.validate_for_login()?;
        if self.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(ValidationError::PasswordTooShort {
                min: MIN_PASSWORD_CHARS,
            });
        }
        if self.password.len() > MAX_PASSWORD_BYTES {
            return Err(ValidationError::PasswordTooLong {
                max: MAX_PASSWORD_BYTES,
            });
        }
        Ok(())
    }

    pub fn validate_for_login(&self) -> Result<(), ValidationError> {
        if self.email.is_empty() {
            return Err(ValidationError::EmptyField("Email"));
        }
        if !is_plausible_email(&self.email) {
            return Err(ValidationError::InvalidEmail(self.email.clone()));
        }
        if self.password.is_empty() {
            return Err(ValidationError::EmptyField("Password"));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
