//! Color theme preference, kept in the same durable storage as the session.

use std::fmt;
use std::str::FromStr;

use crate::models::ValidationError;
use crate::storage::{Storage, StorageError, THEME_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Stored theme, `Light` when unset or unrecognized
    pub fn load(storage: &impl Storage) -> Result<Self, StorageError> {
        Ok(storage
            .get_item(THEME_KEY)?
            .and_then(|value| value.parse().ok())
            .unwrap_or_default())
    }

    pub fn save(&self, storage: &mut impl Storage) -> Result<(), StorageError> {
        storage.set_item(THEME_KEY, self.as_str())
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(ValidationError::UnknownValue {
                field: "theme",
                value: s.to_string(),
            }),
        }
    }
}
