//! Durable key/value storage for client-side state.
//!
//! The session manager mirrors every session transition into a `Storage`
//! so it survives process restarts. Reading a key that was never written
//! yields `Ok(None)`, not an error.
//!
//! Backends:
//! - `FileStorage`: a single JSON document on disk (default)
//! - `KeyringStorage`: one OS keychain entry per key
//! - `MemoryStorage`: process-local, used for tests and `--ephemeral` runs

pub mod file;
pub mod keychain;
pub mod memory;

use thiserror::Error;

pub use file::FileStorage;
pub use keychain::KeyringStorage;
pub use memory::MemoryStorage;

/// Key holding the bearer credential
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Key holding the JSON-serialized user profile
pub const USER_KEY: &str = "user";

/// Key holding the selected color theme
pub const THEME_KEY: &str = "theme";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage document is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keychain(#[from] keyring::Error),

    #[error("No persistent keychain is available on this system")]
    KeychainUnavailable,
}

/// A string-keyed, string-valued durable store.
pub trait Storage {
    /// Read a value. Absent keys are `Ok(None)`.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value. Removing an absent key succeeds.
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }
}
