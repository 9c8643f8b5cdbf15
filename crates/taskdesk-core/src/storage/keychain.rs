use keyring::credential::{CredentialBuilderApi, CredentialPersistence};
use keyring::Entry;
use tracing::debug;

use super::{Storage, StorageError};

/// Default keychain service name
const SERVICE_NAME: &str = "taskdesk";

/// Storage backed by the OS keychain, one entry per key.
///
/// Keeps the bearer credential out of plain files. Values are small
/// (a token, a profile document, a theme name), well within keychain limits.
pub struct KeyringStorage {
    service: String,
}

impl KeyringStorage {
    /// Open the keychain under the default service name.
    ///
    /// Fails with `KeychainUnavailable` when the only store keyring can build
    /// on this platform forgets values once the process exits.
    pub fn open() -> Result<Self, StorageError> {
        Self::open_with_service(SERVICE_NAME)
    }

    pub fn open_with_service(service: impl Into<String>) -> Result<Self, StorageError> {
        if !keychain_persists() {
            return Err(StorageError::KeychainUnavailable);
        }
        Ok(Self {
            service: service.into(),
        })
    }

    fn entry(&self, key: &str) -> Result<Entry, StorageError> {
        Ok(Entry::new(&self.service, key)?)
    }
}

/// Whether the platform's default credential store outlives the process
pub fn keychain_persists() -> bool {
    let persistence = keyring::default::default_credential_builder().persistence();
    !matches!(
        persistence,
        CredentialPersistence::EntryOnly | CredentialPersistence::ProcessOnly
    )
}

impl Storage for KeyringStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entry(key)?.set_password(value)?;
        debug!(service = %self.service, key, "Stored keychain entry");
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
