use std::fmt;
use std::future::Future;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::models::Profile;
use crate::storage::{Storage, StorageError, ACCESS_TOKEN_KEY, USER_KEY};

/// Source of the current user's profile for a given credential.
///
/// `ApiClient` implements this with `GET /users/me`; any error means the
/// credential cannot be trusted.
pub trait ProfileFetcher {
    fn fetch_profile(&self, credential: &str) -> impl Future<Output = Result<Profile>> + Send;
}

impl ProfileFetcher for ApiClient {
    async fn fetch_profile(&self, credential: &str) -> Result<Profile> {
        self.with_token(credential.to_string())
            .fetch_current_profile()
            .await
    }
}

/// A signed-in session: a credential and the profile it belongs to
#[derive(Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub credential: String,
    pub profile: Profile,
}

impl fmt::Debug for ActiveSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveSession")
            .field("credential", &"<redacted>")
            .field("profile", &self.profile)
            .finish()
    }
}

/// Session lifecycle. A profile only ever exists together with its credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Restoration has not resolved yet
    Loading,
    LoggedOut,
    Active(ActiveSession),
}

/// Which path `SessionManager::restore` took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// No credential stored. No network call was made.
    NoCredential,
    /// Credential and a readable cached profile. No network call was made.
    FromCache,
    /// Profile fetched from the server and cached
    Fetched { discarded_cache: bool },
    /// Profile could not be obtained; credential and profile were cleared
    Cleared { discarded_cache: bool },
}

impl RestoreOutcome {
    pub fn is_restored(&self) -> bool {
        matches!(self, RestoreOutcome::FromCache | RestoreOutcome::Fetched { .. })
    }
}

/// Owns the client session and mirrors it into durable storage.
///
/// Created once per process and handed to whatever needs the current user.
/// It is the only writer of the `access_token` and `user` keys.
pub struct SessionManager<S: Storage> {
    storage: S,
    state: SessionState,
}

impl<S: Storage> SessionManager<S> {
    /// New manager in the `Loading` state. Call `restore` next.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            state: SessionState::Loading,
        }
    }

    /// Rebuild the session from storage.
    ///
    /// A cached profile is trusted without contacting the server. When only
    /// the credential is stored (or the cached profile is unreadable) the
    /// profile is fetched; if that fails both keys are removed. The state
    /// leaves `Loading` once, after all of this has resolved.
    pub async fn restore<F: ProfileFetcher>(&mut self, fetcher: &F) -> RestoreOutcome {
        self.state = SessionState::Loading;
        let (state, outcome) = self.resolve(fetcher).await;
        self.state = state;
        info!(?outcome, "Session restoration finished");
        outcome
    }

    async fn resolve<F: ProfileFetcher>(&mut self, fetcher: &F) -> (SessionState, RestoreOutcome) {
        let credential = match self.read(ACCESS_TOKEN_KEY) {
            Some(credential) if !credential.is_empty() => credential,
            _ => {
                debug!("No stored credential");
                return (SessionState::LoggedOut, RestoreOutcome::NoCredential);
            }
        };

        let mut discarded_cache = false;
        if let Some(cached) = self.read(USER_KEY) {
            match serde_json::from_str::<Profile>(&cached) {
                Ok(profile) => {
                    debug!(user_id = %profile.id, "Restored session from cached profile");
                    return (
                        SessionState::Active(ActiveSession { credential, profile }),
                        RestoreOutcome::FromCache,
                    );
                }
                Err(e) => {
                    warn!(error = %e, "Cached profile is corrupted, discarding it");
                    if let Err(e) = self.storage.remove_item(USER_KEY) {
                        warn!(error = %e, "Failed to remove corrupted profile");
                    }
                    discarded_cache = true;
                }
            }
        }

        match fetcher.fetch_profile(&credential).await {
            Ok(profile) => match self.write_profile(&profile) {
                Ok(()) => {
                    debug!(user_id = %profile.id, "Fetched profile for stored credential");
                    (
                        SessionState::Active(ActiveSession { credential, profile }),
                        RestoreOutcome::Fetched { discarded_cache },
                    )
                }
                Err(e) => {
                    warn!(error = %e, "Failed to cache fetched profile, ending session");
                    self.clear_storage();
                    (SessionState::LoggedOut, RestoreOutcome::Cleared { discarded_cache })
                }
            },
            Err(e) => {
                warn!(error = %e, "Stored credential rejected, ending session");
                self.clear_storage();
                (SessionState::LoggedOut, RestoreOutcome::Cleared { discarded_cache })
            }
        }
    }

    /// Start a session with a credential and profile obtained elsewhere.
    ///
    /// Nothing is validated here. If storage refuses the write, whatever was
    /// partly written is removed, the session is left logged out and the
    /// storage error is returned.
    pub fn login(&mut self, credential: impl Into<String>, profile: Profile) -> Result<(), StorageError> {
        let credential = credential.into();
        let written = serde_json::to_string(&profile)
            .map_err(StorageError::from)
            .and_then(|serialized| {
                self.storage.set_item(ACCESS_TOKEN_KEY, &credential)?;
                self.storage.set_item(USER_KEY, &serialized)
            });

        if let Err(e) = written {
            warn!(error = %e, "Failed to persist session");
            self.clear_storage();
            self.state = SessionState::LoggedOut;
            return Err(e);
        }

        info!(user_id = %profile.id, "Session established");
        self.state = SessionState::Active(ActiveSession { credential, profile });
        Ok(())
    }

    /// End the session. Safe to call when already logged out.
    pub fn logout(&mut self) {
        if matches!(self.state, SessionState::Active(_)) {
            info!("Session ended");
        }
        self.clear_storage();
        self.state = SessionState::LoggedOut;
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, SessionState::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    pub fn profile(&self) -> Option<&Profile> {
        match self.state {
            SessionState::Active(ref active) => Some(&active.profile),
            _ => None,
        }
    }

    pub fn credential(&self) -> Option<&str> {
        match self.state {
            SessionState::Active(ref active) => Some(active.credential.as_str()),
            _ => None,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Shared storage for keys other than the session's own
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.storage.get_item(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to read storage, treating as absent");
                None
            }
        }
    }

    fn write_profile(&mut self, profile: &Profile) -> Result<(), StorageError> {
        let serialized = serde_json::to_string(profile)?;
        self.storage.set_item(USER_KEY, &serialized)
    }

    fn clear_storage(&mut self) {
        for key in [ACCESS_TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove_item(key) {
                warn!(key, error = %e, "Failed to clear session key");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserId;
    use crate::storage::MemoryStorage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Answers with a fixed profile, or fails when there is none
    struct FakeFetcher {
        profile: Option<Profile>,
        calls: AtomicUsize,
        last_credential: Mutex<Option<String>>,
    }

    impl FakeFetcher {
        fn returning(profile: Profile) -> Self {
            Self {
                profile: Some(profile),
                calls: AtomicUsize::new(0),
                last_credential: Mutex::new(None),
            }
        }

        fn failing() -> Self {
            Self {
                profile: None,
                calls: AtomicUsize::new(0),
                last_credential: Mutex::new(None),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ProfileFetcher for FakeFetcher {
        async fn fetch_profile(&self, credential: &str) -> Result<Profile> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_credential.lock().unwrap() = Some(credential.to_string());
            self.profile
                .clone()
                .ok_or_else(|| crate::api::ApiError::Unauthorized.into())
        }
    }

    /// Refuses writes to one key
    struct ReadOnlyKey {
        inner: MemoryStorage,
        blocked: &'static str,
    }

    impl Storage for ReadOnlyKey {
        fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get_item(key)
        }

        fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            if key == self.blocked {
                return Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into());
            }
            self.inner.set_item(key, value)
        }

        fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
            self.inner.remove_item(key)
        }
    }

    fn alice() -> Profile {
        Profile::new("1", "a@x.com")
    }

    fn stored(manager: &SessionManager<MemoryStorage>, key: &str) -> Option<String> {
        manager.storage().get_item(key).unwrap()
    }

    #[test]
    fn test_new_manager_is_loading() {
        let manager = SessionManager::new(MemoryStorage::new());
        assert!(manager.is_loading());
        assert!(manager.profile().is_none());
        assert!(manager.credential().is_none());
    }

    #[tokio::test]
    async fn test_restore_without_credential_skips_network() {
        let fetcher = FakeFetcher::returning(alice());
        let mut manager = SessionManager::new(MemoryStorage::new());

        let outcome = manager.restore(&fetcher).await;

        assert_eq!(outcome, RestoreOutcome::NoCredential);
        assert_eq!(manager.state(), &SessionState::LoggedOut);
        assert!(!manager.is_loading());
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_restore_ignores_profile_without_credential() {
        let cached = serde_json::to_string(&alice()).unwrap();
        let fetcher = FakeFetcher::returning(alice());
        let mut manager = SessionManager::new(MemoryStorage::with_items([(USER_KEY, cached)]));

        let outcome = manager.restore(&fetcher).await;

        assert_eq!(outcome, RestoreOutcome::NoCredential);
        assert!(manager.profile().is_none());
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_restore_treats_empty_credential_as_absent() {
        let fetcher = FakeFetcher::returning(alice());
        let mut manager = SessionManager::new(MemoryStorage::with_items([(ACCESS_TOKEN_KEY, "")]));

        assert_eq!(manager.restore(&fetcher).await, RestoreOutcome::NoCredential);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_restore_trusts_cached_profile() {
        let cached = serde_json::to_string(&alice()).unwrap();
        let fetcher = FakeFetcher::failing();
        let mut manager = SessionManager::new(MemoryStorage::with_items([
            (ACCESS_TOKEN_KEY, "abc".to_string()),
            (USER_KEY, cached),
        ]));

        let outcome = manager.restore(&fetcher).await;

        assert_eq!(outcome, RestoreOutcome::FromCache);
        assert_eq!(manager.profile(), Some(&alice()));
        assert_eq!(manager.credential(), Some("abc"));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_restore_fetches_when_profile_missing() {
        let fetcher = FakeFetcher::returning(alice());
        let mut manager = SessionManager::new(MemoryStorage::with_items([(ACCESS_TOKEN_KEY, "abc")]));

        let outcome = manager.restore(&fetcher).await;

        assert_eq!(outcome, RestoreOutcome::Fetched { discarded_cache: false });
        assert!(manager.is_authenticated());
        assert_eq!(manager.profile().map(|p| &p.id), Some(&UserId::from("1")));
        assert_eq!(fetcher.last_credential.lock().unwrap().as_deref(), Some("abc"));

        let cached: Profile = serde_json::from_str(&stored(&manager, USER_KEY).unwrap()).unwrap();
        assert_eq!(cached, alice());
    }

    #[tokio::test]
    async fn test_restore_discards_corrupted_profile_and_fetches() {
        let fetcher = FakeFetcher::returning(alice());
        let mut manager = SessionManager::new(MemoryStorage::with_items([
            (ACCESS_TOKEN_KEY, "abc"),
            (USER_KEY, "{not json"),
        ]));

        let outcome = manager.restore(&fetcher).await;

        assert_eq!(outcome, RestoreOutcome::Fetched { discarded_cache: true });
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(manager.profile(), Some(&alice()));
        assert_eq!(stored(&manager, ACCESS_TOKEN_KEY).as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_restore_discards_null_profile() {
        let fetcher = FakeFetcher::returning(alice());
        let mut manager = SessionManager::new(MemoryStorage::with_items([
            (ACCESS_TOKEN_KEY, "abc"),
            (USER_KEY, "null"),
        ]));

        let outcome = manager.restore(&fetcher).await;

        assert_eq!(outcome, RestoreOutcome::Fetched { discarded_cache: true });
        assert!(manager.is_authenticated());
    }

    #[tokio::test]
    async fn test_restore_clears_everything_when_fetch_fails() {
        let fetcher = FakeFetcher::failing();
        let mut manager = SessionManager::new(MemoryStorage::with_items([
            (ACCESS_TOKEN_KEY, "expired"),
            (USER_KEY, "{not json"),
        ]));

        let outcome = manager.restore(&fetcher).await;

        assert_eq!(outcome, RestoreOutcome::Cleared { discarded_cache: true });
        assert_eq!(manager.state(), &SessionState::LoggedOut);
        assert!(manager.storage().is_empty());
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_restore_clears_when_profile_cannot_be_cached() {
        let fetcher = FakeFetcher::returning(alice());
        let storage = ReadOnlyKey {
            inner: MemoryStorage::with_items([(ACCESS_TOKEN_KEY, "abc")]),
            blocked: USER_KEY,
        };
        let mut manager = SessionManager::new(storage);

        let outcome = manager.restore(&fetcher).await;

        assert_eq!(outcome, RestoreOutcome::Cleared { discarded_cache: false });
        assert!(!manager.is_authenticated());
        assert!(manager.storage().inner.is_empty());
    }

    #[tokio::test]
    async fn test_login_then_reload_restores_same_profile() {
        let mut manager = SessionManager::new(MemoryStorage::new());
        manager.login("abc", alice()).unwrap();
        assert!(manager.is_authenticated());

        // A fresh process over the same storage
        let fetcher = FakeFetcher::failing();
        let mut reloaded = SessionManager::new(manager.storage().clone());
        let outcome = reloaded.restore(&fetcher).await;

        assert_eq!(outcome, RestoreOutcome::FromCache);
        assert_eq!(reloaded.profile(), Some(&alice()));
        assert_eq!(reloaded.credential(), Some("abc"));
        assert_eq!(fetcher.calls(), 0);
    }

    #[test]
    fn test_login_replaces_previous_session() {
        let mut manager = SessionManager::new(MemoryStorage::new());
        manager.login("first", alice()).unwrap();
        manager.login("second", Profile::new("2", "b@x.com")).unwrap();

        assert_eq!(manager.credential(), Some("second"));
        assert_eq!(stored(&manager, ACCESS_TOKEN_KEY).as_deref(), Some("second"));
        let cached: Profile = serde_json::from_str(&stored(&manager, USER_KEY).unwrap()).unwrap();
        assert_eq!(cached.email, "b@x.com");
    }

    #[test]
    fn test_login_storage_failure_leaves_logged_out() {
        let storage = ReadOnlyKey {
            inner: MemoryStorage::new(),
            blocked: USER_KEY,
        };
        let mut manager = SessionManager::new(storage);

        assert!(manager.login("abc", alice()).is_err());
        assert_eq!(manager.state(), &SessionState::LoggedOut);
        // The credential written before the failure was rolled back
        assert!(manager.storage().inner.is_empty());
    }

    #[test]
    fn test_logout_clears_storage_and_memory() {
        let mut manager = SessionManager::new(MemoryStorage::with_items([("theme", "dark")]));
        manager.login("abc", alice()).unwrap();

        manager.logout();

        assert_eq!(manager.state(), &SessionState::LoggedOut);
        assert_eq!(stored(&manager, ACCESS_TOKEN_KEY), None);
        assert_eq!(stored(&manager, USER_KEY), None);
        assert_eq!(stored(&manager, "theme").as_deref(), Some("dark"));
    }

    #[test]
    fn test_logout_is_idempotent() {
        let mut manager = SessionManager::new(MemoryStorage::new());
        manager.logout();
        manager.logout();
        assert_eq!(manager.state(), &SessionState::LoggedOut);
        assert!(manager.storage().is_empty());
    }

    #[test]
    fn test_active_session_debug_hides_credential() {
        let active = ActiveSession {
            credential: "super-secret-token".into(),
            profile: alice(),
        };
        assert!(!format!("{:?}", active).contains("super-secret-token"));
    }
}
