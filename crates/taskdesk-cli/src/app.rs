//! Application context shared by every command.
//!
//! `App` owns the configuration, the API client and the one
//! `SessionManager` of the process. Commands borrow it; nothing reaches the
//! session through globals.

use anyhow::{bail, Result};
use tracing::{debug, warn};

use taskdesk_core::api::error::{find_api_error, user_message};
use taskdesk_core::gate::{gate, GateDecision, Route};
use taskdesk_core::models::Profile;
use taskdesk_core::{ApiClient, Config, MemoryStorage, RestoreOutcome, SessionManager, Storage};

/// Shown when a protected command runs without a session
pub const NOT_SIGNED_IN: &str = "Not logged in. Run `taskdesk login` first.";

/// Shown when the server rejects a credential that restored from cache
pub const SESSION_EXPIRED: &str = "Session expired. Please log in again.";

pub struct App {
    pub config: Config,
    pub api: ApiClient,
    pub session: SessionManager<Box<dyn Storage>>,
    pub json: bool,
    ephemeral: bool,
}

impl App {
    pub fn new(config: Config, api_url: Option<String>, ephemeral: bool, json: bool) -> Result<Self> {
        let base_url = config.api_base_url(api_url);
        debug!(%base_url, ephemeral, "Configuring API client");
        let api = ApiClient::new(base_url)?;

        let storage: Box<dyn Storage> = if ephemeral {
            Box::new(MemoryStorage::new())
        } else {
            config.open_storage()?
        };

        Ok(Self {
            config,
            api,
            session: SessionManager::new(storage),
            json,
            ephemeral,
        })
    }

    pub async fn restore_session(&mut self) -> RestoreOutcome {
        self.session.restore(&self.api).await
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.session.profile()
    }

    /// API client carrying the session's credential, if the route gate lets
    /// `route` through
    pub fn authorized_api(&self, route: Route) -> Result<ApiClient> {
        match gate(route, self.session.state()) {
            GateDecision::Render => match self.session.credential() {
                Some(credential) => Ok(self.api.with_token(credential.to_string())),
                None => Ok(self.api.clone()),
            },
            GateDecision::RedirectToLogin => bail!(NOT_SIGNED_IN),
            GateDecision::Placeholder => bail!("Session is still being restored"),
        }
    }

    /// Turn a failed API call into the error shown to the user.
    ///
    /// A 401 means the credential is no longer accepted, so the session is
    /// ended before reporting.
    pub fn api_failure(&mut self, err: anyhow::Error, fallback: &str) -> anyhow::Error {
        if find_api_error(&err).is_some_and(|api_err| api_err.is_unauthorized()) {
            warn!(error = %err, "Credential rejected by server, logging out");
            self.session.logout();
            return anyhow::anyhow!(SESSION_EXPIRED);
        }
        warn!(error = %err, "API call failed");
        anyhow::anyhow!(user_message(&err, fallback))
    }

    /// Remember the email for the next login prompt
    pub fn remember_email(&mut self, email: &str) {
        if self.ephemeral || self.config.last_email.as_deref() == Some(email) {
            return;
        }
        self.config.last_email = Some(email.to_string());
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }
}
