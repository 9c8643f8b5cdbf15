use thiserror::Error;
use tracing::{error, info, warn};

use crate::api::error::{find_api_error, user_message};
use crate::api::ApiClient;
use crate::models::{Credentials, Profile, ValidationError};
use crate::storage::{Storage, StorageError};

use super::SessionManager;

#[derive(Error, Debug)]
pub enum AuthFlowError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// The server turned the request down; the message is fit for display
    #[error("{0}")]
    Rejected(String),

    #[error("Failed to fetch user data. Please try again.")]
    ProfileUnavailable,

    #[error("Failed to save session: {0}")]
    Storage(#[from] StorageError),
}

/// Sign in with email and password and start a session.
///
/// The token is only persisted once the profile behind it has been fetched,
/// so a failed profile lookup leaves no trace in storage.
pub async fn sign_in<S: Storage>(
    api: &ApiClient,
    session: &mut SessionManager<S>,
    credentials: &Credentials,
) -> Result<Profile, AuthFlowError> {
    credentials.validate_for_login()?;

    let token = match api.login(credentials).await {
        Ok(token) => token,
        Err(e) => {
            error!(error = %e, "Login failed");
            let message = if find_api_error(&e).is_some_and(|api_err| api_err.is_unauthorized()) {
                "Invalid email or password".to_string()
            } else {
                user_message(&e, "Login failed. Please try again.")
            };
            return Err(AuthFlowError::Rejected(message));
        }
    };

    let profile = match api
        .with_token(token.access_token.clone())
        .fetch_current_profile()
        .await
    {
        Ok(profile) => profile,
        Err(e) => {
            warn!(error = %e, "Token issued but profile fetch failed");
            return Err(AuthFlowError::ProfileUnavailable);
        }
    };

    session.login(token.access_token, profile.clone())?;
    info!(user_id = %profile.id, "Login successful");
    Ok(profile)
}

/// Create an account. Does not sign in.
pub async fn register(api: &ApiClient, credentials: &Credentials) -> Result<Profile, AuthFlowError> {
    credentials.validate_for_registration()?;

    match api.register(credentials).await {
        Ok(profile) => {
            info!(user_id = %profile.id, "Account registered");
            Ok(profile)
        }
        Err(e) => {
            error!(error = %e, "Registration failed");
            Err(AuthFlowError::Rejected(user_message(
                &e,
                "Registration failed. Try again.",
            )))
        }
    }
}
