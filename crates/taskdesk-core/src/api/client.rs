//! API client for the tasks/notes REST API.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! API requests against the backend's `/auth`, `/users`, `/tasks` and
//! `/notes` endpoints.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{
    Credentials, MessageResponse, Note, NoteCreate, NoteUpdate, Profile, Task, TaskCreate,
    TaskStatus, TaskUpdate,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Response of `POST /auth/login`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// API client for the tasks/notes backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    initial_backoff: Duration,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url` (e.g. `http://localhost:8000/api/v1`)
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
            initial_backoff: self.initial_backoff,
        }
    }

    /// Override the first rate-limit backoff delay (doubles on each retry)
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, url: &str) -> Result<RequestBuilder> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))
                    .context("Bearer token contains invalid header characters")?,
            );
        }
        Ok(self.client.request(method, url).headers(headers))
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: Response) -> Result<Option<Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Send a request, retrying with exponential backoff while rate limited
    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response> {
        let mut retries = 0;
        let mut backoff = self.initial_backoff;

        loop {
            let attempt = request
                .try_clone()
                .ok_or_else(|| anyhow::anyhow!("Request to {} cannot be retried", url))?;

            let response = attempt
                .send()
                .await
                .map_err(ApiError::from)
                .with_context(|| format!("Failed to send request to {}", url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => return Ok(response),
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = url, retry = retries, backoff_ms = backoff.as_millis() as u64, "Rate limited, backing off");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let response = self.send(self.request(Method::GET, &url)?, &url).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    async fn send_json<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(path);
        let request = self.request(method, &url)?.json(body);
        let response = self.send(request, &url).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        self.send(self.request(Method::DELETE, &url)?, &url).await?;
        Ok(())
    }

    // ===== Authentication =====

    /// Create a new account. Returns the created user's profile.
    pub async fn register(&self, credentials: &Credentials) -> Result<Profile> {
        debug!(email = %credentials.email, "Registering account");
        self.send_json(Method::POST, "/auth/register", credentials).await
    }

    /// Exchange email/password for a bearer token
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenResponse> {
        debug!(email = %credentials.email, "Requesting access token");
        self.send_json(Method::POST, "/auth/login", credentials).await
    }

    /// Fetch the profile of the user the current token belongs to
    pub async fn fetch_current_profile(&self) -> Result<Profile> {
        self.get("/users/me").await
    }

    // ===== Tasks =====

    /// List tasks visible to the current user, optionally filtered by status
    pub async fn list_tasks(&self, status: Option<TaskStatus>) -> Result<Vec<Task>> {
        let path = match status {
            Some(status) => format!("/tasks?status={}", status.as_str()),
            None => "/tasks".to_string(),
        };
        let tasks: Vec<Task> = self.get(&path).await?;
        debug!(count = tasks.len(), ?status, "Fetched tasks");
        Ok(tasks)
    }

    pub async fn create_task(&self, task: &TaskCreate) -> Result<MessageResponse> {
        self.send_json(Method::POST, "/tasks", task).await
    }

    pub async fn update_task(&self, task_id: &str, update: &TaskUpdate) -> Result<MessageResponse> {
        self.send_json(Method::PATCH, &format!("/tasks/{}", task_id), update)
            .await
    }

    pub async fn delete_task(&self, task_id: &str) -> Result<()> {
        self.delete(&format!("/tasks/{}", task_id)).await
    }

    // ===== Notes =====

    /// List notes the current user owns, public notes and notes shared with them
    pub async fn list_notes(&self) -> Result<Vec<Note>> {
        let notes: Vec<Note> = self.get("/notes").await?;
        debug!(count = notes.len(), "Fetched notes");
        Ok(notes)
    }

    pub async fn create_note(&self, note: &NoteCreate) -> Result<Note> {
        self.send_json(Method::POST, "/notes", note).await
    }

    pub async fn update_note(&self, note_id: &str, update: &NoteUpdate) -> Result<MessageResponse> {
        self.send_json(Method::PATCH, &format!("/notes/{}", note_id), update)
            .await
    }

    pub async fn delete_note(&self, note_id: &str) -> Result<()> {
        self.delete(&format!("/notes/{}", note_id)).await
    }
}
