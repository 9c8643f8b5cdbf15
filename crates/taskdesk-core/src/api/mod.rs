//! REST API client module for the tasks/notes backend.
//!
//! This module provides the `ApiClient` for registering, signing in,
//! reading the current profile and managing tasks and notes.
//!
//! The API uses bearer token authentication; the token is obtained from
//! `POST /auth/login` and kept by the session manager.

pub mod client;
pub mod error;

pub use client::{ApiClient, TokenResponse};
pub use error::ApiError;
