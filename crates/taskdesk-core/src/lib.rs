//! Core library for taskdesk.
//!
//! This crate holds everything the front ends share:
//!
//! - `auth`: the `SessionManager` that owns the signed-in session
//! - `storage`: durable key/value storage backends
//! - `api`: REST client for the tasks/notes backend
//! - `models`: profile, task and note records
//! - `access`: ownership predicates used to decide which actions to offer
//! - `gate`: route protection decisions driven by session state
//! - `config`: application configuration
//! - `theme`: color theme preference

pub mod access;
pub mod api;
pub mod auth;
pub mod config;
pub mod gate;
pub mod models;
pub mod storage;
pub mod theme;

pub use api::{ApiClient, ApiError};
pub use auth::{RestoreOutcome, SessionManager, SessionState};
pub use config::Config;
pub use storage::{FileStorage, KeyringStorage, MemoryStorage, Storage, StorageError};
pub use theme::Theme;
