//! Authentication module for managing the client session.
//!
//! This module provides:
//! - `SessionManager`: owns the credential + profile pair and keeps it in
//!   durable storage across restarts
//! - `sign_in` / `register`: the account flows that feed it
//!
//! A restored session trusts its cached profile; the credential is only
//! re-checked when no readable profile is cached.

pub mod session;
pub mod sign_in;

pub use session::{ActiveSession, ProfileFetcher, RestoreOutcome, SessionManager, SessionState};
pub use sign_in::{register, sign_in, AuthFlowError};
