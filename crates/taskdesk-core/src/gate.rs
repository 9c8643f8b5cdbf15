//! Route protection.
//!
//! Protected views render only for a restored session. While restoration
//! is in flight nothing but a placeholder is shown; once it resolves
//! without a profile the caller is sent to the login view.

use std::fmt;

use crate::auth::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Register,
    Dashboard,
    Tasks,
    Notes,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Dashboard => "/dashboard",
            Route::Tasks => "/tasks",
            Route::Notes => "/notes",
        }
    }

    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Dashboard | Route::Tasks | Route::Notes)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Render,
    /// Restoration still running; show nothing yet
    Placeholder,
    RedirectToLogin,
}

pub fn gate(route: Route, state: &SessionState) -> GateDecision {
    if !route.is_protected() {
        return GateDecision::Render;
    }
    match state {
        SessionState::Loading => GateDecision::Placeholder,
        SessionState::LoggedOut => GateDecision::RedirectToLogin,
        SessionState::Active(_) => GateDecision::Render,
    }
}
