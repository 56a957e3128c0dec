//! Access gate.
//!
//! Decides, on every navigation, whether a route renders or where to redirect.
//! The decision reads the session store each time it is asked, so a credential
//! that expires mid-session takes effect on the next navigation.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::errors::ClientResult;
use crate::models::{LoginResponse, Role};
use crate::session::{Session, SessionManager};

pub const LOGIN_PATH: &str = "/login";
pub const LANDING_PATH: &str = "/dashboard";

/// Console screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    Media,
    MediaDetail(String),
    Maccms,
    Users,
    Settings,
}

impl Route {
    /// Parse a path. Unknown paths yield `None`.
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            ["login"] => Some(Route::Login),
            [] | ["dashboard"] => Some(Route::Dashboard),
            ["media"] => Some(Route::Media),
            ["media", id] => Some(Route::MediaDetail((*id).to_string())),
            ["maccms"] => Some(Route::Maccms),
            ["users"] => Some(Route::Users),
            ["settings"] => Some(Route::Settings),
            _ => None,
        }
    }

    /// Like `parse`, but unknown paths land on the dashboard.
    pub fn resolve(path: &str) -> Self {
        Self::parse(path).unwrap_or(Route::Dashboard)
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => LOGIN_PATH.to_string(),
            Route::Dashboard => LANDING_PATH.to_string(),
            Route::Media => "/media".to_string(),
            Route::MediaDetail(id) => format!("/media/{}", id),
            Route::Maccms => "/maccms".to_string(),
            Route::Users => "/users".to_string(),
            Route::Settings => "/settings".to_string(),
        }
    }

    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::Login)
    }

    pub fn admin_only(&self) -> bool {
        matches!(self, Route::Users | Route::Settings)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Outcome of a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Render(Route),
    RedirectToLogin,
    RedirectToDashboard,
}

impl Decision {
    /// Path the console ends up on.
    pub fn target_path(&self) -> String {
        match self {
            Decision::Render(route) => route.path(),
            Decision::RedirectToLogin => LOGIN_PATH.to_string(),
            Decision::RedirectToDashboard => LANDING_PATH.to_string(),
        }
    }
}

/// Pure gate decision. `role` is only consulted when authenticated.
pub fn decide(authenticated: bool, role: Option<Role>, route: &Route) -> Decision {
    if !authenticated {
        return if route.requires_auth() {
            Decision::RedirectToLogin
        } else {
            Decision::Render(route.clone())
        };
    }
    if *route == Route::Login {
        return Decision::RedirectToDashboard;
    }
    if route.admin_only() && role != Some(Role::Admin) {
        return Decision::RedirectToDashboard;
    }
    Decision::Render(route.clone())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Checking,
    Authenticated,
    Unauthenticated,
}

#[derive(Debug)]
pub struct AccessGate {
    sessions: Arc<SessionManager>,
    state: GateState,
}

impl AccessGate {
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self {
            sessions,
            state: GateState::Checking,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Leave `Checking` based on the stored session.
    pub async fn mount(&mut self) -> GateState {
        self.state = if self.sessions.is_authenticated().await {
            GateState::Authenticated
        } else {
            GateState::Unauthenticated
        };
        tracing::debug!("Gate mounted: {:?}", self.state);
        self.state
    }

    pub async fn navigate(&mut self, path: &str) -> Decision {
        self.navigate_at(path, Utc::now()).await
    }

    /// Gate `path` against the session as it stands at `now`.
    pub async fn navigate_at(&mut self, path: &str, now: DateTime<Utc>) -> Decision {
        let session = self.sessions.session_at(now).await;
        self.settle(session.as_ref());

        let route = Route::resolve(path);
        let role = session.as_ref().map(|s| s.profile.role);
        let decision = decide(session.is_some(), role, &route);
        match &decision {
            Decision::Render(route) => tracing::debug!("Render {}", route),
            redirect => tracing::info!("Redirect {} -> {}", path, redirect.target_path()),
        }
        decision
    }

    fn settle(&mut self, session: Option<&Session>) {
        let next = if session.is_some() {
            GateState::Authenticated
        } else {
            GateState::Unauthenticated
        };
        if self.state == GateState::Authenticated && next == GateState::Unauthenticated {
            tracing::info!("Session no longer valid");
        }
        self.state = next;
    }

    /// Store the session from a successful login.
    pub async fn complete_login(&mut self, response: &LoginResponse) -> ClientResult<Decision> {
        self.sessions
            .set_session(&response.token, &response.user)
            .await?;
        self.state = GateState::Authenticated;
        tracing::info!("Signed in as {}", response.user.username);
        Ok(Decision::RedirectToDashboard)
    }

    /// Clear the session from any state and send the console to the login page.
    pub async fn logout(&mut self) -> Decision {
        self.sessions.clear_session().await;
        self.state = GateState::Unauthenticated;
        Decision::RedirectToLogin
    }
}
