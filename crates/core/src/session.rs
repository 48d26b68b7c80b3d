//! Shopper session shared by the components that need it.
//!
//! All writes go through [`SessionContext`]; readers either take a
//! [`snapshot`](SessionContext::snapshot) or [`subscribe`](SessionContext::subscribe)
//! to be told about logins, logouts and city changes.

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::info;

use crate::domain::cart::UserId;

pub const DEFAULT_CITY: &str = "London";

#[derive(Clone, Debug)]
pub struct Session {
    pub user_id: UserId,
    pub display_name: String,
    pub token: SecretString,
    pub city: Option<String>,
}

impl Session {
    pub fn new(user_id: UserId, display_name: impl Into<String>, token: SecretString) -> Self {
        Self { user_id, display_name: display_name.into(), token, city: None }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }
}

#[derive(Debug)]
pub struct SessionContext {
    state: watch::Sender<Option<Session>>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self { state }
    }

    pub fn login(&self, session: Session) {
        info!(
            event_name = "session.login",
            user_id = %session.user_id,
            "shopper session started"
        );
        self.state.send_replace(Some(session));
    }

    pub fn logout(&self) {
        if let Some(previous) = self.state.send_replace(None) {
            info!(event_name = "session.logout", user_id = %previous.user_id, "shopper session ended");
        }
    }

    /// Updates the preferred city; returns `false` when nobody is logged in.
    pub fn set_city(&self, city: impl Into<String>) -> bool {
        let city = city.into();
        self.state.send_if_modified(|state| match state {
            Some(session) if session.city.as_deref() != Some(city.as_str()) => {
                session.city = Some(city.clone());
                true
            }
            _ => false,
        });
        self.state.borrow().is_some()
    }

    pub fn snapshot(&self) -> Option<Session> {
        self.state.borrow().clone()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.state.borrow().as_ref().map(|session| session.user_id.clone())
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Preferred city, falling back to [`DEFAULT_CITY`].
    pub fn city(&self) -> String {
        self.state
            .borrow()
            .as_ref()
            .and_then(|session| session.city.clone())
            .unwrap_or_else(|| DEFAULT_CITY.to_string())
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.state.subscribe()
    }
}
