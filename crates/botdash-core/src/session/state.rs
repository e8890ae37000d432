use serde::Serialize;
use tracing::debug;

use crate::models::User;

/// Coarse session status, for views that only need to gate content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Hydrating,
    Anonymous,
    Authenticated,
}

/// The session. The identity exists only in the authenticated state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Hydrating,
    Anonymous,
    Authenticated(User),
}

/// Inputs to the session state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Startup hydration confirmed the stored credential
    Restored(User),
    /// Login or register succeeded
    SignedIn(User),
    /// Startup hydration found no usable credential
    Cleared,
    /// The user logged out
    SignedOut,
}

impl SessionState {
    pub fn status(&self) -> SessionStatus {
        match self {
            SessionState::Hydrating => SessionStatus::Hydrating,
            SessionState::Anonymous => SessionStatus::Anonymous,
            SessionState::Authenticated(_) => SessionStatus::Authenticated,
        }
    }

    pub fn identity(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_hydrating(&self) -> bool {
        matches!(self, SessionState::Hydrating)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    /// Next state after `event`.
    /// Hydration results arriving after hydration finished are ignored.
    pub fn apply(self, event: SessionEvent) -> SessionState {
        match (self, event) {
            (SessionState::Hydrating, SessionEvent::Restored(user)) => {
                SessionState::Authenticated(user)
            }
            (SessionState::Hydrating, SessionEvent::Cleared) => SessionState::Anonymous,
            (state, SessionEvent::Restored(_) | SessionEvent::Cleared) => {
                debug!(status = ?state.status(), "Ignoring hydration result outside hydration");
                state
            }
            (_, SessionEvent::SignedIn(user)) => SessionState::Authenticated(user),
            (_, SessionEvent::SignedOut) => SessionState::Anonymous,
        }
    }
}
