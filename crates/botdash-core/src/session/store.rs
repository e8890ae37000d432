use tokio::sync::{watch, OnceCell};
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiResult};
use crate::models::User;

use super::{SessionEvent, SessionState, SessionStatus};

/// Where the caller should navigate after an auth action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    /// The authenticated area
    Dashboard,
    /// The public landing page
    Home,
}

impl Redirect {
    pub fn path(&self) -> &'static str {
        match self {
            Redirect::Dashboard => "/dashboard",
            Redirect::Home => "/",
        }
    }
}

/// Process-wide session state.
///
/// Network work is delegated to the `ApiClient`, which also owns the stored
/// credential. State changes are published on a `watch` channel so views can
/// re-render when the session changes.
pub struct SessionStore {
    api: ApiClient,
    state: watch::Sender<SessionState>,
    hydration: OnceCell<()>,
}

impl SessionStore {
    /// Create a store in the `Hydrating` state. Call `hydrate` to leave it.
    pub fn new(api: ApiClient) -> Self {
        let (state, _) = watch::channel(SessionState::Hydrating);
        Self {
            api,
            state,
            hydration: OnceCell::new(),
        }
    }

    /// Create a store and run startup hydration to completion
    pub async fn connect(api: ApiClient) -> Self {
        let store = Self::new(api);
        store.hydrate().await;
        store
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    // =========================================================================
    // Observation
    // =========================================================================

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.state.borrow().status()
    }

    pub fn identity(&self) -> Option<User> {
        self.state.borrow().identity().cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Wait until hydration has finished and return the settled state
    pub async fn wait_until_ready(&self) -> SessionState {
        let mut rx = self.state.subscribe();
        let ready = rx
            .wait_for(|state| !state.is_hydrating())
            .await
            .map(|state| (*state).clone());
        // The sender lives in `self`, so the channel cannot close here
        ready.unwrap_or_else(|_| self.snapshot())
    }

    fn dispatch(&self, event: SessionEvent) {
        self.state.send_modify(|state| {
            let current = std::mem::take(state);
            *state = current.apply(event);
        });
        debug!(status = ?self.status(), "Session state updated");
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Rebuild the session from the stored credential.
    ///
    /// Runs at most once per store; later calls wait for the first run.
    /// Any failure ends in `Anonymous` with the stale credential cleared.
    /// The cause is logged below `warn` unless the credential storage itself failed.
    pub async fn hydrate(&self) {
        self.hydration.get_or_init(|| self.run_hydration()).await;
    }

    async fn run_hydration(&self) {
        let token = match self.api.stored_token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("No stored credential");
                self.dispatch(SessionEvent::Cleared);
                return;
            }
            Err(e) => {
                warn!(error = %e, "Stored credential unreadable, discarding it");
                self.discard_credential();
                self.dispatch(SessionEvent::Cleared);
                return;
            }
        };

        match self.api.get_me().await {
            Ok(user) => {
                info!(user_id = user.id, "Session restored");
                self.dispatch(SessionEvent::Restored(user));
            }
            Err(e) => {
                if e.is_auth_failure() {
                    debug!(error = %e, "Stored credential rejected, continuing anonymously");
                } else {
                    info!(error = %e, "Could not confirm stored credential, continuing anonymously");
                }
                // A login that finished meanwhile has stored a newer credential
                if self.api.get_token().as_ref() == Some(&token) {
                    self.discard_credential();
                }
                self.dispatch(SessionEvent::Cleared);
            }
        }
    }

    fn discard_credential(&self) {
        if let Err(e) = self.api.logout() {
            warn!(error = %e, "Failed to discard stale credential");
        }
    }

    /// Log in. On failure the session is unchanged and the error is returned.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<Redirect> {
        match self.api.login(email, password).await {
            Ok(payload) => {
                info!(user_id = payload.user.id, "Login successful");
                self.dispatch(SessionEvent::SignedIn(payload.user));
                Ok(Redirect::Dashboard)
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                Err(e)
            }
        }
    }

    /// Create an account and log into it
    pub async fn register(&self, email: &str, password: &str, name: &str) -> ApiResult<Redirect> {
        match self.api.register(email, password, name).await {
            Ok(payload) => {
                info!(user_id = payload.user.id, "Registration successful");
                self.dispatch(SessionEvent::SignedIn(payload.user));
                Ok(Redirect::Dashboard)
            }
            Err(e) => {
                warn!(error = %e, "Registration failed");
                Err(e)
            }
        }
    }

    /// Forget the credential and return to the public area.
    /// If the credential cannot be removed the session is left as it was.
    pub fn logout(&self) -> ApiResult<Redirect> {
        if let Err(e) = self.api.logout() {
            warn!(error = %e, "Logout failed");
            return Err(e);
        }
        self.dispatch(SessionEvent::SignedOut);
        info!("Logged out");
        Ok(Redirect::Home)
    }
}
