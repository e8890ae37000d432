//! Session lifecycle: who is logged in.
//!
//! `SessionStore` is the single source of truth consumed by every view that
//! gates content or displays the identity. Its state moves through an
//! explicit transition function (`SessionState::apply`):
//!
//! ```text
//!   Hydrating --Restored(user)--> Authenticated(user)
//!   Hydrating --Cleared---------> Anonymous
//!   any       --SignedIn(user)--> Authenticated(user)
//!   any       --SignedOut-------> Anonymous
//! ```
//!
//! Hydration runs once per store. A stale or unreachable credential is
//! downgraded to `Anonymous`, never reported as an error.

pub mod state;
pub mod store;

pub use state::{SessionEvent, SessionState, SessionStatus};
pub use store::{Redirect, SessionStore};
