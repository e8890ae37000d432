//! Authentication module for the bearer credential and its storage.
//!
//! This module provides:
//! - `Credential`: the opaque bearer token, redacted in debug output
//! - `TokenStore`: the single named slot a credential is persisted in
//! - `KeyringTokenStore`: OS-level storage via keyring
//! - `FileTokenStore`: a `session.json` file in the data directory
//! - `MemoryTokenStore`: an in-process slot
//!
//! An empty slot is the canonical "logged out" signal read at startup.

pub mod credentials;
pub mod store;

pub use credentials::{Credential, KeyringTokenStore};
pub use store::{FileTokenStore, MemoryTokenStore, StoredCredential, TokenStore};
