//! Core library for the botdash Telegram bot dashboard.
//!
//! This crate holds everything below the presentation layer:
//!
//! - `api`: typed client for the dashboard backend (auth, bots, broadcasts,
//!   transactions, products) with uniform error normalization
//! - `auth`: the bearer credential and its storage backends
//! - `session`: the session store and its hydration/login/logout lifecycle
//! - `models`: request and response records shared with front-ends
//! - `forms`: client-side validation for the auth and broadcast forms
//! - `config`: user configuration and storage locations

pub mod api;
pub mod auth;
pub mod config;
pub mod forms;
pub mod models;
pub mod session;

pub use api::{ApiClient, ApiError, ApiResult};
pub use auth::{Credential, TokenStore};
pub use config::Config;
pub use session::{Redirect, SessionState, SessionStatus, SessionStore};
