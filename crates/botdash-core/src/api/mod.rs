//! REST API client module for the botdash backend.
//!
//! This module provides the `ApiClient` for communicating with the
//! dashboard API to authenticate and to manage bots, broadcasts,
//! transactions and products.
//!
//! Every call resolves to an `ApiResult<T>`: either the typed payload or an
//! `ApiError` whose display form is the message shown to the user. The
//! client attaches the stored bearer credential to each request.

pub mod client;
pub mod error;

pub use client::{ApiClient, AuthPayload, DEFAULT_API_URL};
pub use error::{ApiError, ApiResult};
