//! REST API clients for the event backend and the auth service.
//!
//! The backend speaks a `{"status": "OK" | "Error", "error": ...}` envelope
//! around most responses; the auth service issues JWT bearer tokens that the
//! client attaches to every privileged request.

pub mod client;
pub mod error;

pub use client::{ApiClient, RegisterRequest};
pub use error::ApiError;
