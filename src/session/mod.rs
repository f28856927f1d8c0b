//! Client-side session state shared by every view.
//!
//! This module provides:
//! - `SessionStore`: the single source of truth for "who is logged in",
//!   hydrated once from durable storage and kept in lockstep with it
//! - `KeyValueStorage`: the durable storage contract the store writes through
//!
//! The store is constructed once at startup and passed by handle to every
//! consumer; there is no ambient global.

pub mod storage;
pub mod store;

pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
pub use store::{ObserverId, SessionError, SessionState, SessionStore};
