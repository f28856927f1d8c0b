//! Data models for the event-organization backend.
//!
//! - `EventSummary`, `Event`, `EventDraft`: calendar events in their list,
//!   detail, and create/edit shapes
//! - `UserInfo`, `Profile`: the signed-in user's profile page data
//!
//! Field names follow the backend's camelCase wire format via serde
//! attributes; everything else is snake_case Rust.

pub mod event;
pub mod user;

pub use event::{Event, EventDraft, EventFilter, EventSortColumn, EventSummary};
pub use user::{Profile, UserInfo};
