//! Per-user content timelines
//!
//! A timeline is the append-only history of classified content records
//! (tasks and remembered information) for one user.

pub mod record;
pub mod store;

pub use record::{ContentPayload, ContentRecord, NewRecord, UserTimeline};
pub use store::TimelineStore;
