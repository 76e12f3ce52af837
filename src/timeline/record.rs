//! Timeline record types
//!
//! Persisted document shape, one per user:
//! ```text
//! {
//!   "user_id": "6506806306",
//!   "content": [
//!     {"type": "information", "information": "I like tea", "timestamp": 1722860000},
//!     {"type": "task", "task": "Plan trip", "task_steps": ["Book flight"], "timestamp": 1722860100}
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

/// Classified content of one record.
///
/// The tagged representation guarantees a record is either a task or a piece
/// of information, never both and never neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPayload {
    /// A task broken down into ordered steps
    Task {
        task: String,
        task_steps: Vec<String>,
    },
    /// A free-form fact to remember
    Information { information: String },
}

impl ContentPayload {
    /// The record type tag as it appears in the persisted document
    pub fn kind(&self) -> &'static str {
        match self {
            ContentPayload::Task { .. } => "task",
            ContentPayload::Information { .. } => "information",
        }
    }
}

/// One stored content record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    #[serde(flatten)]
    pub payload: ContentPayload,

    /// Seconds since epoch, resolved by the store at insertion time.
    /// Display metadata only; record position in the timeline is the
    /// ordering authority.
    pub timestamp: i64,
}

/// A record draft handed to the store for insertion.
///
/// A caller-supplied `timestamp` is trusted verbatim (backdating and import
/// scenarios); when absent the store fills in its own clock.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub payload: ContentPayload,
    pub timestamp: Option<i64>,
}

impl NewRecord {
    /// Draft a task record
    pub fn task(task: impl Into<String>, task_steps: Vec<String>) -> Self {
        Self {
            payload: ContentPayload::Task {
                task: task.into(),
                task_steps,
            },
            timestamp: None,
        }
    }

    /// Draft an information record
    pub fn information(information: impl Into<String>) -> Self {
        Self {
            payload: ContentPayload::Information {
                information: information.into(),
            },
            timestamp: None,
        }
    }

    /// Override the insertion timestamp
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Resolve the draft into a stored record
    pub(crate) fn into_record(self, now: i64) -> ContentRecord {
        ContentRecord {
            payload: self.payload,
            timestamp: self.timestamp.unwrap_or(now),
        }
    }
}

/// The ordered history of content records for one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTimeline {
    /// Stable external identifier, unique key
    pub user_id: String,

    /// Records in insertion order; append-only
    pub content: Vec<ContentRecord>,
}

impl UserTimeline {
    /// Create an empty timeline for a user
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            content: Vec::new(),
        }
    }
}
