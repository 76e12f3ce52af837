//! Reasoning runtime seam
//!
//! The classification and reply generation live outside this crate; a
//! runtime only has to produce the ordered fragment stream for one turn.

use crate::agent::fragment::ResponseFragment;
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// The ordered, asynchronous fragment sequence of one conversational turn
pub type FragmentStream = BoxStream<'static, Result<ResponseFragment>>;

/// External reasoning process consumed by the chat gateway
#[async_trait]
pub trait ReasoningRuntime: Send + Sync {
    /// Run one conversational turn for a session, returning its fragment
    /// stream. The stream ends on producer exhaustion; there is no explicit
    /// end marker.
    async fn run_turn(&self, session_id: &str, message: &str) -> Result<FragmentStream>;
}

/// Deterministic runtime replaying pre-programmed turns.
///
/// Stands in for the hosted model in tests and offline smoke runs, the same
/// way the rest of the system sees the real thing: an opaque producer of
/// fragment streams.
#[derive(Default)]
pub struct ScriptedRuntime {
    turns: Mutex<VecDeque<Vec<Result<ResponseFragment>>>>,
}

impl ScriptedRuntime {
    /// Create a runtime with no scripted turns
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the fragment sequence for the next turn
    pub async fn push_turn(&self, fragments: Vec<Result<ResponseFragment>>) {
        self.turns.lock().await.push_back(fragments);
    }
}

#[async_trait]
impl ReasoningRuntime for ScriptedRuntime {
    async fn run_turn(&self, session_id: &str, _message: &str) -> Result<FragmentStream> {
        let turn = self.turns.lock().await.pop_front().ok_or_else(|| {
            Error::Agent(format!(
                "No scripted turn remaining for session {}",
                session_id
            ))
        })?;
        Ok(futures::stream::iter(turn).boxed())
    }
}
