//! Chat gateway
//!
//! Handles one conversational turn end to end: tag the message with the
//! caller identity, run it through the reasoning runtime, and fold the
//! fragment stream into the reply.

use crate::agent::{collect_response, ReasoningRuntime};
use crate::error::Result;
use std::sync::Arc;
use uuid::Uuid;

/// Request/response surface over the reasoning runtime
pub struct ChatGateway {
    runtime: Arc<dyn ReasoningRuntime>,
}

impl ChatGateway {
    /// Create a gateway over the given runtime
    pub fn new(runtime: Arc<dyn ReasoningRuntime>) -> Self {
        Self { runtime }
    }

    /// Process one free-text message for a caller and return the aggregated
    /// reply. The caller identity is prefixed onto the message so the
    /// reasoning process can extract it for tool calls.
    pub async fn handle_message(&self, user_id: &str, message: &str) -> Result<String> {
        let turn_id = Uuid::new_v4();
        tracing::info!(%turn_id, user_id, "Processing chat turn");

        let tagged = format!("user_id={}: {}", user_id, message);
        let stream = self.runtime.run_turn(user_id, &tagged).await?;
        let response = collect_response(stream).await?;

        tracing::info!(%turn_id, user_id, chars = response.len(), "Chat turn complete");
        Ok(response)
    }
}
