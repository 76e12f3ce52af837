//! Response aggregator
//!
//! Folds one turn's fragment stream into the single reply string. Text
//! fragments are trimmed and concatenated directly, with no separator;
//! whitespace-only fragments contribute nothing. Executable-code and
//! code-execution-result fragments are logged for diagnostics and never
//! reach the output. Fragments are never retried or re-ordered; producer
//! ordering is trusted absolutely.

use crate::agent::fragment::ResponseFragment;
use crate::error::Result;
use futures::{Stream, StreamExt};

/// Accumulator for one streamed conversational turn
#[derive(Debug, Default)]
pub struct ResponseAggregator {
    buffer: String,
}

impl ResponseAggregator {
    /// Create an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one fragment
    pub fn push(&mut self, fragment: &ResponseFragment) {
        match fragment {
            ResponseFragment::ExecutableCode { language, code } => {
                tracing::debug!(%language, %code, "Agent generated executable code");
            }
            ResponseFragment::CodeExecutionResult { outcome, output } => {
                tracing::debug!(%outcome, %output, "Code execution result");
            }
            ResponseFragment::Text { text } => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    self.buffer.push_str(trimmed);
                }
            }
        }
    }

    /// Return the accumulated output
    pub fn finish(self) -> String {
        self.buffer
    }
}

/// Drive a fragment stream to exhaustion and return the aggregated reply.
///
/// A stream fault propagates unmodified; no partial result is returned.
pub async fn collect_response<S>(stream: S) -> Result<String>
where
    S: Stream<Item = Result<ResponseFragment>>,
{
    futures::pin_mut!(stream);

    let mut aggregator = ResponseAggregator::new();
    while let Some(fragment) = stream.next().await {
        aggregator.push(&fragment?);
    }
    Ok(aggregator.finish())
}
