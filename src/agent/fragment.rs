//! Streamed response fragments
//!
//! One conversational turn arrives as an ordered sequence of fragments.
//! Only text fragments contribute to the reply returned to the caller; the
//! other variants exist for diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One unit of a streamed response from the reasoning process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFragment {
    /// Code the reasoning process generated for execution
    ExecutableCode { language: String, code: String },

    /// The outcome of executing generated code
    CodeExecutionResult {
        outcome: ExecutionOutcome,
        output: String,
    },

    /// Reply text
    Text { text: String },
}

impl ResponseFragment {
    /// A text fragment
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// An executable-code fragment
    pub fn executable_code(language: impl Into<String>, code: impl Into<String>) -> Self {
        Self::ExecutableCode {
            language: language.into(),
            code: code.into(),
        }
    }

    /// A code-execution-result fragment
    pub fn execution_result(outcome: ExecutionOutcome, output: impl Into<String>) -> Self {
        Self::CodeExecutionResult {
            outcome,
            output: output.into(),
        }
    }
}

/// Outcome of a code execution reported by the reasoning process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOutcome {
    Ok,
    Failed,
    DeadlineExceeded,
}

impl fmt::Display for ExecutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionOutcome::Ok => "ok",
            ExecutionOutcome::Failed => "failed",
            ExecutionOutcome::DeadlineExceeded => "deadline_exceeded",
        };
        write!(f, "{}", s)
    }
}
