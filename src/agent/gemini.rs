//! Hosted-model reasoning runtime
//!
//! Client for the generative-language `generateContent` operation. One
//! conversational turn may span several model rounds: a round that returns
//! function calls is answered through the ingestion toolkit and re-sent,
//! until the model replies without one or the configured round limit is
//! hit. Text, executable-code, and code-execution-result parts are surfaced
//! as fragments in arrival order. Conversation history is kept per session
//! so consecutive turns share context.

use crate::agent::fragment::{ExecutionOutcome, ResponseFragment};
use crate::agent::runtime::{FragmentStream, ReasoningRuntime};
use crate::config::AgentConfig;
use crate::error::{Error, Result};
use crate::ingest::IngestToolkit;
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// System instruction used when the configuration does not override it
const DEFAULT_SYSTEM_INSTRUCTION: &str = "\
You are an AI assistant helping users manage their personal lives around \
topics like health, fitness, finance and travel.

1. Decide whether the user request is a task or a piece of information to \
remember. Any form of question counts as a task.
2. Save information with the ingest_information tool. Break tasks down into \
smaller steps and save them with the ingest_task tool.
3. When you execute a tool, return the tool output as a string.
4. Every user request carries the caller identity as `user_id=<id>`. Extract \
it and pass it on every tool call.";

/// Reasoning runtime backed by a hosted generative-language model
#[derive(Clone)]
pub struct GeminiRuntime {
    http: reqwest::Client,
    api_base: String,
    model: String,
    api_key: String,
    system_instruction: String,
    max_tool_rounds: usize,
    toolkit: Arc<IngestToolkit>,
    sessions: Arc<RwLock<HashMap<String, Vec<Content>>>>,
}

impl GeminiRuntime {
    /// Create a runtime from configuration; the API key is read from the
    /// environment variable the configuration names
    pub fn new(config: &AgentConfig, toolkit: Arc<IngestToolkit>) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            Error::Config(format!(
                "Environment variable {} is not set",
                config.api_key_env
            ))
        })?;

        Ok(Self {
            http: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            system_instruction: config
                .system_instruction
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_INSTRUCTION.to_string()),
            max_tool_rounds: config.max_tool_rounds,
            toolkit,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// One model round over the accumulated conversation
    async fn generate(&self, contents: &[Content]) -> Result<Content> {
        let url = format!("{}/models/{}:generateContent", self.api_base, self.model);

        let request = GenerateContentRequest {
            system_instruction: Content::user_text(&self.system_instruction),
            contents,
            tools: vec![ToolDeclarations {
                function_declarations: IngestToolkit::schemas()
                    .into_iter()
                    .map(|s| FunctionDeclaration {
                        name: s.name,
                        description: s.description,
                        parameters: s.parameters,
                    })
                    .collect(),
            }],
        };

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let body: GenerateContentResponse = response.json().await?;
        body.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .ok_or_else(|| Error::Agent("Model returned no candidates".to_string()))
    }

    async fn history(&self, session_id: &str) -> Vec<Content> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn store_history(&self, session_id: &str, contents: Vec<Content>) {
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), contents);
    }
}

#[async_trait]
impl ReasoningRuntime for GeminiRuntime {
    async fn run_turn(&self, session_id: &str, message: &str) -> Result<FragmentStream> {
        let runtime = self.clone();
        let session_id = session_id.to_string();
        let message = message.to_string();

        let stream = async_stream::try_stream! {
            let mut contents = runtime.history(&session_id).await;
            contents.push(Content::user_text(&message));

            for round in 0..runtime.max_tool_rounds {
                let reply = runtime.generate(&contents).await?;
                contents.push(reply.clone());

                let mut tool_responses: Vec<Part> = Vec::new();
                for part in &reply.parts {
                    if let Some(text) = &part.text {
                        yield ResponseFragment::text(text.clone());
                    }
                    if let Some(code) = &part.executable_code {
                        yield ResponseFragment::executable_code(
                            code.language.clone(),
                            code.code.clone(),
                        );
                    }
                    if let Some(result) = &part.code_execution_result {
                        yield ResponseFragment::execution_result(
                            parse_outcome(&result.outcome),
                            result.output.clone(),
                        );
                    }
                    if let Some(call) = &part.function_call {
                        tracing::debug!(tool = %call.name, round, "Invoking ingestion tool");
                        let output = runtime.toolkit.invoke(&call.name, &call.args).await;
                        tool_responses.push(Part::function_response(&call.name, output));
                    }
                }

                if tool_responses.is_empty() {
                    break;
                }
                contents.push(Content::function_responses(tool_responses));
            }

            runtime.store_history(&session_id, contents).await;
        };

        Ok(stream.boxed())
    }
}

fn parse_outcome(outcome: &str) -> ExecutionOutcome {
    match outcome {
        "OUTCOME_OK" => ExecutionOutcome::Ok,
        "OUTCOME_FAILED" => ExecutionOutcome::Failed,
        "OUTCOME_DEADLINE_EXCEEDED" => ExecutionOutcome::DeadlineExceeded,
        other => {
            tracing::warn!(outcome = other, "Unrecognized execution outcome");
            ExecutionOutcome::Failed
        }
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Content {
    pub role: String,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    fn user_text(text: &str) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part {
                text: Some(text.to_string()),
                ..Default::default()
            }],
        }
    }

    fn function_responses(parts: Vec<Part>) -> Self {
        Self {
            role: "user".to_string(),
            parts,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_response: Option<FunctionResponse>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable_code: Option<ExecutableCodePart>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_execution_result: Option<CodeExecutionResultPart>,
}

impl Part {
    fn function_response(name: &str, output: String) -> Self {
        Self {
            function_response: Some(FunctionResponse {
                name: name.to_string(),
                response: serde_json::json!({ "result": output }),
            }),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct FunctionResponse {
    pub name: String,
    pub response: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ExecutableCodePart {
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CodeExecutionResultPart {
    #[serde(default)]
    pub outcome: String,
    #[serde(default)]
    pub output: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content,
    contents: &'a [Content],
    tools: Vec<ToolDeclarations>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolDeclarations {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}
