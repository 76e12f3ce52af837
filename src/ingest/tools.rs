//! Ingestion toolkit: the conversational tool boundary
//!
//! Advertises `ingest_task` and `ingest_information` as callable tools and
//! renders every outcome as a string: success confirmations verbatim,
//! storage faults as the soft-fail template, validation faults as their
//! display text so the reasoning process can self-correct.

use crate::error::Error;
use crate::ingest::dispatcher::IngestionDispatcher;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Function declaration advertised to the reasoning process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// JSON Schema object describing the parameters
    pub parameters: Value,
}

/// Callable tool surface over the ingestion dispatcher
#[derive(Clone)]
pub struct IngestToolkit {
    dispatcher: IngestionDispatcher,
}

impl IngestToolkit {
    /// Create a toolkit over the given dispatcher
    pub fn new(dispatcher: IngestionDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Declarations for every tool the toolkit can invoke
    pub fn schemas() -> Vec<ToolSchema> {
        vec![
            ToolSchema {
                name: "ingest_task".to_string(),
                description: "Ingest a task and its steps into the user's timeline.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "user_id": {
                            "type": "string",
                            "description": "The id of the user the task belongs to."
                        },
                        "task": {
                            "type": "string",
                            "description": "The task to ingest."
                        },
                        "task_steps": {
                            "type": "array",
                            "items": {"type": "string"},
                            "description": "The ordered steps of the task."
                        }
                    },
                    "required": ["user_id", "task", "task_steps"]
                }),
            },
            ToolSchema {
                name: "ingest_information".to_string(),
                description: "Ingest a piece of information into the user's timeline.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "user_id": {
                            "type": "string",
                            "description": "The id of the user the information belongs to."
                        },
                        "information": {
                            "type": "string",
                            "description": "The information to remember."
                        }
                    },
                    "required": ["user_id", "information"]
                }),
            },
        ]
    }

    /// Invoke a tool by name with JSON arguments, rendering the outcome as
    /// text for the reasoning process
    pub async fn invoke(&self, name: &str, args: &Value) -> String {
        match name {
            "ingest_task" => self.invoke_ingest_task(args).await,
            "ingest_information" => self.invoke_ingest_information(args).await,
            other => format!("Unknown tool: {}", other),
        }
    }

    async fn invoke_ingest_task(&self, args: &Value) -> String {
        let Some(user_id) = str_arg(args, "user_id") else {
            return malformed("ingest_task", "user_id");
        };
        let Some(task) = str_arg(args, "task") else {
            return malformed("ingest_task", "task");
        };
        let Some(task_steps) = string_array_arg(args, "task_steps") else {
            return malformed("ingest_task", "task_steps");
        };

        match self.dispatcher.ingest_task(user_id, task, &task_steps).await {
            Ok(confirmation) => confirmation,
            Err(e @ Error::InvalidInput(_)) => e.to_string(),
            Err(e) => {
                tracing::error!(user_id, task, "Task ingestion failed: {}", e);
                format!("Failed to ingest task: {}", task)
            }
        }
    }

    async fn invoke_ingest_information(&self, args: &Value) -> String {
        let Some(user_id) = str_arg(args, "user_id") else {
            return malformed("ingest_information", "user_id");
        };
        let Some(information) = str_arg(args, "information") else {
            return malformed("ingest_information", "information");
        };

        match self
            .dispatcher
            .ingest_information(user_id, information)
            .await
        {
            Ok(confirmation) => confirmation,
            Err(e @ Error::InvalidInput(_)) => e.to_string(),
            Err(e) => {
                tracing::error!(user_id, "Information ingestion failed: {}", e);
                format!("Failed to ingest information: {}", information)
            }
        }
    }
}

fn str_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

fn string_array_arg(args: &Value, key: &str) -> Option<Vec<String>> {
    args.get(key)?
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

fn malformed(tool: &str, key: &str) -> String {
    format!("Invalid arguments for {}: missing or malformed '{}'", tool, key)
}
