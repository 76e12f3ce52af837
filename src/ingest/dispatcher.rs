//! Ingestion dispatcher
//!
//! Normalizes a classified payload into a stored record and produces the
//! human-readable confirmation returned to the reasoning process. Requests
//! are never deduplicated: every call appends a new record even when
//! identical to the previous one.

use crate::error::{Error, Result};
use crate::timeline::{NewRecord, TimelineStore};
use std::sync::Arc;

/// Validates and stores classified content
#[derive(Clone)]
pub struct IngestionDispatcher {
    store: Arc<TimelineStore>,
}

impl IngestionDispatcher {
    /// Create a dispatcher over the given store
    pub fn new(store: Arc<TimelineStore>) -> Self {
        Self { store }
    }

    /// Ingest a task and its ordered steps.
    ///
    /// `task` must be non-empty and `task_steps` must be a non-empty
    /// sequence of non-empty strings. Returns the confirmation text with the
    /// task and its steps joined by line breaks.
    pub async fn ingest_task(
        &self,
        user_id: &str,
        task: &str,
        task_steps: &[String],
    ) -> Result<String> {
        validate_user_id(user_id)?;
        if task.trim().is_empty() {
            return Err(Error::InvalidInput("task must not be empty".to_string()));
        }
        if task_steps.is_empty() {
            return Err(Error::InvalidInput(
                "task_steps must not be empty".to_string(),
            ));
        }
        if task_steps.iter().any(|s| s.trim().is_empty()) {
            return Err(Error::InvalidInput(
                "task_steps must not contain empty entries".to_string(),
            ));
        }

        tracing::info!(user_id, task, steps = task_steps.len(), "Ingesting task");
        self.store
            .upsert_append(user_id, NewRecord::task(task, task_steps.to_vec()))
            .await?;

        Ok(format!(
            "[Task Ingestion]\n\nTask: {}\nTask Steps:\n\n{}\n",
            task,
            task_steps.join("\n")
        ))
    }

    /// Ingest a piece of information to remember.
    ///
    /// `information` must be non-empty. Returns the confirmation text
    /// containing the information body.
    pub async fn ingest_information(&self, user_id: &str, information: &str) -> Result<String> {
        validate_user_id(user_id)?;
        if information.trim().is_empty() {
            return Err(Error::InvalidInput(
                "information must not be empty".to_string(),
            ));
        }

        tracing::info!(user_id, information, "Ingesting information");
        self.store
            .upsert_append(user_id, NewRecord::information(information))
            .await?;

        Ok(format!(
            "[Information Ingestion]\n\nInformation:\n\n{}\n",
            information
        ))
    }
}

fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.trim().is_empty() {
        return Err(Error::InvalidInput("user_id must not be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn make_dispatcher() -> (IngestionDispatcher, Arc<TimelineStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(TimelineStore::new(dir.path().to_path_buf()).await.unwrap());
        (IngestionDispatcher::new(store.clone()), store, dir)
    }

    #[tokio::test]
    async fn test_ingest_task_on_empty_store() {
        let (dispatcher, store, _dir) = make_dispatcher().await;

        let confirmation = dispatcher
            .ingest_task(
                "u1",
                "Plan trip",
                &["Book flight".to_string(), "Book hotel".to_string()],
            )
            .await
            .unwrap();

        assert!(confirmation.contains("Plan trip"));
        assert!(confirmation.contains("Book flight\nBook hotel"));

        let timeline = store.load_timeline("u1").await.unwrap();
        assert_eq!(timeline.content.len(), 1);
        assert_eq!(timeline.content[0].payload.kind(), "task");
    }

    #[tokio::test]
    async fn test_ingest_information_confirmation() {
        let (dispatcher, _store, _dir) = make_dispatcher().await;

        let confirmation = dispatcher
            .ingest_information("u1", "I like tea")
            .await
            .unwrap();
        assert!(confirmation.starts_with("[Information Ingestion]"));
        assert!(confirmation.contains("I like tea"));
    }

    #[tokio::test]
    async fn test_information_then_task_order() {
        let (dispatcher, store, _dir) = make_dispatcher().await;

        dispatcher
            .ingest_information("u1", "I like tea")
            .await
            .unwrap();
        dispatcher
            .ingest_task("u1", "Plan trip", &["Book flight".to_string()])
            .await
            .unwrap();

        let timeline = store.load_timeline("u1").await.unwrap();
        assert_eq!(timeline.content.len(), 2);
        assert_eq!(timeline.content[0].payload.kind(), "information");
        assert_eq!(timeline.content[1].payload.kind(), "task");
    }

    #[tokio::test]
    async fn test_identical_calls_never_deduplicated() {
        let (dispatcher, store, _dir) = make_dispatcher().await;

        dispatcher.ingest_information("u1", "x").await.unwrap();
        dispatcher.ingest_information("u1", "x").await.unwrap();
        dispatcher.ingest_information("u1", "x").await.unwrap();

        let timeline = store.load_timeline("u1").await.unwrap();
        assert_eq!(timeline.content.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_task_rejected() {
        let (dispatcher, store, _dir) = make_dispatcher().await;

        let result = dispatcher
            .ingest_task("u1", "  ", &["step".to_string()])
            .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(store.load_timeline("u1").await.is_none());
    }

    #[tokio::test]
    async fn test_empty_task_steps_rejected() {
        let (dispatcher, store, _dir) = make_dispatcher().await;

        let result = dispatcher.ingest_task("u1", "Plan trip", &[]).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(store.load_timeline("u1").await.is_none());
    }

    #[tokio::test]
    async fn test_blank_step_entry_rejected() {
        let (dispatcher, _store, _dir) = make_dispatcher().await;

        let result = dispatcher
            .ingest_task("u1", "Plan trip", &["Book flight".to_string(), " ".to_string()])
            .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_empty_information_rejected() {
        let (dispatcher, _store, _dir) = make_dispatcher().await;

        let result = dispatcher.ingest_information("u1", "").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_empty_user_id_rejected() {
        let (dispatcher, _store, _dir) = make_dispatcher().await;

        let result = dispatcher.ingest_information("", "I like tea").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
