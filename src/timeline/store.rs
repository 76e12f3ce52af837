//! File-backed timeline store
//!
//! Directory layout:
//! ```text
//! ~/.keeper/
//! └── timelines/
//!     ├── <user>-<hash>.json
//!     └── ...
//! ```
//!
//! Every timeline is held in an in-memory index and mirrored to one JSON
//! document on disk. Appends for the same user serialize on a per-user lock,
//! so load-then-append-then-persist is atomic with respect to concurrent
//! callers. A persistence fault is fatal to the append and propagates to the
//! caller.

use crate::error::{Error, Result};
use crate::timeline::record::{ContentRecord, NewRecord, UserTimeline};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Durable mapping from user identity to an ordered list of content records
pub struct TimelineStore {
    dir: PathBuf,
    timelines: Arc<RwLock<HashMap<String, UserTimeline>>>,
    /// Per-user append locks; the map itself is touched only briefly
    append_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl TimelineStore {
    /// Open a store at the given base directory, loading existing timelines
    pub async fn new(base_dir: PathBuf) -> Result<Self> {
        let dir = base_dir.join("timelines");
        tokio::fs::create_dir_all(&dir).await?;

        let store = Self {
            dir,
            timelines: Arc::new(RwLock::new(HashMap::new())),
            append_locks: Arc::new(Mutex::new(HashMap::new())),
        };

        store.load_from_disk().await;
        Ok(store)
    }

    /// Default base directory (~/.keeper/)
    pub fn default_dir() -> PathBuf {
        dirs_next::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".keeper")
    }

    /// Look up a timeline by exact user id
    pub async fn load_timeline(&self, user_id: &str) -> Option<UserTimeline> {
        self.timelines.read().await.get(user_id).cloned()
    }

    /// List all known user ids
    pub async fn user_ids(&self) -> Vec<String> {
        self.timelines.read().await.keys().cloned().collect()
    }

    /// Append a record to a user's timeline, creating the timeline on first
    /// ingestion.
    ///
    /// Holds the per-user lock across load, append, and persist. The index
    /// is updated only after the document reaches disk, so a persistence
    /// fault leaves the stored state untouched.
    pub async fn upsert_append(&self, user_id: &str, record: NewRecord) -> Result<ContentRecord> {
        let lock = self.append_lock(user_id).await;
        let _guard = lock.lock().await;

        let mut timeline = self
            .load_timeline(user_id)
            .await
            .unwrap_or_else(|| UserTimeline::new(user_id));

        let record = record.into_record(chrono::Utc::now().timestamp());
        timeline.content.push(record.clone());

        self.persist(&timeline).await?;
        self.timelines
            .write()
            .await
            .insert(user_id.to_string(), timeline);

        Ok(record)
    }

    /// Get or create the append lock for a user
    async fn append_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.append_locks.lock().await;
        locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Write the full timeline document to disk
    async fn persist(&self, timeline: &UserTimeline) -> Result<()> {
        let path = self.dir.join(Self::file_name(&timeline.user_id));
        let json = serde_json::to_string_pretty(timeline)?;
        tokio::fs::write(&path, json).await.map_err(|e| {
            Error::Storage(format!(
                "Failed to persist timeline for {}: {}",
                timeline.user_id, e
            ))
        })
    }

    /// Stable file name for a user id: a sanitized prefix for readability
    /// plus a digest suffix so distinct ids never collide
    fn file_name(user_id: &str) -> String {
        let mut sanitized: String = user_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        sanitized.truncate(32);

        let digest = Sha256::digest(user_id.as_bytes());
        let suffix: String = digest.iter().take(4).map(|b| format!("{:02x}", b)).collect();
        format!("{}-{}.json", sanitized, suffix)
    }

    /// Load all timeline documents from disk into the index
    async fn load_from_disk(&self) {
        let docs = Self::load_json_files::<UserTimeline>(&self.dir);
        let mut map = self.timelines.write().await;
        for timeline in docs {
            map.insert(timeline.user_id.clone(), timeline);
        }
        tracing::debug!(count = map.len(), "Loaded timelines from disk");
    }

    /// Load all JSON files from a directory into a Vec
    fn load_json_files<T: serde::de::DeserializeOwned>(dir: &Path) -> Vec<T> {
        let mut items = Vec::new();
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to read directory {}: {}", dir.display(), e);
                }
                return items;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(data) => match serde_json::from_str(&data) {
                    Ok(item) => items.push(item),
                    Err(e) => {
                        tracing::warn!("Failed to parse {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", path.display(), e);
                }
            }
        }

        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::record::ContentPayload;
    use tempfile::TempDir;

    async fn make_store() -> (TimelineStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = TimelineStore::new(dir.path().to_path_buf()).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_upsert_creates_timeline() {
        let (store, _dir) = make_store().await;

        assert!(store.load_timeline("u1").await.is_none());

        let record = store
            .upsert_append("u1", NewRecord::information("I like tea"))
            .await
            .unwrap();
        assert_eq!(record.payload.kind(), "information");

        let timeline = store.load_timeline("u1").await.unwrap();
        assert_eq!(timeline.user_id, "u1");
        assert_eq!(timeline.content.len(), 1);
    }

    #[tokio::test]
    async fn test_append_grows_by_one_preserving_prior() {
        let (store, _dir) = make_store().await;

        for _ in 0..3 {
            store
                .upsert_append("u1", NewRecord::information("x"))
                .await
                .unwrap();
        }
        store
            .upsert_append(
                "u1",
                NewRecord::task("Plan trip", vec!["Book flight".to_string()]),
            )
            .await
            .unwrap();

        let timeline = store.load_timeline("u1").await.unwrap();
        assert_eq!(timeline.content.len(), 4);
        // Prior records unchanged, insertion order preserved
        for record in &timeline.content[..3] {
            assert_eq!(
                record.payload,
                ContentPayload::Information {
                    information: "x".to_string()
                }
            );
        }
        assert_eq!(timeline.content[3].payload.kind(), "task");
    }

    #[tokio::test]
    async fn test_load_timeline_exact_key_match() {
        let (store, _dir) = make_store().await;
        store
            .upsert_append("alice", NewRecord::information("x"))
            .await
            .unwrap();

        assert!(store.load_timeline("alice").await.is_some());
        assert!(store.load_timeline("alic").await.is_none());
        assert!(store.load_timeline("alice2").await.is_none());
    }

    #[tokio::test]
    async fn test_distinct_users_isolated() {
        let (store, _dir) = make_store().await;
        store
            .upsert_append("u1", NewRecord::information("a"))
            .await
            .unwrap();
        store
            .upsert_append("u2", NewRecord::information("b"))
            .await
            .unwrap();

        assert_eq!(store.load_timeline("u1").await.unwrap().content.len(), 1);
        assert_eq!(store.load_timeline("u2").await.unwrap().content.len(), 1);

        let mut ids = store.user_ids().await;
        ids.sort();
        assert_eq!(ids, vec!["u1", "u2"]);
    }

    #[tokio::test]
    async fn test_persistence_round_trip() {
        let dir = TempDir::new().unwrap();

        {
            let store = TimelineStore::new(dir.path().to_path_buf()).await.unwrap();
            store
                .upsert_append("u1", NewRecord::information("I like tea"))
                .await
                .unwrap();
            store
                .upsert_append(
                    "u1",
                    NewRecord::task("Plan trip", vec!["Book flight".to_string()]),
                )
                .await
                .unwrap();
        }

        // Reload from disk
        let store = TimelineStore::new(dir.path().to_path_buf()).await.unwrap();
        let timeline = store.load_timeline("u1").await.unwrap();
        assert_eq!(timeline.content.len(), 2);
        assert_eq!(timeline.content[0].payload.kind(), "information");
        assert_eq!(timeline.content[1].payload.kind(), "task");
    }

    #[tokio::test]
    async fn test_load_skips_corrupt_files() {
        let dir = TempDir::new().unwrap();
        let timelines_dir = dir.path().join("timelines");
        std::fs::create_dir_all(&timelines_dir).unwrap();
        std::fs::write(timelines_dir.join("bad.json"), "not valid json").unwrap();

        let store = TimelineStore::new(dir.path().to_path_buf()).await.unwrap();
        assert!(store.user_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_caller_timestamp_stored_verbatim() {
        let (store, _dir) = make_store().await;

        let record = store
            .upsert_append("u1", NewRecord::information("old").with_timestamp(123))
            .await
            .unwrap();
        assert_eq!(record.timestamp, 123);

        let fresh = store
            .upsert_append("u1", NewRecord::information("new"))
            .await
            .unwrap();
        assert!(fresh.timestamp > 1_700_000_000);
    }

    #[tokio::test]
    async fn test_concurrent_appends_all_land() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(TimelineStore::new(dir.path().to_path_buf()).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .upsert_append("u1", NewRecord::information(format!("note-{}", i)))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let timeline = store.load_timeline("u1").await.unwrap();
        assert_eq!(timeline.content.len(), 10);

        // The persisted document agrees with the index
        let reloaded = TimelineStore::new(dir.path().to_path_buf()).await.unwrap();
        assert_eq!(reloaded.load_timeline("u1").await.unwrap().content.len(), 10);
    }

    #[tokio::test]
    async fn test_persist_failure_propagates() {
        let (store, dir) = make_store().await;

        // Make the timelines directory unwritable by replacing it with a file
        let timelines_dir = dir.path().join("timelines");
        std::fs::remove_dir_all(&timelines_dir).unwrap();
        std::fs::write(&timelines_dir, "in the way").unwrap();

        let result = store
            .upsert_append("u1", NewRecord::information("x"))
            .await;
        assert!(matches!(result, Err(Error::Storage(_))));

        // The failed append did not reach the index
        assert!(store.load_timeline("u1").await.is_none());
    }

    #[test]
    fn test_file_name_distinct_for_colliding_ids() {
        let a = TimelineStore::file_name("user@example.com");
        let b = TimelineStore::file_name("user.example@com");
        // Sanitized prefixes collide, digest suffixes must not
        assert_ne!(a, b);
        assert!(a.ends_with(".json"));
    }
}
