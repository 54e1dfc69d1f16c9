//! Directory-backed store: one JSON file per document.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::errors::{StoreError, StoreResult};
use crate::record::{is_valid_id, new_id, DocumentDraft, DocumentRecord, DocumentSummary};
use crate::store::DocumentStore;

/// On-disk envelope; `created_at` keeps listing in creation order
#[derive(Serialize, Deserialize)]
struct StoredRecord {
    #[serde(flatten)]
    record: DocumentRecord,
    created_at: i64,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    last_created: Arc<AtomicI64>,
    /// Held across every read-modify-write and removal
    writes: Arc<Mutex<()>>,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub async fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        tracing::info!(dir = %dir.display(), "opened file store");
        Ok(Self {
            dir,
            last_created: Arc::new(AtomicI64::new(0)),
            writes: Arc::new(Mutex::new(())),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creation stamp, strictly increasing within this process
    fn next_stamp(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let previous = self
            .last_created
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
            .unwrap_or(now);
        now.max(previous + 1)
    }

    fn record_path(&self, id: &str) -> StoreResult<PathBuf> {
        if !is_valid_id(id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }

    async fn load(&self, id: &str) -> StoreResult<StoredRecord> {
        let path = self.record_path(id)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound(id.to_string())),
            Err(e) => return Err(e.into()),
        };
        parse_stored(&bytes, &path)
    }

    async fn store(&self, stored: &StoredRecord) -> StoreResult<()> {
        let path = self.record_path(&stored.record.id)?;
        let bytes = serde_json::to_vec_pretty(stored).map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;

        // Write then rename so a crash never leaves a half-written record
        let tmp = self.dir.join(format!("{}.{}.tmp", stored.record.id, new_id()));
        tokio::fs::write(&tmp, bytes).await?;
        if let Err(err) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(err.into());
        }
        Ok(())
    }
}

fn parse_stored(bytes: &[u8], path: &Path) -> StoreResult<StoredRecord> {
    serde_json::from_slice(bytes).map_err(|e| {
        StoreError::Io(std::io::Error::new(
            ErrorKind::InvalidData,
            format!("{}: {}", path.display(), e),
        ))
    })
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn create(&self, draft: DocumentDraft) -> StoreResult<DocumentRecord> {
        let stored = StoredRecord {
            record: draft.into_record(new_id()),
            created_at: self.next_stamp(),
        };
        let _guard = self.writes.lock().await;
        self.store(&stored).await?;
        tracing::debug!(id = %stored.record.id, "created document");
        Ok(stored.record)
    }

    async fn read(&self, id: &str) -> StoreResult<DocumentRecord> {
        Ok(self.load(id).await?.record)
    }

    async fn update(&self, id: &str, draft: DocumentDraft) -> StoreResult<DocumentRecord> {
        let _guard = self.writes.lock().await;
        let mut stored = self.load(id).await?;
        stored.record.title = draft.title;
        stored.record.content = draft.content;
        self.store(&stored).await?;
        Ok(stored.record)
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let path = self.record_path(id)?;
        let _guard = self.writes.lock().await;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(id.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> StoreResult<Vec<DocumentSummary>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut stored = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            // Removed since the directory was read
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            match parse_stored(&bytes, &path) {
                Ok(record) => stored.push(record),
                Err(err) => tracing::warn!(error = %err, "skipping unreadable record"),
            }
        }

        stored.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.record.id.cmp(&b.record.id))
        });
        Ok(stored.iter().map(|s| DocumentSummary::from(&s.record)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_persist_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        let created = store.create(DocumentDraft::new("Diary", "")).await.unwrap();
        store
            .update(&created.id, DocumentDraft::new("Diary", "[{\"type\":\"paragraph\",\"children\":[{\"text\":\"x\"}]}]"))
            .await
            .unwrap();

        let reopened = FileStore::open(dir.path()).await.unwrap();
        let record = reopened.read(&created.id).await.unwrap();
        assert_eq!(record.title, "Diary");
        assert!(record.content.contains("paragraph"));
    }

    #[tokio::test]
    async fn test_list_in_creation_order_skips_junk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("docs")).await.unwrap();
        for title in ["first", "second", "third"] {
            store.create(DocumentDraft::new(title, "")).await.unwrap();
        }
        tokio::fs::write(store.dir().join("broken.json"), b"{").await.unwrap();
        tokio::fs::write(store.dir().join("notes.txt"), b"ignored").await.unwrap();

        let titles: Vec<_> = store.list().await.unwrap().into_iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_unsafe_ids_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        assert!(store.read("../secret").await.unwrap_err().is_not_found());
        assert!(store.delete("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        let created = store.create(DocumentDraft::default()).await.unwrap();

        let writers: Vec<_> = (0..16)
            .map(|n| {
                let store = store.clone();
                let id = created.id.clone();
                tokio::spawn(async move { store.update(&id, DocumentDraft::new(format!("v{}", n), "")).await })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        let record = store.read(&created.id).await.unwrap();
        assert!(record.title.starts_with('v'));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_update_never_revives_deleted_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        for _ in 0..50 {
            let created = store.create(DocumentDraft::default()).await.unwrap();
            let update = tokio::spawn({
                let store = store.clone();
                let id = created.id.clone();
                async move { store.update(&id, DocumentDraft::new("late", "")).await }
            });
            let delete = tokio::spawn({
                let store = store.clone();
                let id = created.id.clone();
                async move { store.delete(&id).await }
            });

            delete.await.unwrap().unwrap();
            if let Err(err) = update.await.unwrap() {
                assert!(err.is_not_found());
            }
            assert!(store.read(&created.id).await.unwrap_err().is_not_found());
        }
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_list_tolerates_concurrent_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        let mut ids = Vec::new();
        for _ in 0..64 {
            ids.push(store.create(DocumentDraft::default()).await.unwrap().id);
        }

        let deleter = tokio::spawn({
            let store = store.clone();
            async move {
                for id in ids {
                    store.delete(&id).await.unwrap();
                    tokio::task::yield_now().await;
                }
            }
        });
        while !deleter.is_finished() {
            store.list().await.unwrap();
        }
        deleter.await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }
}

