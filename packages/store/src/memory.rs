use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::errors::{StoreError, StoreResult};
use crate::record::{new_id, DocumentDraft, DocumentRecord, DocumentSummary};
use crate::store::DocumentStore;

/// In-process store, kept in insertion order
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<DocumentRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<DocumentRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, draft: DocumentDraft) -> StoreResult<DocumentRecord> {
        let record = draft.into_record(new_id());
        self.records.write().await.push(record.clone());
        tracing::debug!(id = %record.id, "created document");
        Ok(record)
    }

    async fn read(&self, id: &str) -> StoreResult<DocumentRecord> {
        self.records
            .read()
            .await
            .iter()
            .find(|record| record.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn update(&self, id: &str, draft: DocumentDraft) -> StoreResult<DocumentRecord> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.title = draft.title;
        record.content = draft.content;
        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let mut records = self.records.write().await;
        let index = records
            .iter()
            .position(|record| record.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        records.remove(index);
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<DocumentSummary>> {
        Ok(self.records.read().await.iter().map(DocumentSummary::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_crud_cycle() {
        let store = MemoryStore::new();
        assert!(store.list().await.unwrap().is_empty());

        let created = store.create(DocumentDraft::new("Notes", "")).await.unwrap();
        assert_eq!(store.read(&created.id).await.unwrap(), created);

        let updated = store
            .update(&created.id, DocumentDraft::new("Notes v2", "[]"))
            .await
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.content, "[]");

        store.delete(&created.id).await.unwrap();
        assert!(store.read(&created.id).await.unwrap_err().is_not_found());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_missing_ids_report_not_found() {
        let store = MemoryStore::new();
        assert!(store.update("nope", DocumentDraft::default()).await.unwrap_err().is_not_found());
        assert!(store.delete("nope").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order() {
        let store = MemoryStore::new();
        for title in ["a", "b", "c"] {
            store.create(DocumentDraft::new(title, "")).await.unwrap();
        }
        let titles: Vec<_> = store.list().await.unwrap().into_iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }
}
