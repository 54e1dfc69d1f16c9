use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::StoreResult;
use crate::record::{DocumentDraft, DocumentRecord, DocumentSummary};

/// Persistence collaborator: CRUD plus listing, keyed by an opaque id
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store a new document under a fresh id
    async fn create(&self, draft: DocumentDraft) -> StoreResult<DocumentRecord>;

    async fn read(&self, id: &str) -> StoreResult<DocumentRecord>;

    /// Replace title and content of an existing document
    async fn update(&self, id: &str, draft: DocumentDraft) -> StoreResult<DocumentRecord>;

    async fn delete(&self, id: &str) -> StoreResult<()>;

    /// All documents, oldest first
    async fn list(&self) -> StoreResult<Vec<DocumentSummary>>;
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    async fn create(&self, draft: DocumentDraft) -> StoreResult<DocumentRecord> {
        (**self).create(draft).await
    }

    async fn read(&self, id: &str) -> StoreResult<DocumentRecord> {
        (**self).read(id).await
    }

    async fn update(&self, id: &str, draft: DocumentDraft) -> StoreResult<DocumentRecord> {
        (**self).update(id, draft).await
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        (**self).delete(id).await
    }

    async fn list(&self) -> StoreResult<Vec<DocumentSummary>> {
        (**self).list().await
    }
}
