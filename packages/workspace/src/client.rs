//! Async driver that connects an [`EditSession`] to a [`DocumentStore`].
//!
//! The session sits behind a `std::sync::Mutex` that is only held between
//! awaits, so the document stays editable while a request is in flight.

use folio_store::{DocumentRecord, DocumentStore, DocumentSummary};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::session::{EditSession, SessionError};

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// The store accepted the snapshot
    Saved(DocumentRecord),
    /// A save for this document was already in flight; nothing was sent
    Suppressed,
    /// The document has not finished loading; nothing was sent
    Loading,
    /// The user switched documents before the response arrived
    Stale,
}

pub struct EditorClient<S> {
    session: Arc<Mutex<EditSession>>,
    store: Arc<S>,
}

impl<S> Clone for EditorClient<S> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            store: self.store.clone(),
        }
    }
}

impl<S: DocumentStore> EditorClient<S> {
    pub fn new(store: S) -> Self {
        Self::with_store(Arc::new(store))
    }

    pub fn with_store(store: Arc<S>) -> Self {
        Self {
            session: Arc::new(Mutex::new(EditSession::new())),
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Lock the session. Never hold the guard across an `.await`.
    pub fn session(&self) -> MutexGuard<'_, EditSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn new_document(&self) {
        self.session().new_document();
    }

    pub async fn list(&self) -> Result<Vec<DocumentSummary>, SessionError> {
        self.store.list().await.map_err(|e| {
            tracing::error!(error = %e, "failed to list documents");
            SessionError::Store(e)
        })
    }

    /// Make `id` the active document. Returns `Ok(false)` if another document
    /// was opened before this one finished loading.
    pub async fn open(&self, id: &str) -> Result<bool, SessionError> {
        let ticket = self.session().begin_load(id);
        let result = self.store.read(id).await;
        self.session().finish_load(ticket, result)
    }

    /// Save the active document, creating it on first save
    pub async fn save(&self) -> Result<SaveOutcome, SessionError> {
        let ticket = {
            let mut session = self.session();
            if session.is_loading() {
                return Ok(SaveOutcome::Loading);
            }
            match session.begin_save()? {
                Some(ticket) => ticket,
                None => return Ok(SaveOutcome::Suppressed),
            }
        };

        let result = match &ticket.id {
            Some(id) => self.store.update(id, ticket.draft.clone()).await,
            None => self.store.create(ticket.draft.clone()).await,
        };
        let record = result.as_ref().ok().cloned();

        if self.session().finish_save(ticket, result)? {
            Ok(record.map(SaveOutcome::Saved).unwrap_or(SaveOutcome::Stale))
        } else {
            Ok(SaveOutcome::Stale)
        }
    }

    /// Delete a stored document. If it is the active one the session moves
    /// to a blank document; on failure nothing changes.
    pub async fn delete(&self, id: &str) -> Result<(), SessionError> {
        if let Err(source) = self.store.delete(id).await {
            tracing::error!(%id, error = %source, "failed to delete document");
            return Err(SessionError::Delete {
                id: id.to_string(),
                source,
            });
        }
        tracing::info!(%id, "deleted document");
        self.session().close_deleted(id);
        Ok(())
    }
}
