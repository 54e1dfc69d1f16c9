//! # Edit Session
//!
//! The single active document of an editor, plus the bookkeeping that keeps
//! network completions honest.
//!
//! Every document opened (or started blank) gets a fresh session-local
//! *slot*. Load and save tickets remember the slot they were issued for;
//! a completion whose slot is no longer active belongs to a document the
//! user has already left and is dropped.
//!
//! ```text
//! begin_load(id) ──> LoadTicket ──(store.read)──> finish_load(ticket, result)
//! begin_save()   ──> SaveTicket ──(store.update)─> finish_save(ticket, result)
//! ```

use folio_editor::{deserialize_or_default, Document, EditorError};
use folio_store::{DocumentDraft, DocumentRecord, StoreError, StoreResult};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to load document {id}: {source}")]
    Load {
        id: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to save document: {0}")]
    Save(#[source] StoreError),

    #[error("Failed to delete document {id}: {source}")]
    Delete {
        id: String,
        #[source]
        source: StoreError,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Editor error: {0}")]
    Editor(#[from] EditorError),
}

/// Issued by [`EditSession::begin_load`]
#[derive(Debug, Clone, PartialEq)]
pub struct LoadTicket {
    pub slot: u64,
    pub id: String,
}

/// Issued by [`EditSession::begin_save`]; carries the snapshot to send
#[derive(Debug, Clone, PartialEq)]
pub struct SaveTicket {
    pub slot: u64,
    /// `None` for a document that has never been saved
    pub id: Option<String>,
    pub draft: DocumentDraft,
    /// Document version the snapshot was taken at
    pub version: u64,
}

#[derive(Debug)]
pub struct EditSession {
    document: Document,
    id: Option<String>,
    title: String,
    slot: u64,
    next_slot: u64,
    saving: bool,
    loading: bool,
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditSession {
    /// Start with a blank, unsaved document
    pub fn new() -> Self {
        Self {
            document: Document::new(),
            id: None,
            title: String::new(),
            slot: 1,
            next_slot: 2,
            saving: false,
            loading: false,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Store id of the active document, `None` until first saved
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn slot(&self) -> u64 {
        self.slot
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Switch to another document: fresh slot, blank tree, empty history,
    /// no save in flight
    fn switch(&mut self, id: Option<String>, title: String) {
        self.slot = self.next_slot;
        self.next_slot += 1;
        self.document = Document::new();
        self.id = id;
        self.title = title;
        self.saving = false;
        self.loading = false;
    }

    /// Leave the active document for a blank unsaved one
    pub fn new_document(&mut self) {
        self.switch(None, String::new());
        tracing::debug!(slot = self.slot, "started new document");
    }

    pub fn begin_load(&mut self, id: impl Into<String>) -> LoadTicket {
        let id = id.into();
        self.switch(Some(id.clone()), String::new());
        self.loading = true;
        tracing::debug!(slot = self.slot, %id, "loading document");
        LoadTicket { slot: self.slot, id }
    }

    /// Apply a load result. Returns `Ok(false)` when the ticket is stale.
    ///
    /// A failed load leaves a fresh unsaved document behind and reports the
    /// error.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: StoreResult<DocumentRecord>) -> Result<bool, SessionError> {
        if ticket.slot != self.slot {
            tracing::debug!(slot = ticket.slot, active = self.slot, id = %ticket.id, "discarding stale load");
            return Ok(false);
        }
        self.loading = false;

        match result {
            Ok(record) => {
                self.document.reset(deserialize_or_default(&record.content));
                self.id = Some(record.id);
                self.title = record.title;
                tracing::info!(id = %ticket.id, "opened document");
                Ok(true)
            }
            Err(source) => {
                tracing::error!(id = %ticket.id, error = %source, "failed to load document");
                self.new_document();
                Err(SessionError::Load { id: ticket.id, source })
            }
        }
    }

    /// Snapshot the active document for saving.
    ///
    /// Returns `None` while a save for this document is still in flight,
    /// or while the document is loading and the tree is only a placeholder.
    /// An empty title is replaced by a generated `New Document <millis>`.
    pub fn begin_save(&mut self) -> Result<Option<SaveTicket>, SessionError> {
        if self.loading {
            tracing::debug!(slot = self.slot, "document still loading, not saving");
            return Ok(None);
        }
        if self.saving {
            tracing::debug!(slot = self.slot, "save already in flight");
            return Ok(None);
        }

        let content = self.document.to_content()?;
        if self.title.is_empty() {
            self.title = generated_title();
        }

        self.saving = true;
        Ok(Some(SaveTicket {
            slot: self.slot,
            id: self.id.clone(),
            draft: DocumentDraft::new(self.title.clone(), content),
            version: self.document.version,
        }))
    }

    /// Apply a save result. Returns `Ok(false)` when the ticket is stale.
    ///
    /// On failure the working copy is untouched so the save can be retried.
    pub fn finish_save(&mut self, ticket: SaveTicket, result: StoreResult<DocumentRecord>) -> Result<bool, SessionError> {
        if ticket.slot != self.slot {
            tracing::debug!(slot = ticket.slot, active = self.slot, "discarding stale save response");
            return Ok(false);
        }
        self.saving = false;

        match result {
            Ok(record) => {
                if self.document.version == ticket.version {
                    self.document.mark_saved();
                }
                tracing::info!(id = %record.id, created = ticket.id.is_none(), "saved document");
                self.id = Some(record.id);
                Ok(true)
            }
            Err(source) => {
                tracing::error!(error = %source, "failed to save document");
                Err(SessionError::Save(source))
            }
        }
    }

    /// Forget the active document if it is `id`
    pub fn close_deleted(&mut self, id: &str) -> bool {
        if self.id.as_deref() == Some(id) {
            self.new_document();
            true
        } else {
            false
        }
    }
}

fn generated_title() -> String {
    format!("New Document {}", chrono::Utc::now().timestamp_millis())
}
