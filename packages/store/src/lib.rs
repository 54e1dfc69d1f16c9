//! # Folio Store
//!
//! Persistence for Folio documents behind one async trait.
//!
//! - [`MemoryStore`]: in-process, for tests and ephemeral servers
//! - [`FileStore`]: a directory of JSON files, used by `folio-server`
//! - [`HttpStore`]: client for the REST surface `folio-server` exposes
//!
//! ```rust,ignore
//! use folio_store::{DocumentDraft, DocumentStore, HttpStore};
//!
//! let store = HttpStore::new("http://127.0.0.1:5000/api");
//! let record = store.create(DocumentDraft::new("Notes", "")).await?;
//! ```

pub mod errors;
pub mod file;
pub mod http;
pub mod memory;
pub mod record;
pub mod store;

pub use errors::{StoreError, StoreResult};
pub use file::FileStore;
pub use http::{HttpStore, DEFAULT_BASE_URL};
pub use memory::MemoryStore;
pub use record::{DocumentDraft, DocumentRecord, DocumentSummary, DEFAULT_TITLE};
pub use store::DocumentStore;
