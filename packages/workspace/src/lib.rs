pub mod client;
pub mod config;
pub mod server;
pub mod session;

pub use client::{EditorClient, SaveOutcome};
pub use config::{ServerConfig, DEFAULT_CONFIG_NAME};
pub use server::{app, router, ServeOptions, ServerError, BODY_LIMIT};
pub use session::{EditSession, LoadTicket, SaveTicket, SessionError};

// Re-export the layers this crate ties together
pub use folio_editor as editor;
pub use folio_store as store;
