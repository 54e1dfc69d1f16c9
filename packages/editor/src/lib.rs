//! # Folio Editor
//!
//! Core editing model for Folio rich-text documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ serializer: content string ⇄ DocumentTree   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: Document + edits                    │
//! │  - Primitive invertible mutations           │
//! │  - Transforms (format, delete, break, ...)  │
//! │  - Linear undo/redo history                 │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ render: HTML / plain text views             │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Tree is source of truth**: content strings and HTML are derived views
//! 2. **Invertible edits**: every primitive knows its inverse before it runs
//! 3. **Atomic transforms**: a failed transform leaves the tree untouched
//! 4. **Never empty**: a document always holds at least one node
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_editor::{Document, Mark, Range};
//!
//! let mut doc = Document::from_content(&record.content);
//!
//! doc.toggle_mark(&Range::within_run(0, 0, 0, 5), Mark::Bold)?;
//! doc.undo()?;
//!
//! let content = doc.to_content()?;
//! ```

mod document;
mod errors;
pub mod mutations;
pub mod path;
pub mod render;
pub mod serializer;
pub mod transforms;
pub mod tree;
mod undo_stack;

pub use document::Document;
pub use errors::EditorError;
pub use mutations::{Descendant, Mutation, MutationError, NodeProperty};
pub use path::{Path, Point, Range};
pub use render::{to_html, to_plain_text, RenderOptions};
pub use serializer::{deserialize, deserialize_or_default, serialize, SerializeError};
pub use tree::{
    is_valid_tree, DocumentTree, Image, ImageWidth, Mark, Marks, Node, Paragraph, TextRun, TreeError,
    UnknownNode,
};
pub use undo_stack::{MutationBatch, UndoStack, DEFAULT_MAX_LEVELS};
