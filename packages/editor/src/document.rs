//! # Document Handle
//!
//! The editable working copy of one document: its tree, its undo history,
//! and a version counter.
//!
//! ## Lifecycle
//!
//! ```text
//! content ──deserialize──> Document ──edit/undo/redo──> Document ──serialize──> content
//! ```
//!
//! Every successful edit bumps `version` and marks the document dirty. A
//! failed edit leaves tree, history and version untouched.

use crate::mutations::{Descendant, Mutation, NodeProperty};
use crate::path::{Path, Point, Range};
use crate::render::{self, RenderOptions};
use crate::serializer;
use crate::transforms;
use crate::tree::{DocumentTree, ImageWidth, Mark};
use crate::undo_stack::{MutationBatch, UndoStack};
use crate::EditorError;

/// Editable document
#[derive(Debug, Default)]
pub struct Document {
    /// Current version number (increments on each change)
    pub version: u64,

    tree: DocumentTree,
    history: UndoStack,
    dirty: bool,
}

impl Document {
    /// Blank document: one empty paragraph
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tree(tree: DocumentTree) -> Self {
        Self {
            tree,
            ..Self::default()
        }
    }

    /// Load persisted content, falling back to a blank document when it
    /// cannot be read
    pub fn from_content(content: &str) -> Self {
        Self::from_tree(serializer::deserialize_or_default(content))
    }

    pub fn tree(&self) -> &DocumentTree {
        &self.tree
    }

    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    /// Check if document has unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Replace the whole tree. History from the previous tree is discarded
    /// since its paths no longer apply.
    pub fn reset(&mut self, tree: DocumentTree) {
        self.tree = tree;
        self.history.clear();
        self.version += 1;
        self.dirty = false;
    }

    /// Persisted content string
    pub fn to_content(&self) -> Result<String, EditorError> {
        Ok(serializer::serialize(&self.tree)?)
    }

    pub fn to_html(&self, options: RenderOptions) -> String {
        render::to_html(&self.tree, options)
    }

    pub fn to_plain_text(&self) -> String {
        render::to_plain_text(&self.tree)
    }

    fn commit(&mut self, batch: MutationBatch) -> MutationBatch {
        if !batch.is_empty() {
            self.version += 1;
            self.dirty = true;
            tracing::trace!(
                version = self.version,
                mutations = batch.len(),
                edit = batch.description.as_deref().unwrap_or(""),
                "applied edit"
            );
            self.history.record(batch.clone());
        }
        batch
    }

    /// Apply a single primitive mutation
    pub fn apply(&mut self, mutation: Mutation) -> Result<MutationBatch, EditorError> {
        let inverse = mutation.to_inverse(&self.tree)?;
        mutation.apply(&mut self.tree)?;
        let description = mutation.name();
        Ok(self.commit(MutationBatch::single(mutation, inverse).with_description(description)))
    }

    pub fn insert_node(&mut self, path: Path, node: impl Into<Descendant>) -> Result<MutationBatch, EditorError> {
        let batch = transforms::insert_node(&mut self.tree, path, node)?;
        Ok(self.commit(batch))
    }

    pub fn remove_node(&mut self, path: Path) -> Result<MutationBatch, EditorError> {
        let batch = transforms::remove_node(&mut self.tree, path)?;
        Ok(self.commit(batch))
    }

    pub fn set_node_property(&mut self, path: Path, property: NodeProperty) -> Result<MutationBatch, EditorError> {
        let batch = transforms::set_node_property(&mut self.tree, path, property)?;
        Ok(self.commit(batch))
    }

    pub fn set_marks(&mut self, range: &Range, marks: &[Mark], enable: bool) -> Result<MutationBatch, EditorError> {
        let batch = transforms::set_marks(&mut self.tree, range, marks, enable)?;
        Ok(self.commit(batch))
    }

    pub fn toggle_mark(&mut self, range: &Range, mark: Mark) -> Result<MutationBatch, EditorError> {
        let batch = transforms::toggle_mark(&mut self.tree, range, mark)?;
        Ok(self.commit(batch))
    }

    pub fn is_mark_active(&self, range: &Range, mark: Mark) -> bool {
        transforms::is_mark_active(&self.tree, range, mark)
    }

    pub fn delete_range(&mut self, range: &Range) -> Result<MutationBatch, EditorError> {
        let batch = transforms::delete_range(&mut self.tree, range)?;
        Ok(self.commit(batch))
    }

    pub fn insert_text(&mut self, at: &Point, text: &str) -> Result<MutationBatch, EditorError> {
        let batch = transforms::insert_text(&mut self.tree, at, text)?;
        Ok(self.commit(batch))
    }

    pub fn insert_break(&mut self, at: &Point) -> Result<MutationBatch, EditorError> {
        let batch = transforms::insert_break(&mut self.tree, at)?;
        Ok(self.commit(batch))
    }

    pub fn insert_image(
        &mut self,
        index: usize,
        url: impl Into<String>,
        width: ImageWidth,
    ) -> Result<MutationBatch, EditorError> {
        let batch = transforms::insert_image(&mut self.tree, index, url, width)?;
        Ok(self.commit(batch))
    }

    /// Undo the last edit. Returns `false` if there was nothing to undo.
    pub fn undo(&mut self) -> Result<bool, EditorError> {
        let undone = self.history.undo(&mut self.tree)?;
        if undone {
            self.version += 1;
            self.dirty = true;
        }
        Ok(undone)
    }

    /// Redo the last undone edit. Returns `false` if there was nothing to redo.
    pub fn redo(&mut self) -> Result<bool, EditorError> {
        let redone = self.history.redo(&mut self.tree)?;
        if redone {
            self.version += 1;
            self.dirty = true;
        }
        Ok(redone)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}
