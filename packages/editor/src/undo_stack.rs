//! # History
//!
//! Linear undo/redo over [`MutationBatch`]es.
//!
//! Every transform hands back the batch it applied, inverses already
//! computed. The stack only stores batches; it never looks inside the tree
//! except to replay or revert one.
//!
//! ```rust,ignore
//! let batch = transforms::insert_text(&mut tree, &at, "hi")?;
//! history.record(batch);
//!
//! history.undo(&mut tree)?;
//! history.redo(&mut tree)?;
//! ```

use std::collections::VecDeque;

use crate::mutations::{Mutation, MutationError};
use crate::tree::DocumentTree;

/// Undo levels kept before the oldest batch is dropped
pub const DEFAULT_MAX_LEVELS: usize = 100;

/// Mutations that undo and redo as one step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationBatch {
    /// Forward mutations, in application order
    pub mutations: Vec<Mutation>,

    /// Inverses, already reversed so they can be applied front to back
    pub inverses: Vec<Mutation>,

    pub description: Option<String>,
}

impl MutationBatch {
    pub fn single(mutation: Mutation, inverse: Mutation) -> Self {
        Self {
            mutations: vec![mutation],
            inverses: vec![inverse],
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append an applied mutation together with its inverse
    pub fn push(&mut self, mutation: Mutation, inverse: Mutation) {
        self.mutations.push(mutation);
        self.inverses.insert(0, inverse);
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// Restore the tree as it was before the batch
    pub fn revert(&self, tree: &mut DocumentTree) -> Result<(), MutationError> {
        self.inverses.iter().try_for_each(|inverse| inverse.apply(tree))
    }

    pub fn replay(&self, tree: &mut DocumentTree) -> Result<(), MutationError> {
        self.mutations.iter().try_for_each(|mutation| mutation.apply(tree))
    }
}

#[derive(Debug)]
pub struct UndoStack {
    done: VecDeque<MutationBatch>,
    undone: Vec<MutationBatch>,
    /// 0 keeps everything
    max_levels: usize,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::bounded(DEFAULT_MAX_LEVELS)
    }

    pub fn bounded(max_levels: usize) -> Self {
        Self {
            done: VecDeque::new(),
            undone: Vec::new(),
            max_levels,
        }
    }

    /// Record a batch that has already been applied.
    ///
    /// Empty batches leave the redo stack alone.
    pub fn record(&mut self, batch: MutationBatch) {
        if batch.is_empty() {
            return;
        }

        self.done.push_back(batch);
        if self.max_levels > 0 && self.done.len() > self.max_levels {
            self.done.pop_front();
        }
        self.undone.clear();
    }

    /// Revert the newest batch. `Ok(false)` when there is nothing to undo.
    pub fn undo(&mut self, tree: &mut DocumentTree) -> Result<bool, MutationError> {
        let Some(batch) = self.done.pop_back() else {
            return Ok(false);
        };
        if let Err(err) = batch.revert(tree) {
            self.done.push_back(batch);
            return Err(err);
        }
        self.undone.push(batch);
        Ok(true)
    }

    /// Replay the most recently undone batch. `Ok(false)` when there is nothing to redo.
    pub fn redo(&mut self, tree: &mut DocumentTree) -> Result<bool, MutationError> {
        let Some(batch) = self.undone.pop() else {
            return Ok(false);
        };
        if let Err(err) = batch.replay(tree) {
            self.undone.push(batch);
            return Err(err);
        }
        self.done.push_back(batch);
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        !self.done.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.done.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.undone.len()
    }

    pub fn clear(&mut self) {
        self.done.clear();
        self.undone.clear();
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.done.back().and_then(|batch| batch.description.as_deref())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.undone.last().and_then(|batch| batch.description.as_deref())
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Path;

    /// Apply an insertion at the start of the first run and return its batch
    fn typed(tree: &mut DocumentTree, text: &str) -> MutationBatch {
        let mutation = Mutation::InsertText {
            path: Path::run(0, 0),
            offset: 0,
            text: text.to_string(),
        };
        let inverse = mutation.to_inverse(tree).unwrap();
        mutation.apply(tree).unwrap();
        MutationBatch::single(mutation, inverse).with_description(format!("type {}", text))
    }

    #[test]
    fn test_fresh_stack_is_empty() {
        let stack = UndoStack::new();
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());
        assert_eq!(stack.undo_description(), None);
    }

    #[test]
    fn test_undo_then_redo() {
        let mut tree = DocumentTree::default();
        let mut stack = UndoStack::new();

        let batch = typed(&mut tree, "Hello");
        stack.record(batch);
        assert_eq!(stack.undo_description(), Some("type Hello"));

        assert!(stack.undo(&mut tree).unwrap());
        assert_eq!(tree, DocumentTree::default());
        assert_eq!(stack.redo_description(), Some("type Hello"));

        assert!(stack.redo(&mut tree).unwrap());
        assert_eq!(tree.text(), "Hello");
        assert_eq!((stack.undo_levels(), stack.redo_levels()), (1, 0));
    }

    #[test]
    fn test_nothing_to_undo_or_redo() {
        let mut tree = DocumentTree::default();
        let mut stack = UndoStack::new();
        assert!(!stack.undo(&mut tree).unwrap());
        assert!(!stack.redo(&mut tree).unwrap());
        assert_eq!(tree, DocumentTree::default());
    }

    #[test]
    fn test_multi_mutation_batch_is_one_step() {
        let mut tree = DocumentTree::default();
        let mut stack = UndoStack::new();

        let mut batch = typed(&mut tree, "World");
        let second = typed(&mut tree, "Hello ");
        batch.push(second.mutations[0].clone(), second.inverses[0].clone());
        stack.record(batch);
        assert_eq!(tree.text(), "Hello World");

        stack.undo(&mut tree).unwrap();
        assert_eq!(tree, DocumentTree::default());
        assert!(!stack.can_undo());
    }

    #[test]
    fn test_recording_clears_redo() {
        let mut tree = DocumentTree::default();
        let mut stack = UndoStack::new();

        let batch = typed(&mut tree, "a");
        stack.record(batch);
        stack.undo(&mut tree).unwrap();
        assert_eq!(stack.redo_levels(), 1);

        let batch = typed(&mut tree, "b");
        stack.record(batch);
        assert_eq!(stack.redo_levels(), 0);
    }

    #[test]
    fn test_empty_batch_keeps_redo() {
        let mut tree = DocumentTree::default();
        let mut stack = UndoStack::new();

        let batch = typed(&mut tree, "a");
        stack.record(batch);
        stack.undo(&mut tree).unwrap();
        stack.record(MutationBatch::default());
        assert_eq!(stack.redo_levels(), 1);
    }

    #[test]
    fn test_oldest_level_dropped() {
        let mut tree = DocumentTree::default();
        let mut stack = UndoStack::bounded(2);

        for text in ["1", "2", "3"] {
            let batch = typed(&mut tree, text);
            stack.record(batch);
        }
        assert_eq!(stack.undo_levels(), 2);

        stack.undo(&mut tree).unwrap();
        stack.undo(&mut tree).unwrap();
        assert!(!stack.can_undo());
        assert_eq!(tree.text(), "1");
    }

    #[test]
    fn test_default_bound() {
        let mut tree = DocumentTree::default();
        let mut stack = UndoStack::default();
        for _ in 0..DEFAULT_MAX_LEVELS + 5 {
            let batch = typed(&mut tree, "x");
            stack.record(batch);
        }
        assert_eq!(stack.undo_levels(), DEFAULT_MAX_LEVELS);
    }
}
