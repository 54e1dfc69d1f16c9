//! # Transforms
//!
//! Editing commands built from primitive [`Mutation`]s.
//!
//! Every transform runs inside a transaction: each primitive is applied
//! with its inverse recorded, and if a later step fails the recorded
//! inverses are replayed so the tree comes back unchanged. On success the
//! applied [`MutationBatch`] is returned for the undo stack.
//!
//! Offsets are counted in characters. Formatting and deletion work on
//! paragraph-level character spans and then renormalize the run list:
//! adjacent runs with equal marks are merged and stray empty runs dropped,
//! so toggling a mark twice leaves the same runs it started with.

use crate::mutations::{Descendant, Mutation, MutationError, NodeProperty};
use crate::path::{Path, Point, Range};
use crate::tree::{DocumentTree, ImageWidth, Mark, Node, TextRun};
use crate::undo_stack::MutationBatch;

struct Transaction<'a> {
    tree: &'a mut DocumentTree,
    batch: MutationBatch,
}

impl<'a> Transaction<'a> {
    fn new(tree: &'a mut DocumentTree) -> Self {
        Self {
            tree,
            batch: MutationBatch::default(),
        }
    }

    fn tree(&self) -> &DocumentTree {
        self.tree
    }

    fn apply(&mut self, mutation: Mutation) -> Result<(), MutationError> {
        let inverse = mutation.to_inverse(self.tree)?;
        mutation.apply(self.tree)?;
        self.batch.push(mutation, inverse);
        Ok(())
    }

    fn rollback(self) {
        if let Err(err) = self.batch.revert(self.tree) {
            tracing::error!(error = %err, "failed to roll back partially applied edit");
        }
    }
}

fn transact<F>(tree: &mut DocumentTree, description: &str, edit: F) -> Result<MutationBatch, MutationError>
where
    F: FnOnce(&mut Transaction<'_>) -> Result<(), MutationError>,
{
    let mut tx = Transaction::new(tree);
    match edit(&mut tx) {
        Ok(()) => Ok(tx.batch.with_description(description)),
        Err(err) => {
            tracing::debug!(error = %err, edit = description, "edit aborted");
            tx.rollback();
            Err(err)
        }
    }
}

/// Character span `[start, end)` inside one paragraph
#[derive(Debug, Clone, Copy, PartialEq)]
struct Span {
    block: usize,
    start: usize,
    end: usize,
}

/// Resolve a point to its block index and paragraph-level character offset.
/// Points inside an image placeholder resolve with offset 0.
fn resolve(tree: &DocumentTree, point: &Point) -> Result<(usize, usize), MutationError> {
    let invalid = || MutationError::InvalidPosition(format!("point {} does not resolve", point));
    let (block, run_index) = point.path.as_run().ok_or_else(invalid)?;
    let run = tree.run(&point.path).ok_or_else(invalid)?;
    if point.offset > run.char_len() {
        return Err(invalid());
    }

    let offset = match tree.node(block).and_then(Node::as_paragraph) {
        Some(paragraph) => paragraph.run_start(run_index) + point.offset,
        None => 0,
    };
    Ok((block, offset))
}

/// Paragraph spans covered by a non-collapsed range, in document order
fn covered_spans(tree: &DocumentTree, range: &Range) -> Result<Vec<Span>, MutationError> {
    let (start_block, start_offset) = resolve(tree, range.start())?;
    let (end_block, end_offset) = resolve(tree, range.end())?;

    let spans = (start_block..=end_block)
        .filter_map(|block| {
            let paragraph = tree.paragraph(block)?;
            let start = if block == start_block { start_offset } else { 0 };
            let end = if block == end_block {
                end_offset
            } else {
                paragraph.char_len()
            };
            (start < end).then_some(Span { block, start, end })
        })
        .collect();
    Ok(spans)
}

/// Split the run containing paragraph offset `at`, unless `at` already
/// falls on a run boundary
fn split_at(tx: &mut Transaction<'_>, block: usize, at: usize) -> Result<(), MutationError> {
    let Some(paragraph) = tx.tree().paragraph(block) else {
        return Ok(());
    };

    let mut run_start = 0;
    let mut target = None;
    for (index, run) in paragraph.children.iter().enumerate() {
        let len = run.char_len();
        if at > run_start && at < run_start + len {
            target = Some((index, at - run_start));
            break;
        }
        run_start += len;
    }

    match target {
        Some((index, offset)) => tx.apply(Mutation::SplitRun {
            path: Path::run(block, index),
            offset,
        }),
        None => Ok(()),
    }
}

/// Indices of the non-empty runs lying entirely inside `span`
fn runs_within(tree: &DocumentTree, span: Span) -> Vec<usize> {
    let Some(paragraph) = tree.paragraph(span.block) else {
        return Vec::new();
    };

    let mut run_start = 0;
    let mut indices = Vec::new();
    for (index, run) in paragraph.children.iter().enumerate() {
        let len = run.char_len();
        if len > 0 && run_start >= span.start && run_start + len <= span.end {
            indices.push(index);
        }
        run_start += len;
    }
    indices
}

/// Merge adjacent runs with equal marks and drop empty runs next to others
fn normalize_block(tx: &mut Transaction<'_>, block: usize) -> Result<(), MutationError> {
    let Some(len) = tx.tree().paragraph(block).map(|p| p.children.len()) else {
        return Ok(());
    };

    for index in (1..len).rev() {
        let Some(paragraph) = tx.tree().paragraph(block) else {
            break;
        };
        let (Some(previous), Some(current)) = (paragraph.children.get(index - 1), paragraph.children.get(index))
        else {
            continue;
        };

        let mutation = if previous.marks == current.marks {
            Mutation::MergeRun {
                path: Path::run(block, index),
            }
        } else if current.is_empty() {
            Mutation::RemoveNode {
                path: Path::run(block, index),
            }
        } else if previous.is_empty() {
            Mutation::RemoveNode {
                path: Path::run(block, index - 1),
            }
        } else {
            continue;
        };
        tx.apply(mutation)?;
    }
    Ok(())
}

/// Remove a top-level node, keeping the document non-empty
fn remove_block(tx: &mut Transaction<'_>, index: usize) -> Result<(), MutationError> {
    if tx.tree().len() == 1 {
        tx.apply(Mutation::InsertNode {
            path: Path::block(1),
            node: Node::empty_paragraph().into(),
        })?;
    }
    tx.apply(Mutation::RemoveNode {
        path: Path::block(index),
    })
}

/// Remove the characters of `span` from its paragraph
fn remove_span_text(tx: &mut Transaction<'_>, span: Span) -> Result<(), MutationError> {
    let Some(paragraph) = tx.tree().paragraph(span.block) else {
        return Ok(());
    };

    let mut removals = Vec::new();
    let mut run_start = 0;
    for (index, run) in paragraph.children.iter().enumerate() {
        let run_end = run_start + run.char_len();
        let from = span.start.max(run_start);
        let to = span.end.min(run_end);
        if from < to {
            removals.push(Mutation::RemoveText {
                path: Path::run(span.block, index),
                offset: from - run_start,
                length: to - from,
            });
        }
        run_start = run_end;
    }

    removals.into_iter().try_for_each(|mutation| tx.apply(mutation))
}

/// Insert a node (`[i]`) or a paragraph run (`[i, j]`) at `path`
pub fn insert_node(
    tree: &mut DocumentTree,
    path: Path,
    node: impl Into<Descendant>,
) -> Result<MutationBatch, MutationError> {
    let node = node.into();
    transact(tree, "Insert node", |tx| tx.apply(Mutation::InsertNode { path, node }))
}

/// Remove the node or run at `path`. Removing the only top-level node
/// leaves an empty paragraph in its place.
pub fn remove_node(tree: &mut DocumentTree, path: Path) -> Result<MutationBatch, MutationError> {
    transact(tree, "Remove node", |tx| match path.as_block() {
        Some(index) if index < tx.tree().len() => remove_block(tx, index),
        Some(_) => Err(MutationError::NodeNotFound(path.clone())),
        None => tx.apply(Mutation::RemoveNode { path: path.clone() }),
    })
}

/// Set a property such as `width` on the node at `path`
pub fn set_node_property(
    tree: &mut DocumentTree,
    path: Path,
    property: NodeProperty,
) -> Result<MutationBatch, MutationError> {
    transact(tree, "Set node property", |tx| {
        tx.apply(Mutation::SetNodeProperty { path, property })
    })
}

/// Set (`enable`) or clear every mark in `marks` on the text covered by
/// `range`, splitting runs at the range boundaries.
///
/// A collapsed range only formats an empty run under the caret.
pub fn set_marks(
    tree: &mut DocumentTree,
    range: &Range,
    marks: &[Mark],
    enable: bool,
) -> Result<MutationBatch, MutationError> {
    let apply_marks = |current: crate::tree::Marks| {
        marks
            .iter()
            .fold(current, |acc, mark| acc.with(*mark, enable))
    };

    if range.is_collapsed() {
        resolve(tree, range.start())?;
        let path = range.start().path.clone();
        return transact(tree, "Set marks", |tx| {
            let target = match path.root().and_then(|block| tx.tree().paragraph(block)) {
                Some(_) => tx.tree().run(&path).filter(|run| run.is_empty()).map(|run| run.marks),
                None => None,
            };
            match target {
                Some(current) if apply_marks(current) != current => tx.apply(Mutation::SetMarks {
                    marks: apply_marks(current),
                    path,
                }),
                _ => Ok(()),
            }
        });
    }

    let spans = covered_spans(tree, range)?;
    transact(tree, "Set marks", |tx| {
        for span in spans.iter().rev() {
            split_at(tx, span.block, span.end)?;
            split_at(tx, span.block, span.start)?;

            for index in runs_within(tx.tree(), *span) {
                let path = Path::run(span.block, index);
                let Some(current) = tx.tree().run(&path).map(|run| run.marks) else {
                    continue;
                };
                let next = apply_marks(current);
                if next != current {
                    tx.apply(Mutation::SetMarks { path, marks: next })?;
                }
            }

            normalize_block(tx, span.block)?;
        }
        Ok(())
    })
}

/// True iff at least one run overlapping `range` carries `mark`.
///
/// For a collapsed range this is the run holding the caret. Ranges that do
/// not resolve report `false`.
pub fn is_mark_active(tree: &DocumentTree, range: &Range, mark: Mark) -> bool {
    if range.is_collapsed() {
        let path = &range.start().path;
        let in_paragraph = path.root().and_then(|block| tree.paragraph(block)).is_some();
        return in_paragraph && tree.run(path).is_some_and(|run| run.marks.has(mark));
    }

    let Ok(spans) = covered_spans(tree, range) else {
        return false;
    };

    spans.iter().any(|span| {
        let Some(paragraph) = tree.paragraph(span.block) else {
            return false;
        };
        let mut run_start = 0;
        paragraph.children.iter().any(|run| {
            let run_end = run_start + run.char_len();
            let overlaps = run_start < span.end && run_end > span.start;
            run_start = run_end;
            overlaps && run.marks.has(mark)
        })
    })
}

/// Binary toggle: clear `mark` across the range if any run has it,
/// otherwise set it across the range
pub fn toggle_mark(tree: &mut DocumentTree, range: &Range, mark: Mark) -> Result<MutationBatch, MutationError> {
    let active = is_mark_active(tree, range, mark);
    set_marks(tree, range, &[mark], !active).map(|batch| {
        let verb = if active { "Remove" } else { "Apply" };
        batch.with_description(format!("{} {}", verb, mark))
    })
}

/// Insert text at a caret inside a paragraph
pub fn insert_text(tree: &mut DocumentTree, at: &Point, text: &str) -> Result<MutationBatch, MutationError> {
    resolve(tree, at)?;
    transact(tree, "Insert text", |tx| {
        if text.is_empty() {
            return Ok(());
        }
        tx.apply(Mutation::InsertText {
            path: at.path.clone(),
            offset: at.offset,
            text: text.to_string(),
        })
    })
}

/// Split the paragraph at the caret. At an image, open an empty paragraph
/// after it.
pub fn insert_break(tree: &mut DocumentTree, at: &Point) -> Result<MutationBatch, MutationError> {
    let (block, _) = resolve(tree, at)?;
    transact(tree, "Insert break", |tx| {
        let Some((_, run)) = at.path.as_run() else {
            return Err(MutationError::InvalidPosition(format!("point {} does not resolve", at)));
        };

        if tx.tree().paragraph(block).is_none() {
            return tx.apply(Mutation::InsertNode {
                path: Path::block(block + 1),
                node: Node::empty_paragraph().into(),
            });
        }

        tx.apply(Mutation::SplitRun {
            path: at.path.clone(),
            offset: at.offset,
        })?;
        tx.apply(Mutation::SplitBlock {
            path: Path::block(block),
            position: run + 1,
        })?;
        normalize_block(tx, block + 1)?;
        normalize_block(tx, block)
    })
}

/// Insert an image at top-level `index` followed by an empty paragraph
pub fn insert_image(
    tree: &mut DocumentTree,
    index: usize,
    url: impl Into<String>,
    width: ImageWidth,
) -> Result<MutationBatch, MutationError> {
    let image = Node::image(url, width);
    transact(tree, "Insert image", |tx| {
        tx.apply(Mutation::InsertNode {
            path: Path::block(index),
            node: image.into(),
        })?;
        tx.apply(Mutation::InsertNode {
            path: Path::block(index + 1),
            node: Node::empty_paragraph().into(),
        })
    })
}

/// Delete everything covered by `range`.
///
/// Text inside the boundary paragraphs is removed, blocks strictly between
/// them are dropped, images at a boundary are dropped when the range runs
/// past them, and the two boundary paragraphs are joined.
pub fn delete_range(tree: &mut DocumentTree, range: &Range) -> Result<MutationBatch, MutationError> {
    let (start_block, start_offset) = resolve(tree, range.start())?;
    let (end_block, end_offset) = resolve(tree, range.end())?;

    transact(tree, "Delete", |tx| {
        if range.is_collapsed() {
            return Ok(());
        }

        if start_block == end_block {
            remove_span_text(
                tx,
                Span {
                    block: start_block,
                    start: start_offset,
                    end: end_offset,
                },
            )?;
            return normalize_block(tx, start_block);
        }

        let start_is_paragraph = tx.tree().paragraph(start_block).is_some();
        let end_is_paragraph = tx.tree().paragraph(end_block).is_some();

        // End first so earlier indices stay valid
        if end_is_paragraph {
            remove_span_text(
                tx,
                Span {
                    block: end_block,
                    start: 0,
                    end: end_offset,
                },
            )?;
        } else {
            remove_block(tx, end_block)?;
        }

        for block in (start_block + 1..end_block).rev() {
            remove_block(tx, block)?;
        }

        if start_is_paragraph {
            let len = tx.tree().paragraph(start_block).map_or(0, |p| p.char_len());
            remove_span_text(
                tx,
                Span {
                    block: start_block,
                    start: start_offset,
                    end: len,
                },
            )?;
        } else {
            remove_block(tx, start_block)?;
        }

        if start_is_paragraph && end_is_paragraph {
            tx.apply(Mutation::MergeBlock {
                path: Path::block(start_block + 1),
            })?;
        }

        if tx.tree().paragraph(start_block).is_some() {
            normalize_block(tx, start_block)?;
        }
        Ok(())
    })
}

/// Insert a run with the given text and marks at the end of a paragraph
pub fn append_run(tree: &mut DocumentTree, block: usize, run: TextRun) -> Result<MutationBatch, MutationError> {
    let position = tree
        .paragraph(block)
        .map(|p| p.children.len())
        .ok_or_else(|| MutationError::InvalidPosition(format!("no paragraph at {}", block)))?;
    insert_node(tree, Path::run(block, position), run)
}
