//! # Tree Mutations
//!
//! Primitive, invertible operations on a [`DocumentTree`].
//!
//! ## Design Principles
//!
//! 1. **Atomic**: each mutation is one structural change
//! 2. **Validated**: paths and offsets are checked before anything changes
//! 3. **Invertible**: `to_inverse` is computed against the tree the mutation
//!    is about to be applied to, so undo never needs a snapshot
//! 4. **Shape-preserving**: no mutation can leave the tree empty or an
//!    image without its placeholder run
//!
//! Higher-level edits (formatting a range, deleting a selection) are
//! sequences of these primitives, see [`crate::transforms`].
//!
//! | Mutation       | Inverse                 |
//! |----------------|-------------------------|
//! | `InsertNode`   | `RemoveNode`            |
//! | `RemoveNode`   | `InsertNode`            |
//! | `InsertText`   | `RemoveText`            |
//! | `RemoveText`   | `InsertText`            |
//! | `SplitRun`     | `MergeRun`              |
//! | `MergeRun`     | `SplitRun`              |
//! | `SplitBlock`   | `MergeBlock`            |
//! | `MergeBlock`   | `SplitBlock`            |
//! | `SetMarks`     | `SetMarks` (old)        |
//! | `SetNodeProperty` | `SetNodeProperty` (old) |

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::path::Path;
use crate::tree::{byte_index, DocumentTree, ImageWidth, Marks, Node, Paragraph, TextRun};

/// Content that can be inserted into the tree
///
/// Objects carrying a `type` are nodes; anything else is a text run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Descendant {
    Text(TextRun),
    Node(Node),
}

impl<'de> Deserialize<'de> for Descendant {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        if raw.get("type").is_some() {
            serde_json::from_value(raw).map(Descendant::Node).map_err(D::Error::custom)
        } else {
            serde_json::from_value(raw).map(Descendant::Text).map_err(D::Error::custom)
        }
    }
}

impl From<Node> for Descendant {
    fn from(node: Node) -> Self {
        Descendant::Node(node)
    }
}

impl From<TextRun> for Descendant {
    fn from(run: TextRun) -> Self {
        Descendant::Text(run)
    }
}

/// Settable node property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value", rename_all = "snake_case")]
pub enum NodeProperty {
    Width(ImageWidth),
    Url(String),
}

impl NodeProperty {
    pub fn key(&self) -> &'static str {
        match self {
            NodeProperty::Width(_) => "width",
            NodeProperty::Url(_) => "url",
        }
    }

    /// Build a property from its key and textual value
    pub fn from_key_value(key: &str, value: &str) -> Result<Self, MutationError> {
        match key {
            "width" => value
                .parse()
                .map(NodeProperty::Width)
                .map_err(|e| MutationError::InvalidStructure(e.to_string())),
            "url" => Ok(NodeProperty::Url(value.to_string())),
            other => Err(MutationError::UnsupportedProperty {
                property: other.to_string(),
                kind: "any".to_string(),
            }),
        }
    }
}

/// Primitive tree operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    /// Insert a top-level node (`[i]`) or a run into a paragraph (`[i, j]`)
    InsertNode { path: Path, node: Descendant },

    /// Remove the node or run at `path`
    RemoveNode { path: Path },

    /// Insert text into a paragraph run
    InsertText {
        path: Path,
        offset: usize,
        text: String,
    },

    /// Remove `length` characters from a paragraph run
    RemoveText {
        path: Path,
        offset: usize,
        length: usize,
    },

    /// Split a run in two at `offset`; both halves keep the marks
    SplitRun { path: Path, offset: usize },

    /// Append the run at `path` to its previous sibling (marks must match)
    MergeRun { path: Path },

    /// Move runs `position..` of a paragraph into a new paragraph after it
    SplitBlock { path: Path, position: usize },

    /// Append the paragraph at `path` to the paragraph before it
    MergeBlock { path: Path },

    /// Replace the mark set of a paragraph run
    SetMarks { path: Path, marks: Marks },

    /// Set a property on an image
    SetNodeProperty { path: Path, property: NodeProperty },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    #[error("Node not found: {0}")]
    NodeNotFound(Path),

    #[error("Property `{property}` is not supported on {kind} nodes")]
    UnsupportedProperty { property: String, kind: String },

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),
}

impl Mutation {
    /// Short name for logs and batch descriptions
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::InsertNode { .. } => "insert_node",
            Mutation::RemoveNode { .. } => "remove_node",
            Mutation::InsertText { .. } => "insert_text",
            Mutation::RemoveText { .. } => "remove_text",
            Mutation::SplitRun { .. } => "split_run",
            Mutation::MergeRun { .. } => "merge_run",
            Mutation::SplitBlock { .. } => "split_block",
            Mutation::MergeBlock { .. } => "merge_block",
            Mutation::SetMarks { .. } => "set_marks",
            Mutation::SetNodeProperty { .. } => "set_node_property",
        }
    }

    /// Check that this mutation can be applied without changing anything
    pub fn validate(&self, tree: &DocumentTree) -> Result<(), MutationError> {
        self.to_inverse(tree).map(|_| ())
    }

    /// Compute the mutation that undoes `self`, against the tree before
    /// `self` is applied. Fails exactly when `apply` would fail.
    pub fn to_inverse(&self, tree: &DocumentTree) -> Result<Mutation, MutationError> {
        match self {
            Mutation::InsertNode { path, node } => {
                check_insert(tree, path, node)?;
                Ok(Mutation::RemoveNode { path: path.clone() })
            }

            Mutation::RemoveNode { path } => {
                let node = removable(tree, path)?;
                Ok(Mutation::InsertNode {
                    path: path.clone(),
                    node,
                })
            }

            Mutation::InsertText { path, offset, text } => {
                let run = editable_run(tree, path)?;
                check_offset(run, path, *offset)?;
                Ok(Mutation::RemoveText {
                    path: path.clone(),
                    offset: *offset,
                    length: text.chars().count(),
                })
            }

            Mutation::RemoveText {
                path,
                offset,
                length,
            } => {
                let run = editable_run(tree, path)?;
                let end = span_end(path, *offset, *length)?;
                check_offset(run, path, end)?;
                let start = byte_index(&run.text, *offset);
                let end = byte_index(&run.text, end);
                Ok(Mutation::InsertText {
                    path: path.clone(),
                    offset: *offset,
                    text: run.text[start..end].to_string(),
                })
            }

            Mutation::SplitRun { path, offset } => {
                let run = editable_run(tree, path)?;
                check_offset(run, path, *offset)?;
                Ok(Mutation::MergeRun { path: path.next() })
            }

            Mutation::MergeRun { path } => {
                let run = editable_run(tree, path)?;
                let previous_path = path.previous().ok_or_else(|| {
                    MutationError::InvalidStructure(format!("run {} has no previous sibling", path))
                })?;
                let previous = editable_run(tree, &previous_path)?;
                if previous.marks != run.marks {
                    return Err(MutationError::InvalidStructure(format!(
                        "cannot merge run {} into a run with different marks",
                        path
                    )));
                }
                Ok(Mutation::SplitRun {
                    path: previous_path,
                    offset: previous.char_len(),
                })
            }

            Mutation::SplitBlock { path, position } => {
                let paragraph = paragraph_at(tree, path)?;
                if *position == 0 || *position >= paragraph.children.len() {
                    return Err(MutationError::InvalidPosition(format!(
                        "cannot split paragraph {} at run {}",
                        path, position
                    )));
                }
                Ok(Mutation::MergeBlock { path: path.next() })
            }

            Mutation::MergeBlock { path } => {
                paragraph_at(tree, path)?;
                let previous_path = path.previous().ok_or_else(|| {
                    MutationError::InvalidStructure(format!("block {} has no previous sibling", path))
                })?;
                let previous = paragraph_at(tree, &previous_path)?;
                Ok(Mutation::SplitBlock {
                    path: previous_path,
                    position: previous.children.len(),
                })
            }

            Mutation::SetMarks { path, .. } => {
                let run = editable_run(tree, path)?;
                Ok(Mutation::SetMarks {
                    path: path.clone(),
                    marks: run.marks,
                })
            }

            Mutation::SetNodeProperty { path, property } => {
                let node = path
                    .as_block()
                    .and_then(|index| tree.node(index))
                    .ok_or_else(|| MutationError::NodeNotFound(path.clone()))?;
                let image = node.as_image().ok_or_else(|| MutationError::UnsupportedProperty {
                    property: property.key().to_string(),
                    kind: node.kind().to_string(),
                })?;
                let previous = match property {
                    NodeProperty::Width(_) => NodeProperty::Width(image.width),
                    NodeProperty::Url(_) => NodeProperty::Url(image.url.clone()),
                };
                Ok(Mutation::SetNodeProperty {
                    path: path.clone(),
                    property: previous,
                })
            }
        }
    }

    /// Apply mutation to the tree with validation
    pub fn apply(&self, tree: &mut DocumentTree) -> Result<(), MutationError> {
        // Validate first
        self.validate(tree)?;

        match self {
            Mutation::InsertNode { path, node } => Self::apply_insert(tree, path, node),
            Mutation::RemoveNode { path } => Self::apply_remove(tree, path),
            Mutation::InsertText { path, offset, text } => {
                let run = run_mut(tree, path)?;
                let at = byte_index(&run.text, *offset);
                run.text.insert_str(at, text);
                Ok(())
            }
            Mutation::RemoveText {
                path,
                offset,
                length,
            } => {
                let run = run_mut(tree, path)?;
                let end = span_end(path, *offset, *length)?;
                let start = byte_index(&run.text, *offset);
                let end = byte_index(&run.text, end);
                run.text.replace_range(start..end, "");
                Ok(())
            }
            Mutation::SplitRun { path, offset } => Self::apply_split_run(tree, path, *offset),
            Mutation::MergeRun { path } => Self::apply_merge_run(tree, path),
            Mutation::SplitBlock { path, position } => Self::apply_split_block(tree, path, *position),
            Mutation::MergeBlock { path } => Self::apply_merge_block(tree, path),
            Mutation::SetMarks { path, marks } => {
                run_mut(tree, path)?.marks = *marks;
                Ok(())
            }
            Mutation::SetNodeProperty { path, property } => {
                let image = path
                    .as_block()
                    .and_then(|index| tree.node_mut(index))
                    .and_then(Node::as_image_mut)
                    .ok_or_else(|| MutationError::NodeNotFound(path.clone()))?;
                match property {
                    NodeProperty::Width(width) => image.width = *width,
                    NodeProperty::Url(url) => image.url = url.clone(),
                }
                Ok(())
            }
        }
    }

    fn apply_insert(tree: &mut DocumentTree, path: &Path, node: &Descendant) -> Result<(), MutationError> {
        match (path.indices(), node) {
            ([index], Descendant::Node(node)) => {
                tree.nodes_mut().insert(*index, node.clone());
                Ok(())
            }
            ([block, run], Descendant::Text(text_run)) => {
                let paragraph = paragraph_mut(tree, *block, path)?;
                paragraph.children.insert(*run, text_run.clone());
                Ok(())
            }
            _ => Err(MutationError::InvalidPosition(format!("cannot insert at {}", path))),
        }
    }

    fn apply_remove(tree: &mut DocumentTree, path: &Path) -> Result<(), MutationError> {
        match path.indices() {
            [index] => {
                tree.nodes_mut().remove(*index);
                Ok(())
            }
            [block, run] => {
                paragraph_mut(tree, *block, path)?.children.remove(*run);
                Ok(())
            }
            _ => Err(MutationError::NodeNotFound(path.clone())),
        }
    }

    fn apply_split_run(tree: &mut DocumentTree, path: &Path, offset: usize) -> Result<(), MutationError> {
        let (block, index) = path
            .as_run()
            .ok_or_else(|| MutationError::NodeNotFound(path.clone()))?;
        let paragraph = paragraph_mut(tree, block, path)?;
        let run = paragraph
            .children
            .get_mut(index)
            .ok_or_else(|| MutationError::NodeNotFound(path.clone()))?;

        let at = byte_index(&run.text, offset);
        let tail = TextRun::with_marks(run.text.split_off(at), run.marks);
        paragraph.children.insert(index + 1, tail);
        Ok(())
    }

    fn apply_merge_run(tree: &mut DocumentTree, path: &Path) -> Result<(), MutationError> {
        let (block, index) = path
            .as_run()
            .ok_or_else(|| MutationError::NodeNotFound(path.clone()))?;
        let paragraph = paragraph_mut(tree, block, path)?;
        let run = paragraph.children.remove(index);
        let previous = paragraph
            .children
            .get_mut(index - 1)
            .ok_or_else(|| MutationError::NodeNotFound(path.clone()))?;
        previous.text.push_str(&run.text);
        Ok(())
    }

    fn apply_split_block(tree: &mut DocumentTree, path: &Path, position: usize) -> Result<(), MutationError> {
        let index = path
            .as_block()
            .ok_or_else(|| MutationError::NodeNotFound(path.clone()))?;
        let tail = paragraph_mut(tree, index, path)?.children.split_off(position);
        tree.nodes_mut()
            .insert(index + 1, Node::Paragraph(Paragraph::new(tail)));
        Ok(())
    }

    fn apply_merge_block(tree: &mut DocumentTree, path: &Path) -> Result<(), MutationError> {
        let index = path
            .as_block()
            .ok_or_else(|| MutationError::NodeNotFound(path.clone()))?;
        let removed = tree.nodes_mut().remove(index);
        let Node::Paragraph(mut paragraph) = removed else {
            return Err(MutationError::InvalidStructure(format!("block {} is not a paragraph", path)));
        };
        paragraph_mut(tree, index - 1, path)?
            .children
            .append(&mut paragraph.children);
        Ok(())
    }
}

fn check_insert(tree: &DocumentTree, path: &Path, node: &Descendant) -> Result<(), MutationError> {
    match (path.indices(), node) {
        ([index], Descendant::Node(node)) => {
            if *index > tree.len() {
                return Err(MutationError::InvalidPosition(format!(
                    "block index {} is past the end of a {}-node document",
                    index,
                    tree.len()
                )));
            }
            node.validate(*index)
                .map_err(|e| MutationError::InvalidStructure(e.to_string()))
        }
        ([block, run], Descendant::Text(_)) => {
            let target = tree.node(*block).ok_or_else(|| {
                MutationError::InvalidPosition(format!("no block at {}", block))
            })?;
            let paragraph = target.as_paragraph().ok_or_else(|| {
                MutationError::InvalidPosition(format!(
                    "{} node at {} does not accept text runs",
                    target.kind(),
                    block
                ))
            })?;
            if *run > paragraph.children.len() {
                return Err(MutationError::InvalidPosition(format!(
                    "run index {} is past the end of paragraph {}",
                    run, block
                )));
            }
            Ok(())
        }
        ([_], Descendant::Text(_)) => Err(MutationError::InvalidPosition(format!(
            "text runs cannot be inserted at top level ({})",
            path
        ))),
        ([_, _], Descendant::Node(_)) => Err(MutationError::InvalidPosition(format!(
            "blocks cannot be nested ({})",
            path
        ))),
        _ => Err(MutationError::InvalidPosition(format!("cannot insert at {}", path))),
    }
}

fn removable(tree: &DocumentTree, path: &Path) -> Result<Descendant, MutationError> {
    match path.indices() {
        [index] => {
            let node = tree
                .node(*index)
                .ok_or_else(|| MutationError::NodeNotFound(path.clone()))?;
            if tree.len() == 1 {
                return Err(MutationError::InvalidStructure(
                    "document must keep at least one node".to_string(),
                ));
            }
            Ok(Descendant::Node(node.clone()))
        }
        [block, run] => {
            let target = tree
                .node(*block)
                .ok_or_else(|| MutationError::NodeNotFound(path.clone()))?;
            let paragraph = target.as_paragraph().ok_or_else(|| {
                MutationError::InvalidStructure(format!(
                    "the placeholder run of {} node {} cannot be removed",
                    target.kind(),
                    block
                ))
            })?;
            let text_run = paragraph
                .children
                .get(*run)
                .ok_or_else(|| MutationError::NodeNotFound(path.clone()))?;
            if paragraph.children.len() == 1 {
                return Err(MutationError::InvalidStructure(format!(
                    "paragraph {} must keep at least one run",
                    block
                )));
            }
            Ok(Descendant::Text(text_run.clone()))
        }
        _ => Err(MutationError::NodeNotFound(path.clone())),
    }
}

/// A run whose text and marks may change: one inside a paragraph
fn editable_run<'a>(tree: &'a DocumentTree, path: &Path) -> Result<&'a TextRun, MutationError> {
    let (block, run) = path
        .as_run()
        .ok_or_else(|| MutationError::NodeNotFound(path.clone()))?;
    let node = tree
        .node(block)
        .ok_or_else(|| MutationError::NodeNotFound(path.clone()))?;
    let paragraph = node.as_paragraph().ok_or_else(|| {
        MutationError::InvalidPosition(format!("{} node at {} holds no editable text", node.kind(), block))
    })?;
    paragraph
        .children
        .get(run)
        .ok_or_else(|| MutationError::NodeNotFound(path.clone()))
}

fn span_end(path: &Path, offset: usize, length: usize) -> Result<usize, MutationError> {
    offset.checked_add(length).ok_or_else(|| {
        MutationError::InvalidPosition(format!("{} chars from offset {} overflow run {}", length, offset, path))
    })
}

fn check_offset(run: &TextRun, path: &Path, offset: usize) -> Result<(), MutationError> {
    let len = run.char_len();
    if offset > len {
        return Err(MutationError::InvalidPosition(format!(
            "offset {} is past the end of run {} ({} chars)",
            offset, path, len
        )));
    }
    Ok(())
}

fn paragraph_at<'a>(tree: &'a DocumentTree, path: &Path) -> Result<&'a Paragraph, MutationError> {
    let index = path
        .as_block()
        .ok_or_else(|| MutationError::NodeNotFound(path.clone()))?;
    let node = tree
        .node(index)
        .ok_or_else(|| MutationError::NodeNotFound(path.clone()))?;
    node.as_paragraph().ok_or_else(|| {
        MutationError::InvalidStructure(format!("{} node at {} is not a paragraph", node.kind(), index))
    })
}

fn paragraph_mut<'a>(
    tree: &'a mut DocumentTree,
    index: usize,
    path: &Path,
) -> Result<&'a mut Paragraph, MutationError> {
    tree.paragraph_mut(index)
        .ok_or_else(|| MutationError::NodeNotFound(path.clone()))
}

fn run_mut<'a>(tree: &'a mut DocumentTree, path: &Path) -> Result<&'a mut TextRun, MutationError> {
    let (block, run) = path
        .as_run()
        .ok_or_else(|| MutationError::NodeNotFound(path.clone()))?;
    paragraph_mut(tree, block, path)?
        .children
        .get_mut(run)
        .ok_or_else(|| MutationError::NodeNotFound(path.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Mark;

    fn hello_world() -> DocumentTree {
        DocumentTree::from_nodes(vec![Node::paragraph("hello world")]).unwrap()
    }

    fn round_trip(tree: &mut DocumentTree, mutation: Mutation) {
        let before = tree.clone();
        let inverse = mutation.to_inverse(tree).unwrap();
        mutation.apply(tree).unwrap();
        assert!(tree.is_valid());
        inverse.apply(tree).unwrap();
        assert_eq!(*tree, before, "inverse of {} did not restore the tree", mutation.name());
    }

    #[test]
    fn test_insert_image_before_paragraph() {
        let mut tree = DocumentTree::default();
        let mutation = Mutation::InsertNode {
            path: Path::block(0),
            node: Node::image("data:image/png;base64,AAAA", ImageWidth::Percent(100)).into(),
        };
        mutation.apply(&mut tree).unwrap();

        assert_eq!(tree.len(), 2);
        let image = tree.nodes()[0].as_image().expect("image first");
        assert_eq!(image.children, vec![TextRun::empty()]);
        assert_eq!(tree.nodes()[1], Node::empty_paragraph());
    }

    #[test]
    fn test_insert_past_end_is_invalid_position() {
        let mut tree = DocumentTree::default();
        let mutation = Mutation::InsertNode {
            path: Path::block(5),
            node: Node::empty_paragraph().into(),
        };
        assert!(matches!(mutation.apply(&mut tree), Err(MutationError::InvalidPosition(_))));
        assert_eq!(tree, DocumentTree::default());
    }

    #[test]
    fn test_insert_run_into_image_rejected() {
        let mut tree = DocumentTree::from_nodes(vec![Node::image("u", ImageWidth::default())]).unwrap();
        let mutation = Mutation::InsertNode {
            path: Path::run(0, 1),
            node: TextRun::new("x").into(),
        };
        assert!(matches!(mutation.apply(&mut tree), Err(MutationError::InvalidPosition(_))));
    }

    #[test]
    fn test_remove_last_node_rejected() {
        let mut tree = DocumentTree::default();
        let err = Mutation::RemoveNode { path: Path::block(0) }.apply(&mut tree).unwrap_err();
        assert!(matches!(err, MutationError::InvalidStructure(_)));
    }

    #[test]
    fn test_set_property_on_stale_path() {
        let mut tree = DocumentTree::default();
        let mutation = Mutation::SetNodeProperty {
            path: Path::block(3),
            property: NodeProperty::Width(ImageWidth::Pixels(10)),
        };
        assert_eq!(mutation.apply(&mut tree), Err(MutationError::NodeNotFound(Path::block(3))));
    }

    #[test]
    fn test_set_property_on_paragraph_unsupported() {
        let mut tree = DocumentTree::default();
        let mutation = Mutation::SetNodeProperty {
            path: Path::block(0),
            property: NodeProperty::Width(ImageWidth::Pixels(10)),
        };
        assert!(matches!(
            mutation.apply(&mut tree),
            Err(MutationError::UnsupportedProperty { .. })
        ));
    }

    #[test]
    fn test_split_run_keeps_text_and_marks() {
        let mut tree = DocumentTree::from_nodes(vec![Node::Paragraph(Paragraph::new(vec![
            TextRun::new("héllo wörld").with_mark(Mark::Italic),
        ]))])
        .unwrap();
        Mutation::SplitRun {
            path: Path::run(0, 0),
            offset: 5,
        }
        .apply(&mut tree)
        .unwrap();

        let paragraph = tree.paragraph(0).unwrap();
        assert_eq!(paragraph.children.len(), 2);
        assert_eq!(paragraph.children[0].text, "héllo");
        assert_eq!(paragraph.children[1].text, " wörld");
        assert!(paragraph.children[1].marks.italic);
        assert_eq!(paragraph.text(), "héllo wörld");
    }

    #[test]
    fn test_merge_runs_with_different_marks_rejected() {
        let mut tree = DocumentTree::from_nodes(vec![Node::Paragraph(Paragraph::new(vec![
            TextRun::new("a").with_mark(Mark::Bold),
            TextRun::new("b"),
        ]))])
        .unwrap();
        let err = Mutation::MergeRun { path: Path::run(0, 1) }.apply(&mut tree).unwrap_err();
        assert!(matches!(err, MutationError::InvalidStructure(_)));
    }

    #[test]
    fn test_text_offsets_past_end_rejected() {
        let mut tree = hello_world();
        let mutation = Mutation::RemoveText {
            path: Path::run(0, 0),
            offset: 8,
            length: 10,
        };
        assert!(matches!(mutation.apply(&mut tree), Err(MutationError::InvalidPosition(_))));
        assert_eq!(tree, hello_world());
    }

    #[test]
    fn test_every_mutation_inverts() {
        let mut tree = DocumentTree::from_nodes(vec![
            Node::paragraph("hello world"),
            Node::image("data:image/gif;base64,R0lG", ImageWidth::Pixels(200)),
            Node::Paragraph(Paragraph::new(vec![
                TextRun::new("second"),
                TextRun::new(" line").with_mark(Mark::Underline),
            ])),
        ])
        .unwrap();

        let mutations = vec![
            Mutation::InsertNode {
                path: Path::block(3),
                node: Node::paragraph("tail").into(),
            },
            Mutation::InsertNode {
                path: Path::run(0, 1),
                node: TextRun::new("!").with_mark(Mark::Bold).into(),
            },
            Mutation::RemoveNode { path: Path::block(1) },
            Mutation::RemoveNode { path: Path::run(2, 1) },
            Mutation::InsertText {
                path: Path::run(0, 0),
                offset: 5,
                text: ", dear".to_string(),
            },
            Mutation::RemoveText {
                path: Path::run(0, 0),
                offset: 0,
                length: 6,
            },
            Mutation::SplitRun {
                path: Path::run(0, 0),
                offset: 3,
            },
            Mutation::SplitBlock {
                path: Path::block(2),
                position: 1,
            },
            Mutation::SetMarks {
                path: Path::run(2, 0),
                marks: Marks::none().with(Mark::Bold, true),
            },
            Mutation::SetNodeProperty {
                path: Path::block(1),
                property: NodeProperty::Width(ImageWidth::Percent(50)),
            },
            Mutation::SetNodeProperty {
                path: Path::block(1),
                property: NodeProperty::Url("https://example.com/cat.png".to_string()),
            },
        ];

        for mutation in mutations {
            round_trip(&mut tree, mutation);
        }
    }

    #[test]
    fn test_merge_block_inverts() {
        let mut tree = DocumentTree::from_nodes(vec![Node::paragraph("one"), Node::paragraph("two")]).unwrap();
        round_trip(&mut tree, Mutation::MergeBlock { path: Path::block(1) });

        Mutation::MergeBlock { path: Path::block(1) }.apply(&mut tree).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.paragraph(0).unwrap().children.len(), 2);
        assert_eq!(tree.text(), "onetwo");
    }

    #[test]
    fn test_property_from_key_value() {
        assert_eq!(
            NodeProperty::from_key_value("width", "100%").unwrap(),
            NodeProperty::Width(ImageWidth::Percent(100))
        );
        assert!(matches!(
            NodeProperty::from_key_value("height", "10"),
            Err(MutationError::UnsupportedProperty { .. })
        ));
    }

    #[test]
    fn test_mutation_serde_shape() {
        let mutation = Mutation::SetNodeProperty {
            path: Path::block(1),
            property: NodeProperty::Width(ImageWidth::Pixels(240)),
        };
        let json = serde_json::to_value(&mutation).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "op": "set_node_property",
                "path": [1],
                "property": { "key": "width", "value": "240px" }
            })
        );
        let back: Mutation = serde_json::from_value(json).unwrap();
        assert_eq!(back, mutation);
    }

    #[test]
    fn test_remove_text_length_overflow_rejected() {
        let mut tree = hello_world();
        let mutation = Mutation::RemoveText {
            path: Path::run(0, 0),
            offset: 2,
            length: usize::MAX,
        };
        assert!(matches!(mutation.to_inverse(&tree), Err(MutationError::InvalidPosition(_))));
        assert!(matches!(mutation.apply(&mut tree), Err(MutationError::InvalidPosition(_))));
        assert_eq!(tree, hello_world());
    }

    #[test]
    fn test_typed_object_with_text_is_a_node() {
        let json = serde_json::json!({ "type": "widget", "text": "caption", "children": [] });
        let descendant: Descendant = serde_json::from_value(json.clone()).unwrap();
        match descendant {
            Descendant::Node(Node::Unknown(unknown)) => assert_eq!(unknown.raw(), &json),
            other => panic!("expected an unknown node, got {:?}", other),
        }

        let run: Descendant = serde_json::from_value(serde_json::json!({ "text": "hi", "bold": true })).unwrap();
        assert_eq!(run, Descendant::Text(TextRun::new("hi").with_mark(Mark::Bold)));
    }
}
