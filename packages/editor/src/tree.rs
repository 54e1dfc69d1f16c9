//! # Document Tree
//!
//! In-memory shape of a rich-text document.
//!
//! ```text
//! DocumentTree
//!   ├── Paragraph ── TextRun("hello", bold) ── TextRun(" world")
//!   ├── Image(url, width) ── TextRun("")      <- placeholder, always empty
//!   └── Paragraph ── TextRun("")
//! ```
//!
//! The persisted form is the Slate JSON shape: every node object carries a
//! `type` discriminant and a `children` array of text leaves. Node types this
//! build does not know are carried verbatim as [`Node::Unknown`] so a
//! load/save cycle never drops them.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::path::Path;

/// A boolean formatting attribute of a text run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Bold,
    Italic,
    Underline,
}

impl Mark {
    pub const ALL: [Mark; 3] = [Mark::Bold, Mark::Italic, Mark::Underline];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mark::Bold => "bold",
            Mark::Italic => "italic",
            Mark::Underline => "underline",
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mark {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bold" => Ok(Mark::Bold),
            "italic" => Ok(Mark::Italic),
            "underline" => Ok(Mark::Underline),
            other => Err(TreeError::UnknownMark(other.to_string())),
        }
    }
}

/// The full mark set of a text run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Marks {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl Marks {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn has(&self, mark: Mark) -> bool {
        match mark {
            Mark::Bold => self.bold,
            Mark::Italic => self.italic,
            Mark::Underline => self.underline,
        }
    }

    pub fn set(&mut self, mark: Mark, enabled: bool) {
        match mark {
            Mark::Bold => self.bold = enabled,
            Mark::Italic => self.italic = enabled,
            Mark::Underline => self.underline = enabled,
        }
    }

    pub fn with(mut self, mark: Mark, enabled: bool) -> Self {
        self.set(mark, enabled);
        self
    }

    pub fn is_empty(&self) -> bool {
        !(self.bold || self.italic || self.underline)
    }

    /// Marks that are set, in canonical order
    pub fn iter(&self) -> impl Iterator<Item = Mark> + '_ {
        Mark::ALL.into_iter().filter(move |mark| self.has(*mark))
    }
}

/// Leaf of the tree: a contiguous string with one mark set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TextRunRepr", into = "TextRunRepr")]
pub struct TextRun {
    pub text: String,
    pub marks: Marks,
}

impl TextRun {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Marks::none(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_marks(text: impl Into<String>, marks: Marks) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    pub fn with_mark(mut self, mark: Mark) -> Self {
        self.marks.set(mark, true);
        self
    }

    /// Length in Unicode scalar values (the unit of every offset)
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Wire shape of a run: `{"text": "..", "bold": true}`.
///
/// Marks are written only when set. On read, `null` and `false` both mean
/// unset, which is what a cleared mark looks like in older content.
#[derive(Serialize, Deserialize)]
struct TextRunRepr {
    text: String,
    #[serde(default, deserialize_with = "nullable_flag", skip_serializing_if = "is_false")]
    bold: bool,
    #[serde(default, deserialize_with = "nullable_flag", skip_serializing_if = "is_false")]
    italic: bool,
    #[serde(default, deserialize_with = "nullable_flag", skip_serializing_if = "is_false")]
    underline: bool,
}

fn nullable_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl From<TextRunRepr> for TextRun {
    fn from(repr: TextRunRepr) -> Self {
        Self {
            text: repr.text,
            marks: Marks {
                bold: repr.bold,
                italic: repr.italic,
                underline: repr.underline,
            },
        }
    }
}

impl From<TextRun> for TextRunRepr {
    fn from(run: TextRun) -> Self {
        Self {
            text: run.text,
            bold: run.marks.bold,
            italic: run.marks.italic,
            underline: run.marks.underline,
        }
    }
}

/// Display width of an image.
///
/// Always persisted as a CSS length string. Bare numbers are accepted on
/// read and taken as pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageWidth {
    Percent(u16),
    Pixels(u32),
}

impl Default for ImageWidth {
    fn default() -> Self {
        ImageWidth::Percent(100)
    }
}

impl fmt::Display for ImageWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageWidth::Percent(p) => write!(f, "{}%", p),
            ImageWidth::Pixels(px) => write!(f, "{}px", px),
        }
    }
}

impl FromStr for ImageWidth {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || TreeError::InvalidWidth(s.to_string());

        if let Some(percent) = trimmed.strip_suffix('%') {
            return percent.trim().parse().map(ImageWidth::Percent).map_err(|_| invalid());
        }

        let pixels = trimmed.strip_suffix("px").unwrap_or(trimmed).trim();
        let value: f64 = pixels.parse().map_err(|_| invalid())?;
        pixels_from_f64(value).ok_or_else(invalid)
    }
}

fn pixels_from_f64(value: f64) -> Option<ImageWidth> {
    if !value.is_finite() || value < 0.0 || value > u32::MAX as f64 {
        return None;
    }
    Some(ImageWidth::Pixels(value.round() as u32))
}

impl Serialize for ImageWidth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ImageWidth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) => s.parse().map_err(D::Error::custom),
            serde_json::Value::Number(n) => n
                .as_f64()
                .and_then(pixels_from_f64)
                .ok_or_else(|| D::Error::custom(format!("invalid image width: {}", n))),
            other => Err(D::Error::custom(format!("invalid image width: {}", other))),
        }
    }
}

/// Block of styled text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub children: Vec<TextRun>,
}

impl Paragraph {
    pub fn new(children: Vec<TextRun>) -> Self {
        Self { children }
    }

    pub fn empty() -> Self {
        Self {
            children: vec![TextRun::empty()],
        }
    }

    /// Concatenated text of all runs
    pub fn text(&self) -> String {
        self.children.iter().map(|run| run.text.as_str()).collect()
    }

    pub fn char_len(&self) -> usize {
        self.children.iter().map(TextRun::char_len).sum()
    }

    /// Paragraph-level character offset at which run `index` starts
    pub fn run_start(&self, index: usize) -> usize {
        self.children.iter().take(index).map(TextRun::char_len).sum()
    }
}

/// Embedded image with a single empty placeholder run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub width: ImageWidth,
    pub children: Vec<TextRun>,
}

impl Image {
    pub fn new(url: impl Into<String>, width: ImageWidth) -> Self {
        Self {
            url: url.into(),
            width,
            children: vec![TextRun::empty()],
        }
    }

    pub fn has_valid_placeholder(&self) -> bool {
        matches!(self.children.as_slice(), [run] if run.is_empty())
    }
}

/// Node of a type this build does not understand, kept verbatim
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownNode {
    raw: serde_json::Value,
}

impl UnknownNode {
    pub fn kind(&self) -> Option<&str> {
        self.raw.get("type").and_then(serde_json::Value::as_str)
    }

    pub fn raw(&self) -> &serde_json::Value {
        &self.raw
    }
}

/// Top-level node of a document
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Paragraph(Paragraph),
    Image(Image),
    Unknown(UnknownNode),
}

impl Node {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Node::Paragraph(Paragraph::new(vec![TextRun::new(text)]))
    }

    pub fn empty_paragraph() -> Self {
        Node::Paragraph(Paragraph::empty())
    }

    pub fn image(url: impl Into<String>, width: ImageWidth) -> Self {
        Node::Image(Image::new(url, width))
    }

    /// The `type` discriminant used in the persisted form
    pub fn kind(&self) -> &str {
        match self {
            Node::Paragraph(_) => "paragraph",
            Node::Image(_) => "image",
            Node::Unknown(unknown) => unknown.kind().unwrap_or("unknown"),
        }
    }

    pub fn children(&self) -> Option<&[TextRun]> {
        match self {
            Node::Paragraph(p) => Some(&p.children),
            Node::Image(img) => Some(&img.children),
            Node::Unknown(_) => None,
        }
    }

    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            Node::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_paragraph_mut(&mut self) -> Option<&mut Paragraph> {
        match self {
            Node::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&Image> {
        match self {
            Node::Image(img) => Some(img),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut Image> {
        match self {
            Node::Image(img) => Some(img),
            _ => None,
        }
    }

    /// Check the per-variant shape rules
    pub fn validate(&self, index: usize) -> Result<(), TreeError> {
        match self {
            Node::Paragraph(p) if p.children.is_empty() => Err(TreeError::MissingChildren { index }),
            Node::Paragraph(_) => Ok(()),
            Node::Image(img) if img.url.is_empty() => Err(TreeError::MissingUrl { index }),
            Node::Image(img) if !img.has_valid_placeholder() => {
                Err(TreeError::ImagePlaceholder { index })
            }
            Node::Image(_) => Ok(()),
            Node::Unknown(_) => Ok(()),
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum KnownNodeRef<'a> {
    Paragraph(&'a Paragraph),
    Image(&'a Image),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum KnownNode {
    Paragraph(Paragraph),
    Image(Image),
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Paragraph(p) => KnownNodeRef::Paragraph(p).serialize(serializer),
            Node::Image(img) => KnownNodeRef::Image(img).serialize(serializer),
            Node::Unknown(unknown) => unknown.raw.serialize(serializer),
        }
    }
}

/// Known types keep only the modelled fields; other types are kept whole
impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        if !raw.is_object() {
            return Err(D::Error::custom("node must be a JSON object"));
        }

        match raw.get("type").and_then(serde_json::Value::as_str) {
            Some("paragraph") | Some("image") => {
                match serde_json::from_value::<KnownNode>(raw).map_err(D::Error::custom)? {
                    KnownNode::Paragraph(p) => Ok(Node::Paragraph(p)),
                    KnownNode::Image(img) => Ok(Node::Image(img)),
                }
            }
            _ => Ok(Node::Unknown(UnknownNode { raw })),
        }
    }
}

/// Errors raised by tree shape checks
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("Document must contain at least one node")]
    Empty,

    #[error("Node {index} has no children")]
    MissingChildren { index: usize },

    #[error("Image {index} has no url")]
    MissingUrl { index: usize },

    #[error("Image {index} must hold exactly one empty text run")]
    ImagePlaceholder { index: usize },

    #[error("Invalid image width: {0}")]
    InvalidWidth(String),

    #[error("Unknown mark: {0}")]
    UnknownMark(String),
}

/// Ordered, never-empty sequence of top-level nodes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DocumentTree {
    nodes: Vec<Node>,
}

impl Default for DocumentTree {
    /// One empty paragraph
    fn default() -> Self {
        Self {
            nodes: vec![Node::empty_paragraph()],
        }
    }
}

impl DocumentTree {
    /// Build a tree, rejecting sequences that break the shape rules
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self, TreeError> {
        let tree = Self { nodes };
        tree.validate()?;
        Ok(tree)
    }

    pub fn validate(&self) -> Result<(), TreeError> {
        if self.nodes.is_empty() {
            return Err(TreeError::Empty);
        }
        self.nodes
            .iter()
            .enumerate()
            .try_for_each(|(index, node)| node.validate(index))
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut Vec<Node> {
        &mut self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false for a well-formed tree
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub(crate) fn node_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.nodes.get_mut(index)
    }

    /// Resolve a `[block, run]` path to a text run
    pub fn run(&self, path: &Path) -> Option<&TextRun> {
        let (block, run) = path.as_run()?;
        self.nodes.get(block)?.children()?.get(run)
    }

    pub fn paragraph(&self, index: usize) -> Option<&Paragraph> {
        self.nodes.get(index)?.as_paragraph()
    }

    pub(crate) fn paragraph_mut(&mut self, index: usize) -> Option<&mut Paragraph> {
        self.nodes.get_mut(index)?.as_paragraph_mut()
    }

    /// Concatenated text of every paragraph, one per line
    pub fn text(&self) -> String {
        self.nodes
            .iter()
            .filter_map(Node::as_paragraph)
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Shape check over a whole tree
pub fn is_valid_tree(tree: &DocumentTree) -> bool {
    tree.is_valid()
}

/// Byte index of the `offset`-th character of `text` (clamped to the end)
pub(crate) fn byte_index(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(index, _)| index)
        .unwrap_or(text.len())
}
