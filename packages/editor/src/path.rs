//! Addressing inside a [`DocumentTree`](crate::DocumentTree).
//!
//! A [`Path`] is a list of child indices: `[i]` is the i-th top-level node,
//! `[i, j]` the j-th text run of that node. A [`Point`] is a path to a run
//! plus a character offset, and a [`Range`] is a pair of points.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<usize>);

impl Path {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    /// Path of a top-level node
    pub fn block(index: usize) -> Self {
        Self(vec![index])
    }

    /// Path of a text run inside a top-level node
    pub fn run(block: usize, run: usize) -> Self {
        Self(vec![block, run])
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Some(i)` if this addresses a top-level node
    pub fn as_block(&self) -> Option<usize> {
        match self.0.as_slice() {
            [block] => Some(*block),
            _ => None,
        }
    }

    /// `Some((i, j))` if this addresses a text run
    pub fn as_run(&self) -> Option<(usize, usize)> {
        match self.0.as_slice() {
            [block, run] => Some((*block, *run)),
            _ => None,
        }
    }

    /// Index of the top-level node this path lives under
    pub fn root(&self) -> Option<usize> {
        self.0.first().copied()
    }

    /// Sibling path one position later
    pub fn next(&self) -> Path {
        let mut indices = self.0.clone();
        if let Some(last) = indices.last_mut() {
            *last += 1;
        }
        Path(indices)
    }

    /// Sibling path one position earlier, if any
    pub fn previous(&self) -> Option<Path> {
        let mut indices = self.0.clone();
        let last = indices.last_mut()?;
        *last = last.checked_sub(1)?;
        Some(Path(indices))
    }
}

impl From<Vec<usize>> for Path {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl<const N: usize> From<[usize; N]> for Path {
    fn from(indices: [usize; N]) -> Self {
        Self(indices.to_vec())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Caret position: a text run plus a character offset within it
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn new(path: impl Into<Path>, offset: usize) -> Self {
        Self {
            path: path.into(),
            offset,
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.offset)
    }
}

/// Selection span. `anchor` is where it started, `focus` where it ended;
/// either may come first in document order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub anchor: Point,
    pub focus: Point,
}

impl Range {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    /// Range over `start..end` characters of a single run
    pub fn within_run(block: usize, run: usize, start: usize, end: usize) -> Self {
        Self::new(
            Point::new(Path::run(block, run), start),
            Point::new(Path::run(block, run), end),
        )
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn start(&self) -> &Point {
        if self.anchor <= self.focus {
            &self.anchor
        } else {
            &self.focus
        }
    }

    pub fn end(&self) -> &Point {
        if self.anchor <= self.focus {
            &self.focus
        } else {
            &self.anchor
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start(), self.end())
    }
}
