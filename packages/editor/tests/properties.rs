//! Generated-input tests for the editing laws: lossless serialization,
//! text-preserving formatting, atomic failure and exact undo/redo.

use folio_editor::transforms::{delete_range, set_marks};
use folio_editor::{
    deserialize, serialize, Document, DocumentTree, EditorError, ImageWidth, Mark, Marks, MutationBatch, Node,
    Paragraph, Point, Range, TextRun,
};
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

fn mark_strategy() -> impl Strategy<Value = Mark> {
    prop::sample::select(Mark::ALL.to_vec())
}

fn marks_strategy() -> impl Strategy<Value = Marks> {
    (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(bold, italic, underline)| Marks {
        bold,
        italic,
        underline,
    })
}

fn run_strategy() -> impl Strategy<Value = TextRun> {
    ("[a-cé ]{0,6}", marks_strategy()).prop_map(|(text, marks)| TextRun::with_marks(text, marks))
}

fn width_strategy() -> impl Strategy<Value = ImageWidth> {
    prop_oneof![
        (1u16..=100).prop_map(ImageWidth::Percent),
        (1u32..2000).prop_map(ImageWidth::Pixels),
    ]
}

fn node_strategy() -> impl Strategy<Value = Node> {
    prop_oneof![
        4 => prop::collection::vec(run_strategy(), 1..4).prop_map(|runs| Node::Paragraph(Paragraph::new(runs))),
        1 => width_strategy().prop_map(|width| Node::image("data:image/png;base64,AAAA", width)),
    ]
}

/// Arbitrary valid tree; runs are deliberately left unnormalized
fn tree_strategy() -> impl Strategy<Value = DocumentTree> {
    prop::collection::vec(node_strategy(), 1..5).prop_map(|nodes| DocumentTree::from_nodes(nodes).unwrap())
}

/// Position seed, resolved against whatever tree it is applied to
type Seed = (usize, usize, usize);

fn seed_strategy() -> impl Strategy<Value = Seed> {
    (0usize..64, 0usize..64, 0usize..64)
}

#[derive(Debug, Clone)]
enum Edit {
    Format(Seed, Seed, Mark, bool),
    Toggle(Seed, Seed, Mark),
    Delete(Seed, Seed),
    Break(Seed),
    Type(Seed, String),
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (seed_strategy(), seed_strategy(), mark_strategy(), any::<bool>())
            .prop_map(|(a, b, mark, enable)| Edit::Format(a, b, mark, enable)),
        (seed_strategy(), seed_strategy(), mark_strategy()).prop_map(|(a, b, mark)| Edit::Toggle(a, b, mark)),
        (seed_strategy(), seed_strategy()).prop_map(|(a, b)| Edit::Delete(a, b)),
        seed_strategy().prop_map(Edit::Break),
        (seed_strategy(), "[xyé]{1,3}").prop_map(|(at, text)| Edit::Type(at, text)),
    ]
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn point_in(tree: &DocumentTree, (block, run, offset): Seed) -> Point {
    let block = block % tree.len();
    match tree.node(block).and_then(Node::as_paragraph) {
        Some(paragraph) => {
            let run = run % paragraph.children.len();
            let len = paragraph.children[run].char_len();
            Point::new([block, run], offset % (len + 1))
        }
        None => Point::new([block, 0], 0),
    }
}

fn range_in(tree: &DocumentTree, a: Seed, b: Seed) -> Range {
    Range::new(point_in(tree, a), point_in(tree, b))
}

fn paragraph_texts(tree: &DocumentTree) -> Vec<Option<String>> {
    tree.nodes()
        .iter()
        .map(|node| node.as_paragraph().map(Paragraph::text))
        .collect()
}

fn run_edit(doc: &mut Document, edit: &Edit) -> Result<MutationBatch, EditorError> {
    let tree = doc.tree().clone();
    match edit {
        Edit::Format(a, b, mark, enable) => doc.set_marks(&range_in(&tree, *a, *b), &[*mark], *enable),
        Edit::Toggle(a, b, mark) => doc.toggle_mark(&range_in(&tree, *a, *b), *mark),
        Edit::Delete(a, b) => doc.delete_range(&range_in(&tree, *a, *b)),
        Edit::Break(at) => doc.insert_break(&point_in(&tree, *at)),
        Edit::Type(at, text) => doc.insert_text(&point_in(&tree, *at), text),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Serialization is lossless
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn serialized_tree_reads_back(tree in tree_strategy()) {
        let content = serialize(&tree).unwrap();
        prop_assert_eq!(deserialize(&content).unwrap(), tree);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Formatting never changes text; deletion keeps the tree well formed
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn set_marks_preserves_paragraph_text(
        tree in tree_strategy(),
        a in seed_strategy(),
        b in seed_strategy(),
        mark in mark_strategy(),
        enable in any::<bool>(),
    ) {
        let mut edited = tree.clone();
        let range = range_in(&tree, a, b);
        match set_marks(&mut edited, &range, &[mark], enable) {
            Ok(_) => {
                prop_assert!(edited.is_valid());
                prop_assert_eq!(paragraph_texts(&edited), paragraph_texts(&tree));
            }
            Err(_) => prop_assert_eq!(&edited, &tree),
        }
    }

    #[test]
    fn delete_range_leaves_valid_tree(
        tree in tree_strategy(),
        a in seed_strategy(),
        b in seed_strategy(),
    ) {
        let mut edited = tree.clone();
        let range = range_in(&tree, a, b);
        match delete_range(&mut edited, &range) {
            Ok(_) => {
                prop_assert!(edited.is_valid());
                prop_assert!(!edited.is_empty());
            }
            Err(_) => prop_assert_eq!(&edited, &tree),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Undo all, then redo all, walks back through the exact snapshots
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn undo_and_redo_retrace_every_snapshot(
        tree in tree_strategy(),
        edits in prop::collection::vec(edit_strategy(), 1..30),
    ) {
        let mut doc = Document::from_tree(tree.clone());
        let mut snapshots = vec![tree];

        for edit in &edits {
            let before = doc.tree().clone();
            let levels = doc.history().undo_levels();
            match run_edit(&mut doc, edit) {
                Ok(_) => {
                    prop_assert!(doc.tree().is_valid());
                    if doc.history().undo_levels() > levels {
                        snapshots.push(doc.tree().clone());
                    }
                }
                Err(_) => prop_assert_eq!(doc.tree(), &before),
            }
        }

        for expected in snapshots.iter().rev().skip(1) {
            prop_assert!(doc.undo().unwrap());
            prop_assert_eq!(doc.tree(), expected);
        }
        prop_assert!(!doc.can_undo());

        for expected in snapshots.iter().skip(1) {
            prop_assert!(doc.redo().unwrap());
            prop_assert_eq!(doc.tree(), expected);
        }
        prop_assert!(!doc.can_redo());
    }
}
