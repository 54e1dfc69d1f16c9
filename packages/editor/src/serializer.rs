//! Conversion between a [`DocumentTree`] and the persisted content string.
//!
//! The content string is a JSON array of node objects. Parsing goes through
//! serde and then the tree shape check, so anything returned by
//! [`deserialize`] is a valid tree.

use thiserror::Error;

use crate::tree::{DocumentTree, Node};

#[derive(Error, Debug)]
pub enum SerializeError {
    #[error("Malformed content: {0}")]
    MalformedContent(String),
}

/// Encode a tree as its persisted JSON string
pub fn serialize(tree: &DocumentTree) -> Result<String, SerializeError> {
    serde_json::to_string(tree).map_err(|e| SerializeError::MalformedContent(e.to_string()))
}

/// Parse persisted content, rejecting anything that is not a valid tree
pub fn deserialize(content: &str) -> Result<DocumentTree, SerializeError> {
    let nodes: Vec<Node> =
        serde_json::from_str(content).map_err(|e| SerializeError::MalformedContent(e.to_string()))?;
    DocumentTree::from_nodes(nodes).map_err(|e| SerializeError::MalformedContent(e.to_string()))
}

/// Parse persisted content, falling back to the default tree.
///
/// Empty content is what a freshly created record holds, so it is not
/// worth a warning.
pub fn deserialize_or_default(content: &str) -> DocumentTree {
    if content.trim().is_empty() {
        tracing::debug!("empty content, starting from a blank document");
        return DocumentTree::default();
    }

    match deserialize(content) {
        Ok(tree) => tree,
        Err(err) => {
            tracing::warn!(error = %err, "could not read document content, starting from a blank document");
            DocumentTree::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{ImageWidth, Mark, Paragraph, TextRun};

    #[test]
    fn test_serialize_slate_shape() {
        let tree = DocumentTree::from_nodes(vec![
            Node::Paragraph(Paragraph::new(vec![TextRun::new("hi").with_mark(Mark::Bold)])),
            Node::image("data:image/png;base64,AAAA", ImageWidth::Percent(100)),
        ])
        .unwrap();

        assert_eq!(
            serialize(&tree).unwrap(),
            r#"[{"type":"paragraph","children":[{"text":"hi","bold":true}]},{"type":"image","url":"data:image/png;base64,AAAA","width":"100%","children":[{"text":""}]}]"#
        );
    }

    #[test]
    fn test_round_trip_keeps_unknown_nodes() {
        let content = r#"[{"type":"paragraph","children":[{"text":"a","italic":true,"underline":true}]},{"type":"quote","children":[{"text":"q"}],"cite":"x"}]"#;
        let tree = deserialize(content).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.nodes()[1].kind(), "quote");

        let back = serialize(&tree).unwrap();
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&back).unwrap(),
            serde_json::from_str::<serde_json::Value>(content).unwrap()
        );
    }

    #[test]
    fn test_missing_width_defaults() {
        let tree = deserialize(r#"[{"type":"image","url":"u","children":[{"text":""}]}]"#).unwrap();
        assert_eq!(tree.nodes()[0].as_image().unwrap().width, ImageWidth::Percent(100));
    }

    #[test]
    fn test_malformed_content_rejected() {
        for content in [
            "not json",
            "[]",
            "{}",
            r#"[{"type":"paragraph","children":[{"bold":true}]}]"#,
            r#"[{"type":"image","url":"u","children":[{"text":"x"}]}]"#,
            r#"[{"type":"paragraph","children":[]}]"#,
        ] {
            assert!(
                matches!(deserialize(content), Err(SerializeError::MalformedContent(_))),
                "accepted {}",
                content
            );
        }
    }

    #[test]
    fn test_or_default_recovers() {
        assert_eq!(deserialize_or_default(""), DocumentTree::default());
        assert_eq!(deserialize_or_default("[oops"), DocumentTree::default());
        assert_eq!(
            deserialize_or_default(r#"[{"type":"paragraph","children":[{"text":"x"}]}]"#).text(),
            "x"
        );
    }
}
