//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Mutation error: {0}")]
    Mutation(#[from] crate::mutations::MutationError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] crate::serializer::SerializeError),

    #[error("Invalid tree: {0}")]
    Tree(#[from] crate::tree::TreeError),
}
