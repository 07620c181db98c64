//! Errors surfaced by host boundary operations.

use thiserror::Error;

use crate::ids::DocumentRef;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("{0} not found")]
    DocumentNotFound(DocumentRef),

    #[error("flag {namespace}.{key} on {doc} holds a malformed value")]
    MalformedFlag {
        doc: DocumentRef,
        namespace: String,
        key: String,
    },

    #[error("companion transport failed: {0}")]
    Transport(String),
}
