use thiserror::Error;

use crate::editor::EditorError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Incorrect usage")]
    Usage,
    #[error("Bad pattern: {0}")]
    Pattern(String),
    #[error("Not connected to a database")]
    NoDatabase,
    #[error("Document not found: {0}")]
    DocumentNotFound(String),
    #[error("Editor failed: {0}")]
    Editor(#[from] EditorError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
