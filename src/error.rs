//! Error types for the codec and blob store.

use std::io;
use thiserror::Error;

/// Main error type for encode/decode and store operations.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Blob write failed for {id}: {source}")]
    StoreWrite {
        id: String,
        #[source]
        source: io::Error,
    },

    #[error("Blob read failed for {id}: {source}")]
    StoreRead {
        id: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid document: {0}")]
    DocumentFormat(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CodecError {
    pub(crate) fn store_write(id: impl Into<String>, source: io::Error) -> Self {
        CodecError::StoreWrite {
            id: id.into(),
            source,
        }
    }

    pub(crate) fn store_read(id: impl Into<String>, source: io::Error) -> Self {
        CodecError::StoreRead {
            id: id.into(),
            source,
        }
    }

    /// True when a blob read failed because the record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CodecError::StoreRead { source, .. } if source.kind() == io::ErrorKind::NotFound
        )
    }
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
