//! Content-addressed blob storage.
//!
//! Blobs are named by a digest of their exact bytes plus a fixed
//! extension, so identical payloads always land in the same record.

mod hasher;
mod memory;
mod storage;

pub use hasher::{BlobHasher, DigestEncoding, HashAlgorithm, DEFAULT_EXTENSION};
pub use memory::MemoryBlobStore;
pub use storage::{BlobStoreConfig, FsBlobStore};

use crate::error::Result;
use std::sync::Arc;

/// Durable storage for binary payloads keyed by content identifier.
///
/// Implementations must tolerate concurrent calls from independent codecs.
pub trait BlobStore: Send + Sync {
    /// Persist `content` if absent and return its identifier.
    fn put(&self, content: &[u8]) -> Result<String>;

    /// Read the payload stored under `id`.
    fn get(&self, id: &str) -> Result<Vec<u8>>;

    fn contains(&self, id: &str) -> bool {
        self.get(id).is_ok()
    }
}

impl<S: BlobStore + ?Sized> BlobStore for Arc<S> {
    fn put(&self, content: &[u8]) -> Result<String> {
        (**self).put(content)
    }

    fn get(&self, id: &str) -> Result<Vec<u8>> {
        (**self).get(id)
    }

    fn contains(&self, id: &str) -> bool {
        (**self).contains(id)
    }
}

impl<S: BlobStore + ?Sized> BlobStore for &S {
    fn put(&self, content: &[u8]) -> Result<String> {
        (**self).put(content)
    }

    fn get(&self, id: &str) -> Result<Vec<u8>> {
        (**self).get(id)
    }

    fn contains(&self, id: &str) -> bool {
        (**self).contains(id)
    }
}
