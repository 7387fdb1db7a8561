//! In-process blob storage.

use super::hasher::BlobHasher;
use super::BlobStore;
use crate::error::{CodecError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use tracing::debug;

#[derive(Default)]
struct Inner {
    blobs: HashMap<String, Vec<u8>>,
    writes: Vec<String>,
    reads: Vec<String>,
}

/// Blob store held in memory.
///
/// Keeps a log of every `put` and `get` in call order, which makes it
/// useful for asserting traversal order in fixtures.
#[derive(Default)]
pub struct MemoryBlobStore {
    hasher: BlobHasher,
    inner: Mutex<Inner>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hasher(hasher: BlobHasher) -> Self {
        Self {
            hasher,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn hasher(&self) -> &BlobHasher {
        &self.hasher
    }

    /// Number of distinct blobs stored.
    pub fn len(&self) -> usize {
        self.inner.lock().blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identifiers passed through `put`, in call order, duplicates included.
    pub fn write_log(&self) -> Vec<String> {
        self.inner.lock().writes.clone()
    }

    /// Identifiers requested through `get`, in call order.
    pub fn read_log(&self) -> Vec<String> {
        self.inner.lock().reads.clone()
    }

    /// Drop a blob, returning whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        self.inner.lock().blobs.remove(id).is_some()
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, content: &[u8]) -> Result<String> {
        let id = self.hasher.identify(content);
        let mut inner = self.inner.lock();
        inner
            .blobs
            .entry(id.clone())
            .or_insert_with(|| content.to_vec());
        inner.writes.push(id.clone());
        debug!(id = %id, bytes = content.len(), "stored blob in memory");
        Ok(id)
    }

    fn get(&self, id: &str) -> Result<Vec<u8>> {
        let mut inner = self.inner.lock();
        inner.reads.push(id.to_string());
        inner.blobs.get(id).cloned().ok_or_else(|| {
            CodecError::store_read(id, io::Error::new(io::ErrorKind::NotFound, "no such blob"))
        })
    }

    fn contains(&self, id: &str) -> bool {
        self.inner.lock().blobs.contains_key(id)
    }
}
