//! Filesystem blob storage.

use super::hasher::{BlobHasher, DigestEncoding, HashAlgorithm, DEFAULT_EXTENSION};
use super::BlobStore;
use crate::error::{CodecError, Result};
use serde::Deserialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, trace, warn};

/// Blob store configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BlobStoreConfig {
    /// Directory holding the blob files.
    pub path: PathBuf,

    /// Digest used to name blobs.
    #[serde(alias = "hashAlgorithm", alias = "hash")]
    pub hash_algorithm: HashAlgorithm,

    /// Text encoding of the digest.
    #[serde(alias = "hashDigestEncoding", alias = "hashDigest")]
    pub digest_encoding: DigestEncoding,

    /// Extension appended to every identifier.
    pub extension: String,

    /// Whether to create the directory if it doesn't exist.
    #[serde(alias = "createIfMissing")]
    pub create_if_missing: bool,
}

impl Default for BlobStoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./recordings"),
            hash_algorithm: HashAlgorithm::default(),
            digest_encoding: DigestEncoding::default(),
            extension: DEFAULT_EXTENSION.to_string(),
            create_if_missing: true,
        }
    }
}

impl BlobStoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Parse a JSON configuration. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| CodecError::InvalidConfig(format!("blob store config: {}", e)))
    }

    pub fn hasher(&self) -> BlobHasher {
        BlobHasher::new(self.hash_algorithm, self.digest_encoding, self.extension.clone())
    }

    fn validate(&self) -> Result<()> {
        if self.extension.contains(&['/', '\\', '\0'][..]) || self.extension.starts_with('.') {
            return Err(CodecError::InvalidConfig(format!(
                "invalid blob extension: {:?}",
                self.extension
            )));
        }
        Ok(())
    }
}

/// Content-addressed blob storage in a single directory.
///
/// Each blob is a file named `<digest>.<ext>` holding the exact payload
/// bytes.
#[derive(Debug)]
pub struct FsBlobStore {
    /// Base directory for blobs.
    path: PathBuf,

    hasher: BlobHasher,
}

impl FsBlobStore {
    /// Open (and by default create) a blob directory.
    pub fn open(config: BlobStoreConfig) -> Result<Self> {
        config.validate()?;

        if !config.path.is_dir() {
            if !config.create_if_missing {
                return Err(CodecError::InvalidConfig(format!(
                    "blob directory does not exist: {}",
                    config.path.display()
                )));
            }
            fs::create_dir_all(&config.path)?;
        }

        Ok(Self {
            hasher: config.hasher(),
            path: config.path,
        })
    }

    /// Open a store with default hashing at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open(BlobStoreConfig::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn hasher(&self) -> &BlobHasher {
        &self.hasher
    }

    /// Location of the record for `id`. Identifiers that would escape the
    /// store directory are rejected.
    pub fn path_for(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty()
            || id == "."
            || id == ".."
            || id.contains(&['/', '\\', '\0'][..])
        {
            return Err(CodecError::store_read(
                id,
                io::Error::new(io::ErrorKind::InvalidInput, "invalid blob identifier"),
            ));
        }
        Ok(self.path.join(id))
    }

    /// List identifiers of all blobs carrying this store's extension.
    pub fn list(&self) -> Result<Vec<String>> {
        let suffix = format!(".{}", self.hasher.extension());
        let mut ids = Vec::new();

        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if self.hasher.extension().is_empty() || name.ends_with(&suffix) {
                ids.push(name);
            }
        }

        ids.sort();
        Ok(ids)
    }

    /// Get total size of all blobs.
    pub fn total_size(&self) -> Result<u64> {
        let mut total = 0u64;
        for id in self.list()? {
            total += fs::metadata(self.path.join(id))?.len();
        }
        Ok(total)
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, content: &[u8]) -> Result<String> {
        let id = self.hasher.identify(content);
        let blob_path = self.path.join(&id);

        if blob_path.exists() {
            trace!(id = %id, "blob already stored");
            return Ok(id);
        }

        // Temp file in the same directory, then rename: readers never see a
        // partial blob.
        let mut tmp =
            NamedTempFile::new_in(&self.path).map_err(|e| CodecError::store_write(&id, e))?;
        tmp.write_all(content)
            .map_err(|e| CodecError::store_write(&id, e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| CodecError::store_write(&id, e))?;
        tmp.persist(&blob_path)
            .map_err(|e| CodecError::store_write(&id, e.error))?;

        debug!(id = %id, bytes = content.len(), "stored blob");
        Ok(id)
    }

    fn get(&self, id: &str) -> Result<Vec<u8>> {
        let blob_path = self.path_for(id)?;
        match fs::read(&blob_path) {
            Ok(content) => {
                debug!(id = %id, bytes = content.len(), "read blob");
                Ok(content)
            }
            Err(e) => {
                warn!(id = %id, error = %e, "blob read failed");
                Err(CodecError::store_read(id, e))
            }
        }
    }

    fn contains(&self, id: &str) -> bool {
        self.path_for(id).map(|p| p.is_file()).unwrap_or(false)
    }
}
