//! Session recorder: persists encoded documents next to their blobs.
//!
//! Every recording is a file `<unix-millis>-<kind>.json` in the root
//! directory, written with two-space indentation. Blobs go into the same
//! directory through an [`FsBlobStore`].

use crate::blobs::{BlobStoreConfig, FsBlobStore};
use crate::codec::TreeCodec;
use crate::error::{CodecError, Result};
use crate::types::{Document, Timestamp, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// Recorder configuration. The blob store config's `path` is the root
/// directory for both documents and blobs.
#[derive(Clone, Debug, Default)]
pub struct RecorderConfig {
    pub store: BlobStoreConfig,
}

impl RecorderConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            store: BlobStoreConfig::new(root),
        }
    }

    /// Parse from the same JSON shape as [`BlobStoreConfig`].
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(Self {
            store: BlobStoreConfig::from_json(text)?,
        })
    }
}

/// Records value trees to disk and replays them.
pub struct Recorder {
    root: PathBuf,
    codec: TreeCodec<FsBlobStore>,
}

impl Recorder {
    pub fn open(config: RecorderConfig) -> Result<Self> {
        let store = FsBlobStore::open(config.store)?;
        Ok(Self {
            root: store.path().to_path_buf(),
            codec: TreeCodec::new(store),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn codec(&self) -> &TreeCodec<FsBlobStore> {
        &self.codec
    }

    /// Encode `value` and write it as a new recording of the given kind.
    ///
    /// The document file is only written once every blob is stored.
    pub fn record(&self, kind: &str, value: &Value) -> Result<PathBuf> {
        validate_kind(kind)?;

        let document = self.codec.encode(value)?;
        let text = document.to_pretty_string()?;

        let path = self.root.join(format!("{}-{}.json", Timestamp::now(), kind));
        write_atomic(&self.root, &path, text.as_bytes())?;

        info!(path = %path.display(), kind, "wrote recording");
        Ok(path)
    }

    /// Read a recording back. Relative paths resolve against the root.
    pub fn replay(&self, file: impl AsRef<Path>) -> Result<Value> {
        let document = self.read_document(file)?;
        self.codec.decode(&document)
    }

    /// Read and parse a recording without resolving its blobs.
    pub fn read_document(&self, file: impl AsRef<Path>) -> Result<Document> {
        let path = self.root.join(file.as_ref());
        let bytes = fs::read(&path)?;
        Document::from_slice(&bytes)
    }

    /// All recordings in the root, oldest first.
    pub fn recordings(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_file()
                && path.extension().map_or(false, |ext| ext == "json")
            {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

/// Temp file in the same directory, then rename: a recording is either
/// complete or absent.
fn write_atomic(dir: &Path, path: &Path, contents: &[u8]) -> Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| CodecError::Io(e.error))?;
    Ok(())
}

fn validate_kind(kind: &str) -> Result<()> {
    let valid = !kind.is_empty()
        && kind
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        && !kind.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(CodecError::InvalidConfig(format!(
            "invalid recording kind: {:?}",
            kind
        )))
    }
}
