//! # Blob Codec
//!
//! Converts in-memory value trees into JSON-safe documents and back,
//! moving every binary payload out into a content-addressed blob store.
//!
//! ## Core Concepts
//!
//! - **Values**: Explicit tagged trees of mappings, sequences, primitives,
//!   blobs, opaque objects and errors
//! - **Documents**: The JSON form, with `{"$buffer": id}` and
//!   `{"$type": name}` markers
//! - **Blobs**: Payloads named by a digest of their bytes (md5 hex by default)
//! - **Recorder**: Writes documents as indented `.json` files beside their blobs
//!
//! ## Example
//!
//! ```ignore
//! use blobcodec::{FsBlobStore, Mapping, TreeCodec, Value};
//!
//! let codec = TreeCodec::new(FsBlobStore::new("./recordings")?);
//!
//! let mut event = Mapping::new();
//! event.insert("audio", Value::blob(vec![1, 2, 3, 4, 5]));
//! event.insert("label", "greeting");
//! event.insert("meta", Value::Null);
//!
//! let document = codec.encode(&event.into())?;
//! println!("{}", document.to_pretty_string()?);
//!
//! let value = codec.decode(&document)?;
//! ```

pub mod blobs;
pub mod codec;
pub mod error;
pub mod recorder;
pub mod types;

// Re-exports
pub use blobs::{
    BlobHasher, BlobStore, BlobStoreConfig, DigestEncoding, FsBlobStore, HashAlgorithm,
    MemoryBlobStore, DEFAULT_EXTENSION,
};
pub use codec::TreeCodec;
pub use error::{CodecError, Result};
pub use recorder::{Recorder, RecorderConfig};
pub use types::*;
