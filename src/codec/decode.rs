//! Document to value tree.

use crate::blobs::BlobStore;
use crate::error::Result;
use crate::types::{blob_ref_id, is_type_marker, Mapping, Primitive, Value};
use serde_json::Value as Json;

/// Depth-first walker that pulls externalized blobs back in.
pub(crate) struct Decoder<'a, S: ?Sized> {
    store: &'a S,
    pub(crate) blobs: usize,
}

impl<'a, S: BlobStore + ?Sized> Decoder<'a, S> {
    pub(crate) fn new(store: &'a S) -> Self {
        Self { store, blobs: 0 }
    }

    pub(crate) fn decode(&mut self, node: &Json) -> Result<Value> {
        match node {
            Json::Null => Ok(Value::Null),
            Json::Object(map) => {
                if let Some(id) = blob_ref_id(map)? {
                    let content = self.store.get(id)?;
                    self.blobs += 1;
                    return Ok(Value::Blob(content));
                }
                // Opaque values are not reconstructed.
                if is_type_marker(map) {
                    return Ok(Value::Null);
                }
                let mut out = Mapping::with_capacity(map.len());
                for (key, item) in map {
                    out.insert(key.as_str(), self.decode(item)?);
                }
                Ok(Value::Mapping(out))
            }
            Json::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.decode(item)?);
                }
                Ok(Value::Sequence(out))
            }
            Json::Bool(b) => Ok(Value::Primitive(Primitive::Bool(*b))),
            Json::Number(n) => Ok(Value::Primitive(Primitive::Number(n.clone()))),
            Json::String(s) => Ok(Value::Primitive(Primitive::String(s.clone()))),
        }
    }
}
