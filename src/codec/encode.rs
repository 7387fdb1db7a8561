//! Value tree to document.

use crate::blobs::BlobStore;
use crate::error::Result;
use crate::types::{Document, ErrorValue, Primitive, Value};
use serde_json::{Map, Value as Json};

/// Depth-first walker that externalizes blobs as it goes.
pub(crate) struct Encoder<'a, S: ?Sized> {
    store: &'a S,
    pub(crate) blobs: usize,
}

impl<'a, S: BlobStore + ?Sized> Encoder<'a, S> {
    pub(crate) fn new(store: &'a S) -> Self {
        Self { store, blobs: 0 }
    }

    /// Children are visited one at a time in their defined order; a store
    /// failure anywhere aborts the whole walk.
    pub(crate) fn encode(&mut self, value: &Value) -> Result<Json> {
        match value {
            Value::Opaque { type_name } => {
                Ok(Document::type_marker(type_name.as_str()).into_json())
            }
            Value::Error(err) => Ok(error_fields(err)),
            Value::Blob(bytes) => {
                let id = self.store.put(bytes)?;
                self.blobs += 1;
                Ok(Document::blob_ref(id).into_json())
            }
            Value::Sequence(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.encode(item)?);
                }
                Ok(Json::Array(out))
            }
            Value::Mapping(mapping) => {
                let mut out = Map::with_capacity(mapping.len());
                for (key, item) in mapping.iter() {
                    out.insert(key.to_string(), self.encode(item)?);
                }
                Ok(Json::Object(out))
            }
            Value::Primitive(p) => Ok(primitive(p)),
            Value::Null => Ok(Json::Null),
        }
    }
}

fn error_fields(err: &ErrorValue) -> Json {
    let mut map = Map::with_capacity(3);
    map.insert("name".to_string(), Json::String(err.name.clone()));
    map.insert("message".to_string(), Json::String(err.message.clone()));
    map.insert(
        "stack".to_string(),
        err.stack.clone().map(Json::String).unwrap_or(Json::Null),
    );
    Json::Object(map)
}

fn primitive(p: &Primitive) -> Json {
    match p {
        Primitive::Bool(b) => Json::Bool(*b),
        Primitive::Number(n) => Json::Number(n.clone()),
        Primitive::String(s) => Json::String(s.clone()),
    }
}
