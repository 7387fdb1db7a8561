//! Two-direction tree codec.
//!
//! `encode` walks a [`Value`] and swaps every blob for a `$buffer`
//! reference into the [`BlobStore`]; `decode` walks a [`Document`] and
//! swaps the references back. Both walks are depth-first and strictly
//! sequential: a sibling is not started until the previous sibling's whole
//! subtree, blob I/O included, has finished. Blob write order is therefore
//! reproducible across runs.
//!
//! The round trip is lossy in exactly two places. Opaque values encode to
//! `{"$type": name}` and decode to `Null`. Errors encode to a plain
//! `{name, message, stack}` mapping and decode as that mapping.

mod decode;
mod encode;

use crate::blobs::BlobStore;
use crate::error::Result;
use crate::types::{Document, Value};
use decode::Decoder;
use encode::Encoder;
use tracing::debug;

/// Encodes value trees into documents and back against one blob store.
pub struct TreeCodec<S> {
    store: S,
}

impl<S: BlobStore> TreeCodec<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Encode a value tree. Fails with `StoreWrite` if any blob cannot be
    /// persisted; no document is produced in that case.
    pub fn encode(&self, value: &Value) -> Result<Document> {
        let mut encoder = Encoder::new(&self.store);
        let json = encoder.encode(value)?;
        debug!(blobs = encoder.blobs, "encoded value tree");
        Ok(Document::new(json))
    }

    /// Decode a document. Fails with `StoreRead` if any referenced blob
    /// cannot be read; no partial value is returned.
    pub fn decode(&self, document: &Document) -> Result<Value> {
        let mut decoder = Decoder::new(&self.store);
        let value = decoder.decode(document.as_json())?;
        debug!(blobs = decoder.blobs, "decoded document");
        Ok(value)
    }

    pub fn encode_to_document(&self, value: &Value) -> Result<Document> {
        self.encode(value)
    }

    pub fn decode_from_document(&self, document: &Document) -> Result<Value> {
        self.decode(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blobs::MemoryBlobStore;
    use crate::error::CodecError;
    use crate::types::{ErrorValue, Mapping};
    use serde_json::json;
    use std::io;

    struct FailingStore;

    impl BlobStore for FailingStore {
        fn put(&self, _content: &[u8]) -> Result<String> {
            Err(CodecError::StoreWrite {
                id: "x.wav".to_string(),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            })
        }

        fn get(&self, id: &str) -> Result<Vec<u8>> {
            Err(CodecError::StoreRead {
                id: id.to_string(),
                source: io::Error::from(io::ErrorKind::NotFound),
            })
        }
    }

    fn codec() -> TreeCodec<MemoryBlobStore> {
        TreeCodec::new(MemoryBlobStore::new())
    }

    #[test]
    fn test_blob_becomes_reference() {
        let codec = codec();
        let value: Value = [
            ("audio", Value::blob(vec![1u8, 2, 3, 4, 5])),
            ("label", Value::from("greeting")),
            ("meta", Value::Null),
        ]
        .into_iter()
        .collect::<Mapping>()
        .into();

        let doc = codec.encode(&value).unwrap();
        let id = codec.store().hasher().identify(&[1, 2, 3, 4, 5]);
        assert_eq!(
            doc.as_json(),
            &json!({"audio": {"$buffer": id}, "label": "greeting", "meta": null})
        );
        assert_eq!(codec.store().len(), 1);

        assert_eq!(codec.decode(&doc).unwrap(), value);
    }

    #[test]
    fn test_opaque_encodes_type_and_decodes_null() {
        let codec = codec();
        let doc = codec.encode(&Value::opaque("Function")).unwrap();
        assert_eq!(doc, Document::type_marker("Function"));
        assert_eq!(doc.as_json(), &json!({"$type": "Function"}));
        assert_eq!(codec.decode(&doc).unwrap(), Value::Null);
    }

    #[test]
    fn test_nested_opaque_collapses_in_place() {
        let codec = codec();
        let value = Value::Sequence(vec![Value::from(1i64), Value::opaque("Socket")]);
        let decoded = codec.decode(&codec.encode(&value).unwrap()).unwrap();
        assert_eq!(
            decoded,
            Value::Sequence(vec![Value::from(1i64), Value::Null])
        );
    }

    #[test]
    fn test_error_fields() {
        let codec = codec();
        let err = ErrorValue::new("TypeError", "bad").with_stack("at f (x.js:1:1)");
        let doc = codec.encode(&Value::error(err)).unwrap();
        assert_eq!(
            doc.as_json(),
            &json!({"name": "TypeError", "message": "bad", "stack": "at f (x.js:1:1)"})
        );

        let decoded = codec.decode(&doc).unwrap();
        let expected: Mapping = [
            ("name", "TypeError"),
            ("message", "bad"),
            ("stack", "at f (x.js:1:1)"),
        ]
        .into_iter()
        .collect();
        assert_eq!(decoded, Value::Mapping(expected));
    }

    #[test]
    fn test_error_without_stack_keeps_three_keys() {
        let codec = codec();
        let doc = codec.encode(&Value::error(ErrorValue::new("Error", "boom"))).unwrap();
        assert_eq!(
            doc.as_json(),
            &json!({"name": "Error", "message": "boom", "stack": null})
        );
    }

    #[test]
    fn test_key_order_preserved() {
        let codec = codec();
        let value: Value = [("b", 1i64), ("a", 2i64), ("c", 3i64)]
            .into_iter()
            .collect::<Mapping>()
            .into();

        let doc = codec.encode(&value).unwrap();
        let keys: Vec<&String> = doc.as_json().as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);

        let decoded = codec.decode(&doc).unwrap();
        assert_eq!(
            decoded.as_mapping().unwrap().keys().collect::<Vec<_>>(),
            vec!["b", "a", "c"]
        );
    }

    #[test]
    fn test_falsy_primitives_survive() {
        let codec = codec();
        let value = Value::Sequence(vec![
            Value::bool(false),
            Value::from(0i64),
            Value::from(""),
            Value::Null,
        ]);
        let decoded = codec.decode(&codec.encode(&value).unwrap()).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_blob_write_order_is_depth_first() {
        let codec = codec();
        let value: Value = [
            (
                "first",
                Value::Sequence(vec![Value::blob(b"a".to_vec()), Value::blob(b"b".to_vec())]),
            ),
            ("second", Value::blob(b"c".to_vec())),
        ]
        .into_iter()
        .collect::<Mapping>()
        .into();

        let doc = codec.encode(&value).unwrap();
        let hasher = codec.store().hasher();
        let expected = vec![
            hasher.identify(b"a"),
            hasher.identify(b"b"),
            hasher.identify(b"c"),
        ];
        assert_eq!(codec.store().write_log(), expected);

        codec.decode(&doc).unwrap();
        assert_eq!(codec.store().read_log(), expected);
    }

    #[test]
    fn test_encode_failure_aborts() {
        let codec = TreeCodec::new(FailingStore);
        let value = Value::Sequence(vec![Value::from("ok"), Value::blob(vec![9u8])]);
        let err = codec.encode(&value).unwrap_err();
        assert!(matches!(err, CodecError::StoreWrite { .. }));
    }

    #[test]
    fn test_decode_failure_aborts() {
        let codec = codec();
        let doc = Document::new(json!({"outer": [1, {"inner": {"$buffer": "missing.wav"}}]}));
        let err = codec.decode(&doc).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_non_string_buffer_reference() {
        let codec = codec();
        let doc = Document::new(json!({"$buffer": 42}));
        let err = codec.decode(&doc).unwrap_err();
        assert!(matches!(err, CodecError::StoreRead { .. }));
        assert!(codec.store().read_log().is_empty());
    }

    #[test]
    fn test_empty_marker_values_are_plain_mappings() {
        let codec = codec();
        let doc = Document::new(json!({"$buffer": "", "$type": null}));
        let decoded = codec.decode(&doc).unwrap();
        let m = decoded.as_mapping().unwrap();
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["$buffer", "$type"]);
        assert_eq!(m.get("$type"), Some(&Value::Null));
    }

    #[test]
    fn test_buffer_wins_over_type() {
        let codec = codec();
        let id = codec.store().put(b"pcm").unwrap();
        let doc = Document::new(json!({"$type": "Buffer", "$buffer": id}));
        assert_eq!(codec.decode(&doc).unwrap(), Value::blob(b"pcm".to_vec()));
    }

    #[test]
    fn test_wide_object_decodes() {
        let codec = codec();
        let mut map = serde_json::Map::new();
        for i in 0..50_000u64 {
            map.insert(format!("key{}", i), json!(i));
        }
        let doc = Document::new(serde_json::Value::Object(map));

        let decoded = codec.decode(&doc).unwrap();
        let m = decoded.as_mapping().unwrap();
        assert_eq!(m.len(), 50_000);
        assert_eq!(m.keys().next(), Some("key0"));
        assert_eq!(m.keys().last(), Some("key49999"));
        assert_eq!(m.get("key25000"), Some(&Value::from(25_000u64)));

        assert_eq!(codec.encode(&decoded).unwrap(), doc);
    }

    #[test]
    fn test_shared_store_through_reference() {
        let store = MemoryBlobStore::new();
        let writer = TreeCodec::new(&store);
        let doc = writer.encode(&Value::blob(b"shared".to_vec())).unwrap();

        let reader = TreeCodec::new(&store);
        assert_eq!(
            reader.decode_from_document(&doc).unwrap(),
            Value::blob(b"shared".to_vec())
        );
    }
}
