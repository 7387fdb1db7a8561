//! Core types: the value tree and its JSON-safe document form.

use crate::error::{CodecError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number};
use std::fmt;
use std::io;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Document key marking an externalized blob.
pub const BUFFER_KEY: &str = "$buffer";

/// Document key marking an opaque value's type tag.
pub const TYPE_KEY: &str = "$type";

/// A string, number or boolean leaf.
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    Bool(bool),
    Number(Number),
    String(String),
}

/// A caught error. Only its descriptive fields survive encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorValue {
    pub name: String,
    pub message: String,
    pub stack: Option<String>,
}

impl ErrorValue {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}

/// Ordered string-keyed collection. Keys are unique; iteration follows
/// insertion order.
#[derive(Clone, Debug, Default)]
pub struct Mapping {
    entries: IndexMap<String, Value>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    /// Insert a value. An existing key keeps its position and the previous
    /// value is returned.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Equal only when keys appear in the same order.
impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len() && self.entries.iter().eq(other.entries.iter())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut mapping = Mapping::with_capacity(iter.size_hint().0);
        for (k, v) in iter {
            mapping.insert(k, v);
        }
        mapping
    }
}

impl IntoIterator for Mapping {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// In-memory value tree handed to the codec.
///
/// The producer classifies every node up front; the codec never inspects
/// anything beyond the variant.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Primitive(Primitive),
    Sequence(Vec<Value>),
    Mapping(Mapping),
    Blob(Vec<u8>),
    /// A value that cannot be decomposed. Only its type name is kept.
    Opaque { type_name: String },
    Error(ErrorValue),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::Primitive(Primitive::String(s.into()))
    }

    pub fn number(n: impl Into<Number>) -> Self {
        Value::Primitive(Primitive::Number(n.into()))
    }

    pub fn bool(b: bool) -> Self {
        Value::Primitive(Primitive::Bool(b))
    }

    pub fn blob(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Blob(bytes.into())
    }

    pub fn opaque(type_name: impl Into<String>) -> Self {
        Value::Opaque {
            type_name: type_name.into(),
        }
    }

    pub fn error(error: ErrorValue) -> Self {
        Value::Error(error)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(bytes) => Some(bytes.as_slice()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Primitive(Primitive::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Look up a key when this value is a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|m| m.get(key))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::number(n)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::number(n)
    }
}

impl From<f64> for Value {
    /// Non-finite floats have no JSON form and become `Null`.
    fn from(n: f64) -> Self {
        Number::from_f64(n).map(Value::number).unwrap_or(Value::Null)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<Mapping> for Value {
    fn from(m: Mapping) -> Self {
        Value::Mapping(m)
    }
}

impl From<ErrorValue> for Value {
    fn from(e: ErrorValue) -> Self {
        Value::Error(e)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    /// Plain JSON carries no blobs or opaque values, so the conversion is
    /// structural.
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::bool(b),
            serde_json::Value::Number(n) => Value::number(n),
            serde_json::Value::String(s) => Value::string(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Mapping(map.into_iter().collect()),
        }
    }
}

/// JSON-safe form of a [`Value`]: blobs are replaced by `{"$buffer": id}`
/// and opaque values by `{"$type": name}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(serde_json::Value);

impl Document {
    pub fn new(json: serde_json::Value) -> Self {
        Document(json)
    }

    /// A `{"$buffer": id}` marker.
    pub fn blob_ref(id: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert(BUFFER_KEY.to_string(), serde_json::Value::String(id.into()));
        Document(serde_json::Value::Object(map))
    }

    /// A `{"$type": name}` marker.
    pub fn type_marker(type_name: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert(TYPE_KEY.to_string(), serde_json::Value::String(type_name.into()));
        Document(serde_json::Value::Object(map))
    }

    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_json(self) -> serde_json::Value {
        self.0
    }

    /// Render with two-space indentation.
    pub fn to_pretty_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.0)?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(Document(serde_json::from_slice(bytes)?))
    }

    /// Every blob identifier referenced by the document, in document order.
    ///
    /// Follows the same marker rules as decoding: the children of a
    /// `$type` marker are never visited, and a non-string `$buffer` is an
    /// error.
    pub fn blob_refs(&self) -> Result<Vec<&str>> {
        let mut refs = Vec::new();
        collect_blob_refs(&self.0, &mut refs)?;
        Ok(refs)
    }
}

fn collect_blob_refs<'a>(node: &'a serde_json::Value, refs: &mut Vec<&'a str>) -> Result<()> {
    match node {
        serde_json::Value::Object(map) => {
            if let Some(id) = blob_ref_id(map)? {
                refs.push(id);
            } else if !is_type_marker(map) {
                for child in map.values() {
                    collect_blob_refs(child, refs)?;
                }
            }
        }
        serde_json::Value::Array(items) => {
            for child in items {
                collect_blob_refs(child, refs)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Identifier of a `$buffer` marker, or `None` when the object is not one.
///
/// The key only counts when its value is truthy, so `{"$buffer": ""}` is an
/// ordinary mapping. A truthy value that is not a string is rejected.
pub(crate) fn blob_ref_id(map: &Map<String, serde_json::Value>) -> Result<Option<&str>> {
    match map.get(BUFFER_KEY) {
        Some(serde_json::Value::String(id)) if !id.is_empty() => Ok(Some(id.as_str())),
        Some(other) if is_truthy(other) => Err(CodecError::store_read(
            other.to_string(),
            io::Error::new(io::ErrorKind::InvalidData, "blob reference is not a string"),
        )),
        _ => Ok(None),
    }
}

/// True for a `$type` marker with a truthy tag.
pub(crate) fn is_type_marker(map: &Map<String, serde_json::Value>) -> bool {
    map.get(TYPE_KEY).map_or(false, is_truthy)
}

fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

impl FromStr for Document {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Document(serde_json::from_str(s)?))
    }
}

impl From<serde_json::Value> for Document {
    fn from(json: serde_json::Value) -> Self {
        Document(json)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Milliseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Timestamp(millis)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
