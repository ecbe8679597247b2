//! Wire format codecs and the registry that resolves format names to
//! codec implementations.
//!
//! - `json.rs` - serde_json backed codec
//! - `xml.rs` - hand-written element-mapping codec
//! - `url_encoded.rs` - bracket-nested form codec with two parse strategies
//! - `registry.rs` - identifier-derived codec lookup

mod json;
mod registry;
mod url_encoded;
mod xml;

pub use json::JsonFormat;
pub use registry::CodecRegistry;
pub use url_encoded::{ParseStrategy, UrlEncodedFormat};
pub use xml::XmlFormat;

use crate::core::{Result, Value};

/// How `decode` treats a single enclosing root key in the decoded
/// structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RootHandling {
    /// When the decoded structure is a map with exactly one key whose
    /// value is itself a map or array, remove the enclosing key and
    /// return the inner value. Mirrors the REST convention of wrapping
    /// a resource under its type name.
    #[default]
    Strip,
    /// Return the raw decoded structure unchanged, for endpoints that
    /// are already rootless or return heterogeneous envelopes.
    Keep,
}

/// A paired encode/decode implementation for one wire format.
pub trait Codec: Send + Sync {
    /// File extension used in request paths, e.g. `json`.
    fn extension(&self) -> &'static str;

    /// MIME type sent and expected for this format, empty when the
    /// format declares none (the form codec).
    fn mime_type(&self) -> &'static str;

    /// Encodes a value, wrapping it under `root` when given.
    fn encode_with_root(&self, value: &Value, root: Option<&str>) -> Result<Vec<u8>>;

    fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        self.encode_with_root(value, None)
    }

    fn decode(&self, bytes: &[u8], root: RootHandling) -> Result<Value>;
}

/// Applies root-stripping normalization to a decoded structure.
pub(crate) fn apply_root(value: Value, root: RootHandling) -> Value {
    if root == RootHandling::Keep {
        return value;
    }
    match value {
        Value::Map(map) if map.len() == 1 => {
            let (key, inner) = map.into_iter().next().expect("len checked");
            if inner.is_structured() {
                inner
            } else {
                let mut restored = crate::core::Attributes::new();
                restored.insert(key, inner);
                Value::Map(restored)
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Attributes;

    #[test]
    fn test_apply_root_strips_single_structured_key() {
        let mut inner = Attributes::new();
        inner.insert("name", Value::Text("Matz".into()));
        let mut outer = Attributes::new();
        outer.insert("person", Value::Map(inner.clone()));

        let stripped = apply_root(Value::Map(outer.clone()), RootHandling::Strip);
        assert_eq!(stripped, Value::Map(inner));

        let kept = apply_root(Value::Map(outer.clone()), RootHandling::Keep);
        assert_eq!(kept, Value::Map(outer));
    }

    #[test]
    fn test_apply_root_ignores_scalar_single_key() {
        let mut outer = Attributes::new();
        outer.insert("count", Value::Integer(3));

        let result = apply_root(Value::Map(outer.clone()), RootHandling::Strip);
        assert_eq!(result, Value::Map(outer));
    }

    #[test]
    fn test_apply_root_ignores_multi_key_map() {
        let mut outer = Attributes::new();
        outer.insert("a", Value::Map(Attributes::new()));
        outer.insert("b", Value::Integer(1));

        let result = apply_root(Value::Map(outer.clone()), RootHandling::Strip);
        assert_eq!(result, Value::Map(outer));
    }
}
