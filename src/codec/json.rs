use super::{apply_root, Codec, RootHandling};
use crate::core::{Attributes, ResourceError, Result, Value};
use serde_json::Value as JsonValue;

/// JSON wire codec backed by serde_json. Key order of decoded objects
/// is preserved.
#[derive(Debug, Clone, Default)]
pub struct JsonFormat;

impl Codec for JsonFormat {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn mime_type(&self) -> &'static str {
        "application/json"
    }

    fn encode_with_root(&self, value: &Value, root: Option<&str>) -> Result<Vec<u8>> {
        let json = match root {
            Some(root) => {
                let mut outer = serde_json::Map::new();
                outer.insert(root.to_string(), value_to_json(value));
                JsonValue::Object(outer)
            }
            None => value_to_json(value),
        };
        serde_json::to_vec(&json).map_err(|e| ResourceError::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8], root: RootHandling) -> Result<Value> {
        let json: JsonValue =
            serde_json::from_slice(bytes).map_err(|e| ResourceError::Decode(e.to_string()))?;
        Ok(apply_root(json_to_value(json), root))
    }
}

fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(*b),
        Value::Integer(i) => JsonValue::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Decimal(d) => JsonValue::String(d.to_string()),
        Value::Text(s) => JsonValue::String(s.clone()),
        Value::Binary(b) => JsonValue::String(String::from_utf8_lossy(b).into_owned()),
        Value::Date(d) => JsonValue::String(d.format("%Y-%m-%d").to_string()),
        Value::DateTime(dt) => JsonValue::String(dt.to_rfc3339()),
        Value::Array(a) => JsonValue::Array(a.iter().map(value_to_json).collect()),
        Value::Map(m) => JsonValue::Object(
            m.iter()
                .map(|(k, v)| (k.to_string(), value_to_json(v)))
                .collect(),
        ),
    }
}

fn json_to_value(json: JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Boolean(b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        JsonValue::String(s) => Value::Text(s),
        JsonValue::Array(a) => Value::Array(a.into_iter().map(json_to_value).collect()),
        JsonValue::Object(o) => Value::Map(
            o.into_iter()
                .map(|(k, v)| (k, json_to_value(v)))
                .collect::<Attributes>(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_strips_root() {
        let codec = JsonFormat;
        let decoded = codec
            .decode(br#"{"person":{"name":"Matz"}}"#, RootHandling::Strip)
            .unwrap();

        let map = decoded.as_map().unwrap();
        assert_eq!(map.get("name"), Some(&Value::Text("Matz".into())));
    }

    #[test]
    fn test_decode_keeps_root_on_request() {
        let codec = JsonFormat;
        let decoded = codec
            .decode(br#"{"person":{"name":"Matz"}}"#, RootHandling::Keep)
            .unwrap();

        let map = decoded.as_map().unwrap();
        assert!(map.contains("person"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_decode_preserves_key_order() {
        let codec = JsonFormat;
        let decoded = codec
            .decode(br#"{"z":1,"a":2,"m":3}"#, RootHandling::Keep)
            .unwrap();

        let keys: Vec<&str> = decoded.as_map().unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_encode_with_root() {
        let codec = JsonFormat;
        let mut attrs = Attributes::new();
        attrs.insert("name", Value::Text("Matz".into()));

        let bytes = codec
            .encode_with_root(&Value::Map(attrs), Some("person"))
            .unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"person":{"name":"Matz"}}"#
        );
    }

    #[test]
    fn test_decode_error_is_reported() {
        let codec = JsonFormat;
        assert!(matches!(
            codec.decode(b"not json", RootHandling::Strip),
            Err(ResourceError::Decode(_))
        ));
    }
}
