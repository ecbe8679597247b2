use super::{apply_root, Codec, RootHandling};
use crate::core::{Attributes, ResourceError, Result, Value};

/// Decode strategy for the form codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseStrategy {
    /// Bracket-aware parser: `a[b]=1` nests a mapping, repeated
    /// `a[]=1&a[]=2` builds an ordered array.
    #[default]
    Strict,
    /// Flat parser: keys are taken verbatim and repeated keys fold
    /// last-wins onto a single scalar. Known limitation: two
    /// same-named keys without the bracket convention do not produce
    /// a list.
    Simple,
}

/// URL-encoded form codec used for request bodies. Encoding follows
/// the standard bracket-nesting query conventions; decoding
/// reconstructs an attribute mapping from the flat key/value
/// representation.
#[derive(Debug, Clone, Default)]
pub struct UrlEncodedFormat {
    strategy: ParseStrategy,
}

impl UrlEncodedFormat {
    pub fn new(strategy: ParseStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> ParseStrategy {
        self.strategy
    }
}

impl Codec for UrlEncodedFormat {
    fn extension(&self) -> &'static str {
        "url"
    }

    // The form codec declares no MIME constant; it is only used for
    // request bodies.
    fn mime_type(&self) -> &'static str {
        ""
    }

    fn encode_with_root(&self, value: &Value, root: Option<&str>) -> Result<Vec<u8>> {
        let map = value.as_map().ok_or_else(|| {
            ResourceError::Encode(format!(
                "url-encoded body requires a mapping, got {}",
                value.type_name()
            ))
        })?;

        let mut pairs = Vec::new();
        for (key, value) in map.iter() {
            let prefix = match root {
                Some(root) => format!("{}[{}]", percent_encode(root), percent_encode(key)),
                None => percent_encode(key),
            };
            emit_pairs(&mut pairs, &prefix, value)?;
        }
        Ok(pairs.join("&").into_bytes())
    }

    fn decode(&self, bytes: &[u8], root: RootHandling) -> Result<Value> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ResourceError::Decode(format!("invalid UTF-8: {}", e)))?;
        let query = text.strip_prefix('?').unwrap_or(text);

        let mut map = Attributes::new();
        for segment in query.split('&') {
            if segment.is_empty() {
                continue;
            }
            let (raw_key, raw_value) = match segment.split_once('=') {
                Some((k, v)) => (k, v),
                None => (segment, ""),
            };
            let key = percent_decode(raw_key)?;
            let value = Value::Text(percent_decode(raw_value)?);

            match self.strategy {
                ParseStrategy::Simple => {
                    // Verbatim key, last value wins.
                    map.insert(key, value);
                }
                ParseStrategy::Strict => {
                    let segments = split_brackets(&key)?;
                    insert_path(&mut map, &segments, value)?;
                }
            }
        }
        Ok(apply_root(Value::Map(map), root))
    }
}

fn emit_pairs(pairs: &mut Vec<String>, prefix: &str, value: &Value) -> Result<()> {
    match value {
        Value::Map(map) => {
            for (key, inner) in map.iter() {
                emit_pairs(pairs, &format!("{}[{}]", prefix, percent_encode(key)), inner)?;
            }
        }
        Value::Array(items) => {
            for item in items {
                emit_pairs(pairs, &format!("{}[]", prefix), item)?;
            }
        }
        Value::Null => pairs.push(format!("{}=", prefix)),
        Value::Binary(_) => {
            return Err(ResourceError::Encode(format!(
                "cannot url-encode binary value for '{}'",
                prefix
            )))
        }
        scalar => pairs.push(format!("{}={}", prefix, percent_encode(&scalar.to_string()))),
    }
    Ok(())
}

/// Splits `a[b][]` into `["a", "b", ""]`.
fn split_brackets(key: &str) -> Result<Vec<String>> {
    let Some(open) = key.find('[') else {
        return Ok(vec![key.to_string()]);
    };
    let mut segments = vec![key[..open].to_string()];
    let mut rest = &key[open..];
    while !rest.is_empty() {
        if !rest.starts_with('[') {
            return Err(ResourceError::Decode(format!("malformed key '{}'", key)));
        }
        let close = rest
            .find(']')
            .ok_or_else(|| ResourceError::Decode(format!("unbalanced bracket in '{}'", key)))?;
        segments.push(rest[1..close].to_string());
        rest = &rest[close + 1..];
    }
    Ok(segments)
}

fn insert_path(map: &mut Attributes, segments: &[String], value: Value) -> Result<()> {
    let key = &segments[0];
    let rest = &segments[1..];

    if rest.is_empty() {
        map.insert(key.clone(), value);
        return Ok(());
    }

    if rest[0].is_empty() {
        // Array segment: `a[]` appends, `a[][b]` fills the trailing map.
        if !matches!(map.get(key), Some(Value::Array(_))) {
            map.insert(key.clone(), Value::Array(Vec::new()));
        }
        let Some(Value::Array(items)) = map.get_mut(key) else {
            unreachable!()
        };
        if rest.len() == 1 {
            items.push(value);
            return Ok(());
        }
        let tail = &rest[1..];
        let needs_new = match items.last() {
            Some(Value::Map(last)) => last.contains(&tail[0]),
            _ => true,
        };
        if needs_new {
            items.push(Value::Map(Attributes::new()));
        }
        let Some(Value::Map(last)) = items.last_mut() else {
            unreachable!()
        };
        return insert_path(last, tail, value);
    }

    // Named segment: nest a mapping, replacing any scalar already there.
    if !matches!(map.get(key), Some(Value::Map(_))) {
        map.insert(key.clone(), Value::Map(Attributes::new()));
    }
    let Some(Value::Map(inner)) = map.get_mut(key) else {
        unreachable!()
    };
    insert_path(inner, rest, value)
}

fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{:02X}", other)),
        }
    }
    out
}

fn percent_decode(s: &str) -> Result<String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .ok_or_else(|| ResourceError::Decode(format!("truncated escape in '{}'", s)))?;
                let hex = std::str::from_utf8(hex)
                    .map_err(|_| ResourceError::Decode(format!("invalid escape in '{}'", s)))?;
                let byte = u8::from_str_radix(hex, 16)
                    .map_err(|_| ResourceError::Decode(format!("invalid escape in '{}'", s)))?;
                out.push(byte);
                i += 3;
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }
    String::from_utf8(out).map_err(|e| ResourceError::Decode(format!("invalid UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict() -> UrlEncodedFormat {
        UrlEncodedFormat::new(ParseStrategy::Strict)
    }

    fn decode_map(codec: &UrlEncodedFormat, input: &str) -> Attributes {
        codec
            .decode(input.as_bytes(), RootHandling::Keep)
            .unwrap()
            .into_map()
            .unwrap()
    }

    #[test]
    fn test_decode_simple_pair() {
        let map = decode_map(&strict(), "a=1");
        assert_eq!(map.get("a"), Some(&Value::Text("1".into())));
    }

    #[test]
    fn test_decode_ignores_leading_question_mark() {
        let map = decode_map(&strict(), "?a=1");
        assert_eq!(map.get("a"), Some(&Value::Text("1".into())));
    }

    #[test]
    fn test_strict_decodes_bracket_arrays() {
        let map = decode_map(&strict(), "a[]=1&a[]=2");
        assert_eq!(
            map.get("a"),
            Some(&Value::Array(vec![
                Value::Text("1".into()),
                Value::Text("2".into())
            ]))
        );
    }

    #[test]
    fn test_strict_decodes_nested_maps() {
        let map = decode_map(&strict(), "a[b]=1&a[c]=2");
        let inner = map.get("a").unwrap().as_map().unwrap();
        assert_eq!(inner.get("b"), Some(&Value::Text("1".into())));
        assert_eq!(inner.get("c"), Some(&Value::Text("2".into())));
    }

    #[test]
    fn test_strict_array_of_maps() {
        let map = decode_map(&strict(), "a[][b]=1&a[][c]=2&a[][b]=3");
        let items = map.get("a").unwrap().as_array().unwrap();
        assert_eq!(items.len(), 2);
        let first = items[0].as_map().unwrap();
        assert_eq!(first.get("b"), Some(&Value::Text("1".into())));
        assert_eq!(first.get("c"), Some(&Value::Text("2".into())));
        let second = items[1].as_map().unwrap();
        assert_eq!(second.get("b"), Some(&Value::Text("3".into())));
    }

    #[test]
    fn test_simple_folds_repeated_keys_last_wins() {
        let codec = UrlEncodedFormat::new(ParseStrategy::Simple);
        let map = decode_map(&codec, "a=1&a=2");
        assert_eq!(map.get("a"), Some(&Value::Text("2".into())));
    }

    #[test]
    fn test_simple_keeps_bracket_keys_verbatim() {
        let codec = UrlEncodedFormat::new(ParseStrategy::Simple);
        let map = decode_map(&codec, "a[b]=1");
        assert_eq!(map.get("a[b]"), Some(&Value::Text("1".into())));
    }

    #[test]
    fn test_percent_and_plus_decoding() {
        let map = decode_map(&strict(), "name=Yukihiro+Matsumoto&city=T%C5%8Dky%C5%8D");
        assert_eq!(
            map.get("name"),
            Some(&Value::Text("Yukihiro Matsumoto".into()))
        );
        assert_eq!(map.get("city"), Some(&Value::Text("Tōkyō".into())));
    }

    #[test]
    fn test_encode_nested_with_root() {
        let codec = strict();
        let mut address = Attributes::new();
        address.insert("city", Value::Text("Tokyo".into()));
        let mut attrs = Attributes::new();
        attrs.insert("name", Value::Text("Matz".into()));
        attrs.insert("address", Value::Map(address));
        attrs.insert(
            "tags",
            Value::Array(vec![Value::Text("a".into()), Value::Text("b".into())]),
        );

        let bytes = codec
            .encode_with_root(&Value::Map(attrs), Some("person"))
            .unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "person[name]=Matz&person[address][city]=Tokyo&person[tags][]=a&person[tags][]=b"
        );
    }

    #[test]
    fn test_encode_rejects_non_map() {
        let codec = strict();
        assert!(matches!(
            codec.encode(&Value::Integer(1)),
            Err(ResourceError::Encode(_))
        ));
    }

    #[test]
    fn test_root_stripping_applies() {
        let codec = strict();
        let decoded = codec
            .decode(b"person[name]=Matz", RootHandling::Strip)
            .unwrap();
        let map = decoded.as_map().unwrap();
        assert_eq!(map.get("name"), Some(&Value::Text("Matz".into())));
    }
}
