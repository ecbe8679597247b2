use super::{apply_root, Codec, RootHandling};
use crate::core::{Attributes, ResourceError, Result, Value};
use crate::inflect;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

/// XML wire codec using the conventional hash-to-element mapping:
/// nested maps become child elements, arrays become repeated sibling
/// elements inside a `type="array"` container, scalar elements carry a
/// `type` attribute for non-string values and `nil="true"` for null.
/// Underscored keys are dasherized on the wire.
#[derive(Debug, Clone, Default)]
pub struct XmlFormat;

impl Codec for XmlFormat {
    fn extension(&self) -> &'static str {
        "xml"
    }

    fn mime_type(&self) -> &'static str {
        "application/xml"
    }

    fn encode_with_root(&self, value: &Value, root: Option<&str>) -> Result<Vec<u8>> {
        let root = root.unwrap_or(match value {
            Value::Array(_) => "records",
            _ => "hash",
        });
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        emit_element(&mut out, root, value);
        Ok(out.into_bytes())
    }

    fn decode(&self, bytes: &[u8], root: RootHandling) -> Result<Value> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ResourceError::Decode(format!("invalid UTF-8: {}", e)))?;
        let mut parser = Parser::new(text);
        parser.skip_prolog();
        let element = parser.parse_element()?;
        parser.skip_whitespace_and_comments();
        if !parser.at_end() {
            return Err(ResourceError::Decode(
                "trailing content after document element".into(),
            ));
        }

        let mut envelope = Attributes::new();
        let key = element.name.replace('-', "_");
        envelope.insert(key, element_to_value(element)?);
        Ok(apply_root(Value::Map(envelope), root))
    }
}

// ---------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------

fn emit_element(out: &mut String, key: &str, value: &Value) {
    let tag = key.replace('_', "-");
    match value {
        Value::Null => {
            out.push_str(&format!("<{} nil=\"true\"/>", tag));
        }
        Value::Boolean(b) => emit_typed(out, &tag, "boolean", &b.to_string()),
        Value::Integer(i) => emit_typed(out, &tag, "integer", &i.to_string()),
        Value::Float(f) => emit_typed(out, &tag, "float", &f.to_string()),
        Value::Decimal(d) => emit_typed(out, &tag, "decimal", &d.to_string()),
        Value::Date(d) => emit_typed(out, &tag, "date", &d.format("%Y-%m-%d").to_string()),
        Value::DateTime(dt) => emit_typed(out, &tag, "datetime", &dt.to_rfc3339()),
        Value::Binary(b) => emit_typed(out, &tag, "binary", &BASE64.encode(b)),
        Value::Text(s) => {
            out.push_str(&format!("<{}>{}</{}>", tag, escape(s), tag));
        }
        Value::Array(items) => {
            let item_key = inflect::singularize(key);
            out.push_str(&format!("<{} type=\"array\">", tag));
            for item in items {
                emit_element(out, &item_key, item);
            }
            out.push_str(&format!("</{}>", tag));
        }
        Value::Map(map) => {
            out.push_str(&format!("<{}>", tag));
            for (k, v) in map.iter() {
                emit_element(out, k, v);
            }
            out.push_str(&format!("</{}>", tag));
        }
    }
}

fn emit_typed(out: &mut String, tag: &str, attr_type: &str, body: &str) {
    out.push_str(&format!(
        "<{} type=\"{}\">{}</{}>",
        tag,
        attr_type,
        escape(body),
        tag
    ));
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

// ---------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------

struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
    self_closing: bool,
}

impl Element {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

fn element_to_value(element: Element) -> Result<Value> {
    if element.attr("nil") == Some("true") {
        return Ok(Value::Null);
    }

    if element.attr("type") == Some("array") {
        let mut items = Vec::with_capacity(element.children.len());
        for child in element.children {
            items.push(element_to_value(child)?);
        }
        return Ok(Value::Array(items));
    }

    if !element.children.is_empty() {
        // Repeated sibling names fold into an ordered array under the
        // shared key.
        let mut map = Attributes::new();
        for child in element.children {
            let key = child.name.replace('-', "_");
            let value = element_to_value(child)?;
            match map.remove(&key) {
                Some(Value::Array(mut items)) => {
                    items.push(value);
                    map.insert(key, Value::Array(items));
                }
                Some(existing) => {
                    map.insert(key, Value::Array(vec![existing, value]));
                }
                None => {
                    map.insert(key, value);
                }
            }
        }
        return Ok(Value::Map(map));
    }

    if element.self_closing {
        return Ok(Value::Null);
    }

    let text = unescape(element.text.trim());
    match element.attr("type") {
        Some("integer") => text
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|e| decode_err(&element.name, &text, e)),
        Some("float") => text
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| decode_err(&element.name, &text, e)),
        Some("decimal") => Decimal::from_str(&text)
            .map(Value::Decimal)
            .map_err(|e| decode_err(&element.name, &text, e)),
        Some("boolean") => match text.as_str() {
            "true" | "1" => Ok(Value::Boolean(true)),
            "false" | "0" => Ok(Value::Boolean(false)),
            _ => Err(decode_err(&element.name, &text, "invalid boolean")),
        },
        Some("date") => NaiveDate::parse_from_str(&text, "%Y-%m-%d")
            .map(Value::Date)
            .map_err(|e| decode_err(&element.name, &text, e)),
        Some("datetime") => DateTime::parse_from_rfc3339(&text)
            .map(|dt| Value::DateTime(dt.with_timezone(&Utc)))
            .map_err(|e| decode_err(&element.name, &text, e)),
        Some("binary") => BASE64
            .decode(text.as_bytes())
            .map(Value::Binary)
            .map_err(|e| decode_err(&element.name, &text, e)),
        _ => Ok(Value::Text(text)),
    }
}

fn decode_err(element: &str, text: &str, reason: impl ToString) -> ResourceError {
    ResourceError::Decode(format!(
        "element '{}' with content '{}': {}",
        element,
        text,
        reason.to_string()
    ))
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn skip_prolog(&mut self) {
        self.skip_whitespace_and_comments();
        if self.rest().starts_with("<?") {
            if let Some(end) = self.rest().find("?>") {
                self.pos += end + 2;
            }
        }
        self.skip_whitespace_and_comments();
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            let trimmed = self.rest().trim_start();
            self.pos = self.input.len() - trimmed.len();
            if trimmed.starts_with("<!--") {
                match trimmed.find("-->") {
                    Some(end) => self.pos += end + 3,
                    None => {
                        self.pos = self.input.len();
                        return;
                    }
                }
            } else {
                return;
            }
        }
    }

    fn parse_element(&mut self) -> Result<Element> {
        if !self.rest().starts_with('<') {
            return Err(ResourceError::Decode(format!(
                "expected element at byte {}",
                self.pos
            )));
        }
        self.pos += 1;

        let name = self.parse_name()?;
        let attrs = self.parse_attrs()?;

        if self.rest().starts_with("/>") {
            self.pos += 2;
            return Ok(Element {
                name,
                attrs,
                children: Vec::new(),
                text: String::new(),
                self_closing: true,
            });
        }
        if !self.rest().starts_with('>') {
            return Err(ResourceError::Decode(format!(
                "malformed tag '{}' at byte {}",
                name, self.pos
            )));
        }
        self.pos += 1;

        let mut children = Vec::new();
        let mut text = String::new();
        loop {
            self.skip_comments();
            if self.rest().starts_with("</") {
                self.pos += 2;
                let closing = self.parse_name()?;
                if closing != name {
                    return Err(ResourceError::Decode(format!(
                        "mismatched closing tag: expected '</{}>', found '</{}>'",
                        name, closing
                    )));
                }
                self.skip_spaces();
                if !self.rest().starts_with('>') {
                    return Err(ResourceError::Decode(format!(
                        "malformed closing tag '</{}>'",
                        closing
                    )));
                }
                self.pos += 1;
                return Ok(Element {
                    name,
                    attrs,
                    children,
                    text,
                    self_closing: false,
                });
            }
            if self.rest().starts_with('<') {
                children.push(self.parse_element()?);
            } else if self.at_end() {
                return Err(ResourceError::Decode(format!(
                    "unterminated element '{}'",
                    name
                )));
            } else {
                let chunk_end = self.rest().find('<').unwrap_or(self.rest().len());
                text.push_str(&self.rest()[..chunk_end]);
                self.pos += chunk_end;
            }
        }
    }

    /// Comments inside element content are skipped; text runs are
    /// accumulated by the caller.
    fn skip_comments(&mut self) {
        while self.rest().starts_with("<!--") {
            match self.rest().find("-->") {
                Some(end) => self.pos += end + 3,
                None => {
                    self.pos = self.input.len();
                    return;
                }
            }
        }
    }

    fn parse_name(&mut self) -> Result<String> {
        let end = self
            .rest()
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/' || c == '=')
            .unwrap_or(self.rest().len());
        if end == 0 {
            return Err(ResourceError::Decode(format!(
                "expected name at byte {}",
                self.pos
            )));
        }
        let name = self.rest()[..end].to_string();
        self.pos += end;
        Ok(name)
    }

    fn parse_attrs(&mut self) -> Result<Vec<(String, String)>> {
        let mut attrs = Vec::new();
        loop {
            self.skip_spaces();
            if self.rest().starts_with('>') || self.rest().starts_with("/>") || self.at_end() {
                return Ok(attrs);
            }
            let name = self.parse_name()?;
            self.skip_spaces();
            if !self.rest().starts_with('=') {
                return Err(ResourceError::Decode(format!(
                    "attribute '{}' missing value",
                    name
                )));
            }
            self.pos += 1;
            self.skip_spaces();
            let quote = match self.rest().chars().next() {
                Some(q @ ('"' | '\'')) => q,
                _ => {
                    return Err(ResourceError::Decode(format!(
                        "attribute '{}' value not quoted",
                        name
                    )))
                }
            };
            self.pos += 1;
            let end = self.rest().find(quote).ok_or_else(|| {
                ResourceError::Decode(format!("unterminated attribute '{}'", name))
            })?;
            let value = unescape(&self.rest()[..end]);
            self.pos += end + 1;
            attrs.push((name, value));
        }
    }

    fn skip_spaces(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_map() {
        let codec = XmlFormat;
        let mut attrs = Attributes::new();
        attrs.insert("name", Value::Text("Matz".into()));
        attrs.insert("age", Value::Integer(59));
        attrs.insert("admin", Value::Boolean(true));

        let bytes = codec
            .encode_with_root(&Value::Map(attrs), Some("person"))
            .unwrap();
        let xml = String::from_utf8(bytes).unwrap();
        assert!(xml.contains("<person>"));
        assert!(xml.contains("<name>Matz</name>"));
        assert!(xml.contains("<age type=\"integer\">59</age>"));
        assert!(xml.contains("<admin type=\"boolean\">true</admin>"));
    }

    #[test]
    fn test_encode_array_as_repeated_siblings() {
        let codec = XmlFormat;
        let mut attrs = Attributes::new();
        attrs.insert(
            "tags",
            Value::Array(vec![Value::Text("a".into()), Value::Text("b".into())]),
        );

        let xml = String::from_utf8(
            codec
                .encode_with_root(&Value::Map(attrs), Some("post"))
                .unwrap(),
        )
        .unwrap();
        assert!(xml.contains("<tags type=\"array\"><tag>a</tag><tag>b</tag></tags>"));
    }

    #[test]
    fn test_roundtrip() {
        let codec = XmlFormat;
        let mut attrs = Attributes::new();
        attrs.insert("name", Value::Text("Matz".into()));
        attrs.insert("age", Value::Integer(59));
        attrs.insert("nickname", Value::Null);

        let bytes = codec
            .encode_with_root(&Value::Map(attrs.clone()), Some("person"))
            .unwrap();
        let decoded = codec.decode(&bytes, RootHandling::Strip).unwrap();
        assert_eq!(decoded, Value::Map(attrs));
    }

    #[test]
    fn test_decode_repeated_siblings_fold_to_array() {
        let codec = XmlFormat;
        let xml = b"<person><tag>a</tag><tag>b</tag></person>";
        let decoded = codec.decode(xml, RootHandling::Strip).unwrap();

        let map = decoded.as_map().unwrap();
        assert_eq!(
            map.get("tag"),
            Some(&Value::Array(vec![
                Value::Text("a".into()),
                Value::Text("b".into())
            ]))
        );
    }

    #[test]
    fn test_decode_dasherized_keys() {
        let codec = XmlFormat;
        let xml = b"<person><first-name>Yukihiro</first-name></person>";
        let decoded = codec.decode(xml, RootHandling::Strip).unwrap();
        assert_eq!(
            decoded.as_map().unwrap().get("first_name"),
            Some(&Value::Text("Yukihiro".into()))
        );
    }

    #[test]
    fn test_decode_keep_root() {
        let codec = XmlFormat;
        let xml = b"<person><name>Matz</name></person>";
        let decoded = codec.decode(xml, RootHandling::Keep).unwrap();
        assert!(decoded.as_map().unwrap().contains("person"));
    }

    #[test]
    fn test_decode_escaped_text() {
        let codec = XmlFormat;
        let xml = b"<note><body>a &amp; b &lt; c</body></note>";
        let decoded = codec.decode(xml, RootHandling::Strip).unwrap();
        assert_eq!(
            decoded.as_map().unwrap().get("body"),
            Some(&Value::Text("a & b < c".into()))
        );
    }

    #[test]
    fn test_decode_rejects_mismatched_tags() {
        let codec = XmlFormat;
        assert!(matches!(
            codec.decode(b"<a><b></a></b>", RootHandling::Strip),
            Err(ResourceError::Decode(_))
        ));
    }
}
