use crate::core::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered, unique-key attribute mapping: the canonical in-memory form
/// of one decoded resource payload. Key order is preserved exactly as
/// decoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    entries: IndexMap<String, Value>,
}

impl Attributes {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.entries.get_mut(name)
    }

    /// Inserts or replaces; replacing keeps the key's original position.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(name.into(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.entries.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merges `other` into self, overwriting existing keys.
    pub fn merge(&mut self, other: Attributes) {
        for (k, v) in other.entries {
            self.entries.insert(k, v);
        }
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

impl Serialize for Attributes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.entries.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Attributes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        IndexMap::deserialize(deserializer).map(|entries| Self { entries })
    }
}

impl FromIterator<(String, Value)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Attributes {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_preserved() {
        let mut attrs = Attributes::new();
        attrs.insert("z", Value::Integer(1));
        attrs.insert("a", Value::Integer(2));
        attrs.insert("m", Value::Integer(3));

        let keys: Vec<&str> = attrs.keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut attrs = Attributes::new();
        attrs.insert("a", Value::Integer(1));
        attrs.insert("b", Value::Integer(2));
        attrs.insert("a", Value::Integer(9));

        let keys: Vec<&str> = attrs.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(attrs.get("a"), Some(&Value::Integer(9)));
    }

    #[test]
    fn test_serde_round_trip_keeps_order() {
        let mut attrs = Attributes::new();
        attrs.insert("z", Value::Integer(1));
        attrs.insert("a", Value::Text("x".into()));
        attrs.insert("m", Value::Null);

        let json = serde_json::to_string(&attrs).unwrap();
        assert_eq!(json, r#"{"z":1,"a":"x","m":null}"#);

        let back: Attributes = serde_json::from_str(&json).unwrap();
        assert_eq!(back, attrs);
        let keys: Vec<&str> = back.keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_merge_overwrites() {
        let mut a = Attributes::new();
        a.insert("x", Value::Integer(1));

        let mut b = Attributes::new();
        b.insert("x", Value::Integer(2));
        b.insert("y", Value::Integer(3));

        a.merge(b);
        assert_eq!(a.get("x"), Some(&Value::Integer(2)));
        assert_eq!(a.len(), 2);
    }
}
