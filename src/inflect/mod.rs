//! String inflection shared by the codec registry (format-name to
//! codec-identifier derivation) and the association builder
//! (association-name to target-class-name derivation).

use convert_case::{Case, Casing};
use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    static ref IRREGULARS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("people", "person");
        m.insert("men", "man");
        m.insert("women", "woman");
        m.insert("children", "child");
        m.insert("mice", "mouse");
        m.insert("geese", "goose");
        m.insert("feet", "foot");
        m.insert("teeth", "tooth");
        m
    };
    static ref IRREGULARS_INVERSE: HashMap<&'static str, &'static str> = {
        IRREGULARS.iter().map(|(k, v)| (*v, *k)).collect()
    };
}

/// Acronym-aware casing rules. Registering an acronym changes how its
/// segment camelizes: with "JSON" registered, `json` camelizes to
/// `JSON` instead of `Json`. Registration is additive.
#[derive(Debug, Clone, Default)]
pub struct Inflections {
    acronyms: HashMap<String, String>,
}

impl Inflections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_acronym(&mut self, acronym: impl Into<String>) {
        let acronym = acronym.into();
        self.acronyms.insert(acronym.to_lowercase(), acronym);
    }

    /// Camel-cases an underscored name segment by segment, honoring
    /// registered acronyms: `url_encoded` -> `UrlEncoded`, or
    /// `URLEncoded` once "URL" is registered.
    pub fn camelize(&self, name: &str) -> String {
        name.split('_')
            .filter(|segment| !segment.is_empty())
            .map(|segment| match self.acronyms.get(&segment.to_lowercase()) {
                Some(canonical) => canonical.clone(),
                None => segment.to_case(Case::Pascal),
            })
            .collect()
    }

    /// Derives the conventional codec identifier for a format name:
    /// `json` -> `JsonFormat`, `msgpack` -> `MsgpackFormat`.
    pub fn format_identifier(&self, format_name: &str) -> String {
        format!("{}Format", self.camelize(format_name))
    }
}

/// Underscores a camel-cased name: `UrlEncoded` -> `url_encoded`.
pub fn underscore(name: &str) -> String {
    name.replace("::", "/").to_case(Case::Snake)
}

/// Singular form of an English word, covering the regular suffix rules
/// and a short irregular table.
pub fn singularize(word: &str) -> String {
    if let Some(singular) = IRREGULARS.get(word) {
        return (*singular).to_string();
    }

    if let Some(stem) = word.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{}y", stem);
        }
    }
    for suffix in ["sses", "shes", "ches", "xes", "zes"] {
        if let Some(stem) = word.strip_suffix(suffix) {
            return format!("{}{}", stem, &suffix[..suffix.len() - 2]);
        }
    }
    if let Some(stem) = word.strip_suffix('s') {
        if !stem.is_empty() && !stem.ends_with('s') {
            return stem.to_string();
        }
    }
    word.to_string()
}

/// Plural form of an English word.
pub fn pluralize(word: &str) -> String {
    if let Some(plural) = IRREGULARS_INVERSE.get(word) {
        return (*plural).to_string();
    }

    if word.ends_with('y') && !ends_with_vowel_y(word) {
        return format!("{}ies", &word[..word.len() - 1]);
    }
    for suffix in ["s", "ss", "sh", "ch", "x", "z"] {
        if word.ends_with(suffix) {
            return format!("{}es", word);
        }
    }
    format!("{}s", word)
}

fn ends_with_vowel_y(word: &str) -> bool {
    let bytes = word.as_bytes();
    if bytes.len() < 2 {
        return false;
    }
    matches!(bytes[bytes.len() - 2], b'a' | b'e' | b'i' | b'o' | b'u')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camelize_default() {
        let inflections = Inflections::new();
        assert_eq!(inflections.camelize("json"), "Json");
        assert_eq!(inflections.camelize("url_encoded"), "UrlEncoded");
    }

    #[test]
    fn test_camelize_with_acronym() {
        let mut inflections = Inflections::new();
        inflections.register_acronym("JSON");
        assert_eq!(inflections.camelize("json"), "JSON");
        assert_eq!(inflections.camelize("json_api"), "JSONApi");
    }

    #[test]
    fn test_format_identifier() {
        let inflections = Inflections::new();
        assert_eq!(inflections.format_identifier("json"), "JsonFormat");
        assert_eq!(inflections.format_identifier("msgpack"), "MsgpackFormat");
        assert_eq!(
            inflections.format_identifier("url_encoded"),
            "UrlEncodedFormat"
        );
    }

    #[test]
    fn test_underscore() {
        assert_eq!(underscore("UrlEncoded"), "url_encoded");
        assert_eq!(underscore("Person"), "person");
    }

    #[test]
    fn test_singularize() {
        assert_eq!(singularize("posts"), "post");
        assert_eq!(singularize("countries"), "country");
        assert_eq!(singularize("addresses"), "address");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("people"), "person");
        assert_eq!(singularize("sheep"), "sheep");
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("post"), "posts");
        assert_eq!(pluralize("country"), "countries");
        assert_eq!(pluralize("address"), "addresses");
        assert_eq!(pluralize("person"), "people");
        assert_eq!(pluralize("day"), "days");
    }
}
