use super::{Codec, JsonFormat, UrlEncodedFormat, XmlFormat};
use crate::core::{ResourceError, Result};
use crate::inflect::Inflections;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

/// Maps canonical codec identifiers to codec implementations.
///
/// Lookup by format name derives the conventional identifier with the
/// acronym-aware inflector (`json` -> `JsonFormat`) and resolves it in
/// the registration map. The registry never synthesizes a codec: a
/// miss propagates the derived identifier verbatim so callers see
/// exactly which codec was expected.
pub struct CodecRegistry {
    codecs: HashMap<String, Arc<dyn Codec>>,
    inflections: Inflections,
}

impl CodecRegistry {
    /// Registry with the three built-in codecs registered under their
    /// default derived identifiers.
    pub fn new() -> Self {
        let mut registry = Self {
            codecs: HashMap::new(),
            inflections: Inflections::new(),
        };
        registry.register("JsonFormat", Arc::new(JsonFormat));
        registry.register("XmlFormat", Arc::new(XmlFormat));
        registry.register("UrlEncodedFormat", Arc::new(UrlEncodedFormat::default()));
        registry
    }

    /// Registers a codec under an explicit canonical identifier,
    /// replacing any previous registration.
    pub fn register(&mut self, identifier: impl Into<String>, codec: Arc<dyn Codec>) {
        let identifier = identifier.into();
        debug!("registering codec '{}'", identifier);
        self.codecs.insert(identifier, codec);
    }

    /// Registers an acronym override for identifier derivation
    /// (`json` -> `JSONFormat` once "JSON" is registered). Affects
    /// subsequent lookups only; existing registrations keep their keys.
    pub fn register_acronym(&mut self, acronym: impl Into<String>) {
        self.inflections.register_acronym(acronym);
    }

    /// Resolves a format name to its codec, failing with
    /// `UnknownFormat` carrying the derived identifier.
    pub fn lookup(&self, format_name: &str) -> Result<Arc<dyn Codec>> {
        let identifier = self.inflections.format_identifier(format_name);
        debug!("codec lookup: '{}' -> '{}'", format_name, identifier);
        self.codecs
            .get(&identifier)
            .cloned()
            .ok_or(ResourceError::UnknownFormat {
                expected: identifier,
            })
    }

    pub fn inflections(&self) -> &Inflections {
        &self.inflections
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}
