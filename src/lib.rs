// ============================================================================
// restmodel Library
// ============================================================================

pub mod association;
pub mod codec;
pub mod collection;
pub mod core;
pub mod inflect;
pub mod resource;
pub mod schema;
pub mod transport;

// Re-export main types for convenience
pub use crate::core::{
    AttributeType, Attributes, ResourceError, Result, SchemaEntry, Value,
};
pub use association::{AssociationValue, MacroKind};
pub use codec::{Codec, CodecRegistry, ParseStrategy, RootHandling};
pub use collection::{Collection, CollectionParser, DefaultParser};
pub use resource::{ClassRegistry, Resource, ResourceClass};
pub use schema::{AccessorTable, Schema, SchemaBuilder};
pub use transport::{Method, MockTransport, Transport};

use std::sync::Arc;

// ============================================================================
// High-level Client API
// ============================================================================

/// Bundles the three collaborators the engine needs: the class
/// registry (association-target namespace), the codec registry, and
/// the wire transport.
///
/// # Examples
///
/// ```
/// use restmodel::{Client, MockTransport, ResourceClass, Schema, Value};
///
/// # fn main() -> restmodel::Result<()> {
/// let client = Client::new(MockTransport::new());
///
/// let person = ResourceClass::builder("Person")
///     .schema(Schema::builder().string("name").integer("age").build())
///     .build()?;
/// client.register(person.clone());
///
/// let mut matz = restmodel::Resource::new(person);
/// matz.write_attribute("age", Value::Text("59".into()))?;
/// assert_eq!(matz.read_attribute("age"), Some(&Value::Integer(59)));
/// # Ok(())
/// # }
/// ```
pub struct Client {
    classes: ClassRegistry,
    codecs: CodecRegistry,
    transport: Box<dyn Transport>,
}

impl Client {
    /// Client over a transport, with the built-in codecs registered.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            classes: ClassRegistry::new(),
            codecs: CodecRegistry::new(),
            transport: Box::new(transport),
        }
    }

    /// Registers a resource class, making it resolvable as an
    /// association target.
    pub fn register(&self, class: Arc<ResourceClass>) {
        self.classes.register(class);
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    /// Mutable codec registry access for registering additional
    /// codecs or acronym overrides.
    pub fn codecs_mut(&mut self) -> &mut CodecRegistry {
        &mut self.codecs
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_registers_builtin_codecs() {
        let client = Client::new(MockTransport::new());
        assert!(client.codecs().lookup("json").is_ok());
        assert!(client.codecs().lookup("xml").is_ok());
        assert!(client.codecs().lookup("url_encoded").is_ok());
    }

    #[test]
    fn test_client_class_registration() {
        let client = Client::new(MockTransport::new());
        client.register(ResourceClass::builder("Person").build().unwrap());
        assert!(client.classes().get("Person").is_some());
    }
}
