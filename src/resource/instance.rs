use super::ResourceClass;
use crate::association::{AssociationValue, MacroKind};
use crate::codec::RootHandling;
use crate::collection::{Collection, CollectionParser, DefaultParser};
use crate::core::{Attributes, ResourceError, Result, Value};
use crate::Client;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

/// One hydrated instance of a resource class: the per-instance
/// attribute store plus the instance-scoped cache of resolved
/// association values.
#[derive(Debug, Clone)]
pub struct Resource {
    class: Arc<ResourceClass>,
    attributes: Attributes,
    association_cache: HashMap<String, AssociationValue>,
}

impl Resource {
    pub fn new(class: Arc<ResourceClass>) -> Self {
        Self {
            class,
            attributes: Attributes::new(),
            association_cache: HashMap::new(),
        }
    }

    /// Hydrates an instance from an already-decoded attribute mapping.
    /// Values are stored as decoded; declared types only govern
    /// coercion on subsequent writes.
    pub fn from_attributes(class: Arc<ResourceClass>, attributes: Attributes) -> Self {
        Self {
            class,
            attributes,
            association_cache: HashMap::new(),
        }
    }

    /// Hydrates an instance from wire bytes through the class codec,
    /// with root stripping.
    pub fn decode(class: Arc<ResourceClass>, client: &Client, bytes: &[u8]) -> Result<Self> {
        let codec = client.codecs().lookup(class.format())?;
        let decoded = codec.decode(bytes, RootHandling::Strip)?;
        let attributes = decoded.into_map().ok_or_else(|| {
            ResourceError::Decode("expected an attribute mapping payload".into())
        })?;
        Ok(Self::from_attributes(class, attributes))
    }

    /// Encodes the attribute store through the class codec, wrapped
    /// under the class element name.
    pub fn to_wire(&self, client: &Client) -> Result<Vec<u8>> {
        let codec = client.codecs().lookup(self.class.format())?;
        codec.encode_with_root(
            &Value::Map(self.attributes.clone()),
            Some(self.class.element_name()),
        )
    }

    pub fn class(&self) -> &Arc<ResourceClass> {
        &self.class
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Attribute names that currently have a typed accessor or were
    /// present in the last hydration.
    pub fn known_attribute_names(&self) -> Vec<String> {
        let mut names = self.class.accessor_names();
        for key in self.attributes.keys() {
            if !names.iter().any(|n| n == key) {
                names.push(key.to_string());
            }
        }
        names
    }

    /// Canonical read path: consults the primary-key alias first, then
    /// the attribute store.
    pub fn read_attribute(&self, name: &str) -> Option<&Value> {
        let key = if name == "id" || name == self.class.primary_key() {
            self.class.primary_key()
        } else {
            name
        };
        self.attributes.get(key)
    }

    /// Canonical write path: primary-key alias first, then typed
    /// coercion when a generated accessor claims the name. A failed
    /// coercion rejects the write and leaves the prior value.
    pub fn write_attribute(&mut self, name: &str, value: Value) -> Result<()> {
        let key = if name == "id" || name == self.class.primary_key() {
            self.class.primary_key().to_string()
        } else {
            name.to_string()
        };

        let value = match self.class.accessor_type(&key) {
            Some(attr_type) => attr_type.cast(&key, value)?,
            None => value,
        };
        self.attributes.insert(key, value);
        Ok(())
    }

    /// Logical identity field, aliased onto the configured primary key.
    pub fn id(&self) -> Option<&Value> {
        self.attributes.get(self.class.primary_key())
    }

    pub fn set_id(&mut self, value: Value) -> Result<()> {
        self.write_attribute("id", value)
    }

    pub fn persisted(&self) -> bool {
        self.id().map(|v| !v.is_null()).unwrap_or(false)
    }

    pub fn new_record(&self) -> bool {
        !self.persisted()
    }

    /// Generic boolean-like query for attribute names with no
    /// generated accessor.
    pub fn has_truthy_attribute(&self, name: &str) -> bool {
        self.read_attribute(name)
            .map(Value::is_truthy)
            .unwrap_or(false)
    }

    /// Wholesale replacement of the attribute store (e.g. reload).
    /// Clears the memoized association values.
    pub fn load(&mut self, attributes: Attributes) {
        self.attributes = attributes;
        self.association_cache.clear();
    }

    /// Explicit merge variant: existing attributes survive unless
    /// overwritten, and memoized association values are kept.
    pub fn load_merge(&mut self, attributes: Attributes) {
        self.attributes.merge(attributes);
    }

    // -----------------------------------------------------------------
    // Association resolution
    // -----------------------------------------------------------------

    /// Resolves a declared association, fetching through the client
    /// transport on first use and memoizing per instance. The cache is
    /// invalidated by `load`.
    pub fn association(&mut self, name: &str, client: &Client) -> Result<AssociationValue> {
        if let Some(cached) = self.association_cache.get(name) {
            return Ok(cached.clone());
        }

        let reflection = self
            .class
            .reflection(name)
            .ok_or_else(|| ResourceError::UnknownAssociation(name.to_string()))?;

        let codec = client.codecs().lookup(self.class.format())?;
        let extension = codec.extension();

        let value = match reflection.macro_kind() {
            MacroKind::HasMany => {
                let target = reflection
                    .resolve_target(self.class.namespace(), client.classes())?;
                let path = format!("{}.{}", self.nested_prefix(name)?, extension);
                debug!("association '{}': GET {}", name, path);
                match client.transport().fetch(&path, None)? {
                    Some(bytes) => {
                        let envelope = codec.decode(&bytes, RootHandling::Keep)?;
                        AssociationValue::Many(DefaultParser.parse(&target, &envelope)?)
                    }
                    None => AssociationValue::Many(Collection::empty(target)),
                }
            }
            MacroKind::HasOne => {
                let target = reflection
                    .resolve_target(self.class.namespace(), client.classes())?;
                let path = format!("{}.{}", self.nested_prefix(name)?, extension);
                debug!("association '{}': GET {}", name, path);
                match client.transport().fetch(&path, None)? {
                    Some(bytes) => {
                        let decoded = codec.decode(&bytes, RootHandling::Strip)?;
                        let attributes = decoded.into_map().ok_or_else(|| {
                            ResourceError::Decode(
                                "expected a single-resource payload".into(),
                            )
                        })?;
                        AssociationValue::One(Some(Resource::from_attributes(
                            target, attributes,
                        )))
                    }
                    None => AssociationValue::One(None),
                }
            }
            MacroKind::BelongsTo => {
                let target = if reflection.polymorphic() {
                    // Polymorphic targets come from the sibling
                    // `{name}_type` attribute rather than the resolver.
                    let type_key = format!("{}_type", name);
                    let class_name = self
                        .read_attribute(&type_key)
                        .and_then(Value::as_str)
                        .map(String::from)
                        .ok_or_else(|| ResourceError::AssociationTargetNotFound {
                            association: name.to_string(),
                            class_name: format!("<attribute '{}'>", type_key),
                        })?;
                    client.classes().get(&class_name).ok_or(
                        ResourceError::AssociationTargetNotFound {
                            association: name.to_string(),
                            class_name,
                        },
                    )?
                } else {
                    reflection.resolve_target(self.class.namespace(), client.classes())?
                };

                let foreign_key = reflection.foreign_key();
                let fk_value = match self.read_attribute(&foreign_key) {
                    Some(value) if !value.is_null() => value.clone(),
                    _ => {
                        return Err(ResourceError::MissingForeignKey {
                            association: name.to_string(),
                            foreign_key,
                        })
                    }
                };

                let path = format!(
                    "/{}/{}.{}",
                    target.collection_name(),
                    fk_value,
                    extension
                );
                debug!("association '{}': GET {}", name, path);
                match client.transport().fetch(&path, None)? {
                    Some(bytes) => {
                        let decoded = codec.decode(&bytes, RootHandling::Strip)?;
                        let attributes = decoded.into_map().ok_or_else(|| {
                            ResourceError::Decode(
                                "expected a single-resource payload".into(),
                            )
                        })?;
                        AssociationValue::One(Some(Resource::from_attributes(
                            target, attributes,
                        )))
                    }
                    None => AssociationValue::One(None),
                }
            }
        };

        self.association_cache.insert(name.to_string(), value.clone());
        Ok(value)
    }

    /// `/{owner_collection}/{id}/{name}` prefix for nested association
    /// paths; requires the owner's identity.
    fn nested_prefix(&self, association: &str) -> Result<String> {
        let id = match self.id() {
            Some(id) if !id.is_null() => id.clone(),
            _ => {
                return Err(ResourceError::MissingForeignKey {
                    association: association.to_string(),
                    foreign_key: self.class.primary_key().to_string(),
                })
            }
        };
        Ok(format!(
            "/{}/{}/{}",
            self.class.collection_name(),
            id,
            association
        ))
    }
}
