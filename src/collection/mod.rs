//! Ordered container for decoded resource collections, with a parser
//! extension point for payloads that carry sidecar fields (pagination
//! cursors and the like) alongside the element sequence.

use crate::core::{Attributes, ResourceError, Result, Value};
use crate::resource::{Resource, ResourceClass};
use std::ops::Index;
use std::sync::Arc;

/// An ordered collection of hydrated resources. Element order is
/// preserved exactly as decoded; `metadata` carries any sidecar fields
/// a parser extracted from the envelope.
#[derive(Debug, Clone)]
pub struct Collection {
    class: Arc<ResourceClass>,
    elements: Vec<Resource>,
    metadata: Attributes,
}

impl Collection {
    pub fn empty(class: Arc<ResourceClass>) -> Self {
        Self {
            class,
            elements: Vec::new(),
            metadata: Attributes::new(),
        }
    }

    /// Wraps an already-decoded payload using the default parser.
    pub fn wrap(class: Arc<ResourceClass>, decoded: &Value) -> Result<Self> {
        DefaultParser.parse(&class, decoded)
    }

    pub fn class(&self) -> &Arc<ResourceClass> {
        &self.class
    }

    pub fn get(&self, index: usize) -> Option<&Resource> {
        self.elements.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Resource> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The container is lazily extensible: decoded pages can be
    /// appended without rebuilding.
    pub fn push(&mut self, resource: Resource) {
        self.elements.push(resource);
    }

    pub fn metadata(&self) -> &Attributes {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Attributes {
        &mut self.metadata
    }
}

impl Index<usize> for Collection {
    type Output = Resource;

    fn index(&self, index: usize) -> &Resource {
        &self.elements[index]
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Resource;
    type IntoIter = std::slice::Iter<'a, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl IntoIterator for Collection {
    type Item = Resource;
    type IntoIter = std::vec::IntoIter<Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

/// Extension point for collection envelopes. A parser receives the
/// full decoded envelope before any root-stripping, so sidecar fields
/// next to the element sequence are still visible.
pub trait CollectionParser {
    fn parse(&self, class: &Arc<ResourceClass>, envelope: &Value) -> Result<Collection>;
}

/// Handles the two conventional envelope shapes: a bare element
/// sequence, or a mapping with a single root key over the sequence.
#[derive(Debug, Clone, Default)]
pub struct DefaultParser;

impl CollectionParser for DefaultParser {
    fn parse(&self, class: &Arc<ResourceClass>, envelope: &Value) -> Result<Collection> {
        let elements = match envelope {
            Value::Array(items) => items.as_slice(),
            Value::Map(map) if map.len() == 1 => {
                match map.iter().next().map(|(_, v)| v) {
                    Some(Value::Array(items)) => items.as_slice(),
                    _ => {
                        return Err(ResourceError::Decode(
                            "expected a collection payload".into(),
                        ))
                    }
                }
            }
            _ => {
                return Err(ResourceError::Decode(
                    "expected a collection payload".into(),
                ))
            }
        };

        let mut collection = Collection::empty(class.clone());
        for element in elements {
            let attributes = element.as_map().cloned().ok_or_else(|| {
                ResourceError::Decode("collection element is not a mapping".into())
            })?;
            collection.push(Resource::from_attributes(class.clone(), attributes));
        }
        Ok(collection)
    }
}
