use crate::association::{self, AssociationReflection, MacroKind};
use crate::core::{Attributes, Result};
use crate::inflect::{self, Inflections};
use crate::schema::{AccessorTable, Schema};
use log::debug;
use std::sync::{Arc, RwLock};

/// Runtime descriptor of one resource class: its naming, primary key,
/// wire format, declared schema with the generated-accessor table, and
/// association reflections.
///
/// Schema and association mutation is caller-serialized: the locks
/// protect invariants, not concurrent-writer semantics.
#[derive(Debug)]
pub struct ResourceClass {
    name: String,
    element_name: String,
    collection_name: String,
    primary_key: String,
    format: String,
    inflections: Inflections,
    schema: RwLock<Schema>,
    accessors: RwLock<AccessorTable>,
    associations: RwLock<Vec<Arc<AssociationReflection>>>,
}

impl ResourceClass {
    /// Starts building a class; `name` may be namespaced with `::`.
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace portion of the class name, if any
    /// (`Admin::Post` -> `Admin`).
    pub fn namespace(&self) -> Option<&str> {
        self.name.rsplit_once("::").map(|(ns, _)| ns)
    }

    /// Demodulized, underscored name used as the wire root key.
    pub fn element_name(&self) -> &str {
        &self.element_name
    }

    /// Pluralized element name used in collection paths.
    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Format name resolved through the codec registry for this
    /// class's payloads.
    pub fn format(&self) -> &str {
        &self.format
    }

    // -----------------------------------------------------------------
    // Schema surface
    // -----------------------------------------------------------------

    /// Declares the full schema, atomically regenerating the accessor
    /// table. Safe to call repeatedly; an empty schema tears down all
    /// generated accessors.
    pub fn declare_schema(&self, schema: Schema) -> Result<()> {
        let mut accessors = self.accessors.write()?;
        accessors.rebuild(&schema);
        *self.schema.write()? = schema;
        debug!(
            "class '{}': schema declared with {} accessors",
            self.name,
            accessors.len()
        );
        Ok(())
    }

    /// Removes every generated accessor and the schema behind it.
    pub fn clear_schema(&self) -> Result<()> {
        self.accessors.write()?.clear();
        *self.schema.write()? = Schema::default();
        Ok(())
    }

    pub fn schema(&self) -> Result<Schema> {
        Ok(self.schema.read()?.clone())
    }

    /// Declared type behind the generated accessor for `name`, when
    /// one exists.
    pub fn accessor_type(&self, name: &str) -> Option<crate::core::AttributeType> {
        self.accessors.read().ok().and_then(|t| t.get(name))
    }

    pub fn accessor_count(&self) -> usize {
        self.accessors.read().map(|t| t.len()).unwrap_or(0)
    }

    pub fn accessor_names(&self) -> Vec<String> {
        self.accessors
            .read()
            .map(|t| t.names().map(String::from).collect())
            .unwrap_or_default()
    }

    // -----------------------------------------------------------------
    // Association declaration surface
    // -----------------------------------------------------------------

    pub fn has_many(&self, name: &str, options: Attributes) -> Result<()> {
        self.declare_association(MacroKind::HasMany, name, options)
    }

    pub fn has_one(&self, name: &str, options: Attributes) -> Result<()> {
        self.declare_association(MacroKind::HasOne, name, options)
    }

    pub fn belongs_to(&self, name: &str, options: Attributes) -> Result<()> {
        self.declare_association(MacroKind::BelongsTo, name, options)
    }

    fn declare_association(
        &self,
        macro_kind: MacroKind,
        name: &str,
        options: Attributes,
    ) -> Result<()> {
        // Option validation is declaration-time fatal; nothing is
        // installed on failure.
        let reflection = association::build(macro_kind, name, &options, &self.inflections)?;
        let mut associations = self.associations.write()?;
        associations.retain(|r| r.name() != name);
        associations.push(Arc::new(reflection));
        Ok(())
    }

    pub fn reflection(&self, name: &str) -> Option<Arc<AssociationReflection>> {
        self.associations
            .read()
            .ok()?
            .iter()
            .find(|r| r.name() == name)
            .cloned()
    }

    pub fn reflections(&self) -> Vec<Arc<AssociationReflection>> {
        self.associations
            .read()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

/// Builder-style class configuration.
#[derive(Debug, Clone)]
pub struct ClassBuilder {
    name: String,
    element_name: Option<String>,
    collection_name: Option<String>,
    primary_key: String,
    format: String,
    inflections: Inflections,
    schema: Option<Schema>,
}

impl ClassBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            element_name: None,
            collection_name: None,
            primary_key: "id".to_string(),
            format: "json".to_string(),
            inflections: Inflections::new(),
            schema: None,
        }
    }

    /// Overrides the derived wire root key.
    pub fn element_name(mut self, name: impl Into<String>) -> Self {
        self.element_name = Some(name.into());
        self
    }

    /// Overrides the derived collection path segment.
    pub fn collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = Some(name.into());
        self
    }

    /// Overrides the configured primary-key attribute name.
    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key = name.into();
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Casing rules used when deriving association target-class names.
    pub fn inflections(mut self, inflections: Inflections) -> Self {
        self.inflections = inflections;
        self
    }

    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn build(self) -> Result<Arc<ResourceClass>> {
        let demodulized = self
            .name
            .rsplit_once("::")
            .map(|(_, base)| base)
            .unwrap_or(&self.name);
        let element_name = self
            .element_name
            .unwrap_or_else(|| inflect::underscore(demodulized));
        let collection_name = self
            .collection_name
            .unwrap_or_else(|| inflect::pluralize(&element_name));

        // The primary key is a statically-defined member: the schema
        // system never installs or removes an accessor for it.
        let accessors = AccessorTable::new([self.primary_key.clone()]);

        let class = ResourceClass {
            name: self.name,
            element_name,
            collection_name,
            primary_key: self.primary_key,
            format: self.format,
            inflections: self.inflections,
            schema: RwLock::new(Schema::default()),
            accessors: RwLock::new(accessors),
            associations: RwLock::new(Vec::new()),
        };
        if let Some(schema) = self.schema {
            class.declare_schema(schema)?;
        }
        Ok(Arc::new(class))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AttributeType, Value};

    #[test]
    fn test_naming_derivation() {
        let class = ResourceClass::builder("Admin::PostCategory").build().unwrap();
        assert_eq!(class.namespace(), Some("Admin"));
        assert_eq!(class.element_name(), "post_category");
        assert_eq!(class.collection_name(), "post_categories");
    }

    #[test]
    fn test_naming_overrides() {
        let class = ResourceClass::builder("Person")
            .element_name("human")
            .collection_name("folks")
            .build()
            .unwrap();
        assert_eq!(class.element_name(), "human");
        assert_eq!(class.collection_name(), "folks");
    }

    #[test]
    fn test_schema_declare_and_clear() {
        let class = ResourceClass::builder("Person").build().unwrap();
        class
            .declare_schema(Schema::builder().string("name").integer("age").build())
            .unwrap();
        assert_eq!(class.accessor_count(), 2);
        assert_eq!(class.accessor_type("age"), Some(AttributeType::Integer));

        class.clear_schema().unwrap();
        assert_eq!(class.accessor_count(), 0);
    }

    #[test]
    fn test_primary_key_is_reserved() {
        let class = ResourceClass::builder("Person").build().unwrap();
        class
            .declare_schema(Schema::builder().integer("id").string("name").build())
            .unwrap();
        // No generated accessor shadows the primary key.
        assert_eq!(class.accessor_type("id"), None);
        assert_eq!(class.accessor_count(), 1);
    }

    #[test]
    fn test_redeclaring_association_replaces() {
        let class = ResourceClass::builder("Post").build().unwrap();
        class.has_many("comments", Attributes::new()).unwrap();

        let mut options = Attributes::new();
        options.insert("class_name", Value::Text("Remark".into()));
        class.has_many("comments", options).unwrap();

        let reflection = class.reflection("comments").unwrap();
        assert_eq!(reflection.resolver().expected_class_name(), "Remark");
        assert_eq!(class.reflections().len(), 1);
    }
}
