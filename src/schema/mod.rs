//! Per-class schema declarations and the generated-accessor table.
//!
//! Dynamic accessor generation is modeled as an explicit table: each
//! schema entry whose name is not claimed by a statically-defined
//! member gets a row, and `read_attribute`/`write_attribute` dispatch
//! through the table. Re-declaring a schema rebuilds the table
//! atomically; clearing it restores zero dynamic accessors.

use crate::core::{AttributeType, SchemaEntry};
use indexmap::IndexMap;
use log::debug;
use std::collections::HashSet;

/// An ordered set of declared (name, type) attribute entries owned by
/// a resource class.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    entries: Vec<SchemaEntry>,
}

impl Schema {
    pub fn new(entries: Vec<SchemaEntry>) -> Self {
        let mut schema = Self::default();
        for entry in entries {
            schema.push(entry);
        }
        schema
    }

    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Appends an entry; re-declaring a name replaces its type in place.
    pub fn push(&mut self, entry: SchemaEntry) {
        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => existing.attr_type = entry.attr_type,
            None => self.entries.push(entry),
        }
    }

    pub fn entries(&self) -> &[SchemaEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&SchemaEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn attribute_type(&self, name: &str) -> Option<AttributeType> {
        self.get(name).map(|e| e.attr_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builder-style schema declaration surface.
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn attribute(mut self, name: impl Into<String>, attr_type: AttributeType) -> Self {
        self.schema.push(SchemaEntry::new(name, attr_type));
        self
    }

    pub fn string(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeType::Text)
    }

    pub fn integer(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeType::Integer)
    }

    pub fn float(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeType::Float)
    }

    pub fn decimal(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeType::Decimal)
    }

    pub fn boolean(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeType::Boolean)
    }

    pub fn date(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeType::Date)
    }

    pub fn datetime(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeType::DateTime)
    }

    pub fn binary(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeType::Binary)
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

/// The per-class table of generated typed accessors: one row per
/// schema entry whose name is not reserved by a statically-defined
/// member.
#[derive(Debug, Clone, Default)]
pub struct AccessorTable {
    accessors: IndexMap<String, AttributeType>,
    reserved: HashSet<String>,
}

impl AccessorTable {
    pub fn new(reserved: impl IntoIterator<Item = String>) -> Self {
        Self {
            accessors: IndexMap::new(),
            reserved: reserved.into_iter().collect(),
        }
    }

    /// Transactionally replaces the table from a schema: entries no
    /// longer present lose their accessor, new entries gain one.
    /// Reserved names never gain or lose rows.
    pub fn rebuild(&mut self, schema: &Schema) {
        let mut next = IndexMap::with_capacity(schema.len());
        for entry in schema.entries() {
            if self.reserved.contains(&entry.name) {
                continue;
            }
            next.insert(entry.name.clone(), entry.attr_type);
        }
        debug!(
            "accessor table rebuilt: {} -> {} accessors",
            self.accessors.len(),
            next.len()
        );
        self.accessors = next;
    }

    /// Removes every generated accessor.
    pub fn clear(&mut self) {
        self.accessors.clear();
    }

    pub fn get(&self, name: &str) -> Option<AttributeType> {
        self.accessors.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.accessors.contains_key(name)
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.accessors.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> Schema {
        Schema::builder()
            .string("name")
            .integer("age")
            .boolean("admin")
            .build()
    }

    #[test]
    fn test_schema_order_and_redeclare() {
        let mut schema = sample_schema();
        schema.push(SchemaEntry::new("name", AttributeType::Binary));

        let names: Vec<&str> = schema.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["name", "age", "admin"]);
        assert_eq!(schema.attribute_type("name"), Some(AttributeType::Binary));
    }

    #[test]
    fn test_new_from_entries_replaces_duplicates() {
        let schema = Schema::new(vec![
            SchemaEntry::new("name", AttributeType::Text),
            SchemaEntry::new("age", AttributeType::Integer),
            SchemaEntry::new("name", AttributeType::Binary),
        ]);

        assert_eq!(schema.len(), 2);
        assert_eq!(schema.attribute_type("name"), Some(AttributeType::Binary));
    }

    #[test]
    fn test_rebuild_installs_and_removes() {
        let mut table = AccessorTable::new(["id".to_string()]);
        table.rebuild(&sample_schema());
        assert_eq!(table.len(), 3);
        assert!(table.contains("age"));

        let smaller = Schema::builder().string("name").build();
        table.rebuild(&smaller);
        assert_eq!(table.len(), 1);
        assert!(!table.contains("age"));
    }

    #[test]
    fn test_reserved_names_never_installed() {
        let mut table = AccessorTable::new(["id".to_string()]);
        let schema = Schema::builder()
            .integer("id")
            .string("name")
            .build();
        table.rebuild(&schema);
        assert!(!table.contains("id"));
        assert!(table.contains("name"));
    }

    #[test]
    fn test_declare_then_clear_round_trip() {
        let mut table = AccessorTable::new(["id".to_string()]);
        table.rebuild(&sample_schema());
        assert!(!table.is_empty());

        table.clear();
        assert!(table.is_empty());

        // Rebuilding from an empty schema is tear-down only.
        table.rebuild(&sample_schema());
        table.rebuild(&Schema::default());
        assert!(table.is_empty());
    }
}
