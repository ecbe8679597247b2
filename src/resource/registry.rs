use super::ResourceClass;
use crate::core::{ResourceError, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Registry of resource classes by (possibly namespaced) name. This
/// is the namespace deferred association-target resolution searches.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: RwLock<HashMap<String, Arc<ResourceClass>>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, class: Arc<ResourceClass>) {
        if let Ok(mut classes) = self.classes.write() {
            classes.insert(class.name().to_string(), class);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<ResourceClass>> {
        self.classes.read().ok()?.get(name).cloned()
    }

    pub fn expect(&self, name: &str) -> Result<Arc<ResourceClass>> {
        self.get(name)
            .ok_or_else(|| ResourceError::ClassNotFound(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.classes.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
