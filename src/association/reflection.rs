use crate::core::{ResourceError, Result};
use crate::resource::{ClassRegistry, ResourceClass};
use log::debug;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Association kind of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroKind {
    HasMany,
    HasOne,
    BelongsTo,
}

impl MacroKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HasMany => "has_many",
            Self::HasOne => "has_one",
            Self::BelongsTo => "belongs_to",
        }
    }
}

impl fmt::Display for MacroKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validated option set of one association declaration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssociationOptions {
    pub class_name: Option<String>,
    pub foreign_key: Option<String>,
    pub polymorphic: bool,
}

/// Deferred target-class resolution: the expected class name is
/// computed at declaration time, but the registry lookup happens on
/// first use and is memoized. Resolution failure is a hard error only
/// then, never at declaration, so forward references to classes
/// registered later succeed.
#[derive(Debug)]
pub struct TargetResolver {
    expected: String,
    resolved: OnceLock<Arc<ResourceClass>>,
}

impl TargetResolver {
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            resolved: OnceLock::new(),
        }
    }

    /// The class name this resolver will attempt, for diagnostics.
    pub fn expected_class_name(&self) -> &str {
        &self.expected
    }

    /// Idempotent lookup: tries the owner's namespace sibling first,
    /// then the global namespace.
    pub fn resolve(
        &self,
        association: &str,
        owner_namespace: Option<&str>,
        registry: &ClassRegistry,
    ) -> Result<Arc<ResourceClass>> {
        if let Some(class) = self.resolved.get() {
            return Ok(class.clone());
        }

        let sibling = owner_namespace.map(|ns| format!("{}::{}", ns, self.expected));
        let found = sibling
            .as_deref()
            .and_then(|name| registry.get(name))
            .or_else(|| registry.get(&self.expected));

        match found {
            Some(class) => {
                debug!(
                    "association '{}' resolved target class '{}'",
                    association,
                    class.name()
                );
                Ok(self.resolved.get_or_init(|| class).clone())
            }
            None => Err(ResourceError::AssociationTargetNotFound {
                association: association.to_string(),
                class_name: self.expected.clone(),
            }),
        }
    }
}

/// Immutable descriptor of one declared association, created once at
/// declaration time.
#[derive(Debug)]
pub struct AssociationReflection {
    macro_kind: MacroKind,
    name: String,
    options: AssociationOptions,
    resolver: TargetResolver,
}

impl AssociationReflection {
    pub(crate) fn new(
        macro_kind: MacroKind,
        name: impl Into<String>,
        options: AssociationOptions,
        resolver: TargetResolver,
    ) -> Self {
        Self {
            macro_kind,
            name: name.into(),
            options,
            resolver,
        }
    }

    pub fn macro_kind(&self) -> MacroKind {
        self.macro_kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &AssociationOptions {
        &self.options
    }

    pub fn resolver(&self) -> &TargetResolver {
        &self.resolver
    }

    pub fn polymorphic(&self) -> bool {
        self.options.polymorphic
    }

    /// Foreign-key attribute read from the owner for `belongs_to`
    /// resolution; defaults to `{name}_id`.
    pub fn foreign_key(&self) -> String {
        self.options
            .foreign_key
            .clone()
            .unwrap_or_else(|| format!("{}_id", self.name))
    }

    pub fn resolve_target(
        &self,
        owner_namespace: Option<&str>,
        registry: &ClassRegistry,
    ) -> Result<Arc<ResourceClass>> {
        self.resolver
            .resolve(&self.name, owner_namespace, registry)
    }
}
