//! Association reflection and the builder that turns a declarative
//! statement into a reusable descriptor. Resolution itself runs on
//! the instance (`Resource::association`) so the cached value is
//! instance-scoped.

mod builder;
mod reflection;

pub use builder::build;
pub use reflection::{AssociationOptions, AssociationReflection, MacroKind, TargetResolver};

use crate::collection::Collection;
use crate::resource::Resource;

/// The resolved value of one association accessor.
#[derive(Debug, Clone)]
pub enum AssociationValue {
    /// `has_many`: the fetched nested collection.
    Many(Collection),
    /// `has_one` / `belongs_to`: a single instance, or None when the
    /// server reported no content.
    One(Option<Resource>),
}

impl AssociationValue {
    pub fn as_many(&self) -> Option<&Collection> {
        match self {
            Self::Many(collection) => Some(collection),
            Self::One(_) => None,
        }
    }

    pub fn as_one(&self) -> Option<&Resource> {
        match self {
            Self::One(resource) => resource.as_ref(),
            Self::Many(_) => None,
        }
    }
}
