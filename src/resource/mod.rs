//! Resource classes (runtime descriptors), the class registry used as
//! the association-target namespace, and hydrated instances.

mod class;
mod instance;
mod registry;

pub use class::{ClassBuilder, ResourceClass};
pub use instance::Resource;
pub use registry::ClassRegistry;
