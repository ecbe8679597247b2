mod attributes;
mod error;
mod types;
mod value;

pub use attributes::Attributes;
pub use error::{ResourceError, Result};
pub use types::{AttributeType, SchemaEntry};
pub use value::Value;
