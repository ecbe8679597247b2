use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Unknown format: expected codec '{expected}' to be registered")]
    UnknownFormat { expected: String },

    #[error("Cannot coerce attribute '{attribute}' from '{input}': {reason}")]
    Coercion {
        attribute: String,
        input: String,
        reason: String,
    },

    #[error("Invalid option '{option}' for {macro_kind} association")]
    InvalidOption { option: String, macro_kind: String },

    #[error("Association '{association}' target class '{class_name}' not found")]
    AssociationTargetNotFound {
        association: String,
        class_name: String,
    },

    #[error("Resource class '{0}' not found")]
    ClassNotFound(String),

    #[error("No association named '{0}' is declared on this class")]
    UnknownAssociation(String),

    #[error("Association '{association}' requires foreign key '{foreign_key}' on the owner")]
    MissingForeignKey {
        association: String,
        foreign_key: String,
    },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

pub type Result<T> = std::result::Result<T, ResourceError>;

impl<T> From<std::sync::PoisonError<T>> for ResourceError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}
