//! Error types
//!
//! `TemplateError` covers everything that can go wrong while defining a
//! class; `EngineError` covers instance operations and wraps both template
//! and DOM failures.

use ef_dom::DomError;

use crate::ast::MountKind;

/// Result type for component operations
pub type Result<T, E = EngineError> = std::result::Result<T, E>;

/// Class definition errors
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// A JSON value that is not a string, array or object
    #[error("Not a standard ef AST: unknown node type '{0}'")]
    UnknownAstNodeType(&'static str),

    #[error("Not a standard ef AST: unknown mounting point type '{0}'")]
    UnknownMountingPointType(String),

    #[error("Malformed template: {0}")]
    MalformedTemplate(String),

    #[error("Mounting point '{0}' is defined more than once")]
    DuplicateMountingPoint(String),

    #[error("Invalid template JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Component operation errors
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),

    #[error("Unknown mounting point '{0}'")]
    UnknownMountingPoint(String),

    #[error("Mounting point '{name}' is a {actual} mounting point, expected {expected}")]
    MountKindMismatch {
        name: String,
        expected: MountKind,
        actual: MountKind,
    },

    #[error("Index {index} out of bounds for list '{name}' of length {len}")]
    IndexOutOfBounds { name: String, index: usize, len: usize },

    #[error("Component has been destroyed")]
    Destroyed,

    /// Components can only be mounted into instances sharing their DOM
    #[error("Component renders into a different DOM")]
    ForeignContext,

    /// Scoped children are placed by their parent's template
    #[error("Component {0} belongs to its parent's template and cannot be moved")]
    TemplateOwned(u64),
}
