//! ef core
//!
//! Declarative component engine. A JSON template is compiled once into a
//! [`ComponentClass`]; instances render into an [`ef_dom::DomTree`] and keep
//! it in sync with their state through the render queue.
//!
//! # Example
//! ```rust,ignore
//! use ef_core::{create, Context};
//! use ef_dom::DomTree;
//! use serde_json::json;
//!
//! let class = create(&json!(["hello", {"t": 0, "n": "greeting"}]))?;
//! let ctx = Context::new(DomTree::new());
//! let state = json!({"greeting": "world"}).as_object().cloned();
//! let component = class.instantiate(&ctx, state, None)?;
//! assert_eq!(component.text_content(), "helloworld");
//! ```

mod ast;
mod component;
mod config;
mod context;
mod error;
mod mount_options;
mod mounting;
pub mod render_queue;
mod resolver;

pub use ast::{shape_of, MountKind, TemplateNode};
pub use component::{Component, ComponentClass, ComponentId, Scope, State};
pub use config::Config;
pub use context::Context;
pub use error::{EngineError, Result, TemplateError};
pub use mount_options::MountOption;
pub use mounting::{apply_mounting_point, MountingPoint, MountingPointTable};
pub use render_queue::{bundle, exec, inform, is_paused, on_next_render, Batch, JobKey, RenderQueue};
pub use resolver::resolve;

// Re-export the DOM crate for advanced usage
pub use ef_dom as dom;

use serde_json::Value;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Define a component class from a template AST.
///
/// The whole template is validated first; then the mounting point resolver
/// runs once to fill the class table. Any error leaves nothing defined.
pub fn create(ast: &Value) -> Result<ComponentClass, TemplateError> {
    let template = TemplateNode::compile(ast)?;
    let mut table = MountingPointTable::new();
    resolve(ast, &mut table)?;
    tracing::debug!("Defined component class with {} mounting point(s)", table.len());
    Ok(ComponentClass::define(template, table))
}

/// [`create`] from JSON text
pub fn create_from_json(source: &str) -> Result<ComponentClass, TemplateError> {
    let ast: Value = serde_json::from_str(source)?;
    create(&ast)
}
