//! Template AST
//!
//! Templates arrive as JSON:
//!
//! - a string is a text literal;
//! - an array whose first element is an object is an element: the head is
//!   `{"t": <tag>, "a": {<attr>: <literal>}}` and the rest are children;
//! - any other array is a flat list of siblings with no wrapping element;
//! - an object is a mounting point `{"t": 0 | 1, "n": <name>}`.
//!
//! [`TemplateNode::compile`] validates the whole tree up front and produces
//! the typed form that instances are built from.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::TemplateError;
use crate::mounting::mounting_name;

/// Mounting point kind, numbered like the AST type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MountKind {
    /// Holds at most one piece of content
    Single = 0,
    /// Holds an ordered list of components
    List = 1,
}

impl MountKind {
    /// Kind for an AST type code; anything but 0 or 1 is unknown
    pub fn from_code(code: &Value) -> Option<Self> {
        match code.as_u64() {
            Some(0) => Some(Self::Single),
            Some(1) => Some(Self::List),
            _ => None,
        }
    }

    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for MountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => f.write_str("single"),
            Self::List => f.write_str("list"),
        }
    }
}

/// Compiled template node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateNode {
    Text(String),
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<TemplateNode>,
    },
    /// Flat sibling list without a wrapping element
    Siblings(Vec<TemplateNode>),
    MountingPoint { kind: MountKind, name: String },
}

impl TemplateNode {
    /// Validate and compile a JSON AST
    pub fn compile(ast: &Value) -> Result<Self, TemplateError> {
        let mut names = HashSet::new();
        compile_node(ast, &mut names)
    }

    /// Names of every mounting point in document order, flat sibling lists
    /// included
    pub fn mounting_point_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Text(_) => {}
            Self::Element { children, .. } | Self::Siblings(children) => {
                for child in children {
                    child.collect_names(out);
                }
            }
            Self::MountingPoint { name, .. } => out.push(name),
        }
    }
}

/// JSON type name used in error messages
pub fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn compile_node(value: &Value, names: &mut HashSet<String>) -> Result<TemplateNode, TemplateError> {
    match value {
        Value::String(text) => Ok(TemplateNode::Text(text.clone())),
        Value::Array(items) => match items.split_first() {
            Some((Value::Object(info), children)) => {
                let (tag, attrs) = element_info(info)?;
                let children = compile_all(children, names)?;
                Ok(TemplateNode::Element { tag, attrs, children })
            }
            _ => Ok(TemplateNode::Siblings(compile_all(items, names)?)),
        },
        Value::Object(descriptor) => {
            let code = descriptor.get("t").unwrap_or(&Value::Null);
            let kind = MountKind::from_code(code)
                .ok_or_else(|| TemplateError::UnknownMountingPointType(code.to_string()))?;
            let name = mounting_name(descriptor.get("n").unwrap_or(&Value::Null))?.to_string();
            if !names.insert(name.clone()) {
                return Err(TemplateError::DuplicateMountingPoint(name));
            }
            Ok(TemplateNode::MountingPoint { kind, name })
        }
        other => Err(TemplateError::UnknownAstNodeType(shape_of(other))),
    }
}

fn compile_all(items: &[Value], names: &mut HashSet<String>) -> Result<Vec<TemplateNode>, TemplateError> {
    items.iter().map(|item| compile_node(item, names)).collect()
}

fn element_info(info: &Map<String, Value>) -> Result<(String, Vec<(String, String)>), TemplateError> {
    let tag = match info.get("t") {
        Some(Value::String(tag)) if !tag.is_empty() => tag.clone(),
        Some(other) => {
            return Err(TemplateError::MalformedTemplate(format!(
                "element tag must be a non-empty string, got {}",
                shape_of(other)
            )));
        }
        None => return Err(TemplateError::MalformedTemplate("element is missing its tag".into())),
    };

    let attrs = match info.get("a") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Object(attrs)) => attrs
            .iter()
            .map(|(name, value)| match value {
                Value::String(text) => Ok((name.clone(), text.clone())),
                Value::Number(_) | Value::Bool(_) => Ok((name.clone(), value.to_string())),
                other => Err(TemplateError::MalformedTemplate(format!(
                    "attribute '{}' on <{}> must be a literal, got {}",
                    name,
                    tag,
                    shape_of(other)
                ))),
            })
            .collect::<Result<_, _>>()?,
        Some(other) => {
            return Err(TemplateError::MalformedTemplate(format!(
                "attributes of <{}> must be an object, got {}",
                tag,
                shape_of(other)
            )));
        }
    };

    Ok((tag, attrs))
}
