//! Mounting points
//!
//! The class-level table of named dynamic slots. It is filled once while a
//! class is defined and shared, read-only, by every instance.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::ast::{shape_of, MountKind};
use crate::error::TemplateError;

/// A named slot installed on a component class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountingPoint {
    pub name: String,
    pub kind: MountKind,
    /// Array indices leading from the template root to the descriptor
    pub path: Vec<usize>,
}

/// Mounting points of one class, in installation order
#[derive(Debug, Clone, Default, Serialize)]
pub struct MountingPointTable {
    points: Vec<MountingPoint>,
    #[serde(skip)]
    by_name: HashMap<String, usize>,
}

impl MountingPointTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&MountingPoint> {
        self.by_name.get(name).map(|&index| &self.points[index])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MountingPoint> {
        self.points.iter()
    }

    fn install(&mut self, point: MountingPoint) -> Result<(), TemplateError> {
        if self.by_name.contains_key(&point.name) {
            return Err(TemplateError::DuplicateMountingPoint(point.name));
        }
        self.by_name.insert(point.name.clone(), self.points.len());
        self.points.push(point);
        Ok(())
    }
}

/// Install a mounting point of `kind` named by `payload` at `path`
pub fn apply_mounting_point(
    kind: MountKind,
    payload: &Value,
    path: &[usize],
    table: &mut MountingPointTable,
) -> Result<(), TemplateError> {
    let name = mounting_name(payload)?;
    tracing::trace!("Installing {} mounting point '{}' at {:?}", kind, name, path);
    table.install(MountingPoint {
        name: name.to_string(),
        kind,
        path: path.to_vec(),
    })
}

/// Mounting point names must be non-empty strings
pub(crate) fn mounting_name(payload: &Value) -> Result<&str, TemplateError> {
    match payload {
        Value::String(name) if !name.is_empty() => Ok(name),
        other => Err(TemplateError::MalformedTemplate(format!(
            "mounting point name must be a non-empty string, got {}",
            shape_of(other)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_install_and_lookup() {
        let mut table = MountingPointTable::new();
        apply_mounting_point(MountKind::Single, &json!("title"), &[1], &mut table).unwrap();
        apply_mounting_point(MountKind::List, &json!("rows"), &[2, 1], &mut table).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("rows").map(|p| p.kind), Some(MountKind::List));
        assert_eq!(table.get("title").map(|p| p.path.clone()), Some(vec![1]));
        assert!(!table.contains("missing"));

        let names: Vec<_> = table.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["title", "rows"]);
    }

    #[test]
    fn test_rejects_duplicates_and_bad_names() {
        let mut table = MountingPointTable::new();
        apply_mounting_point(MountKind::Single, &json!("a"), &[], &mut table).unwrap();

        assert!(matches!(
            apply_mounting_point(MountKind::List, &json!("a"), &[], &mut table),
            Err(TemplateError::DuplicateMountingPoint(_))
        ));
        assert!(matches!(
            apply_mounting_point(MountKind::Single, &json!(3), &[], &mut table),
            Err(TemplateError::MalformedTemplate(_))
        ));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_table_serializes() {
        let mut table = MountingPointTable::new();
        apply_mounting_point(MountKind::List, &json!("items"), &[3], &mut table).unwrap();

        let dump = serde_json::to_value(&table).unwrap();
        assert_eq!(dump, json!({"points": [{"name": "items", "kind": "list", "path": [3]}]}));
    }
}
