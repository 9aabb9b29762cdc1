//! Mounting point resolver
//!
//! Walks a template AST and installs every mounting point it reaches into a
//! class table. Only element arrays (head is an object) are descended into;
//! flat sibling lists are left alone, so mounting points inside them get no
//! class-level entry.

use serde_json::Value;

use crate::ast::{shape_of, MountKind};
use crate::error::TemplateError;
use crate::mounting::{apply_mounting_point, MountingPointTable};

/// Resolve every reachable mounting point of `ast` into `table`
pub fn resolve(ast: &Value, table: &mut MountingPointTable) -> Result<(), TemplateError> {
    let mut path = Vec::new();
    resolve_at(ast, &mut path, table)
}

fn resolve_at(node: &Value, path: &mut Vec<usize>, table: &mut MountingPointTable) -> Result<(), TemplateError> {
    match node {
        Value::Array(items) => {
            if let Some((Value::Object(_), children)) = items.split_first() {
                for (offset, child) in children.iter().enumerate() {
                    path.push(offset + 1);
                    resolve_at(child, path, table)?;
                    path.pop();
                }
            }
            Ok(())
        }
        Value::Object(descriptor) => {
            let code = descriptor.get("t").unwrap_or(&Value::Null);
            let kind = MountKind::from_code(code)
                .ok_or_else(|| TemplateError::UnknownMountingPointType(code.to_string()))?;
            apply_mounting_point(kind, descriptor.get("n").unwrap_or(&Value::Null), path, table)
        }
        Value::String(_) => Ok(()),
        other => Err(TemplateError::UnknownAstNodeType(shape_of(other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolved(ast: Value) -> Result<MountingPointTable, TemplateError> {
        let mut table = MountingPointTable::new();
        resolve(&ast, &mut table).map(|()| table)
    }

    #[test]
    fn test_resolves_nested_elements() {
        let table = resolved(json!([
            {"t": "div"},
            {"t": 0, "n": "header"},
            [{"t": "ul"}, {"t": 1, "n": "items"}],
            "footer"
        ]))
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("header").unwrap().path, vec![1]);
        assert_eq!(table.get("items").unwrap().path, vec![2, 1]);
        assert_eq!(table.get("items").unwrap().kind, MountKind::List);
    }

    #[test]
    fn test_flat_list_not_descended() {
        let table = resolved(json!(["hello", {"t": 0, "n": "greeting"}])).unwrap();
        assert!(table.is_empty());

        // Invalid entries inside a flat list are not seen either
        let table = resolved(json!(["x", 42, {"t": 9}])).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_root_descriptor() {
        let table = resolved(json!({"t": 1, "n": "all"})).unwrap();
        assert_eq!(table.get("all").unwrap().path, Vec::<usize>::new());
    }

    #[test]
    fn test_unknown_type_codes() {
        for code in [json!(2), json!(-1), json!("1"), json!(null)] {
            let err = resolved(json!([{"t": "p"}, {"t": code, "n": "x"}])).unwrap_err();
            assert!(matches!(err, TemplateError::UnknownMountingPointType(_)));
        }
    }

    #[test]
    fn test_unknown_node_types() {
        assert!(matches!(
            resolved(json!([{"t": "p"}, true])),
            Err(TemplateError::UnknownAstNodeType("boolean"))
        ));
        assert!(matches!(resolved(json!(null)), Err(TemplateError::UnknownAstNodeType("null"))));
    }

    #[test]
    fn test_error_message_names_code() {
        let err = resolved(json!([{"t": "p"}, {"t": 2, "n": "x"}])).unwrap_err();
        assert_eq!(err.to_string(), "Not a standard ef AST: unknown mounting point type '2'");
    }
}
