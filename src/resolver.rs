//! Reference discovery, lexical-scope resolution, and dependency collection
//! under a resolved base path.

use indexmap::IndexMap;

use crate::error::ComposeError;
use crate::path::{Key, Path};
use crate::tree::{self, looks_like_kind};
use crate::value::Value;

/// Every reference key-sequence found anywhere inside `v`, including inside
/// sub-maps and list items, but never descending into a nested
/// [`Value::Component`] (a nested component owns its own references,
/// discovered separately when the graph builder visits it at its own path).
pub fn get_refs(value: &Value) -> Vec<Path> {
    let mut out = Vec::new();
    collect_refs(value, &mut out);
    out
}

/// Same as [`get_refs`], applied to a component's `config` map directly (the
/// shape the graph builder actually has in hand).
pub fn get_refs_in_config(config: &IndexMap<Key, Value>) -> Vec<Path> {
    let mut out = Vec::new();
    for value in config.values() {
        collect_refs(value, &mut out);
    }
    out
}

fn collect_refs(value: &Value, out: &mut Vec<Path>) {
    match value {
        Value::Ref(r) => out.push(r.keys().clone()),
        Value::Map(map) => {
            for child in map.values() {
                collect_refs(child, out);
            }
        }
        Value::List(items) => {
            for item in items {
                collect_refs(item, out);
            }
        }
        // Nested components own their own references.
        Value::Component(_) => {}
        _ => {}
    }
}

/// Resolve a reference `R` found inside the component registered at `from`,
/// climbing lexical scope: try `from ++ R`, then each successively shorter
/// prefix of `from`, down to the root scope.
///
/// Returns the absolute path of the **target base** `D` (the location the
/// reference names, which may itself be a component or an enclosing map that
/// contains many components).
pub fn resolve_reference(
    root: &Value,
    from: &Path,
    reference: &Path,
) -> Result<Path, ComposeError> {
    let mut scope = from.clone();
    loop {
        let candidate = scope.extend(reference);
        if tree::lookup(root, &candidate).is_some() {
            return Ok(candidate);
        }
        match scope.parent() {
            Some(parent) => scope = parent,
            None => {
                return Err(ComposeError::MissingDependency {
                    path: from.clone(),
                    reference: reference.clone(),
                });
            }
        }
    }
}

/// The set of component paths reachable under a resolved target base `D`.
///
/// Any namespaced key found one layer under `D` names a component location,
/// whether it is a value already wrapped as a [`Value::Component`] ("opaque")
/// or a map that must itself be recursed into.
pub fn dependencies_under(root: &Value, base: &Path) -> Vec<Path> {
    match tree::lookup(root, base) {
        Some(value) => collect_dependencies(value, base),
        None => Vec::new(),
    }
}

fn collect_dependencies(value: &Value, base: &Path) -> Vec<Path> {
    match value {
        Value::Component(_) => vec![base.clone()],
        Value::Map(map) => {
            let mut out = Vec::new();
            for (key, child) in map {
                if !looks_like_kind(key) {
                    continue;
                }
                let child_path = base.join(key.clone());
                match child {
                    Value::Map(_) => out.extend(collect_dependencies(child, &child_path)),
                    _ => out.push(child_path),
                }
            }
            out
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Kind, Ref};

    fn key(s: &str) -> Key {
        Key::new(s)
    }

    #[test]
    fn get_refs_does_not_descend_into_nested_components() {
        let mut outer_cfg = IndexMap::new();
        let mut nested_cfg = IndexMap::new();
        nested_cfg.insert(key("r"), Value::Ref(Ref::new(Path::from_keys(["ignored"]))));
        outer_cfg.insert(
            key("nested"),
            Value::component(Kind::new("k"), nested_cfg),
        );
        outer_cfg.insert(key("r2"), Value::Ref(Ref::new(Path::from_keys(["seen"]))));
        let refs = get_refs_in_config(&outer_cfg);
        assert_eq!(refs, vec![Path::from_keys(["seen"])]);
    }

    #[test]
    fn resolve_climbs_scope_to_root() {
        // root -> { a -> { b -> component }, r -> ref(a.b) at top level }
        let mut b_cfg = IndexMap::new();
        b_cfg.insert(key("x"), Value::Int(1));
        let a = Value::map([(key("b"), Value::component(Kind::new("k"), b_cfg))]);
        let root = Value::map([(key("a"), a)]);

        // Resolving "a.b" from path "a.other" should climb: try a.other.a.b (miss),
        // then a.a.b (miss), then a.b (hit) at the root scope.
        let from = Path::from_keys(["a", "other"]);
        let reference = Path::from_keys(["a", "b"]);
        let resolved = resolve_reference(&root, &from, &reference).unwrap();
        assert_eq!(resolved, Path::from_keys(["a", "b"]));
    }

    #[test]
    fn resolve_fails_when_nothing_matches() {
        let root = Value::map([(key("a"), Value::Int(1))]);
        let err = resolve_reference(&root, &Path::from_keys(["a"]), &Path::from_keys(["missing"]))
            .unwrap_err();
        assert!(matches!(err, ComposeError::MissingDependency { .. }));
    }

    #[test]
    fn dependencies_under_a_map_collects_namespaced_children() {
        let b = Value::component(Kind::new("k"), IndexMap::new());
        let c = Value::component(Kind::new("k"), IndexMap::new());
        let root = Value::map([(
            key("grp"),
            Value::map([(key("svc/b"), b), (key("svc/c"), c), (key("plain"), Value::Int(1))]),
        )]);
        let deps = dependencies_under(&root, &Path::from_keys(["grp"]));
        assert_eq!(deps.len(), 2);
        assert!(deps.contains(&Path::from_keys(["grp", "svc/b"])));
        assert!(deps.contains(&Path::from_keys(["grp", "svc/c"])));
    }

    #[test]
    fn dependencies_under_a_component_is_itself() {
        let root = Value::map([(key("a"), Value::component(Kind::new("k"), IndexMap::new()))]);
        let deps = dependencies_under(&root, &Path::from_keys(["a"]));
        assert_eq!(deps, vec![Path::from_keys(["a"])]);
    }
}
