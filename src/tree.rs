//! Normalizes a raw configuration tree into one where every component is
//! represented explicitly as [`Value::Component`], and walks the result to
//! recover path-addressable structure.

use indexmap::IndexMap;

use crate::path::{Key, Path};
use crate::value::{Component, Kind, Value};

/// The two reserved keys recognised on an explicit `{kind: ..., config:
/// ...}` component marker map.
const KIND_FIELD: &str = "kind";
const CONFIG_FIELD: &str = "config";

/// A map key is treated as a namespaced kind identifier, eligible for the
/// terse auto-wrap rule, if it contains the namespace separator used
/// throughout this family's examples (`svc/http-server`).
pub(crate) fn looks_like_kind(key: &Key) -> bool {
    key.as_str().contains('/')
}

/// Normalize a raw tree into canonical form.
///
/// This initial expansion must run exactly once, before a
/// [`crate::graph::Graph`] is attached, because the terse auto-wrap rule is
/// only valid pre-graph. [`crate::system::System`] calls this once in its
/// constructor and never again.
#[tracing::instrument(level = "debug", skip_all)]
pub fn expand(value: Value) -> Value {
    match value {
        Value::Component(mut component) => {
            component.config = expand_map(component.config);
            Value::Component(component)
        }
        Value::Map(map) => {
            if let Some(component) = try_explicit_marker(&map) {
                Value::Component(component)
            } else {
                Value::Map(expand_map(map))
            }
        }
        Value::List(items) => Value::List(items.into_iter().map(expand).collect()),
        other => other,
    }
}

/// Recognize the explicit `{kind: "...", config: {...}}` marker form.
/// Returns `None` if `map` doesn't carry a `kind` field, leaving it to be
/// treated as plain data (or auto-wrapped entry-by-entry by the caller).
fn try_explicit_marker(map: &IndexMap<Key, Value>) -> Option<Component> {
    let kind_field = Key::new(KIND_FIELD);
    let kind = match map.get(&kind_field)? {
        Value::Str(s) => Kind::new(s.clone()),
        _ => return None,
    };
    let config = match map.get(&Key::new(CONFIG_FIELD)) {
        Some(Value::Map(config)) => expand_map(config.clone()),
        Some(_) | None => IndexMap::new(),
    };
    Some(Component::new(kind, config))
}

/// Apply the auto-wrap rule to every entry of a map, then recurse.
fn expand_map(map: IndexMap<Key, Value>) -> IndexMap<Key, Value> {
    map.into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Map(inner) if looks_like_kind(&key) => {
                    Value::Component(Component::new(key.clone().into(), expand_map(inner)))
                }
                other => expand(other),
            };
            (key, value)
        })
        .collect()
}

/// Look up the value at `path` inside `root`, descending through maps and
/// component configs, but never sequences (list items are not
/// path-addressable).
pub fn lookup<'a>(root: &'a Value, path: &Path) -> Option<&'a Value> {
    let mut current = root;
    for key in path.keys() {
        current = current.get(key)?;
    }
    Some(current)
}

/// Mutable counterpart to [`lookup`].
pub fn lookup_mut<'a>(root: &'a mut Value, path: &Path) -> Option<&'a mut Value> {
    let mut current = root;
    for key in path.keys() {
        current = current.get_mut(key)?;
    }
    Some(current)
}

/// Collect the absolute path of every [`Value::Component`] reachable from
/// `root`, including components nested inside another component's config.
/// Descends maps and component configs; does not descend into sequences.
pub fn collect_component_paths(root: &Value) -> Vec<Path> {
    let mut paths = Vec::new();
    collect_component_paths_into(root, &Path::root(), &mut paths);
    paths
}

fn collect_component_paths_into(value: &Value, path: &Path, out: &mut Vec<Path>) {
    match value {
        Value::Component(component) => {
            out.push(path.clone());
            for (key, child) in &component.config {
                collect_component_paths_into(child, &path.join(key.clone()), out);
            }
        }
        Value::Map(map) => {
            for (key, child) in map {
                collect_component_paths_into(child, &path.join(key.clone()), out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Ref;

    fn key(s: &str) -> Key {
        Key::new(s)
    }

    #[test]
    fn auto_wraps_namespaced_map_entries() {
        let raw = Value::map([(
            key("a"),
            Value::map([(key("svc/http"), Value::map([(key("port"), Value::Int(8080))]))]),
        )]);
        let expanded = expand(raw);
        let a = expanded.get(&key("a")).unwrap();
        let http = a.get(&key("svc/http")).unwrap();
        assert!(http.is_component());
        assert_eq!(http.as_component().unwrap().kind.as_str(), "svc/http");
    }

    #[test]
    fn explicit_marker_map_becomes_component() {
        let raw = Value::map([(
            key("a"),
            Value::map([
                (key("kind"), Value::str("k1")),
                (key("config"), Value::map([(key("x"), Value::Int(1))])),
            ]),
        )]);
        let expanded = expand(raw);
        let a = expanded.get(&key("a")).unwrap();
        assert!(a.is_component());
        assert_eq!(a.as_component().unwrap().kind.as_str(), "k1");
    }

    #[test]
    fn does_not_auto_wrap_already_expanded_components() {
        let raw = Value::component(Kind::new("k1"), IndexMap::new());
        let expanded = expand(raw.clone());
        assert_eq!(expanded, raw);
    }

    #[test]
    fn collect_finds_nested_components_in_config() {
        let mut inner_cfg = IndexMap::new();
        inner_cfg.insert(
            key("nested"),
            Value::component(Kind::new("k2"), IndexMap::new()),
        );
        let root = Value::map([(key("a"), Value::component(Kind::new("k1"), inner_cfg))]);
        let paths = collect_component_paths(&root);
        assert!(paths.contains(&Path::from_keys(["a"])));
        assert!(paths.contains(&Path::from_keys(["a", "nested"])));
    }

    #[test]
    fn lookup_walks_through_component_config() {
        let mut cfg = IndexMap::new();
        cfg.insert(key("dep"), Value::Ref(Ref::new(Path::from_keys(["other"]))));
        let root = Value::map([(key("a"), Value::component(Kind::new("k1"), cfg))]);
        let found = lookup(&root, &Path::from_keys(["a", "dep"])).unwrap();
        assert!(found.is_ref());
    }
}
