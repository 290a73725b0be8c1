//! [`System`]: an expanded configuration tree paired with its dependency
//! [`Graph`], the value every facade function and the transition engine
//! operate on.

use itertools::Itertools;

use crate::error::ComposeError;
use crate::graph::Graph;
use crate::path::Path;
use crate::resolver;
use crate::tree;
use crate::value::{Component, Value};

/// A fully expanded, graph-backed configuration tree.
///
/// Built once from a raw [`Value`] via [`System::expand`]; every later
/// lifecycle call mutates the same `System` in place (well, by value: Rust
/// has no in-place mutation through a shared owner, so facade functions
/// thread it through by move and return the updated system).
#[derive(Debug, Clone)]
pub struct System {
    root: Value,
    graph: Graph,
}

impl System {
    /// Normalize `raw`, derive the dependency graph from it, and bind the
    /// two together.
    ///
    /// Fails with [`ComposeError::MissingDependency`] if any reference does
    /// not resolve, or [`ComposeError::CyclicDependency`] if the resulting
    /// graph has a cycle (both are preflight failures, returned directly
    /// rather than routed through a runtime exception hook).
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn expand(raw: Value) -> Result<Self, ComposeError> {
        let root = tree::expand(raw);
        let graph = build_graph(&root)?;
        // Exercise the toposort now so a cycle is reported at construction
        // time rather than on the first lifecycle call.
        graph.topological_order()?;
        Ok(Self { root, graph })
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn component(&self, path: &Path) -> Option<&Component> {
        tree::lookup(&self.root, path).and_then(Value::as_component)
    }

    pub fn component_mut(&mut self, path: &Path) -> Option<&mut Component> {
        tree::lookup_mut(&mut self.root, path).and_then(Value::as_component_mut)
    }

    /// Every path the dependency graph knows about.
    pub fn component_paths(&self) -> Vec<Path> {
        self.graph
            .component_ids()
            .filter_map(|id| self.graph.path_for(id).cloned())
            .collect()
    }
}

/// Build the dependency [`Graph`] for an already-expanded tree: one node per
/// component, a `P -> D` edge for every reference `P`'s config carries that
/// resolves under `D`, and a `P -> ROOT` edge for every component so the
/// toposort always has a sink.
fn build_graph(root: &Value) -> Result<Graph, ComposeError> {
    let mut builder = Graph::builder();
    let component_paths = tree::collect_component_paths(root);
    for path in &component_paths {
        builder.add_component(path.clone());
    }

    for path in &component_paths {
        let component = tree::lookup(root, path)
            .and_then(Value::as_component)
            .expect("path was just collected from this same tree");
        let from_id = builder
            .node_for(path)
            .expect("path was just registered above");

        // A config can name the same reference more than once (e.g. two
        // sibling keys pointing at the same dependency); resolve each
        // distinct key-sequence once.
        for reference in resolver::get_refs_in_config(&component.config)
            .into_iter()
            .unique()
        {
            let base = resolver::resolve_reference(root, path, &reference)?;
            for dependency in resolver::dependencies_under(root, &base) {
                // The "opaque" branch of dependencies-under assumes any
                // namespaced key names a component location; if that
                // assumption doesn't hold here, skip wiring an edge rather
                // than inventing a graph node for a non-component path
                // (every node in the graph locates a real component).
                if let Some(to_id) = builder.node_for(&dependency) {
                    builder.add_dependency(from_id, to_id);
                }
            }
        }

        builder.add_dependency(from_id, crate::graph::NodeId::ROOT);
    }

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Key;
    use crate::value::{Kind, Ref};
    use indexmap::IndexMap;

    fn key(s: &str) -> Key {
        Key::new(s)
    }

    #[test]
    fn expand_wires_reference_as_dependency_edge() {
        let mut b_cfg = IndexMap::new();
        b_cfg.insert(key("dep"), Value::Ref(Ref::new(Path::from_keys(["a"]))));
        let root = Value::map([
            (key("a"), Value::component(Kind::new("k"), IndexMap::new())),
            (key("b"), Value::component(Kind::new("k"), b_cfg)),
        ]);
        let system = System::expand(root).unwrap();
        let a = system.graph().node_for(&Path::from_keys(["a"])).unwrap();
        let b = system.graph().node_for(&Path::from_keys(["b"])).unwrap();
        assert!(system.graph().direct_dependencies(b).contains(&a));
    }

    #[test]
    fn expand_fails_on_missing_reference() {
        let mut cfg = IndexMap::new();
        cfg.insert(key("dep"), Value::Ref(Ref::new(Path::from_keys(["missing"]))));
        let root = Value::map([(key("a"), Value::component(Kind::new("k"), cfg))]);
        let err = System::expand(root).unwrap_err();
        assert!(matches!(err, ComposeError::MissingDependency { .. }));
    }

    #[test]
    fn expand_fails_on_cycle() {
        let mut a_cfg = IndexMap::new();
        a_cfg.insert(key("dep"), Value::Ref(Ref::new(Path::from_keys(["b"]))));
        let mut b_cfg = IndexMap::new();
        b_cfg.insert(key("dep"), Value::Ref(Ref::new(Path::from_keys(["a"]))));
        let root = Value::map([
            (key("a"), Value::component(Kind::new("k"), a_cfg)),
            (key("b"), Value::component(Kind::new("k"), b_cfg)),
        ]);
        let err = System::expand(root).unwrap_err();
        assert!(matches!(err, ComposeError::CyclicDependency { .. }));
    }

    #[test]
    fn component_mut_is_visible_through_component() {
        let root = Value::map([(key("a"), Value::component(Kind::new("k"), IndexMap::new()))]);
        let mut system = System::expand(root).unwrap();
        system.component_mut(&Path::from_keys(["a"])).unwrap().value =
            Some(Box::new(Value::Int(9)));
        assert_eq!(
            system
                .component(&Path::from_keys(["a"]))
                .unwrap()
                .value
                .as_deref(),
            Some(&Value::Int(9))
        );
    }
}
