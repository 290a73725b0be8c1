//! The dependency DAG: one node per component path plus a synthetic `ROOT`
//! sink.
//!
//! Modeled on `pavexc`'s `ScopeGraph`/`ScopeGraphBuilder`
//! (`compiler/analyses/user_components/scope_graph.rs`): a
//! `petgraph::graphmap::DiGraphMap<usize, ()>` wrapped by a small `Copy` id
//! newtype, built incrementally through a builder that hands out sequential
//! node ids.

use std::collections::BTreeSet;
use std::fmt;

use ahash::{HashMap, HashMapExt};
use indexmap::IndexMap;
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::{Dfs, Reversed, Walker};

use crate::error::ComposeError;
use crate::path::Path;
use crate::scheduler::Direction;

/// The id of a node in the dependency [`Graph`].
///
/// Stable for the lifetime of a single expansion; never persisted across
/// lifecycle calls.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// The synthetic sink every component with no other outgoing
    /// dependency edge points to.
    pub const ROOT: NodeId = NodeId(0);
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == NodeId::ROOT {
            f.write_str("<ROOT>")
        } else {
            write!(f, "Node({})", self.0)
        }
    }
}

/// Incrementally builds a [`Graph`].
#[derive(Debug)]
pub struct GraphBuilder {
    graph: DiGraphMap<usize, ()>,
    path2id: IndexMap<Path, NodeId>,
    id2path: HashMap<usize, Path>,
    next_id: usize,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        let mut graph = DiGraphMap::new();
        graph.add_node(NodeId::ROOT.0);
        Self {
            graph,
            path2id: IndexMap::new(),
            id2path: HashMap::new(),
            next_id: 1,
        }
    }

    /// Register a component path, returning its (possibly newly-allocated)
    /// node id. Idempotent: calling it twice for the same path returns the
    /// same id.
    pub fn add_component(&mut self, path: Path) -> NodeId {
        if let Some(id) = self.path2id.get(&path) {
            return *id;
        }
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.graph.add_node(id.0);
        self.id2path.insert(id.0, path.clone());
        self.path2id.insert(path, id);
        id
    }

    /// Record "`from` depends on `to`".
    pub fn add_dependency(&mut self, from: NodeId, to: NodeId) {
        self.graph.add_edge(from.0, to.0, ());
    }

    pub fn node_for(&self, path: &Path) -> Option<NodeId> {
        self.path2id.get(path).copied()
    }

    pub fn build(self) -> Graph {
        Graph {
            graph: self.graph,
            path2id: self.path2id,
            id2path: self.id2path,
        }
    }
}

/// The dependency DAG, paired 1:1 with the components in a [`crate::system::System`].
#[derive(Debug, Clone)]
pub struct Graph {
    graph: DiGraphMap<usize, ()>,
    path2id: IndexMap<Path, NodeId>,
    id2path: HashMap<usize, Path>,
}

impl Graph {
    pub fn builder() -> GraphBuilder {
        GraphBuilder::new()
    }

    pub fn node_for(&self, path: &Path) -> Option<NodeId> {
        self.path2id.get(path).copied()
    }

    pub fn path_for(&self, id: NodeId) -> Option<&Path> {
        self.id2path.get(&id.0)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.path2id.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.path2id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path2id.is_empty()
    }

    /// All node ids, `ROOT` excluded.
    pub fn component_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.path2id.values().copied()
    }

    /// Direct (one-hop) dependencies of `id`.
    pub fn direct_dependencies(&self, id: NodeId) -> BTreeSet<NodeId> {
        self.graph
            .neighbors_directed(id.0, petgraph::Direction::Outgoing)
            .map(NodeId)
            .collect()
    }

    /// Direct (one-hop) dependents of `id`.
    pub fn direct_dependents(&self, id: NodeId) -> BTreeSet<NodeId> {
        self.graph
            .neighbors_directed(id.0, petgraph::Direction::Incoming)
            .map(NodeId)
            .collect()
    }

    /// The transitive closure of `roots` on the given side: dependencies
    /// for [`Direction::Forward`], dependents for [`Direction::Reverse`].
    /// `roots` themselves are included.
    pub fn closure(&self, roots: &[NodeId], direction: Direction) -> BTreeSet<NodeId> {
        let mut seen = BTreeSet::new();
        for &root in roots {
            match direction {
                Direction::Forward => {
                    for node in Dfs::new(&self.graph, root.0).iter(&self.graph) {
                        seen.insert(NodeId(node));
                    }
                }
                Direction::Reverse => {
                    let reversed = Reversed(&self.graph);
                    for node in Dfs::new(&reversed, root.0).iter(&reversed) {
                        seen.insert(NodeId(node));
                    }
                }
            }
        }
        seen
    }

    /// A dependency-first topological order of every node in the graph
    /// (`ROOT` last): for any edge `P -> D` ("P depends on D"), `D`
    /// precedes `P`.
    ///
    /// `petgraph::algo::toposort` guarantees the opposite relationship (an
    /// edge's source precedes its target), so the dependency-first order
    /// used throughout this crate is its reverse.
    pub fn topological_order(&self) -> Result<Vec<NodeId>, ComposeError> {
        let sorted = petgraph::algo::toposort(&self.graph, None).map_err(|cycle| {
            let path = self
                .id2path
                .get(&cycle.node_id())
                .cloned()
                .unwrap_or_else(Path::root);
            ComposeError::CyclicDependency { path }
        })?;
        let mut order: Vec<NodeId> = sorted.into_iter().map(NodeId).collect();
        order.reverse();
        Ok(order)
    }

    /// Debug helper: a `.dot` rendering of the graph.
    #[allow(unused)]
    pub fn debug_dot(&self) -> String {
        format!(
            "{:?}",
            petgraph::dot::Dot::with_config(&self.graph, &[petgraph::dot::Config::EdgeNoLabel])
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Path {
        Path::from_keys([s])
    }

    #[test]
    fn topological_order_respects_edges() {
        let mut b = Graph::builder();
        let a = b.add_component(p("a"));
        let c = b.add_component(p("b"));
        b.add_dependency(c, a);
        b.add_dependency(a, NodeId::ROOT);
        b.add_dependency(c, NodeId::ROOT);
        let g = b.build();
        let order = g.topological_order().unwrap();
        let pos = |id: NodeId| order.iter().position(|&n| n == id).unwrap();
        assert!(pos(a) < pos(c));
        assert!(pos(c) < pos(NodeId::ROOT));
    }

    #[test]
    fn cycle_is_detected() {
        let mut b = Graph::builder();
        let a = b.add_component(p("a"));
        let c = b.add_component(p("b"));
        b.add_dependency(a, c);
        b.add_dependency(c, a);
        let g = b.build();
        assert!(matches!(
            g.topological_order(),
            Err(ComposeError::CyclicDependency { .. })
        ));
    }

    #[test]
    fn closure_follows_direction() {
        let mut b = Graph::builder();
        let a = b.add_component(p("a"));
        let c = b.add_component(p("b"));
        let d = b.add_component(p("c"));
        // c depends on a, d depends on a
        b.add_dependency(c, a);
        b.add_dependency(d, a);
        let g = b.build();

        let deps_of_c = g.closure(&[c], Direction::Forward);
        assert!(deps_of_c.contains(&a));
        assert!(!deps_of_c.contains(&d));

        let dependents_of_a = g.closure(&[a], Direction::Reverse);
        assert!(dependents_of_a.contains(&c));
        assert!(dependents_of_a.contains(&d));
    }
}
