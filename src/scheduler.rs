//! Turns a [`Graph`] plus an optional set of target paths into an ordered
//! traversal.

use crate::error::ComposeError;
use crate::graph::{Graph, NodeId};
use crate::path::Path;

/// Which side of the dependency graph a lifecycle transition walks.
///
/// `Forward` transitions (`init`, `resume`) need their dependencies to
/// have already run; `Reverse` transitions (`halt`, `suspend`) need their
/// dependents to have already stopped.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

/// Compute the ordered traversal for a lifecycle call.
///
/// If `targets` is `None`, the full graph is scheduled. Otherwise:
/// - `Forward` (`init`/`resume`): the targets' transitive *dependencies*
///   are pulled in and executed alongside them (a forward transition needs
///   its dependencies actually running to produce a fresh value, so
///   targeting a component implicitly provisions what it needs).
/// - `Reverse` (`halt`/`suspend`): only the literal targets are scheduled.
///   Dependents are deliberately **not** auto-halted. [`crate::engine`]'s
///   neighbor-status check still inspects the true, live status of the
///   full dependents closure from the graph, so a dependent that hasn't
///   been explicitly stopped first correctly fails the call with
///   [`ComposeError::WrongNeighborStatus`] rather than being silently
///   halted out from under its own callers.
///
/// Any target not present in `graph` fails with
/// [`ComposeError::UnknownComponent`].
///
/// The `ROOT` sentinel is always dropped from the returned order; it
/// exists only to give leaf components an outgoing edge for the
/// topological sort and is never itself a schedulable path.
pub fn schedule(
    graph: &Graph,
    targets: Option<&[Path]>,
    direction: Direction,
) -> Result<Vec<Path>, ComposeError> {
    let full_order = graph.topological_order()?;

    let scope: Option<std::collections::BTreeSet<NodeId>> = match targets {
        None => None,
        Some(targets) => {
            let mut roots = Vec::with_capacity(targets.len());
            for target in targets {
                let id = graph
                    .node_for(target)
                    .ok_or_else(|| ComposeError::UnknownComponent {
                        path: target.clone(),
                    })?;
                roots.push(id);
            }
            match direction {
                Direction::Forward => Some(graph.closure(&roots, direction)),
                Direction::Reverse => Some(roots.into_iter().collect()),
            }
        }
    };

    let mut order: Vec<Path> = full_order
        .into_iter()
        .filter(|&id| id != NodeId::ROOT)
        .filter(|id| match &scope {
            Some(scope) => scope.contains(id),
            None => true,
        })
        .filter_map(|id| graph.path_for(id).cloned())
        .collect();

    if direction == Direction::Reverse {
        order.reverse();
    }

    Ok(order)
}
