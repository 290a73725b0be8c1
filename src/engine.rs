//! The transition engine: can-run and neighbor-status preconditions,
//! reference substitution, handler invocation, and status bookkeeping, run
//! as a single-threaded fold over a scheduled path order.

use indexmap::IndexMap;

use crate::error::{ActionException, ComposeError, NeighborDirection};
use crate::graph::NodeId;
use crate::handler::{HandlerRegistry, Node};
use crate::path::{Key, Path};
use crate::resolver;
use crate::runtime::Runtime;
use crate::scheduler::Direction;
use crate::status::{can_run_on_status, required_neighbor_status, Phase, Status, Transition};
use crate::system::System;
use crate::tree;
use crate::value::Value;

/// Run `transition` over every path in `ordered`, in order, mutating
/// `system` one path at a time.
///
/// Every failure (a neighbor-status violation or a handler error) is
/// routed through `runtime`'s exception hook and ends the loop; the
/// function always returns a `System`, never an `Err`.
#[tracing::instrument(level = "debug", skip(system, ordered, registry, runtime))]
pub fn run_action(
    mut system: System,
    ordered: &[Path],
    transition: Transition,
    registry: &HandlerRegistry,
    runtime: &Runtime,
) -> System {
    for path in ordered {
        let current_phase = system
            .component(path)
            .map(|c| c.status)
            .unwrap_or(Phase::Absent);

        if !can_run_on_status(transition, current_phase) {
            runtime.trace(&format!(
                "skip `{transition}` on `{path}`: current status is `{current_phase}`"
            ));
            continue;
        }
        runtime.trace(&format!(
            "running `{transition}` on `{path}` (status `{current_phase}`)"
        ));

        if let Some(err) = check_neighbor_status(&system, path, transition) {
            runtime.trace(&format!("{err}"));
            return runtime.handle_exception(system, &err);
        }

        let component = system
            .component(path)
            .cloned()
            .expect("a scheduled path always names a component");

        let resolved_config = match substitute_config(&system, path, &component.config) {
            Ok(config) => config,
            Err(err) => return runtime.handle_exception(system, &err),
        };

        let Some(handler) = registry.get(&component.kind) else {
            let err = ComposeError::InvalidConfig {
                path: path.clone(),
                reason: format!("no handler registered for kind `{}`", component.kind),
            };
            return runtime.handle_exception(system, &err);
        };

        let node = Node::new(resolved_config, &system, path.clone());
        let result = match transition {
            Transition::Init => handler.init(node),
            Transition::Halt => handler.halt(node),
            Transition::Suspend => handler.suspend(node),
            Transition::Resume => handler.resume(node),
        };

        match result {
            Ok(value) => {
                let target = transition.target_phase();
                let public_status = target.to_status();
                let stored_value = match public_status {
                    Status::Init | Status::Suspend => Some(Box::new(value)),
                    Status::Halt | Status::Absent => None,
                };
                let slot = system
                    .component_mut(path)
                    .expect("a scheduled path always names a component");
                slot.status = target;
                slot.value = stored_value;
            }
            Err(cause) => {
                let err = ComposeError::ActionException(ActionException {
                    action: transition,
                    path: path.clone(),
                    component: Box::new(component),
                    cause,
                });
                return runtime.handle_exception(system, &err);
            }
        }
    }
    system
}

/// Every transitive neighbor on the direction side implied by `transition`
/// must be in an allowed status.
fn check_neighbor_status(system: &System, path: &Path, transition: Transition) -> Option<ComposeError> {
    let id = system
        .graph()
        .node_for(path)
        .expect("a scheduled path is always a graph node");
    let direction = if transition.is_forward() {
        Direction::Forward
    } else {
        Direction::Reverse
    };
    let neighbor_direction = if transition.is_forward() {
        NeighborDirection::Dependency
    } else {
        NeighborDirection::Dependent
    };

    for neighbor_id in system.graph().closure(&[id], direction) {
        if neighbor_id == id || neighbor_id == NodeId::ROOT {
            continue;
        }
        let Some(neighbor_path) = system.graph().path_for(neighbor_id) else {
            continue;
        };
        let neighbor_phase = system
            .component(neighbor_path)
            .map(|c| c.status)
            .unwrap_or(Phase::Absent);
        if !required_neighbor_status(transition, neighbor_phase) {
            return Some(ComposeError::WrongNeighborStatus {
                action: transition,
                path: path.clone(),
                direction: neighbor_direction,
                neighbor: neighbor_path.clone(),
                neighbor_status: neighbor_phase,
            });
        }
    }
    None
}

/// Build the config the handler actually sees: every [`Value::Ref`]
/// replaced by the value of its resolved target, and every nested
/// [`Value::Component`] replaced by its own `value`.
fn substitute_config(
    system: &System,
    from: &Path,
    config: &IndexMap<Key, Value>,
) -> Result<IndexMap<Key, Value>, ComposeError> {
    let mut resolved = IndexMap::with_capacity(config.len());
    for (key, value) in config {
        resolved.insert(key.clone(), materialize(system, value, &from.join(key.clone()))?);
    }
    Ok(resolved)
}

/// Recursively resolve refs and flatten nested components to their stored
/// `value`, tracking the tree path of the value currently being visited so
/// that further nested refs resolve against their own lexical scope.
fn materialize(system: &System, value: &Value, current_path: &Path) -> Result<Value, ComposeError> {
    match value {
        Value::Ref(r) => {
            let target = resolver::resolve_reference(system.root(), current_path, r.keys())?;
            let target_value = tree::lookup(system.root(), &target)
                .expect("resolve_reference only returns paths that exist");
            materialize_target(system, target_value, &target)
        }
        Value::Component(component) => Ok(component
            .value
            .clone()
            .map(|boxed| *boxed)
            .unwrap_or(Value::Null)),
        Value::Map(map) => {
            let mut out = IndexMap::with_capacity(map.len());
            for (key, child) in map {
                out.insert(
                    key.clone(),
                    materialize(system, child, &current_path.join(key.clone()))?,
                );
            }
            Ok(Value::Map(out))
        }
        Value::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                // Sequences are not path-addressable; any refs inside a
                // list item keep resolving against the enclosing map's
                // scope.
                out.push(materialize(system, item, current_path)?);
            }
            Ok(Value::List(out))
        }
        other => Ok(other.clone()),
    }
}

/// A reference's target base `D` may itself be a component (substitute its
/// `value`) or plain data/a group of components (substitute the
/// materialized value at `D`).
fn materialize_target(system: &System, target_value: &Value, target_path: &Path) -> Result<Value, ComposeError> {
    match target_value {
        Value::Component(component) => Ok(component
            .value
            .clone()
            .map(|boxed| *boxed)
            .unwrap_or(Value::Null)),
        _ => materialize(system, target_value, target_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerRegistry;
    use crate::runtime::Runtime;
    use crate::system::System;
    use crate::value::{Kind, Ref};

    fn key(s: &str) -> Key {
        Key::new(s)
    }

    #[test]
    fn init_substitutes_dependency_value_and_orders_before_dependent() {
        let mut b_cfg = IndexMap::new();
        b_cfg.insert(key("dep"), Value::Ref(Ref::new(Path::from_keys(["a"]))));
        let root = Value::map([
            (key("a"), Value::component(Kind::identity(), IndexMap::new())),
            (key("b"), Value::component(Kind::identity(), b_cfg)),
        ]);
        let system = System::expand(root).unwrap();
        let registry = HandlerRegistry::with_identity();
        let runtime = Runtime::new();
        let order = crate::scheduler::schedule(system.graph(), None, Direction::Forward).unwrap();
        let system = run_action(system, &order, Transition::Init, &registry, &runtime);

        let a = system.component(&Path::from_keys(["a"])).unwrap();
        assert_eq!(a.status(), Status::Init);
        let b = system.component(&Path::from_keys(["b"])).unwrap();
        assert_eq!(b.status(), Status::Init);
        let b_value = b.value.as_ref().unwrap().as_map().unwrap();
        // `a`'s value is its own (empty) config, echoed by the identity handler.
        assert_eq!(b_value.get(&key("dep")), Some(&Value::Map(IndexMap::new())));
    }

    #[test]
    fn halt_resets_value_to_none() {
        let root = Value::map([(key("a"), Value::component(Kind::identity(), IndexMap::new()))]);
        let system = System::expand(root).unwrap();
        let registry = HandlerRegistry::with_identity();
        let runtime = Runtime::new();
        let order = crate::scheduler::schedule(system.graph(), None, Direction::Forward).unwrap();
        let system = run_action(system, &order, Transition::Init, &registry, &runtime);
        let order = crate::scheduler::schedule(system.graph(), None, Direction::Reverse).unwrap();
        let system = run_action(system, &order, Transition::Halt, &registry, &runtime);
        let a = system.component(&Path::from_keys(["a"])).unwrap();
        assert_eq!(a.status(), Status::Halt);
        assert!(a.value.is_none());
    }
}
