//! The public system facade: the five entry points callers actually use,
//! each a thin compose of scheduling and the transition engine.

use crate::error::ComposeError;
use crate::handler::HandlerRegistry;
use crate::path::Path;
use crate::runtime::Runtime;
use crate::scheduler::{self, Direction};
use crate::status::Transition;
use crate::system::System;
use crate::value::Value;
use crate::{engine, tree};

/// Expand `config`, build its dependency graph, and run `init` over the
/// forward (dependency-first) closure of `paths` (the whole system if
/// `None`).
///
/// The only facade function that takes raw, unexpanded configuration; every
/// other entry point operates on a [`System`] already produced by a prior
/// call.
#[tracing::instrument(level = "info", skip(config, registry, runtime))]
pub fn init(
    config: Value,
    paths: Option<&[Path]>,
    registry: &HandlerRegistry,
    runtime: &Runtime,
) -> Result<System, ComposeError> {
    let system = System::expand(config)?;
    let order = scheduler::schedule(system.graph(), paths, Direction::Forward)?;
    Ok(engine::run_action(system, &order, Transition::Init, registry, runtime))
}

/// Run `halt` over the reverse (dependent-first) closure of `paths`.
#[tracing::instrument(level = "info", skip(system, registry, runtime))]
pub fn halt(
    system: System,
    paths: Option<&[Path]>,
    registry: &HandlerRegistry,
    runtime: &Runtime,
) -> Result<System, ComposeError> {
    let order = scheduler::schedule(system.graph(), paths, Direction::Reverse)?;
    Ok(engine::run_action(system, &order, Transition::Halt, registry, runtime))
}

/// Run `suspend` over the reverse (dependent-first) closure of `paths`.
#[tracing::instrument(level = "info", skip(system, registry, runtime))]
pub fn suspend(
    system: System,
    paths: Option<&[Path]>,
    registry: &HandlerRegistry,
    runtime: &Runtime,
) -> Result<System, ComposeError> {
    let order = scheduler::schedule(system.graph(), paths, Direction::Reverse)?;
    Ok(engine::run_action(system, &order, Transition::Suspend, registry, runtime))
}

/// Run `resume` over the forward (dependency-first) closure of `paths`.
#[tracing::instrument(level = "info", skip(system, registry, runtime))]
pub fn resume(
    system: System,
    paths: Option<&[Path]>,
    registry: &HandlerRegistry,
    runtime: &Runtime,
) -> Result<System, ComposeError> {
    let order = scheduler::schedule(system.graph(), paths, Direction::Forward)?;
    Ok(engine::run_action(system, &order, Transition::Resume, registry, runtime))
}

/// For each path in the forward closure, run `resume` then `init`
/// back-to-back; the can-run gate ensures only the transition that
/// actually applies to a given component's current status fires.
#[tracing::instrument(level = "info", skip(system, registry, runtime))]
pub fn resume_or_init(
    system: System,
    paths: Option<&[Path]>,
    registry: &HandlerRegistry,
    runtime: &Runtime,
) -> Result<System, ComposeError> {
    let order = scheduler::schedule(system.graph(), paths, Direction::Forward)?;
    let system = engine::run_action(system, &order, Transition::Resume, registry, runtime);
    Ok(engine::run_action(system, &order, Transition::Init, registry, runtime))
}

/// Look up the absolute path of every `Component` in the raw (pre-expansion)
/// shape of `config`, useful for building a target list before the first
/// [`init`] call. Purely a convenience wrapper over [`tree::expand`] +
/// [`tree::collect_component_paths`].
pub fn component_paths(config: &Value) -> Vec<Path> {
    let expanded = tree::expand(config.clone());
    tree::collect_component_paths(&expanded)
}
