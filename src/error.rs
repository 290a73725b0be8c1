//! Typed failure modes, one variant per error kind.

use crate::path::Path;
use crate::status::{Phase, Transition};
use crate::value::Component;

/// Which side of the dependency graph a [`ComposeError::WrongNeighborStatus`]
/// violation was found on.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NeighborDirection {
    /// A transitive dependency (checked by forward transitions).
    Dependency,
    /// A transitive dependent (checked by reverse transitions).
    Dependent,
}

impl std::fmt::Display for NeighborDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NeighborDirection::Dependency => "dependency",
            NeighborDirection::Dependent => "dependent",
        };
        f.write_str(s)
    }
}

/// A handler raised an error while running a transition.
///
/// The cause is an `anyhow::Error` (the handler contract returns
/// `anyhow::Result<Value>`), matching how this crate family uses `anyhow` at
/// the boundary where arbitrary user-supplied fallible code is invoked.
#[derive(Debug, thiserror::Error)]
#[error("`{action}` raised an error while transitioning `{path}`: {cause}")]
pub struct ActionException {
    pub action: Transition,
    pub path: Path,
    pub component: Box<Component>,
    pub cause: anyhow::Error,
}

/// Every way a lifecycle call can fail.
///
/// `InvalidConfig`, `MissingDependency`, `CyclicDependency` and
/// `UnknownComponent` are preflight: they are returned directly by the
/// facade functions before any handler runs. `WrongNeighborStatus` and
/// `ActionException` are raised from inside the transition engine's loop
/// and are always routed through [`crate::runtime::Runtime`]'s exception
/// hook rather than escaping as an `Err` (see `src/engine.rs`).
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("invalid configuration at `{path}`: {reason}")]
    InvalidConfig { path: Path, reason: String },

    #[error("`{path}` has a reference to `{reference}` that does not resolve to any existing component")]
    MissingDependency { path: Path, reference: Path },

    #[error("the dependency graph has a cycle that includes `{path}`")]
    CyclicDependency { path: Path },

    #[error("`{path}` is not a component in this system")]
    UnknownComponent { path: Path },

    #[error(
        "cannot run `{action}` on `{path}`: its {direction} `{neighbor}` is `{neighbor_status}`"
    )]
    WrongNeighborStatus {
        action: Transition,
        path: Path,
        direction: NeighborDirection,
        neighbor: Path,
        neighbor_status: Phase,
    },

    #[error(transparent)]
    ActionException(#[from] ActionException),
}
