//! The component lifecycle state machine: which transitions may run on a
//! component given its current phase, and what phase its dependencies /
//! dependents must be in.

use std::fmt;

/// The internal, five-valued phase of a component.
///
/// `Resume` is kept distinct from `Init` here even though only four public
/// statuses are exposed (see [`Phase::to_status`]): a freshly-resumed
/// component is tracked separately from a freshly-initialized one so the
/// can-run tables can treat them differently, even though both fold onto
/// the same public `init` status.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Phase {
    Absent,
    Init,
    Halt,
    Suspend,
    Resume,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Absent
    }
}

impl Phase {
    /// Fold onto the four public statuses.
    pub fn to_status(self) -> Status {
        match self {
            Phase::Absent => Status::Absent,
            Phase::Init | Phase::Resume => Status::Init,
            Phase::Halt => Status::Halt,
            Phase::Suspend => Status::Suspend,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Absent => "absent",
            Phase::Init => "init",
            Phase::Halt => "halt",
            Phase::Suspend => "suspend",
            Phase::Resume => "resume",
        };
        f.write_str(s)
    }
}

/// The public, four-valued status of a component.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    Absent,
    Init,
    Halt,
    Suspend,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Absent => "absent",
            Status::Init => "init",
            Status::Halt => "halt",
            Status::Suspend => "suspend",
        };
        f.write_str(s)
    }
}

/// One of the four lifecycle transitions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Transition {
    Init,
    Halt,
    Suspend,
    Resume,
}

impl Transition {
    /// The phase a component moves into on a *successful* run of this
    /// transition.
    pub fn target_phase(self) -> Phase {
        match self {
            Transition::Init => Phase::Init,
            Transition::Halt => Phase::Halt,
            Transition::Suspend => Phase::Suspend,
            Transition::Resume => Phase::Resume,
        }
    }

    /// Forward transitions check their *dependencies*' status; reverse
    /// transitions check their *dependents*' status.
    pub fn is_forward(self) -> bool {
        matches!(self, Transition::Init | Transition::Resume)
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Transition::Init => "init",
            Transition::Halt => "halt",
            Transition::Suspend => "suspend",
            Transition::Resume => "resume",
        };
        f.write_str(s)
    }
}

/// The can-run precondition: the transition proceeds only if the
/// component's *current* phase is in this set. Not in the set => silent
/// skip, not an error.
pub fn can_run_on_status(transition: Transition, current: Phase) -> bool {
    use Phase::*;
    use Transition::*;
    match transition {
        Init => matches!(current, Absent | Halt),
        Halt => matches!(current, Init | Resume | Suspend),
        Resume => matches!(current, Suspend),
        Suspend => matches!(current, Init | Resume),
    }
}

/// Whether a required-neighbor-status set is the unconstrained `ALL`
/// sentinel, or an explicit membership check.
enum Required {
    All,
    OneOf(&'static [Phase]),
}

impl Required {
    fn allows(&self, phase: Phase) -> bool {
        match self {
            Required::All => true,
            Required::OneOf(phases) => phases.contains(&phase),
        }
    }
}

/// For forward transitions, every transitive dependency must be in this
/// set.
fn required_dependency_status(transition: Transition) -> Required {
    use Phase::*;
    use Transition::*;
    match transition {
        Init => Required::OneOf(&[Init, Resume]),
        Resume => Required::OneOf(&[Init, Resume]),
        Halt => Required::All,
        Suspend => Required::All,
    }
}

/// For reverse transitions, every transitive dependent must be in this set.
fn required_dependent_status(transition: Transition) -> Required {
    use Phase::*;
    use Transition::*;
    match transition {
        Init => Required::All,
        Resume => Required::All,
        Halt => Required::OneOf(&[Halt, Absent]),
        Suspend => Required::OneOf(&[Suspend, Halt, Absent]),
    }
}

/// The neighbor-status precondition for `transition`, applied to the side
/// of the graph the transition's direction implies checking (dependencies
/// for forward transitions, dependents for reverse transitions).
pub fn required_neighbor_status(transition: Transition, neighbor: Phase) -> bool {
    let required = if transition.is_forward() {
        required_dependency_status(transition)
    } else {
        required_dependent_status(transition)
    };
    required.allows(neighbor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_runs_from_absent_or_halt_only() {
        assert!(can_run_on_status(Transition::Init, Phase::Absent));
        assert!(can_run_on_status(Transition::Init, Phase::Halt));
        assert!(!can_run_on_status(Transition::Init, Phase::Init));
        assert!(!can_run_on_status(Transition::Init, Phase::Suspend));
        assert!(!can_run_on_status(Transition::Init, Phase::Resume));
    }

    #[test]
    fn halt_requires_dependents_stopped() {
        assert!(required_neighbor_status(Transition::Halt, Phase::Halt));
        assert!(required_neighbor_status(Transition::Halt, Phase::Absent));
        assert!(!required_neighbor_status(Transition::Halt, Phase::Init));
    }

    #[test]
    fn init_requires_dependencies_running() {
        assert!(required_neighbor_status(Transition::Init, Phase::Init));
        assert!(required_neighbor_status(Transition::Init, Phase::Resume));
        assert!(!required_neighbor_status(Transition::Init, Phase::Halt));
        assert!(!required_neighbor_status(Transition::Init, Phase::Absent));
    }

    #[test]
    fn halt_does_not_constrain_dependencies() {
        for phase in [
            Phase::Absent,
            Phase::Init,
            Phase::Halt,
            Phase::Suspend,
            Phase::Resume,
        ] {
            assert!(required_neighbor_status(Transition::Halt, phase));
        }
    }

    #[test]
    fn phase_folds_resume_into_init() {
        assert_eq!(Phase::Resume.to_status(), Status::Init);
        assert_eq!(Phase::Init.to_status(), Status::Init);
    }
}
