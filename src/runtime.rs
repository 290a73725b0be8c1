//! Ambient hooks threaded through every transition: carried as fields on an
//! explicit value rather than true globals, the way `pavexc` threads its
//! `DiagnosticSink` through a compilation pass instead of reaching for a
//! static.

use crate::error::ComposeError;
use crate::system::System;

type TraceHook = Box<dyn Fn(&str) + Send + Sync>;
type ExceptionHook = Box<dyn Fn(System, &ComposeError) -> System + Send + Sync>;

/// Holds the two optional hooks a caller may install:
///
/// - `trace`: called with a short progress message before/after each
///   per-path step, in addition to (not instead of) this crate's own
///   `tracing` instrumentation.
/// - `exception_handler`: called whenever [`crate::engine::run_action`]
///   hits a [`ComposeError::WrongNeighborStatus`] or
///   [`ComposeError::ActionException`]; it receives the system as it stood
///   at the point of failure and returns the system to continue with.
///   Default: log the error and return the system unchanged.
#[derive(Default)]
pub struct Runtime {
    trace: Option<TraceHook>,
    exception_handler: Option<ExceptionHook>,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trace(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.trace = Some(Box::new(hook));
        self
    }

    pub fn with_exception_handler(
        mut self,
        hook: impl Fn(System, &ComposeError) -> System + Send + Sync + 'static,
    ) -> Self {
        self.exception_handler = Some(Box::new(hook));
        self
    }

    pub(crate) fn trace(&self, message: &str) {
        tracing::debug!(%message, "trace");
        if let Some(hook) = &self.trace {
            hook(message);
        }
    }

    pub(crate) fn handle_exception(&self, system: System, error: &ComposeError) -> System {
        match &self.exception_handler {
            Some(hook) => hook(system, error),
            None => {
                tracing::error!(%error, "unhandled exception during lifecycle transition");
                system
            }
        }
    }
}
