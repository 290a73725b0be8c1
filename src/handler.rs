//! The handler contract: four operations keyed by [`Kind`], dispatched
//! through a [`HandlerRegistry`].

use std::fmt;

use ahash::HashMap;

use crate::path::Path;
use crate::system::System;
use crate::value::{Kind, Value};

/// What a handler sees when it is invoked for a single component: its
/// already-substituted config, read-only access to the rest of the system,
/// and its own location.
pub struct Node<'a> {
    config: Value,
    system: &'a System,
    path: Path,
}

impl<'a> Node<'a> {
    pub fn new(config: Value, system: &'a System, path: Path) -> Self {
        Self {
            config,
            system,
            path,
        }
    }

    /// The component's config, with every reference and nested component
    /// already resolved to a plain value.
    pub fn config(&self) -> &Value {
        &self.config
    }

    pub fn system(&self) -> &System {
        self.system
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The component's currently stored `value`, before this transition ran
    /// (`Value::Null` if it was never set). Used by the default `halt`
    /// implementation.
    pub fn current_value(&self) -> Value {
        self.system
            .component(&self.path)
            .and_then(|c| c.value.clone())
            .map(|boxed| *boxed)
            .unwrap_or(Value::Null)
    }
}

/// The four lifecycle operations a [`Kind`] implements.
///
/// Only `init` must be implemented; the other three default to
/// identity-flavoured behaviour, so most handlers need to provide just one
/// method.
pub trait ComponentHandler: fmt::Debug + Send + Sync {
    /// Produce this component's runtime value. The sole mandatory method.
    fn init(&self, node: Node<'_>) -> anyhow::Result<Value>;

    /// Default: identity, return the value already stored for this
    /// component.
    fn halt(&self, node: Node<'_>) -> anyhow::Result<Value> {
        Ok(node.current_value())
    }

    /// Default: delegate to `halt`.
    fn suspend(&self, node: Node<'_>) -> anyhow::Result<Value> {
        self.halt(node)
    }

    /// Default: delegate to `init`.
    fn resume(&self, node: Node<'_>) -> anyhow::Result<Value> {
        self.init(node)
    }
}

/// The built-in `identity` [`Kind`]: `init` (and, by delegation, `resume`)
/// simply returns the config it was given.
#[derive(Debug, Default)]
pub struct IdentityHandler;

impl ComponentHandler for IdentityHandler {
    fn init(&self, node: Node<'_>) -> anyhow::Result<Value> {
        Ok(node.config)
    }
}

/// A `Kind` -> handler table, keyed the way this crate family keys its
/// dispatch-by-kind tables (`ahash` for a non-ordered side lookup).
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<Kind, Box<dyn ComponentHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::default(),
        }
    }

    /// A registry pre-seeded with the built-in `identity` kind, available
    /// to every system without extra setup.
    pub fn with_identity() -> Self {
        let mut registry = Self::new();
        registry.register(Kind::identity(), IdentityHandler);
        registry
    }

    pub fn register(&mut self, kind: Kind, handler: impl ComponentHandler + 'static) -> &mut Self {
        self.handlers.insert(kind, Box::new(handler));
        self
    }

    pub fn get(&self, kind: &Kind) -> Option<&dyn ComponentHandler> {
        self.handlers.get(kind).map(|boxed| boxed.as_ref())
    }

    pub fn contains(&self, kind: &Kind) -> bool {
        self.handlers.contains_key(kind)
    }
}
