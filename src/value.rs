//! The tagged-data model underpinning a configuration tree: [`Value`] is a
//! sum type, never a class hierarchy. Components, references, and plain
//! data are distinguished by matching on the variant, not by dynamic
//! dispatch or inheritance.

use std::fmt;

use indexmap::IndexMap;

use crate::path::{Key, Path};
use crate::status::Phase;

/// A namespaced symbolic identifier (e.g. `svc/http-server`) used to
/// dispatch to a registered [`crate::handler::ComponentHandler`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Kind(String);

impl Kind {
    /// The distinguished built-in kind whose `init` handler is the
    /// identity function.
    pub const IDENTITY_NAME: &'static str = "identity";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn identity() -> Self {
        Self::new(Self::IDENTITY_NAME)
    }

    pub fn is_identity(&self) -> bool {
        self.0 == Self::IDENTITY_NAME
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Kind {
    fn from(value: &str) -> Self {
        Kind::new(value)
    }
}

impl From<String> for Kind {
    fn from(value: String) -> Self {
        Kind::new(value)
    }
}

impl From<Key> for Kind {
    fn from(key: Key) -> Self {
        Kind::new(key.as_str().to_string())
    }
}

/// A lexically-scoped symbolic pointer: the value of the component found by
/// resolving this key-sequence against the current scope.
///
/// Stored as a relative [`Path`] (the key-sequence itself, not yet resolved
/// to an absolute location). Resolution happens in [`crate::resolver`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ref(pub Path);

impl Ref {
    pub fn new(keys: Path) -> Self {
        Self(keys)
    }

    pub fn keys(&self) -> &Path {
        &self.0
    }
}

/// A component embedded in the tree.
///
/// `config` is the map of parameters as authored; it may contain
/// [`Value::Ref`]s and nested [`Value::Component`]s. `status` and `value`
/// start out `Phase::Absent`/`None` and are mutated only by
/// [`crate::engine::run_action`].
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub kind: Kind,
    pub config: IndexMap<Key, Value>,
    pub status: Phase,
    pub value: Option<Box<Value>>,
}

impl Component {
    pub fn new(kind: Kind, config: IndexMap<Key, Value>) -> Self {
        Self {
            kind,
            config,
            status: Phase::Absent,
            value: None,
        }
    }

    /// The public, four-valued status derived from the internal `Phase`
    /// (a freshly-resumed component folds onto the same public `init`
    /// status as a freshly-initialized one).
    pub fn status(&self) -> crate::status::Status {
        self.status.to_status()
    }
}

/// A node in the configuration tree.
///
/// Maps are order-preserving (`IndexMap`) so that registration order is
/// stable across runs, the way this crate family keeps registration order
/// stable in its own component databases.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(IndexMap<Key, Value>),
    Ref(Ref),
    Component(Component),
}

impl Value {
    pub fn map<I>(entries: I) -> Value
    where
        I: IntoIterator<Item = (Key, Value)>,
    {
        Value::Map(entries.into_iter().collect())
    }

    pub fn list<I>(items: I) -> Value
    where
        I: IntoIterator<Item = Value>,
    {
        Value::List(items.into_iter().collect())
    }

    pub fn str(s: impl Into<String>) -> Value {
        Value::Str(s.into())
    }

    /// Build a component value from a kind and its config map.
    pub fn component(kind: impl Into<Kind>, config: IndexMap<Key, Value>) -> Value {
        Value::Component(Component::new(kind.into(), config))
    }

    /// Build a component value, merging `extra` into `config` with `extra`
    /// taking precedence on key collisions. Lets callers layer overrides
    /// onto a base config without hand-merging the two maps themselves.
    pub fn component_with_extra(
        kind: impl Into<Kind>,
        mut config: IndexMap<Key, Value>,
        extra: IndexMap<Key, Value>,
    ) -> Value {
        for (key, value) in extra {
            config.insert(key, value);
        }
        Value::Component(Component::new(kind.into(), config))
    }

    /// Sugar for `Value::component(Kind::identity(), config)`.
    pub fn identity(config: IndexMap<Key, Value>) -> Value {
        Value::component(Kind::identity(), config)
    }

    pub fn is_component(&self) -> bool {
        matches!(self, Value::Component(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    pub fn is_ref(&self) -> bool {
        matches!(self, Value::Ref(_))
    }

    pub fn as_map(&self) -> Option<&IndexMap<Key, Value>> {
        match self {
            Value::Map(m) => Some(m),
            Value::Component(c) => Some(&c.config),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut IndexMap<Key, Value>> {
        match self {
            Value::Map(m) => Some(m),
            Value::Component(c) => Some(&mut c.config),
            _ => None,
        }
    }

    pub fn as_component(&self) -> Option<&Component> {
        match self {
            Value::Component(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_component_mut(&mut self) -> Option<&mut Component> {
        match self {
            Value::Component(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_ref_value(&self) -> Option<&Ref> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }

    /// Descend one key into this value, if it is map-shaped (a plain map or
    /// a component's config).
    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Mutable counterpart to [`Value::get`].
    pub fn get_mut(&mut self, key: &Key) -> Option<&mut Value> {
        self.as_map_mut().and_then(|m| m.get_mut(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_with_extra_overrides_config_on_key_collision() {
        let config = IndexMap::from([
            (Key::new("host"), Value::str("localhost")),
            (Key::new("port"), Value::Int(80)),
        ]);
        let extra = IndexMap::from([(Key::new("port"), Value::Int(8080))]);

        let value = Value::component_with_extra(Kind::new("svc/http"), config, extra);

        let built = value.as_component().unwrap();
        assert_eq!(built.config.get(&Key::new("host")), Some(&Value::str("localhost")));
        assert_eq!(built.config.get(&Key::new("port")), Some(&Value::Int(8080)));
    }
}
