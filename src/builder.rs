//! Free-function construction sugar for [`crate::value::Value::Ref`]. The
//! rest of the construction surface (`Value::component`, `Value::map`, ...)
//! lives as associated functions on [`crate::value::Value`] itself.

use crate::path::{Key, Path};
use crate::value::{Ref, Value};

/// Build a reference to `path`, generalizing the single-key `ref(key)` form
/// to a full key-sequence.
pub fn reference(path: Path) -> Value {
    Value::Ref(Ref::new(path))
}

/// Build a reference to a single top-level key, sugar for
/// `reference(Path::from_keys([key]))`.
pub fn reference1(key: impl Into<Key>) -> Value {
    reference(Path::from_keys([key.into()]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference1_builds_a_single_key_path() {
        let value = reference1("svc");
        let r = value.as_ref_value().unwrap();
        assert_eq!(r.keys(), &Path::from_keys(["svc"]));
    }
}
