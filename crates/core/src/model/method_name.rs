use std::sync::Arc;

use serde::{Serialize, Serializer};

/// Full name of a profiled method (`Class#method`, `module::func`, ...).
///
/// Interned once per [`CallTree`](super::CallTree); summaries, groups and
/// ranked rows share the allocation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MethodName(Arc<str>);

impl MethodName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for MethodName {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl PartialEq<str> for MethodName {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

// `HashMap<MethodName, _>` lookups by `&str`. Consistent with the derived
// `Hash`/`Eq`, which both go through the `str` contents.
impl std::borrow::Borrow<str> for MethodName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MethodName {
    fn from(s: &str) -> Self {
        MethodName(Arc::from(s))
    }
}

impl std::fmt::Display for MethodName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for MethodName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compares_by_contents() {
        let a = MethodName::from("Object#work");
        assert_eq!(a, MethodName::from("Object#work"));
        assert_eq!(a, "Object#work");
        assert!(MethodName::from("Array#each") < MethodName::from("Array#map"));
    }

    #[test]
    fn interned_lookup_by_str() {
        let mut map = std::collections::HashMap::new();
        map.insert(MethodName::from("Kernel#sleep"), 3);
        assert_eq!(map.get("Kernel#sleep"), Some(&3));
    }

    #[test]
    fn displays_and_serializes_as_plain_string() {
        let name = MethodName::from("Foo#bar");
        assert_eq!(name.to_string(), "Foo#bar");
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"Foo#bar\"");
    }
}
