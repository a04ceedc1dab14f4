//! Unique instance names for choice controllers
//!
//! A choice controller carries a `name` that groups its options, the way a
//! set of radio inputs shares one field name. When the caller gives none, a
//! fresh one is minted per instance so two selects built from the same call
//! site in a loop never share a group.
//!
//! ```ignore
//! let a = InstanceKey::new("select");
//! let b = InstanceKey::new("select");
//! assert_ne!(a.name(), b.name());
//!
//! let fixed = InstanceKey::explicit("country");
//! assert_eq!(fixed.name(), "country");
//! ```

use uuid::Uuid;

/// A unique, cheaply clonable name for one widget instance
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct InstanceKey {
    name: String,
    location: Option<(&'static str, u32)>,
}

impl InstanceKey {
    /// Mint a fresh name of the form `{prefix}-{uuid}`
    #[track_caller]
    pub fn new(prefix: &str) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            name: format!("{}-{}", prefix, Uuid::new_v4().as_simple()),
            location: Some((loc.file(), loc.line())),
        }
    }

    /// Use a caller-provided name as is
    pub fn explicit(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// A name for an internal part of this instance, e.g. its option panel
    pub fn derive(&self, suffix: &str) -> String {
        format!("{}_{}", self.name, suffix)
    }

    /// Where a generated key was created; `None` for explicit keys
    pub fn location(&self) -> Option<(&'static str, u32)> {
        self.location
    }
}

impl std::fmt::Debug for InstanceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InstanceKey({})", self.name)
    }
}

impl std::fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
