//! Opaque caller identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An already-authenticated caller, as handed to the core by its host.
///
/// The core only compares identities; how they were resolved or verified
/// is the transport's business.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identity(String);

impl Identity {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Return the raw identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Non-empty and free of surrounding whitespace.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty() && self.0.trim() == self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity() {
        assert!(Identity::new("0xabc").is_valid());
        assert!(!Identity::new("").is_valid());
        assert!(!Identity::new(" 0xabc").is_valid());
        assert!(!Identity::new("0xabc\n").is_valid());
    }

    #[test]
    fn identities_compare_by_value() {
        assert_eq!(Identity::from("alice"), Identity::new(String::from("alice")));
        assert_ne!(Identity::from("alice"), Identity::from("Alice"));
        assert!(Identity::from("a") < Identity::from("b"));
    }
}
