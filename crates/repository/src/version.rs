use serde::{Deserialize, Serialize};

/// Version number of a stored aggregate, used for optimistic concurrency control.
///
/// An aggregate that has never been saved is at version 0; every successful
/// save increments the version by 1.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the initial version (0) for an unsaved aggregate.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the version after the first save.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Version {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_is_default() {
        assert_eq!(Version::default(), Version::initial());
        assert_eq!(Version::initial().next(), Version::first());
    }

    #[test]
    fn versions_are_ordered() {
        assert!(Version::new(3) > Version::new(2));
    }

    #[test]
    fn serializes_as_bare_number() {
        let json = serde_json::to_string(&Version::new(7)).unwrap();
        assert_eq!(json, "7");
        let back: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Version::new(7));
    }
}
