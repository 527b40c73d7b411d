use serde::{Deserialize, Serialize};

/// Version of a persisted aggregate, used for optimistic concurrency control.
///
/// A freshly constructed aggregate is at version 0. Every successful
/// persisted update advances the version by exactly one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Version of an aggregate that has never been updated.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the following version.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_is_zero_and_next_increments() {
        assert_eq!(Version::initial().as_i64(), 0);
        assert_eq!(Version::initial().next(), Version::new(1));
        assert!(Version::new(1) < Version::new(2));
    }

    #[test]
    fn converts_to_and_from_i64() {
        let v: Version = 7.into();
        assert_eq!(i64::from(v), 7);
        assert_eq!(v.to_string(), "7");
    }
}
