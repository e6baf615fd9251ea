//! Version labels and their ordering
//!
//! A version label is the three-component numeric string `MAJOR.MINOR.PATCH`
//! used to name version directories on disk. Comparison is component-wise and
//! numeric, never lexical: `0.10.0` is newer than `0.9.0`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::RextError;

/// A parsed `MAJOR.MINOR.PATCH` version label
///
/// Each component is restricted to at most two digits (0–99), matching the
/// directory-name pattern `\d{1,2}\.\d{1,2}\.\d{1,2}` of the on-disk layout.
/// `FromStr` is the well-formedness check: anything it rejects is a
/// `MalformedVersion`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl Version {
    /// The empty-baseline label, older than every storable version
    pub const ZERO: Version = Version::new(0, 0, 0);

    /// The conventional first version of a fresh document
    pub const FIRST: Version = Version::new(0, 0, 1);

    /// Create a version from its components
    pub const fn new(major: u8, minor: u8, patch: u8) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Check whether a label parses as a version
    pub fn is_well_formed(label: &str) -> bool {
        label.parse::<Version>().is_ok()
    }

    /// Compare two possibly-absent versions
    ///
    /// An absent `a` defaults to `0.0.1` and an absent `b` to `0.0.0`, so a
    /// call that names no version sorts as newer than a document that stores
    /// none. The first version ever created therefore always beats the empty
    /// baseline.
    pub fn compare_or_default(a: Option<Version>, b: Option<Version>) -> Ordering {
        a.unwrap_or(Version::FIRST).cmp(&b.unwrap_or(Version::ZERO))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Parse one version component: one or two ASCII digits, nothing else
fn parse_component(s: &str) -> Option<u8> {
    if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl FromStr for Version {
    type Err = RextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || RextError::MalformedVersion(s.to_string());

        let mut parts = s.split('.');
        let major = parts.next().and_then(parse_component).ok_or_else(malformed)?;
        let minor = parts.next().and_then(parse_component).ok_or_else(malformed)?;
        let patch = parts.next().and_then(parse_component).ok_or_else(malformed)?;
        if parts.next().is_some() {
            return Err(malformed());
        }

        Ok(Version::new(major, minor, patch))
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
