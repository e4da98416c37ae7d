//! PARA bucket enumeration.
//!
//! # Responsibility
//! - Define the four-way taxonomy every note is filed under.
//! - Own the stable string form shared by storage and the wire format.
//!
//! # Invariants
//! - String form is lowercase and never changes once persisted.
//! - `Archive` is reachable only through explicit user action; the
//!   classifier never produces it.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// PARA bucket a note is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParaBucket {
    /// Time-bound effort with a concrete outcome.
    Project,
    /// Ongoing responsibility without an end date.
    Area,
    /// Reference material.
    Resource,
    /// Inactive or completed material.
    Archive,
}

impl ParaBucket {
    /// All buckets in canonical display order.
    pub const ALL: [ParaBucket; 4] = [
        ParaBucket::Project,
        ParaBucket::Area,
        ParaBucket::Resource,
        ParaBucket::Archive,
    ];

    /// Stable storage/wire identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Area => "area",
            Self::Resource => "resource",
            Self::Archive => "archive",
        }
    }

    /// Parses a stored or user-supplied bucket name (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "project" => Some(Self::Project),
            "area" => Some(Self::Area),
            "resource" => Some(Self::Resource),
            "archive" => Some(Self::Archive),
            _ => None,
        }
    }
}

impl Display for ParaBucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a PARA bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBucket(pub String);

impl Display for UnknownBucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown PARA bucket `{}`; expected project|area|resource|archive",
            self.0
        )
    }
}

impl Error for UnknownBucket {}

impl FromStr for ParaBucket {
    type Err = UnknownBucket;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownBucket(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::ParaBucket;

    #[test]
    fn parse_accepts_mixed_case_and_padding() {
        assert_eq!(ParaBucket::parse(" Project "), Some(ParaBucket::Project));
        assert_eq!(ParaBucket::parse("ARCHIVE"), Some(ParaBucket::Archive));
        assert_eq!(ParaBucket::parse("projects"), None);
    }

    #[test]
    fn as_str_matches_serde_form() {
        for bucket in ParaBucket::ALL {
            let json = serde_json::to_value(bucket).unwrap();
            assert_eq!(json, bucket.as_str());
        }
    }
}
