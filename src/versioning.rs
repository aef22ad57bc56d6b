//! Versioning policy
//!
//! Two counters exist and they are never the same number:
//!
//! - **Store version** (`Artifact::version`, integer): owned by the artifact
//!   store, starts at 1 and grows by exactly 1 on every upsert of a
//!   (project, type) key. Authoritative for "which write is newest".
//! - **Document version** (`RequirementsDoc::version`, `"major.minor"`):
//!   carried inside the requirements content. Authoritative for humans reading
//!   the document. The orchestrator stamps it: `1.0` on first generation, minor
//!   bump on every regeneration. Rewriting the same content bumps only the
//!   store counter, so the two drift apart.

use crate::error::{PipelineError, PipelineResult};
use std::fmt;
use std::str::FromStr;

/// A `"major.minor"` document revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SemanticVersion {
    pub major: u32,
    pub minor: u32,
}

impl SemanticVersion {
    pub const INITIAL: SemanticVersion = SemanticVersion { major: 1, minor: 0 };

    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// `None` once the minor number is exhausted
    pub fn bump_minor(&self) -> Option<Self> {
        Some(Self {
            major: self.major,
            minor: self.minor.checked_add(1)?,
        })
    }

    /// Whether `s` is a well-formed `"major.minor"` string
    pub fn is_valid(s: &str) -> bool {
        s.parse::<SemanticVersion>().is_ok()
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for SemanticVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s
            .split_once('.')
            .ok_or_else(|| format!("Version '{}' is not in major.minor form", s))?;
        let parse = |part: &str| -> Result<u32, String> {
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                return Err(format!("Version '{}' is not in major.minor form", s));
            }
            part.parse::<u32>()
                .map_err(|e| format!("Version '{}' is out of range: {}", s, e))
        };
        Ok(Self {
            major: parse(major)?,
            minor: parse(minor)?,
        })
    }
}

/// Document version for a (re)generated requirements doc.
///
/// An unparseable previous version is treated like a missing one, so a
/// hand-edited document never blocks regeneration. A version whose minor
/// number cannot grow is a `Validation` error.
pub fn next_document_version(previous: Option<&str>) -> PipelineResult<SemanticVersion> {
    match previous.and_then(|p| p.parse::<SemanticVersion>().ok()) {
        Some(prev) => prev.bump_minor().ok_or_else(|| {
            PipelineError::validation(format!(
                "Document version {} cannot be bumped further",
                prev
            ))
        }),
        None => Ok(SemanticVersion::INITIAL),
    }
}

/// Store version after an upsert, given the version currently stored
pub fn next_store_version(current: Option<u32>) -> u32 {
    current.map_or(1, |v| v + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let v: SemanticVersion = "2.13".parse().unwrap();
        assert_eq!(v, SemanticVersion::new(2, 13));
        assert_eq!(v.to_string(), "2.13");
    }

    #[test]
    fn test_rejects_malformed_versions() {
        for bad in ["1", "1.2.3", "v1.0", "1.", ".1", "a.b", "1.-1", ""] {
            assert!(!SemanticVersion::is_valid(bad), "{} should be invalid", bad);
        }
    }

    #[test]
    fn test_next_document_version() {
        let next = |prev| next_document_version(prev).unwrap().to_string();
        assert_eq!(next(None), "1.0");
        assert_eq!(next(Some("1.0")), "1.1");
        assert_eq!(next(Some("3.9")), "3.10");
        assert_eq!(next(Some("garbage")), "1.0");
    }

    #[test]
    fn test_exhausted_minor_is_a_validation_error() {
        assert_eq!(SemanticVersion::new(1, u32::MAX).bump_minor(), None);

        let err = next_document_version(Some("1.4294967295")).unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
        assert!(err.to_string().contains("1.4294967295"));
    }

    #[test]
    fn test_next_store_version() {
        assert_eq!(next_store_version(None), 1);
        assert_eq!(next_store_version(Some(1)), 2);
        assert_eq!(next_store_version(Some(41)), 42);
    }
}
