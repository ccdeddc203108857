// crates/invoker-tck-core/src/core/identifiers.rs
// ============================================================================
// Module: Invoker TCK Identifiers
// Description: Opaque identifiers for suites, cases, images, and containers.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the string-based identifiers used throughout the kit.
//! Identifiers are opaque and serialize as strings. Validation (non-empty,
//! uniqueness) happens at suite registration rather than within these wrappers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Tag applied to image references that do not carry one.
pub const DEFAULT_IMAGE_TAG: &str = "latest";

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Suite identifier, unique within a registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuiteName(String);

impl SuiteName {
    /// Creates a new suite name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SuiteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for SuiteName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SuiteName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Test case identifier, unique within its suite.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseName(String);

impl CaseName {
    /// Creates a new case name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for CaseName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CaseName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Container image reference (`[registry/]repository[:tag]`).
///
/// # Invariants
/// - A `:` that precedes the last `/` belongs to a registry host, not a tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Creates a new image reference.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Returns the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the repository part of the reference (everything but the tag).
    #[must_use]
    pub fn repository(&self) -> &str {
        self.split().0
    }

    /// Returns the tag, defaulting to [`DEFAULT_IMAGE_TAG`].
    #[must_use]
    pub fn tag(&self) -> &str {
        self.split().1
    }

    /// Splits the reference into repository and tag.
    fn split(&self) -> (&str, &str) {
        let name_start = self.0.rfind('/').map_or(0, |idx| idx + 1);
        match self.0[name_start ..].rfind(':') {
            Some(idx) => {
                let split_at = name_start + idx;
                let tag = &self.0[split_at + 1 ..];
                if tag.is_empty() {
                    (&self.0[.. split_at], DEFAULT_IMAGE_TAG)
                } else {
                    (&self.0[.. split_at], tag)
                }
            }
            None => (&self.0, DEFAULT_IMAGE_TAG),
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ImageRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ImageRef {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Container identifier assigned by the container engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(String);

impl ContainerId {
    /// Creates a new container identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ContainerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ContainerId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::ImageRef;

    #[test]
    fn image_without_tag_defaults_to_latest() {
        let image = ImageRef::new("upper");
        assert_eq!(image.repository(), "upper");
        assert_eq!(image.tag(), "latest");
    }

    #[test]
    fn image_tag_is_split_from_repository() {
        let image = ImageRef::new("projectriff/upper:0.0.3");
        assert_eq!(image.repository(), "projectriff/upper");
        assert_eq!(image.tag(), "0.0.3");
    }

    #[test]
    fn registry_port_is_not_a_tag() {
        let image = ImageRef::new("localhost:5000/upper");
        assert_eq!(image.repository(), "localhost:5000/upper");
        assert_eq!(image.tag(), "latest");

        let tagged = ImageRef::new("localhost:5000/upper:dev");
        assert_eq!(tagged.repository(), "localhost:5000/upper");
        assert_eq!(tagged.tag(), "dev");
    }

    #[test]
    fn trailing_colon_falls_back_to_default_tag() {
        let image = ImageRef::new("upper:");
        assert_eq!(image.repository(), "upper");
        assert_eq!(image.tag(), "latest");
    }
}
