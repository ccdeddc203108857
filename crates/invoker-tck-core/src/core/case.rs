// crates/invoker-tck-core/src/core/case.rs
// ============================================================================
// Module: Test Case Descriptors
// Description: Declarative units of verification and their builder.
// Purpose: Bind every case to its strategies and verification at registration.
// Dependencies: serde, crate::interfaces, crate::runtime
// ============================================================================

//! ## Overview
//! A [`TestCase`] names one requirement of the candidate contract, the image it
//! runs against, whether the requirement is mandatory, and the procedure that
//! verifies it. Cases are immutable once built. Cases that do not override the
//! setup or teardown strategy are bound to the defaults when built, so the
//! runner never branches on a missing strategy.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::CaseName;
use crate::core::identifiers::ImageRef;
use crate::core::suite::SuiteError;
use crate::interfaces::SetupStrategy;
use crate::interfaces::TeardownStrategy;
use crate::interfaces::Verification;
use crate::runtime::DefaultSetup;
use crate::runtime::DefaultTeardown;

// ============================================================================
// SECTION: Requirement Level
// ============================================================================

/// Requirement level of a case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    /// "MUST" requirement: a failure fails the suite.
    #[default]
    Must,
    /// "SHOULD" requirement: a failure is reported but non-fatal.
    Should,
}

impl Requirement {
    /// Returns true when a failure of this requirement fails the suite.
    #[must_use]
    pub const fn is_mandatory(self) -> bool {
        matches!(self, Self::Must)
    }

    /// Returns the RFC 2119 keyword for the requirement.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Must => "MUST",
            Self::Should => "SHOULD",
        }
    }
}

// ============================================================================
// SECTION: Test Case
// ============================================================================

/// Immutable test case descriptor.
///
/// # Invariants
/// - Name, description, and image are non-empty.
/// - Setup, teardown, and verification are always present.
#[derive(Clone)]
pub struct TestCase {
    /// Case name, unique within the suite.
    name: CaseName,
    /// Human-readable description.
    description: String,
    /// Logical image the case targets.
    image: ImageRef,
    /// Requirement level.
    requirement: Requirement,
    /// Strategy producing a ready instance.
    setup: Arc<dyn SetupStrategy>,
    /// Strategy disposing of the instance.
    teardown: Arc<dyn TeardownStrategy>,
    /// Verification procedure.
    verification: Arc<dyn Verification>,
}

impl TestCase {
    /// Starts building a case with the given name.
    #[must_use]
    pub fn builder(name: impl Into<CaseName>) -> TestCaseBuilder {
        TestCaseBuilder::new(name.into())
    }

    /// Returns the case name.
    #[must_use]
    pub const fn name(&self) -> &CaseName {
        &self.name
    }

    /// Returns the case description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the logical image targeted by the case.
    #[must_use]
    pub const fn image(&self) -> &ImageRef {
        &self.image
    }

    /// Returns the requirement level.
    #[must_use]
    pub const fn requirement(&self) -> Requirement {
        self.requirement
    }

    /// Returns a shared handle to the effective setup strategy.
    #[must_use]
    pub fn setup(&self) -> Arc<dyn SetupStrategy> {
        Arc::clone(&self.setup)
    }

    /// Returns a shared handle to the effective teardown strategy.
    #[must_use]
    pub fn teardown(&self) -> Arc<dyn TeardownStrategy> {
        Arc::clone(&self.teardown)
    }

    /// Returns a shared handle to the verification procedure.
    #[must_use]
    pub fn verification(&self) -> Arc<dyn Verification> {
        Arc::clone(&self.verification)
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("image", &self.image)
            .field("requirement", &self.requirement)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builder for [`TestCase`]; validation happens in [`TestCaseBuilder::build`].
pub struct TestCaseBuilder {
    /// Case name.
    name: CaseName,
    /// Description, required.
    description: Option<String>,
    /// Logical image, required.
    image: Option<ImageRef>,
    /// Requirement level, defaults to MUST.
    requirement: Requirement,
    /// Optional setup override.
    setup: Option<Arc<dyn SetupStrategy>>,
    /// Optional teardown override.
    teardown: Option<Arc<dyn TeardownStrategy>>,
    /// Verification procedure, required.
    verification: Option<Arc<dyn Verification>>,
}

impl TestCaseBuilder {
    /// Creates an empty builder.
    fn new(name: CaseName) -> Self {
        Self {
            name,
            description: None,
            image: None,
            requirement: Requirement::Must,
            setup: None,
            teardown: None,
            verification: None,
        }
    }

    /// Sets the human-readable description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the logical image the case runs against.
    #[must_use]
    pub fn image(mut self, image: impl Into<ImageRef>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Marks the case as optional ("SHOULD").
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.requirement = Requirement::Should;
        self
    }

    /// Sets the requirement level explicitly.
    #[must_use]
    pub const fn requirement(mut self, requirement: Requirement) -> Self {
        self.requirement = requirement;
        self
    }

    /// Overrides the setup strategy for this case.
    #[must_use]
    pub fn setup(mut self, setup: Arc<dyn SetupStrategy>) -> Self {
        self.setup = Some(setup);
        self
    }

    /// Overrides the teardown strategy for this case.
    #[must_use]
    pub fn teardown(mut self, teardown: Arc<dyn TeardownStrategy>) -> Self {
        self.teardown = Some(teardown);
        self
    }

    /// Sets the verification procedure.
    #[must_use]
    pub fn verify(mut self, verification: impl Verification + 'static) -> Self {
        self.verification = Some(Arc::new(verification));
        self
    }

    /// Validates the descriptor and binds default strategies.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError`] when a required field is missing or empty.
    pub fn build(self) -> Result<TestCase, SuiteError> {
        if self.name.as_str().trim().is_empty() {
            return Err(SuiteError::EmptyField {
                case: self.name,
                field: "name",
            });
        }
        let description = match self.description {
            Some(description) if !description.trim().is_empty() => description,
            _ => {
                return Err(SuiteError::EmptyField {
                    case: self.name,
                    field: "description",
                });
            }
        };
        let image = match self.image {
            Some(image) if !image.as_str().trim().is_empty() => image,
            _ => {
                return Err(SuiteError::EmptyField {
                    case: self.name,
                    field: "image",
                });
            }
        };
        let Some(verification) = self.verification else {
            return Err(SuiteError::MissingVerification(self.name));
        };
        Ok(TestCase {
            name: self.name,
            description,
            image,
            requirement: self.requirement,
            setup: self.setup.unwrap_or_else(|| Arc::new(DefaultSetup::default())),
            teardown: self.teardown.unwrap_or_else(|| Arc::new(DefaultTeardown)),
            verification,
        })
    }
}
