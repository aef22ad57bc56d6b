//! Schema Validator
//!
//! A stage's raw output is deserialized into its typed document, then checked
//! for what the types alone cannot say: non-empty lists and names, version and
//! color formats, upper-case HTTP verbs. The JSON Schema handed to the
//! generation backend is derived from the same types, so the contract and the
//! check share one definition.

pub mod checks;

use crate::models::{BackendSpec, DocumentKind, FrontendSpec, RequirementsDoc, UiSpec};
use checks::Checker;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Bumped whenever a document type or one of its checks changes shape
pub const SCHEMA_VERSION: u32 = 2;

/// One reason a document does not conform, located by a JSON path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Rejection of a whole document
#[derive(Debug, Clone)]
pub struct SchemaError {
    pub kind: DocumentKind,
    pub violations: Vec<SchemaViolation>,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let details: Vec<String> = self.violations.iter().map(|v| v.to_string()).collect();
        write!(
            f,
            "{} does not match its schema ({} violation{}): {}",
            self.kind,
            self.violations.len(),
            if self.violations.len() == 1 { "" } else { "s" },
            details.join("; ")
        )
    }
}

impl std::error::Error for SchemaError {}

/// A document produced by one generation stage
pub trait StageDocument: DeserializeOwned + JsonSchema {
    const KIND: DocumentKind;

    /// Record every constraint the deserialized value breaks
    fn check(&self, checker: &mut Checker);
}

impl StageDocument for RequirementsDoc {
    const KIND: DocumentKind = DocumentKind::RequirementsDoc;

    fn check(&self, checker: &mut Checker) {
        checks::requirements(self, checker);
    }
}

impl StageDocument for BackendSpec {
    const KIND: DocumentKind = DocumentKind::BackendSpec;

    fn check(&self, checker: &mut Checker) {
        checks::backend(self, checker);
    }
}

impl StageDocument for FrontendSpec {
    const KIND: DocumentKind = DocumentKind::FrontendSpec;

    fn check(&self, checker: &mut Checker) {
        checks::frontend(self, checker);
    }
}

impl StageDocument for UiSpec {
    const KIND: DocumentKind = DocumentKind::UiSpec;

    fn check(&self, checker: &mut Checker) {
        checks::ui(self, checker);
    }
}

/// Stateless validator over the fixed document types
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    pub fn new() -> Self {
        Self
    }

    /// Check a raw value for a document kind. Unknown extra properties are
    /// ignored. Succeeds exactly when [`parse`](Self::parse) would.
    pub fn validate(&self, kind: DocumentKind, value: &Value) -> Result<(), SchemaError> {
        match kind {
            DocumentKind::RequirementsDoc => self.check_value::<RequirementsDoc>(value),
            DocumentKind::BackendSpec => self.check_value::<BackendSpec>(value),
            DocumentKind::FrontendSpec => self.check_value::<FrontendSpec>(value),
            DocumentKind::UiSpec => self.check_value::<UiSpec>(value),
        }
    }

    /// Deserialize into the typed document and check it
    pub fn parse<T: StageDocument>(&self, value: Value) -> Result<T, SchemaError> {
        let doc: T = serde_json::from_value(value).map_err(deserialize_error::<T>)?;
        Self::checked(doc)
    }

    /// JSON Schema (draft 2020-12) for a document kind
    pub fn json_schema(&self, kind: DocumentKind) -> Value {
        match kind {
            DocumentKind::RequirementsDoc => schemars::schema_for!(RequirementsDoc).to_value(),
            DocumentKind::BackendSpec => schemars::schema_for!(BackendSpec).to_value(),
            DocumentKind::FrontendSpec => schemars::schema_for!(FrontendSpec).to_value(),
            DocumentKind::UiSpec => schemars::schema_for!(UiSpec).to_value(),
        }
    }

    fn check_value<T: StageDocument>(&self, value: &Value) -> Result<(), SchemaError> {
        let doc = T::deserialize(value).map_err(deserialize_error::<T>)?;
        Self::checked(doc).map(|_| ())
    }

    fn checked<T: StageDocument>(doc: T) -> Result<T, SchemaError> {
        let mut checker = Checker::default();
        doc.check(&mut checker);
        let violations = checker.into_violations();
        if violations.is_empty() {
            Ok(doc)
        } else {
            Err(SchemaError {
                kind: T::KIND,
                violations,
            })
        }
    }
}

fn deserialize_error<T: StageDocument>(e: serde_json::Error) -> SchemaError {
    SchemaError {
        kind: T::KIND,
        violations: vec![SchemaViolation {
            path: "$".to_string(),
            message: e.to_string(),
        }],
    }
}
