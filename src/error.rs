// Error taxonomy shared by every pipeline component

use crate::models::{ArtifactType, DocumentKind};
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the generation pipeline and its collaborators
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed or missing required input field. Reported before any side effect.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A referenced project, graph or artifact does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A generation stage failed, either in the backend or in schema validation
    #[error("Generation failed at {stage} stage: {reason}")]
    Generation { stage: DocumentKind, reason: String },

    /// An artifact store write failed. Earlier writes stay committed.
    #[error("Failed to persist {artifact}: {reason}")]
    Persistence { artifact: String, reason: String },

    /// The caller-supplied deadline expired before generation finished
    #[error("Generation exceeded its deadline of {0:?}")]
    Timeout(Duration),
}

/// Result alias used across the core
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    pub fn validation(message: impl Into<String>) -> Self {
        PipelineError::Validation(message.into())
    }

    pub fn project_not_found(project_id: &str) -> Self {
        PipelineError::NotFound {
            kind: "Project",
            id: project_id.to_string(),
        }
    }

    pub fn artifact_not_found(project_id: &str, artifact_type: &ArtifactType) -> Self {
        PipelineError::NotFound {
            kind: "Artifact",
            id: format!("{}/{}", project_id, artifact_type),
        }
    }

    pub fn generation(stage: DocumentKind, reason: impl Into<String>) -> Self {
        PipelineError::Generation {
            stage,
            reason: reason.into(),
        }
    }

    pub fn persistence(artifact: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::Persistence {
            artifact: artifact.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error should trigger the configured rollback policy
    pub fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            PipelineError::Generation { .. } | PipelineError::Timeout(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_error_display_names_stage() {
        let err = PipelineError::generation(DocumentKind::BackendSpec, "missing field `entities`");
        assert_eq!(
            err.to_string(),
            "Generation failed at backend spec stage: missing field `entities`"
        );
        assert!(err.is_generation_failure());
    }

    #[test]
    fn test_timeout_counts_as_generation_failure() {
        let err = PipelineError::Timeout(Duration::from_secs(5));
        assert!(err.is_generation_failure());
        assert!(!PipelineError::validation("x").is_generation_failure());
    }

    #[test]
    fn test_not_found_display() {
        let err = PipelineError::artifact_not_found("p1", &ArtifactType::FlowDiagram);
        assert_eq!(err.to_string(), "Artifact not found: p1/FlowDiagram");
    }
}
