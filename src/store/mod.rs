//! Artifact Store contract
//!
//! Artifacts are keyed by (project id, artifact type). Every upsert of a key
//! is atomic on its own and bumps that key's integer version by exactly one;
//! there is no transaction spanning several keys. The module graph is kept
//! next to the artifacts and serialized only at this boundary.

pub mod memory;

pub use memory::MemoryArtifactStore;

use crate::error::PipelineResult;
use crate::models::{Artifact, ArtifactType, ProjectGraph, ProjectRecord};

pub trait ArtifactStore: Send + Sync {
    /// Create a project with a fresh id and an empty graph
    fn create_project(&self, name: &str) -> PipelineResult<ProjectRecord>;

    /// `NotFound` when the project does not exist
    fn get_project(&self, project_id: &str) -> PipelineResult<ProjectRecord>;

    fn list_projects(&self) -> PipelineResult<Vec<ProjectRecord>>;

    /// Remove a project with its graph and every artifact
    fn delete_project(&self, project_id: &str) -> PipelineResult<()>;

    /// Insert or replace an artifact, returning its new version (1 on insert)
    fn upsert(
        &self,
        project_id: &str,
        artifact_type: ArtifactType,
        content: &str,
    ) -> PipelineResult<u32>;

    fn get(&self, project_id: &str, artifact_type: ArtifactType) -> PipelineResult<Artifact>;

    /// Stored artifacts of a project, in `ArtifactType::all()` order
    fn list(&self, project_id: &str) -> PipelineResult<Vec<Artifact>>;

    /// Replace the project graph (last writer wins)
    fn save_graph(&self, project_id: &str, graph: &ProjectGraph) -> PipelineResult<()>;

    fn load_graph(&self, project_id: &str) -> PipelineResult<ProjectGraph>;

    fn project_exists(&self, project_id: &str) -> bool {
        self.get_project(project_id).is_ok()
    }
}

/// Project names must contain something printable
pub(crate) fn check_project_name(name: &str) -> PipelineResult<()> {
    if name.trim().is_empty() {
        return Err(crate::error::PipelineError::validation(
            "project name must not be empty",
        ));
    }
    Ok(())
}

/// Order artifacts the way `ArtifactType::all()` lists their types
pub(crate) fn sort_artifacts(artifacts: &mut [Artifact]) {
    let order = ArtifactType::all();
    artifacts.sort_by_key(|a| {
        order
            .iter()
            .position(|t| *t == a.artifact_type)
            .unwrap_or(usize::MAX)
    });
}
