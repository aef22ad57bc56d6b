// In-memory artifact store

use super::{check_project_name, sort_artifacts, ArtifactStore};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{Artifact, ArtifactType, ProjectGraph, ProjectRecord};
use crate::versioning::next_store_version;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MemoryState {
    projects: BTreeMap<String, ProjectRecord>,
    artifacts: HashMap<(String, ArtifactType), Artifact>,
    /// Serialized graphs, as a persistent store would hold them
    graphs: HashMap<String, String>,
}

/// Mutex-guarded map store. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    state: Mutex<MemoryState>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> PipelineResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| PipelineError::persistence("store", format!("Lock error: {}", e)))
    }
}

fn require_project(state: &MemoryState, project_id: &str) -> PipelineResult<()> {
    if state.projects.contains_key(project_id) {
        Ok(())
    } else {
        Err(PipelineError::project_not_found(project_id))
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn create_project(&self, name: &str) -> PipelineResult<ProjectRecord> {
        check_project_name(name)?;
        let record = ProjectRecord::new(&uuid::Uuid::new_v4().to_string(), name.trim());
        let mut state = self.lock()?;
        state
            .graphs
            .insert(record.id.clone(), ProjectGraph::new().to_json()?);
        state.projects.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn get_project(&self, project_id: &str) -> PipelineResult<ProjectRecord> {
        self.lock()?
            .projects
            .get(project_id)
            .cloned()
            .ok_or_else(|| PipelineError::project_not_found(project_id))
    }

    fn list_projects(&self) -> PipelineResult<Vec<ProjectRecord>> {
        let mut projects: Vec<ProjectRecord> = self.lock()?.projects.values().cloned().collect();
        projects.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(projects)
    }

    fn delete_project(&self, project_id: &str) -> PipelineResult<()> {
        let mut state = self.lock()?;
        require_project(&state, project_id)?;
        state.projects.remove(project_id);
        state.graphs.remove(project_id);
        state.artifacts.retain(|(pid, _), _| pid != project_id);
        Ok(())
    }

    fn upsert(
        &self,
        project_id: &str,
        artifact_type: ArtifactType,
        content: &str,
    ) -> PipelineResult<u32> {
        let mut state = self.lock()?;
        require_project(&state, project_id)?;
        let key = (project_id.to_string(), artifact_type);
        let version = next_store_version(state.artifacts.get(&key).map(|a| a.version));
        state.artifacts.insert(
            key,
            Artifact {
                project_id: project_id.to_string(),
                artifact_type,
                content: content.to_string(),
                version,
                updated_at: Utc::now(),
            },
        );
        Ok(version)
    }

    fn get(&self, project_id: &str, artifact_type: ArtifactType) -> PipelineResult<Artifact> {
        let state = self.lock()?;
        require_project(&state, project_id)?;
        state
            .artifacts
            .get(&(project_id.to_string(), artifact_type))
            .cloned()
            .ok_or_else(|| PipelineError::artifact_not_found(project_id, &artifact_type))
    }

    fn list(&self, project_id: &str) -> PipelineResult<Vec<Artifact>> {
        let state = self.lock()?;
        require_project(&state, project_id)?;
        let mut artifacts: Vec<Artifact> = state
            .artifacts
            .values()
            .filter(|a| a.project_id == project_id)
            .cloned()
            .collect();
        sort_artifacts(&mut artifacts);
        Ok(artifacts)
    }

    fn save_graph(&self, project_id: &str, graph: &ProjectGraph) -> PipelineResult<()> {
        let content = graph.to_json()?;
        let mut state = self.lock()?;
        require_project(&state, project_id)?;
        state.graphs.insert(project_id.to_string(), content);
        Ok(())
    }

    fn load_graph(&self, project_id: &str) -> PipelineResult<ProjectGraph> {
        let state = self.lock()?;
        require_project(&state, project_id)?;
        match state.graphs.get(project_id) {
            Some(content) => ProjectGraph::from_json(content),
            None => Err(PipelineError::NotFound {
                kind: "Graph",
                id: project_id.to_string(),
            }),
        }
    }
}
