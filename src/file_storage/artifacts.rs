// File-backed artifact store

use super::{atomic_write, ensure_dir, read_json, write_json, FileLock};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{Artifact, ArtifactType, ProjectGraph, ProjectRecord};
use crate::store::{check_project_name, sort_artifacts, ArtifactStore};
use crate::versioning::next_store_version;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

const PROJECT_FILE: &str = "project.json";
const GRAPH_FILE: &str = "graph.json";
const ARTIFACTS_DIR: &str = "artifacts";
const LOCK_FILE: &str = ".lock";

/// One directory per project, one JSON file per artifact
#[derive(Debug, Clone)]
pub struct FileArtifactStore {
    root: PathBuf,
}

impl FileArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of a project. Ids are used as path components, so only
    /// `[A-Za-z0-9_-]` is accepted.
    fn project_dir(&self, project_id: &str) -> PipelineResult<PathBuf> {
        let safe = !project_id.is_empty()
            && project_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !safe {
            return Err(PipelineError::validation(format!(
                "invalid project id '{}'",
                project_id
            )));
        }
        Ok(self.root.join(project_id))
    }

    /// Directory of an existing project
    fn existing_project_dir(&self, project_id: &str) -> PipelineResult<PathBuf> {
        let dir = self.project_dir(project_id)?;
        if dir.join(PROJECT_FILE).exists() {
            Ok(dir)
        } else {
            Err(PipelineError::project_not_found(project_id))
        }
    }

    fn artifact_path(dir: &Path, artifact_type: ArtifactType) -> PathBuf {
        dir.join(ARTIFACTS_DIR)
            .join(format!("{}.json", artifact_type.file_stem()))
    }
}

impl ArtifactStore for FileArtifactStore {
    fn create_project(&self, name: &str) -> PipelineResult<ProjectRecord> {
        check_project_name(name)?;
        let record = ProjectRecord::new(&uuid::Uuid::new_v4().to_string(), name.trim());
        let dir = self.project_dir(&record.id)?;
        let to_error = |e: String| PipelineError::persistence("project", e);

        ensure_dir(&dir.join(ARTIFACTS_DIR)).map_err(to_error)?;
        atomic_write(&dir.join(GRAPH_FILE), &ProjectGraph::new().to_json()?).map_err(to_error)?;
        write_json(&dir.join(PROJECT_FILE), &record).map_err(to_error)?;

        log::info!("[FileStorage] Created project {} ({})", record.id, record.name);
        Ok(record)
    }

    fn get_project(&self, project_id: &str) -> PipelineResult<ProjectRecord> {
        let dir = self.existing_project_dir(project_id)?;
        read_json(&dir.join(PROJECT_FILE)).map_err(|e| PipelineError::persistence("project", e))
    }

    fn list_projects(&self) -> PipelineResult<Vec<ProjectRecord>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.root).map_err(|e| {
            PipelineError::persistence("project", format!("Failed to read {:?}: {}", self.root, e))
        })?;

        let mut projects = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path().join(PROJECT_FILE);
            if !path.exists() {
                continue;
            }
            match read_json::<ProjectRecord>(&path) {
                Ok(record) => projects.push(record),
                Err(e) => log::warn!("[FileStorage] Skipping unreadable project: {}", e),
            }
        }
        projects.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(projects)
    }

    fn delete_project(&self, project_id: &str) -> PipelineResult<()> {
        let dir = self.existing_project_dir(project_id)?;
        fs::remove_dir_all(&dir).map_err(|e| {
            PipelineError::persistence("project", format!("Failed to remove {:?}: {}", dir, e))
        })?;
        log::info!("[FileStorage] Deleted project {}", project_id);
        Ok(())
    }

    fn upsert(
        &self,
        project_id: &str,
        artifact_type: ArtifactType,
        content: &str,
    ) -> PipelineResult<u32> {
        let dir = self.existing_project_dir(project_id)?;
        let to_error = |e: String| PipelineError::persistence(artifact_type.to_string(), e);

        let _lock = FileLock::acquire(&dir.join(LOCK_FILE)).map_err(to_error)?;
        let path = Self::artifact_path(&dir, artifact_type);
        let current = if path.exists() {
            Some(read_json::<Artifact>(&path).map_err(to_error)?.version)
        } else {
            None
        };

        let artifact = Artifact {
            project_id: project_id.to_string(),
            artifact_type,
            content: content.to_string(),
            version: next_store_version(current),
            updated_at: Utc::now(),
        };
        write_json(&path, &artifact).map_err(to_error)?;

        log::debug!(
            "[FileStorage] Wrote {} v{} for project {}",
            artifact_type,
            artifact.version,
            project_id
        );
        Ok(artifact.version)
    }

    fn get(&self, project_id: &str, artifact_type: ArtifactType) -> PipelineResult<Artifact> {
        let dir = self.existing_project_dir(project_id)?;
        let path = Self::artifact_path(&dir, artifact_type);
        if !path.exists() {
            return Err(PipelineError::artifact_not_found(project_id, &artifact_type));
        }
        read_json(&path).map_err(|e| PipelineError::persistence(artifact_type.to_string(), e))
    }

    fn list(&self, project_id: &str) -> PipelineResult<Vec<Artifact>> {
        let dir = self.existing_project_dir(project_id)?;
        let mut artifacts = Vec::new();
        for artifact_type in ArtifactType::all() {
            let path = Self::artifact_path(&dir, artifact_type);
            if path.exists() {
                artifacts.push(
                    read_json(&path)
                        .map_err(|e| PipelineError::persistence(artifact_type.to_string(), e))?,
                );
            }
        }
        sort_artifacts(&mut artifacts);
        Ok(artifacts)
    }

    fn save_graph(&self, project_id: &str, graph: &ProjectGraph) -> PipelineResult<()> {
        let dir = self.existing_project_dir(project_id)?;
        let content = graph.to_json()?;
        atomic_write(&dir.join(GRAPH_FILE), &content)
            .map_err(|e| PipelineError::persistence("graph", e))
    }

    fn load_graph(&self, project_id: &str) -> PipelineResult<ProjectGraph> {
        let dir = self.existing_project_dir(project_id)?;
        let path = dir.join(GRAPH_FILE);
        if !path.exists() {
            return Err(PipelineError::NotFound {
                kind: "Graph",
                id: project_id.to_string(),
            });
        }
        let content = fs::read_to_string(&path).map_err(|e| {
            PipelineError::persistence("graph", format!("Failed to read {:?}: {}", path, e))
        })?;
        ProjectGraph::from_json(&content)
    }
}
