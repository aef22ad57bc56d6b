//! Pipeline
//!
//! Drives one request end to end: idea → orchestrator → module graph →
//! diagrams → export packs → artifact store. Writes go out one artifact at a
//! time in a fixed order. There is no cross-artifact transaction: a failed
//! write stops the run, everything written before it stays committed, and the
//! report says exactly what made it.

use crate::config::{PipelineSettings, SpecforgeConfig};
use crate::diagrams::{render_erd, render_flow, sanitize_collisions};
use crate::error::{PipelineError, PipelineResult};
use crate::export::{ExportPackBuilder, PackInputs};
use crate::graph::build_order_labels;
use crate::models::{
    ArtifactType, BackendSpec, DocumentKind, FrontendSpec, GeneratedBundle, Idea, ProjectGraph,
    RequirementsDoc, UiSpec,
};
use crate::orchestrator::{GenerationBackend, GenerationConfig, Orchestrator, StageOutput};
use crate::schema::SchemaValidator;
use crate::store::ArtifactStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// What happens to a project whose generation run fails or times out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RollbackPolicy {
    /// Leave the project and whatever it already holds untouched
    #[default]
    Keep,
    /// Delete the project, its graph and all of its artifacts
    DeleteProject,
}

/// Outcome of [`Pipeline::run`]
#[derive(Debug)]
pub struct PipelineReport {
    pub project_id: String,
    pub bundle: GeneratedBundle,
    pub graph: ProjectGraph,
    pub graph_saved: bool,
    /// Committed artifact writes, in write order, with their new versions
    pub written: Vec<(ArtifactType, u32)>,
    /// First failed write; nothing after it was attempted
    pub failure: Option<PipelineError>,
}

impl PipelineReport {
    pub fn is_fully_persisted(&self) -> bool {
        self.failure.is_none()
    }

    pub fn version_of(&self, artifact_type: ArtifactType) -> Option<u32> {
        self.written
            .iter()
            .find(|(t, _)| *t == artifact_type)
            .map(|(_, v)| *v)
    }

    /// Surface a persistence failure as an error
    pub fn into_result(mut self) -> PipelineResult<Self> {
        match self.failure.take() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

/// Result of replacing a project graph
#[derive(Debug, Clone)]
pub struct GraphUpdate {
    pub graph: ProjectGraph,
    pub flow_diagram_version: u32,
    /// Sanitized diagram ids shared by more than one module
    pub collisions: Vec<(String, Vec<String>)>,
}

/// Result of regenerating one document
#[derive(Debug, Clone)]
pub struct StageUpdate {
    pub output: StageOutput,
    pub written: Vec<(ArtifactType, u32)>,
}

pub struct Pipeline<B: GenerationBackend> {
    orchestrator: Orchestrator<B>,
    store: Arc<dyn ArtifactStore>,
    exporter: ExportPackBuilder,
    settings: PipelineSettings,
    default_deadline: Option<Duration>,
}

impl<B: GenerationBackend> Pipeline<B> {
    pub fn new(
        orchestrator: Orchestrator<B>,
        store: Arc<dyn ArtifactStore>,
        exporter: ExportPackBuilder,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            orchestrator,
            store,
            exporter,
            settings,
            default_deadline: None,
        }
    }

    /// Wire every collaborator from a resolved configuration
    pub fn from_config(
        backend: Arc<B>,
        store: Arc<dyn ArtifactStore>,
        config: &SpecforgeConfig,
    ) -> PipelineResult<Self> {
        let orchestrator = Orchestrator::new(
            backend,
            SchemaValidator::new(),
            Default::default(),
            GenerationConfig::from(&config.generation),
        );
        let exporter = match &config.pipeline.templates_dir {
            Some(dir) => ExportPackBuilder::with_template_dir(Path::new(dir))?,
            None => ExportPackBuilder::new()?,
        };
        Ok(Self::new(orchestrator, store, exporter, config.pipeline.clone())
            .with_default_deadline(Duration::from_secs(config.generation.timeout_secs)))
    }

    /// Deadline used when `run` is called without one
    pub fn with_default_deadline(mut self, deadline: Duration) -> Self {
        self.default_deadline = Some(deadline);
        self
    }

    pub fn orchestrator(&self) -> &Orchestrator<B> {
        &self.orchestrator
    }

    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Generate, derive and persist every artifact of a project.
    ///
    /// Validation and NotFound errors happen before any side effect.
    /// Generation failures and timeouts apply the rollback policy. Store
    /// failures are reported in the returned report, not as an `Err`.
    pub async fn run(
        &self,
        project_id: &str,
        idea: &Idea,
        deadline: Option<Duration>,
    ) -> PipelineResult<PipelineReport> {
        idea.validate()?;
        let existing = self.store.load_graph(project_id)?;

        let generated = match deadline.or(self.default_deadline) {
            Some(limit) => {
                self.orchestrator
                    .generate_within(idea, &existing, limit)
                    .await
            }
            None => self.orchestrator.generate(idea, &existing).await,
        };
        let bundle = match generated {
            Ok(bundle) => bundle,
            Err(err) => {
                if err.is_generation_failure() {
                    self.roll_back(project_id);
                }
                return Err(err);
            }
        };

        let graph = self
            .orchestrator
            .graph_builder()
            .build_graph(&bundle.requirements_doc.features);
        let flow = render_flow(&graph);
        let erd = render_erd(&bundle.backend_spec);
        let build_order = self.build_order(&graph);

        let inputs = PackInputs::from_bundle(&bundle)
            .with_diagrams(Some(&flow), Some(&erd))
            .with_build_order(build_order);
        let packs = self
            .exporter
            .build_all(&self.settings.export_targets, &inputs)?;

        let mut pending = vec![
            to_json(ArtifactType::RequirementsDoc, &bundle.requirements_doc)?,
            to_json(ArtifactType::BackendSpec, &bundle.backend_spec)?,
            to_json(ArtifactType::FrontendSpec, &bundle.frontend_spec)?,
            to_json(ArtifactType::UiSpec, &bundle.ui_spec)?,
            (ArtifactType::FlowDiagram, flow),
            (ArtifactType::ErDiagram, erd),
        ];
        pending.extend(
            packs
                .into_iter()
                .map(|(target, text)| (ArtifactType::ExportPack(target), text)),
        );

        let mut report = PipelineReport {
            project_id: project_id.to_string(),
            bundle,
            graph,
            graph_saved: false,
            written: Vec::new(),
            failure: None,
        };

        if let Err(err) = self.store.save_graph(project_id, &report.graph) {
            log::error!("[Pipeline] Failed to save graph for {}: {}", project_id, err);
            report.failure = Some(err);
            return Ok(report);
        }
        report.graph_saved = true;

        let (written, failure) = self.persist(project_id, pending);
        report.written = written;
        report.failure = failure;

        log::info!(
            "[Pipeline] Project {}: {} artifact(s) written{}",
            project_id,
            report.written.len(),
            if report.failure.is_some() { ", stopped on failure" } else { "" }
        );
        Ok(report)
    }

    /// Regenerate one document from the project's stored inputs.
    ///
    /// A new backend spec also refreshes the ER diagram. No rollback is
    /// applied on failure; the stored artifacts stay as they were.
    pub async fn regenerate_stage(
        &self,
        project_id: &str,
        stage: DocumentKind,
        idea: &Idea,
    ) -> PipelineResult<StageUpdate> {
        idea.validate()?;
        let graph = self.store.load_graph(project_id)?;
        let requirements: Option<RequirementsDoc> =
            self.load_document(project_id, ArtifactType::RequirementsDoc)?;
        if stage != DocumentKind::RequirementsDoc && requirements.is_none() {
            return Err(PipelineError::artifact_not_found(
                project_id,
                &ArtifactType::RequirementsDoc,
            ));
        }
        let previous = self.load_content(project_id, stage.artifact_type())?;

        let output = self
            .orchestrator
            .regenerate(stage, idea, requirements.as_ref(), &graph, previous.as_deref())
            .await?;

        let mut pending = vec![(stage.artifact_type(), output.to_json()?)];
        if let StageOutput::Backend(spec) = &output {
            pending.push((ArtifactType::ErDiagram, render_erd(spec)));
        }

        let (written, failure) = self.persist(project_id, pending);
        match failure {
            Some(err) => Err(err),
            None => Ok(StageUpdate { output, written }),
        }
    }

    /// Rebuild the graph wholesale from the stored requirements doc.
    /// Node identity is not preserved.
    pub fn regenerate_graph(&self, project_id: &str) -> PipelineResult<GraphUpdate> {
        let requirements: RequirementsDoc = self
            .load_document(project_id, ArtifactType::RequirementsDoc)?
            .ok_or_else(|| {
                PipelineError::artifact_not_found(project_id, &ArtifactType::RequirementsDoc)
            })?;
        let graph = self
            .orchestrator
            .graph_builder()
            .build_graph(&requirements.features);
        self.replace_graph(project_id, graph)
    }

    /// Replace the graph with a hand-edited one. Last writer wins.
    pub fn update_graph(&self, project_id: &str, graph: ProjectGraph) -> PipelineResult<GraphUpdate> {
        graph.check_integrity()?;
        self.replace_graph(project_id, graph)
    }

    /// Rebuild every configured export pack from what the store holds
    pub fn rebuild_exports(&self, project_id: &str) -> PipelineResult<Vec<(ArtifactType, u32)>> {
        self.store.get_project(project_id)?;
        let requirements: Option<RequirementsDoc> =
            self.load_document(project_id, ArtifactType::RequirementsDoc)?;
        let backend: Option<BackendSpec> =
            self.load_document(project_id, ArtifactType::BackendSpec)?;
        let frontend: Option<FrontendSpec> =
            self.load_document(project_id, ArtifactType::FrontendSpec)?;
        let ui: Option<UiSpec> = self.load_document(project_id, ArtifactType::UiSpec)?;
        let flow = self.load_content(project_id, ArtifactType::FlowDiagram)?;
        let erd = self.load_content(project_id, ArtifactType::ErDiagram)?;
        let graph = self.store.load_graph(project_id)?;

        let inputs = PackInputs {
            requirements_doc: requirements.as_ref(),
            backend_spec: backend.as_ref(),
            frontend_spec: frontend.as_ref(),
            ui_spec: ui.as_ref(),
            flow_diagram: flow.as_deref(),
            er_diagram: erd.as_deref(),
            build_order: self.build_order(&graph),
        };
        let pending: Vec<(ArtifactType, String)> = self
            .exporter
            .build_all(&self.settings.export_targets, &inputs)?
            .into_iter()
            .map(|(target, text)| (ArtifactType::ExportPack(target), text))
            .collect();

        let (written, failure) = self.persist(project_id, pending);
        match failure {
            Some(err) => Err(err),
            None => Ok(written),
        }
    }

    fn replace_graph(&self, project_id: &str, graph: ProjectGraph) -> PipelineResult<GraphUpdate> {
        let collisions = sanitize_collisions(&graph);
        for (sanitized, ids) in &collisions {
            log::warn!(
                "[Pipeline] Modules {:?} share the diagram id '{}'",
                ids,
                sanitized
            );
        }

        self.store.save_graph(project_id, &graph)?;
        let flow_diagram_version =
            self.store
                .upsert(project_id, ArtifactType::FlowDiagram, &render_flow(&graph))?;
        log::info!(
            "[Pipeline] Project {}: graph replaced ({} modules), flow diagram v{}",
            project_id,
            graph.nodes.len(),
            flow_diagram_version
        );

        Ok(GraphUpdate {
            graph,
            flow_diagram_version,
            collisions,
        })
    }

    /// Upsert in order, stopping at the first failure
    fn persist(
        &self,
        project_id: &str,
        pending: Vec<(ArtifactType, String)>,
    ) -> (Vec<(ArtifactType, u32)>, Option<PipelineError>) {
        let mut written = Vec::with_capacity(pending.len());
        for (artifact_type, content) in pending {
            match self.store.upsert(project_id, artifact_type, &content) {
                Ok(version) => written.push((artifact_type, version)),
                Err(err) => {
                    log::error!(
                        "[Pipeline] Failed to write {} for {}: {}",
                        artifact_type,
                        project_id,
                        err
                    );
                    return (written, Some(err));
                }
            }
        }
        (written, None)
    }

    fn roll_back(&self, project_id: &str) {
        match self.settings.rollback {
            RollbackPolicy::Keep => {
                log::info!("[Pipeline] Generation failed; keeping project {}", project_id);
            }
            RollbackPolicy::DeleteProject => match self.store.delete_project(project_id) {
                Ok(()) => log::info!("[Pipeline] Generation failed; deleted project {}", project_id),
                Err(e) => log::warn!("[Pipeline] Rollback of project {} failed: {}", project_id, e),
            },
        }
    }

    fn build_order(&self, graph: &ProjectGraph) -> Vec<String> {
        build_order_labels(graph).unwrap_or_else(|e| {
            log::warn!("[Pipeline] Export packs will omit the build order: {}", e);
            Vec::new()
        })
    }

    /// Stored content of an artifact, `None` when it was never written
    fn load_content(
        &self,
        project_id: &str,
        artifact_type: ArtifactType,
    ) -> PipelineResult<Option<String>> {
        match self.store.get(project_id, artifact_type) {
            Ok(artifact) => Ok(Some(artifact.content)),
            Err(PipelineError::NotFound { kind: "Artifact", .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn load_document<T: DeserializeOwned>(
        &self,
        project_id: &str,
        artifact_type: ArtifactType,
    ) -> PipelineResult<Option<T>> {
        match self.load_content(project_id, artifact_type)? {
            Some(content) => serde_json::from_str(&content).map(Some).map_err(|e| {
                PipelineError::validation(format!("stored {} is unreadable: {}", artifact_type, e))
            }),
            None => Ok(None),
        }
    }
}

/// Serialized document, paired with the artifact type it is stored under
fn to_json<T: Serialize>(
    artifact_type: ArtifactType,
    doc: &T,
) -> PipelineResult<(ArtifactType, String)> {
    serde_json::to_string_pretty(doc)
        .map(|content| (artifact_type, content))
        .map_err(|e| PipelineError::persistence(artifact_type.to_string(), e.to_string()))
}
