//! Orchestrator
//!
//! Sequences the generation stages. The requirements doc is generated and
//! validated first; the backend, frontend and UI specs depend only on it and
//! run concurrently. Every stage output passes the schema validator before it
//! is accepted, and any failure aborts the whole run without a partial bundle.

pub mod backend;
pub mod command_backend;
pub mod prompts;

pub use backend::{BackendError, GenerationBackend, GenerationConfig, GenerationRequest};
pub use command_backend::CommandBackend;

use crate::error::{PipelineError, PipelineResult};
use crate::graph::ModuleGraphBuilder;
use crate::models::{
    BackendSpec, DocumentKind, FrontendSpec, GeneratedBundle, Idea, ProjectGraph,
    RequirementsDoc, UiSpec,
};
use crate::schema::{SchemaValidator, StageDocument};
use crate::versioning::next_document_version;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// A single regenerated document
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutput {
    Requirements(RequirementsDoc),
    Backend(BackendSpec),
    Frontend(FrontendSpec),
    Ui(UiSpec),
}

impl StageOutput {
    pub fn kind(&self) -> DocumentKind {
        match self {
            StageOutput::Requirements(_) => DocumentKind::RequirementsDoc,
            StageOutput::Backend(_) => DocumentKind::BackendSpec,
            StageOutput::Frontend(_) => DocumentKind::FrontendSpec,
            StageOutput::Ui(_) => DocumentKind::UiSpec,
        }
    }

    /// Stored artifact content
    pub fn to_json(&self) -> PipelineResult<String> {
        let result = match self {
            StageOutput::Requirements(doc) => serde_json::to_string_pretty(doc),
            StageOutput::Backend(doc) => serde_json::to_string_pretty(doc),
            StageOutput::Frontend(doc) => serde_json::to_string_pretty(doc),
            StageOutput::Ui(doc) => serde_json::to_string_pretty(doc),
        };
        result.map_err(|e| {
            PipelineError::persistence(self.kind().artifact_type().to_string(), e.to_string())
        })
    }
}

/// Generation orchestrator. Holds no global state; every collaborator is
/// passed in at construction.
pub struct Orchestrator<B: GenerationBackend> {
    backend: Arc<B>,
    validator: SchemaValidator,
    graph_builder: ModuleGraphBuilder,
    config: GenerationConfig,
}

impl<B: GenerationBackend> Orchestrator<B> {
    pub fn new(
        backend: Arc<B>,
        validator: SchemaValidator,
        graph_builder: ModuleGraphBuilder,
        config: GenerationConfig,
    ) -> Self {
        Self {
            backend,
            validator,
            graph_builder,
            config,
        }
    }

    /// Default validator, classifier rules and sampling settings
    pub fn with_backend(backend: Arc<B>) -> Self {
        Self::new(
            backend,
            SchemaValidator::new(),
            ModuleGraphBuilder::default(),
            GenerationConfig::default(),
        )
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn graph_builder(&self) -> &ModuleGraphBuilder {
        &self.graph_builder
    }

    pub fn validator(&self) -> &SchemaValidator {
        &self.validator
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Run every stage. `graph` is context only: its in-scope modules are
    /// summarised into the stage-2 prompts.
    pub async fn generate(
        &self,
        idea: &Idea,
        graph: &ProjectGraph,
    ) -> PipelineResult<GeneratedBundle> {
        idea.validate()?;
        log::info!("[Orchestrator] Generating artifacts for '{}'", idea.title);

        let requirements_doc = self.generate_requirements(idea, None).await?;

        let summary = prompts::summarize_graph(graph);
        let requirements = &requirements_doc;
        let (backend_spec, frontend_spec, ui_spec) = tokio::try_join!(
            self.generate_spec::<BackendSpec>(
                DocumentKind::BackendSpec,
                idea,
                requirements,
                &summary,
                None
            ),
            self.generate_spec::<FrontendSpec>(
                DocumentKind::FrontendSpec,
                idea,
                requirements,
                &summary,
                None
            ),
            self.generate_spec::<UiSpec>(DocumentKind::UiSpec, idea, requirements, &summary, None),
        )?;

        log::info!(
            "[Orchestrator] Generated requirements v{} with {} features",
            requirements_doc.version,
            requirements_doc.features.len()
        );

        Ok(GeneratedBundle {
            requirements_doc,
            backend_spec,
            frontend_spec,
            ui_spec,
        })
    }

    /// [`generate`](Self::generate) bounded by a deadline. In-flight stage
    /// calls are dropped when it expires.
    pub async fn generate_within(
        &self,
        idea: &Idea,
        graph: &ProjectGraph,
        deadline: Duration,
    ) -> PipelineResult<GeneratedBundle> {
        match tokio::time::timeout(deadline, self.generate(idea, graph)).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!(
                    "[Orchestrator] Generation for '{}' exceeded {:?}",
                    idea.title,
                    deadline
                );
                Err(PipelineError::Timeout(deadline))
            }
        }
    }

    /// Re-run a single stage.
    ///
    /// `previous` is the stored JSON of the document being replaced. A spec
    /// stage needs the current requirements doc; the requirements stage
    /// ignores `requirements` and bumps the minor version of `previous`.
    pub async fn regenerate(
        &self,
        stage: DocumentKind,
        idea: &Idea,
        requirements: Option<&RequirementsDoc>,
        graph: &ProjectGraph,
        previous: Option<&str>,
    ) -> PipelineResult<StageOutput> {
        idea.validate()?;
        log::info!("[Orchestrator] Regenerating {} for '{}'", stage, idea.title);

        let summary = prompts::summarize_graph(graph);
        let need_requirements = || {
            requirements.ok_or_else(|| {
                PipelineError::validation(format!(
                    "regenerating the {} requires a requirements document",
                    stage
                ))
            })
        };

        Ok(match stage {
            DocumentKind::RequirementsDoc => {
                let previous_doc = previous.and_then(|content| {
                    serde_json::from_str::<RequirementsDoc>(content)
                        .map_err(|e| {
                            log::warn!(
                                "[Orchestrator] Ignoring unreadable previous requirements: {}",
                                e
                            )
                        })
                        .ok()
                });
                StageOutput::Requirements(
                    self.generate_requirements(idea, previous_doc.as_ref()).await?,
                )
            }
            DocumentKind::BackendSpec => StageOutput::Backend(
                self.generate_spec(stage, idea, need_requirements()?, &summary, previous)
                    .await?,
            ),
            DocumentKind::FrontendSpec => StageOutput::Frontend(
                self.generate_spec(stage, idea, need_requirements()?, &summary, previous)
                    .await?,
            ),
            DocumentKind::UiSpec => StageOutput::Ui(
                self.generate_spec(stage, idea, need_requirements()?, &summary, previous)
                    .await?,
            ),
        })
    }

    /// Stage 1. The orchestrator owns `version` and `lastUpdated`: the values
    /// the backend returns are checked for shape, then replaced.
    pub async fn generate_requirements(
        &self,
        idea: &Idea,
        previous: Option<&RequirementsDoc>,
    ) -> PipelineResult<RequirementsDoc> {
        let stage = DocumentKind::RequirementsDoc;
        let version = next_document_version(previous.map(|doc| doc.version.as_str()))?;

        let raw = self
            .call(stage, prompts::requirements_prompt(idea, version, previous))
            .await?;
        let mut doc: RequirementsDoc = self.accept(stage, raw)?;
        doc.version = version.to_string();
        doc.last_updated = Utc::now();
        Ok(doc)
    }

    async fn generate_spec<T: StageDocument>(
        &self,
        stage: DocumentKind,
        idea: &Idea,
        requirements: &RequirementsDoc,
        graph_summary: &str,
        previous: Option<&str>,
    ) -> PipelineResult<T> {
        let prompt = prompts::spec_prompt(stage, idea, requirements, graph_summary, previous);
        let raw = self.call(stage, prompt).await?;
        self.accept(stage, raw)
    }

    async fn call(&self, stage: DocumentKind, user_prompt: String) -> PipelineResult<Value> {
        let request = GenerationRequest {
            stage,
            schema: self.validator.json_schema(stage),
            system_prompt: prompts::system_prompt(stage),
            user_prompt,
            config: self.config.clone(),
        };

        log::debug!("[Orchestrator] Calling backend for {} stage", stage);
        self.backend
            .generate_structured(request)
            .await
            .map_err(|e| {
                log::warn!("[Orchestrator] {} stage failed: {}", stage, e);
                PipelineError::generation(stage, e.to_string())
            })
    }

    fn accept<T: StageDocument>(&self, stage: DocumentKind, raw: Value) -> PipelineResult<T> {
        self.validator.parse::<T>(raw).map_err(|e| {
            log::warn!("[Orchestrator] Rejected {} output: {}", stage, e);
            PipelineError::generation(stage, e.to_string())
        })
    }
}
