//! Command-line surface
//!
//! Each subcommand resolves configuration, opens the file store and calls
//! into the pipeline or one of the pure components. Handlers return the text
//! to print so they can be exercised without a terminal.

use crate::config::merger::{
    PartialGenerationSettings, PartialPipelineSettings, PartialStorageSettings,
};
use crate::config::{self, PartialConfig, SpecforgeConfig};
use crate::diagrams::{render_erd, render_flow, sanitize_collisions};
use crate::file_storage::{atomic_write, FileArtifactStore};
use crate::graph::{build_order_labels, DependencyGraph};
use crate::models::{ArtifactType, BackendSpec, DocumentKind, ExportTarget, Idea, ProjectGraph};
use crate::orchestrator::CommandBackend;
use crate::pipeline::{GraphUpdate, Pipeline, RollbackPolicy};
use crate::schema::SchemaValidator;
use crate::store::ArtifactStore;
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Specforge - turn a product idea into design artifacts and a module graph
#[derive(Parser, Debug)]
#[command(name = "specforge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory whose .specforge/config.toml is the project config layer
    #[arg(long, global = true, default_value = ".")]
    pub dir: PathBuf,

    /// Artifact store root (overrides config)
    #[arg(long, global = true, env = "SPECFORGE_STORAGE")]
    pub storage: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a project and print its id
    Init {
        name: String,
        /// Also write the resolved config to <dir>/.specforge/config.toml
        #[arg(long)]
        write_config: bool,
    },
    /// Generate every artifact of a project from an idea file (YAML or JSON)
    Generate {
        project: String,
        idea: PathBuf,
        /// Regenerate a single document instead of the whole set
        #[arg(long, value_enum)]
        stage: Option<StageArg>,
        /// Deadline in seconds for the whole generation
        #[arg(long)]
        timeout: Option<u64>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long, value_enum)]
        rollback: Option<RollbackArg>,
    },
    /// Inspect or replace a project's module graph
    Graph {
        project: String,
        #[command(subcommand)]
        action: Option<GraphAction>,
    },
    /// Print a diagram derived from stored artifacts
    Render {
        project: String,
        #[arg(value_enum)]
        diagram: DiagramArg,
    },
    /// Rebuild export packs from stored artifacts
    Export {
        project: String,
        /// Only print this target's pack
        #[arg(long)]
        target: Option<ExportTarget>,
        /// Write each pack to its conventional file name under this directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List a project's artifacts, or print one
    Show {
        project: String,
        artifact: Option<ArtifactType>,
    },
    /// Check a JSON document against a stage schema
    Validate {
        #[arg(value_enum)]
        stage: StageArg,
        /// Document to check; prints the JSON Schema when omitted
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum GraphAction {
    /// Print the graph as JSON (default)
    Show,
    /// Rebuild the graph from the stored requirements doc
    Regenerate,
    /// Replace the graph with a hand-edited JSON file
    Apply { file: PathBuf },
    /// Print in-scope modules in build order
    Order,
    /// Print dependency statistics
    Stats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StageArg {
    Requirements,
    Backend,
    Frontend,
    Ui,
}

impl From<StageArg> for DocumentKind {
    fn from(stage: StageArg) -> Self {
        match stage {
            StageArg::Requirements => DocumentKind::RequirementsDoc,
            StageArg::Backend => DocumentKind::BackendSpec,
            StageArg::Frontend => DocumentKind::FrontendSpec,
            StageArg::Ui => DocumentKind::UiSpec,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RollbackArg {
    Keep,
    DeleteProject,
}

impl From<RollbackArg> for RollbackPolicy {
    fn from(arg: RollbackArg) -> Self {
        match arg {
            RollbackArg::Keep => RollbackPolicy::Keep,
            RollbackArg::DeleteProject => RollbackPolicy::DeleteProject,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DiagramArg {
    Flow,
    Erd,
}

/// Resolved configuration plus the store it points at
pub struct CommandContext {
    pub config: SpecforgeConfig,
    pub store: Arc<dyn ArtifactStore>,
}

impl CommandContext {
    pub fn new(config: SpecforgeConfig, store: Arc<dyn ArtifactStore>) -> Self {
        Self { config, store }
    }

    /// Merge config layers and open the file store
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = config::load_merged_config(Some(&cli.dir), Some(cli_overrides(cli)))?;
        let root = config.storage_root();
        log::debug!("[Cli] Using storage root {}", root.display());
        Ok(Self::new(config, Arc::new(FileArtifactStore::new(root))))
    }

    fn pipeline(&self) -> Result<Pipeline<CommandBackend>> {
        let backend = Arc::new(CommandBackend::new(self.config.backend.clone()));
        Ok(Pipeline::from_config(backend, self.store.clone(), &self.config)?)
    }
}

/// Flags that map onto config keys
pub fn cli_overrides(cli: &Cli) -> PartialConfig {
    let mut overrides = PartialConfig::default();
    if let Some(storage) = &cli.storage {
        overrides.storage = Some(PartialStorageSettings {
            root: Some(storage.display().to_string()),
        });
    }
    if let Commands::Generate {
        timeout,
        model,
        rollback,
        ..
    } = &cli.command
    {
        overrides.generation = Some(PartialGenerationSettings {
            model: model.clone(),
            timeout_secs: *timeout,
            ..Default::default()
        });
        overrides.pipeline = Some(PartialPipelineSettings {
            rollback: rollback.map(RollbackPolicy::from),
            ..Default::default()
        });
    }
    overrides
}

/// Parse an idea file. YAML is a superset of JSON, so both are accepted.
pub fn load_idea(path: &Path) -> Result<Idea> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read idea file '{}'", path.display()))?;
    let idea: Idea = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse idea file '{}'", path.display()))?;
    Ok(idea)
}

/// Run a parsed command and return what should be printed
pub async fn execute(cli: Cli) -> Result<String> {
    let ctx = CommandContext::from_cli(&cli)?;
    match cli.command {
        Commands::Init { name, write_config } => init(&ctx, &cli.dir, &name, write_config),
        Commands::Generate {
            project,
            idea,
            stage,
            timeout,
            ..
        } => {
            let idea = load_idea(&idea)?;
            let deadline = timeout.map(Duration::from_secs);
            generate(&ctx, &project, &idea, stage.map(DocumentKind::from), deadline).await
        }
        Commands::Graph { project, action } => {
            graph(&ctx, &project, action.unwrap_or(GraphAction::Show))
        }
        Commands::Render { project, diagram } => render(&ctx, &project, diagram),
        Commands::Export {
            project,
            target,
            out,
        } => export(&ctx, &project, target, out.as_deref()),
        Commands::Show { project, artifact } => show(&ctx, &project, artifact),
        Commands::Validate { stage, file } => validate(stage.into(), file.as_deref()),
    }
}

pub fn init(ctx: &CommandContext, dir: &Path, name: &str, write_config: bool) -> Result<String> {
    let record = ctx.store.create_project(name)?;
    let mut out = format!("Created project '{}' with id {}\n", record.name, record.id);
    if write_config {
        let path = config::ConfigLoader::new()
            .with_project_path(dir)
            .save_project(&ctx.config)?;
        out.push_str(&format!("Wrote config to {}\n", path.display()));
    }
    Ok(out)
}

pub async fn generate(
    ctx: &CommandContext,
    project: &str,
    idea: &Idea,
    stage: Option<DocumentKind>,
    deadline: Option<Duration>,
) -> Result<String> {
    let pipeline = ctx.pipeline()?;
    let backend = pipeline.orchestrator().backend();
    if !backend.is_available() {
        return Err(anyhow!(
            "Generation backend '{}' not found in PATH",
            backend.settings().command
        ));
    }

    let mut out = String::new();
    match stage {
        Some(stage) => {
            let update = pipeline.regenerate_stage(project, stage, idea).await?;
            for (artifact_type, version) in &update.written {
                out.push_str(&format!("{} v{}\n", artifact_type, version));
            }
        }
        None => {
            let report = pipeline.run(project, idea, deadline).await?;
            for (artifact_type, version) in &report.written {
                out.push_str(&format!("{} v{}\n", artifact_type, version));
            }
            let report = report.into_result()?;
            out.push_str(&format!(
                "Generated {} modules for '{}' (requirements v{})\n",
                report.graph.nodes.len(),
                report.bundle.requirements_doc.title,
                report.bundle.requirements_doc.version
            ));
        }
    }
    Ok(out)
}

pub fn graph(ctx: &CommandContext, project: &str, action: GraphAction) -> Result<String> {
    match action {
        GraphAction::Show => Ok(ctx.store.load_graph(project)?.to_json()?),
        GraphAction::Regenerate => {
            let update = ctx.pipeline()?.regenerate_graph(project)?;
            Ok(describe_graph_update(&update))
        }
        GraphAction::Apply { file } => {
            let content = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read graph file '{}'", file.display()))?;
            let update = ctx
                .pipeline()?
                .update_graph(project, ProjectGraph::from_json(&content)?)?;
            Ok(describe_graph_update(&update))
        }
        GraphAction::Order => {
            let labels = build_order_labels(&ctx.store.load_graph(project)?)?;
            Ok(labels
                .iter()
                .enumerate()
                .map(|(i, label)| format!("{}. {}\n", i + 1, label))
                .collect())
        }
        GraphAction::Stats => {
            let stats = DependencyGraph::in_scope(&ctx.store.load_graph(project)?).stats();
            Ok(format!("{}\n", serde_json::to_string_pretty(&stats)?))
        }
    }
}

fn describe_graph_update(update: &GraphUpdate) -> String {
    let mut out = format!(
        "Graph saved: {} modules, {} edges (FlowDiagram v{})\n",
        update.graph.nodes.len(),
        update.graph.edges.len(),
        update.flow_diagram_version
    );
    for (sanitized, ids) in &update.collisions {
        out.push_str(&format!(
            "warning: modules {} all render as '{}'\n",
            ids.join(", "),
            sanitized
        ));
    }
    out
}

pub fn render(ctx: &CommandContext, project: &str, diagram: DiagramArg) -> Result<String> {
    match diagram {
        DiagramArg::Flow => {
            let graph = ctx.store.load_graph(project)?;
            for (sanitized, ids) in sanitize_collisions(&graph) {
                log::warn!("[Cli] Modules {:?} share the diagram id '{}'", ids, sanitized);
            }
            Ok(format!("{}\n", render_flow(&graph)))
        }
        DiagramArg::Erd => {
            let artifact = ctx.store.get(project, ArtifactType::BackendSpec)?;
            let spec: BackendSpec = serde_json::from_str(&artifact.content)
                .context("Stored backend spec is unreadable")?;
            Ok(format!("{}\n", render_erd(&spec)))
        }
    }
}

pub fn export(
    ctx: &CommandContext,
    project: &str,
    target: Option<ExportTarget>,
    out_dir: Option<&Path>,
) -> Result<String> {
    let written = ctx.pipeline()?.rebuild_exports(project)?;
    let mut out = String::new();

    for (artifact_type, version) in written {
        let pack_target = match artifact_type {
            ArtifactType::ExportPack(t) => t,
            _ => continue,
        };
        if target.is_some_and(|t| t != pack_target) {
            continue;
        }
        let artifact = ctx.store.get(project, artifact_type)?;
        match out_dir {
            Some(dir) => {
                let path = dir.join(pack_target.file_name());
                atomic_write(&path, &artifact.content).map_err(|e| anyhow!(e))?;
                out.push_str(&format!("{} v{} -> {}\n", artifact_type, version, path.display()));
            }
            None if target.is_some() => out.push_str(&artifact.content),
            None => out.push_str(&format!("{} v{}\n", artifact_type, version)),
        }
    }
    Ok(out)
}

pub fn show(ctx: &CommandContext, project: &str, artifact: Option<ArtifactType>) -> Result<String> {
    match artifact {
        Some(artifact_type) => Ok(ctx.store.get(project, artifact_type)?.content),
        None => {
            let record = ctx.store.get_project(project)?;
            let mut out = format!("{} ({})\n", record.name, record.id);
            for artifact in ctx.store.list(project)? {
                out.push_str(&format!(
                    "  {:<20} v{:<4} {}\n",
                    artifact.artifact_type.to_string(),
                    artifact.version,
                    artifact.updated_at.to_rfc3339()
                ));
            }
            Ok(out)
        }
    }
}

pub fn validate(stage: DocumentKind, file: Option<&Path>) -> Result<String> {
    let validator = SchemaValidator::new();
    let Some(path) = file else {
        return Ok(format!(
            "{}\n",
            serde_json::to_string_pretty(&validator.json_schema(stage))?
        ));
    };

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("'{}' is not valid JSON", path.display()))?;
    match validator.validate(stage, &value) {
        Ok(()) => Ok(format!("{} conforms to the {} schema\n", path.display(), stage)),
        Err(e) => Err(anyhow!(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryArtifactStore;
    use tempfile::TempDir;

    fn context() -> CommandContext {
        CommandContext::new(SpecforgeConfig::default(), Arc::new(MemoryArtifactStore::new()))
    }

    #[test]
    fn test_cli_parses_generate_flags() {
        let cli = Cli::try_parse_from([
            "specforge",
            "generate",
            "p1",
            "idea.yaml",
            "--stage",
            "backend",
            "--timeout",
            "30",
            "--rollback",
            "delete-project",
        ])
        .unwrap();

        let overrides = cli_overrides(&cli);
        assert_eq!(overrides.generation.unwrap().timeout_secs, Some(30));
        assert_eq!(
            overrides.pipeline.unwrap().rollback,
            Some(RollbackPolicy::DeleteProject)
        );
        match cli.command {
            Commands::Generate { stage, .. } => assert_eq!(stage, Some(StageArg::Backend)),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_parses_artifact_and_target_names() {
        let cli = Cli::try_parse_from(["specforge", "show", "p1", "ExportPack_Claude"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Show {
                artifact: Some(ArtifactType::ExportPack(ExportTarget::Claude)),
                ..
            }
        ));

        let cli = Cli::try_parse_from(["specforge", "export", "p1", "--target", "windsurf"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Export {
                target: Some(ExportTarget::Windsurf),
                ..
            }
        ));
    }

    #[test]
    fn test_load_idea_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("idea.yaml");
        fs::write(
            &path,
            "title: TaskFlow\nproblem: Tasks get lost\nsolution: A shared board\nplatforms: [web, ios]\ncoreFeatures:\n  - Sign Up\n  - Board View\n",
        )
        .unwrap();

        let idea = load_idea(&path).unwrap();
        assert_eq!(idea.title, "TaskFlow");
        assert_eq!(idea.core_features, vec!["Sign Up", "Board View"]);
        assert_eq!(idea.platforms.len(), 2);
    }

    #[test]
    fn test_init_and_show() {
        let ctx = context();
        let temp_dir = TempDir::new().unwrap();
        let out = init(&ctx, temp_dir.path(), "TaskFlow", false).unwrap();
        assert!(out.starts_with("Created project 'TaskFlow'"));

        let project = &ctx.store.list_projects().unwrap()[0];
        ctx.store
            .upsert(&project.id, ArtifactType::FlowDiagram, "flowchart TD")
            .unwrap();

        let listing = show(&ctx, &project.id, None).unwrap();
        assert!(listing.contains("FlowDiagram"));
        assert!(listing.contains("v1"));
        assert_eq!(
            show(&ctx, &project.id, Some(ArtifactType::FlowDiagram)).unwrap(),
            "flowchart TD"
        );
    }

    #[test]
    fn test_graph_order_and_render() {
        let ctx = context();
        let project = ctx.store.create_project("TaskFlow").unwrap();
        let graph = crate::graph::ModuleGraphBuilder::default().build_graph(&[
            crate::models::Feature::new("Board View", ""),
            crate::models::Feature::new("Sign Up", ""),
        ]);
        ctx.store.save_graph(&project.id, &graph).unwrap();

        let order = super::graph(&ctx, &project.id, GraphAction::Order).unwrap();
        assert_eq!(order, "1. Sign Up\n2. Board View\n");

        let flow = render(&ctx, &project.id, DiagramArg::Flow).unwrap();
        assert!(flow.starts_with("flowchart TD"));
        assert!(flow.contains("module_2 -->|requires user| module_1"));
    }

    #[test]
    fn test_validate_file() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("ui.json");
        fs::write(&good, r#"{"screens": [{"name": "Board", "purpose": "Tasks"}]}"#).unwrap();
        assert!(validate(DocumentKind::UiSpec, Some(&good))
            .unwrap()
            .contains("conforms"));

        let bad = temp_dir.path().join("bad.json");
        fs::write(&bad, r#"{"screens": "none"}"#).unwrap();
        let err = validate(DocumentKind::UiSpec, Some(&bad)).unwrap_err();
        assert!(err.to_string().contains("expected a sequence"));

        fs::write(&bad, r#"{"screens": []}"#).unwrap();
        let err = validate(DocumentKind::UiSpec, Some(&bad)).unwrap_err();
        assert!(err.to_string().contains("$.screens"));

        let schema = validate(DocumentKind::UiSpec, None).unwrap();
        assert!(schema.contains("\"$schema\""));
    }
}
