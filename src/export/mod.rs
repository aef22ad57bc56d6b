//! Export Pack Builder
//!
//! Concatenates a target-specific subset of artifacts into one text bundle
//! for a downstream coding assistant. Each target declares which sections it
//! carries and in what order. Documents are required; a missing diagram is
//! replaced by placeholder text. Content is never inspected beyond presence.

pub mod builtin;
pub mod engine;

pub use engine::TemplateEngine;

use crate::classifier::RULESET_VERSION;
use crate::error::{PipelineError, PipelineResult};
use crate::models::{
    ArtifactType, BackendSpec, ExportTarget, FrontendSpec, GeneratedBundle, RequirementsDoc,
    UiSpec,
};
use crate::schema::SCHEMA_VERSION;
use serde::Serialize;
use std::path::Path;
use tera::Context;

/// A section an export pack can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackSection {
    Requirements,
    Backend,
    Frontend,
    Ui,
    FlowDiagram,
    ErDiagram,
}

impl PackSection {
    pub fn heading(&self) -> &'static str {
        match self {
            PackSection::Requirements => "Product Requirements",
            PackSection::Backend => "Backend Specification",
            PackSection::Frontend => "Frontend Specification",
            PackSection::Ui => "UI Specification",
            PackSection::FlowDiagram => "Module Flow",
            PackSection::ErDiagram => "Data Model",
        }
    }

    pub fn artifact_type(&self) -> ArtifactType {
        match self {
            PackSection::Requirements => ArtifactType::RequirementsDoc,
            PackSection::Backend => ArtifactType::BackendSpec,
            PackSection::Frontend => ArtifactType::FrontendSpec,
            PackSection::Ui => ArtifactType::UiSpec,
            PackSection::FlowDiagram => ArtifactType::FlowDiagram,
            PackSection::ErDiagram => ArtifactType::ErDiagram,
        }
    }

    pub fn is_diagram(&self) -> bool {
        matches!(self, PackSection::FlowDiagram | PackSection::ErDiagram)
    }
}

/// Sections carried by a target, in output order
pub fn pack_sections(target: ExportTarget) -> &'static [PackSection] {
    use PackSection::*;
    match target {
        ExportTarget::Cursor => &[Requirements, Frontend, Ui, FlowDiagram],
        ExportTarget::Claude => &[Requirements, Backend, Frontend, Ui, FlowDiagram, ErDiagram],
        ExportTarget::Copilot => &[Requirements, Backend, Frontend],
        ExportTarget::Windsurf => &[Requirements, Backend, Ui, ErDiagram, FlowDiagram],
    }
}

/// Everything a pack may draw from
#[derive(Debug, Clone, Default)]
pub struct PackInputs<'a> {
    pub requirements_doc: Option<&'a RequirementsDoc>,
    pub backend_spec: Option<&'a BackendSpec>,
    pub frontend_spec: Option<&'a FrontendSpec>,
    pub ui_spec: Option<&'a UiSpec>,
    pub flow_diagram: Option<&'a str>,
    pub er_diagram: Option<&'a str>,
    /// Module labels in suggested implementation order; omitted when empty
    pub build_order: Vec<String>,
}

impl<'a> PackInputs<'a> {
    pub fn from_bundle(bundle: &'a GeneratedBundle) -> Self {
        Self {
            requirements_doc: Some(&bundle.requirements_doc),
            backend_spec: Some(&bundle.backend_spec),
            frontend_spec: Some(&bundle.frontend_spec),
            ui_spec: Some(&bundle.ui_spec),
            ..Self::default()
        }
    }

    pub fn with_diagrams(mut self, flow: Option<&'a str>, erd: Option<&'a str>) -> Self {
        self.flow_diagram = flow;
        self.er_diagram = erd;
        self
    }

    pub fn with_build_order(mut self, build_order: Vec<String>) -> Self {
        self.build_order = build_order;
        self
    }

    /// Section body, or `None` when a required document is absent
    fn section_body(&self, section: PackSection) -> Option<String> {
        match section {
            PackSection::Requirements => self
                .requirements_doc
                .map(|d| demote_headings(&d.to_markdown())),
            PackSection::Backend => self.backend_spec.map(|d| demote_headings(&d.to_markdown())),
            PackSection::Frontend => self
                .frontend_spec
                .map(|d| demote_headings(&d.to_markdown())),
            PackSection::Ui => self.ui_spec.map(|d| demote_headings(&d.to_markdown())),
            PackSection::FlowDiagram => Some(
                self.flow_diagram
                    .map(mermaid_block)
                    .unwrap_or_else(|| builtin::FLOW_PLACEHOLDER.to_string()),
            ),
            PackSection::ErDiagram => Some(
                self.er_diagram
                    .map(mermaid_block)
                    .unwrap_or_else(|| builtin::ERD_PLACEHOLDER.to_string()),
            ),
        }
    }
}

#[derive(Debug, Serialize)]
struct SectionContext {
    heading: &'static str,
    body: String,
}

fn mermaid_block(diagram: &str) -> String {
    format!("```mermaid\n{}\n```", diagram.trim_end())
}

/// Push every markdown heading two levels down so documents nest under a section
fn demote_headings(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len() + 32);
    for line in markdown.trim_end().lines() {
        if line.starts_with('#') {
            out.push_str("##");
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim_end().to_string()
}

pub struct ExportPackBuilder {
    engine: TemplateEngine,
}

impl ExportPackBuilder {
    /// Builder with the built-in template for every target
    pub fn new() -> PipelineResult<Self> {
        let builder = Self {
            engine: TemplateEngine::new(),
        };
        for target in ExportTarget::ALL {
            builder.override_template(target, builtin::template_source(target))?;
        }
        Ok(builder)
    }

    /// Built-in templates, replaced by `<dir>/<target>.md.tera` where present
    pub fn with_template_dir(dir: &Path) -> PipelineResult<Self> {
        let builder = Self::new()?;
        for target in ExportTarget::ALL {
            let path = dir.join(format!("{}.md.tera", builtin::template_name(target)));
            if !path.exists() {
                continue;
            }
            let source = std::fs::read_to_string(&path).map_err(|e| {
                PipelineError::validation(format!(
                    "Failed to read template {}: {}",
                    path.display(),
                    e
                ))
            })?;
            builder.override_template(target, &source)?;
            log::info!(
                "[ExportPack] Using custom {} template from {}",
                target,
                path.display()
            );
        }
        Ok(builder)
    }

    pub fn override_template(&self, target: ExportTarget, source: &str) -> PipelineResult<()> {
        self.engine
            .add_template(builtin::template_name(target), source)
            .map_err(|e| PipelineError::validation(e.to_string()))
    }

    pub fn build_pack(&self, target: ExportTarget, inputs: &PackInputs<'_>) -> PipelineResult<String> {
        let requirements = inputs.requirements_doc.ok_or_else(|| {
            PipelineError::validation(format!(
                "{} export pack requires the requirements document",
                target
            ))
        })?;

        let mut sections = Vec::new();
        for section in pack_sections(target) {
            let body = inputs.section_body(*section).ok_or_else(|| {
                PipelineError::validation(format!(
                    "{} export pack requires the {} artifact",
                    target,
                    section.artifact_type()
                ))
            })?;
            sections.push(SectionContext {
                heading: section.heading(),
                body,
            });
        }

        let mut ctx = Context::new();
        ctx.insert("target", target.name());
        ctx.insert("project_title", &requirements.title);
        ctx.insert("version", &requirements.version);
        ctx.insert("sections", &sections);
        ctx.insert("build_order", &inputs.build_order);
        ctx.insert("schema_version", &SCHEMA_VERSION);
        ctx.insert("ruleset_version", &RULESET_VERSION);

        let rendered = self
            .engine
            .render(builtin::template_name(target), &ctx)
            .map_err(|e| PipelineError::validation(e.to_string()))?;
        Ok(format!("{}\n", rendered.trim_end()))
    }

    /// One pack per target, in the order given
    pub fn build_all(
        &self,
        targets: &[ExportTarget],
        inputs: &PackInputs<'_>,
    ) -> PipelineResult<Vec<(ExportTarget, String)>> {
        targets
            .iter()
            .map(|target| Ok((*target, self.build_pack(*target, inputs)?)))
            .collect()
    }
}
