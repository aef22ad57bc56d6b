// Structured design documents produced by the generation stages

use super::artifact::ArtifactType;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four schema-validated documents, in stage order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    RequirementsDoc,
    BackendSpec,
    FrontendSpec,
    UiSpec,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 4] = [
        DocumentKind::RequirementsDoc,
        DocumentKind::BackendSpec,
        DocumentKind::FrontendSpec,
        DocumentKind::UiSpec,
    ];

    pub fn artifact_type(&self) -> ArtifactType {
        match self {
            DocumentKind::RequirementsDoc => ArtifactType::RequirementsDoc,
            DocumentKind::BackendSpec => ArtifactType::BackendSpec,
            DocumentKind::FrontendSpec => ArtifactType::FrontendSpec,
            DocumentKind::UiSpec => ArtifactType::UiSpec,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentKind::RequirementsDoc => "requirements",
            DocumentKind::BackendSpec => "backend spec",
            DocumentKind::FrontendSpec => "frontend spec",
            DocumentKind::UiSpec => "UI spec",
        };
        write!(f, "{}", name)
    }
}

/// A feature listed in the requirements doc
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Feature {
    pub title: String,
    pub description: String,
}

impl Feature {
    pub fn new(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
        }
    }
}

/// Product requirements document ("PRD")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequirementsDoc {
    pub title: String,
    /// Semantic "major.minor" document revision, for example "1.0"
    pub version: String,
    #[schemars(length(min = 1))]
    pub features: Vec<Feature>,
    pub last_updated: DateTime<Utc>,
}

impl RequirementsDoc {
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str(&format!("# {} (v{})\n\n", self.title, self.version));
        md.push_str(&format!(
            "_Last updated: {}_\n\n",
            self.last_updated.to_rfc3339()
        ));
        md.push_str("## Features\n\n");
        for (i, feature) in self.features.iter().enumerate() {
            md.push_str(&format!("### {}. {}\n\n", i + 1, feature.title));
            md.push_str(&format!("{}\n\n", feature.description));
        }
        md
    }
}

/// Relationship multiplicity between two data entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntityField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default = "default_true")]
    pub required: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EntityRelation {
    /// Name of the related entity
    pub target: String,
    pub cardinality: Cardinality,
    #[serde(default)]
    pub label: Option<String>,
}

/// A persisted data entity declared by the backend spec
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DataEntity {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[schemars(length(min = 1))]
    pub fields: Vec<EntityField>,
    #[serde(default)]
    pub relations: Vec<EntityRelation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiEndpoint {
    /// Upper-case HTTP verb: GET, POST, PUT, PATCH or DELETE
    pub method: String,
    pub path: String,
    pub description: String,
    #[serde(default)]
    pub auth_required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackendSpec {
    pub overview: String,
    #[serde(default)]
    pub architecture: String,
    #[schemars(length(min = 1))]
    pub entities: Vec<DataEntity>,
    pub endpoints: Vec<ApiEndpoint>,
}

impl BackendSpec {
    pub fn to_markdown(&self) -> String {
        let mut md = String::from("# Backend Specification\n\n");
        md.push_str(&format!("{}\n\n", self.overview));
        if !self.architecture.is_empty() {
            md.push_str(&format!("## Architecture\n\n{}\n\n", self.architecture));
        }

        md.push_str("## Data Entities\n\n");
        for entity in &self.entities {
            md.push_str(&format!("### {}\n\n", entity.name));
            if !entity.description.is_empty() {
                md.push_str(&format!("{}\n\n", entity.description));
            }
            md.push_str("| Field | Type | Notes |\n|---|---|---|\n");
            for field in &entity.fields {
                let mut notes = Vec::new();
                if field.primary_key {
                    notes.push("primary key");
                }
                if !field.required {
                    notes.push("optional");
                }
                md.push_str(&format!(
                    "| {} | {} | {} |\n",
                    field.name,
                    field.field_type,
                    notes.join(", ")
                ));
            }
            md.push('\n');
        }

        md.push_str("## API Endpoints\n\n");
        for endpoint in &self.endpoints {
            let auth = if endpoint.auth_required { " (auth)" } else { "" };
            md.push_str(&format!(
                "- `{} {}`{} - {}\n",
                endpoint.method.to_uppercase(),
                endpoint.path,
                auth,
                endpoint.description
            ));
        }
        md.push('\n');
        md
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Page {
    pub name: String,
    pub route: String,
    pub description: String,
    #[serde(default)]
    pub components: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FrontendSpec {
    pub framework: String,
    pub state_management: String,
    #[schemars(length(min = 1))]
    pub pages: Vec<Page>,
    #[serde(default)]
    pub shared_components: Vec<String>,
}

impl FrontendSpec {
    pub fn to_markdown(&self) -> String {
        let mut md = String::from("# Frontend Specification\n\n");
        md.push_str(&format!("- **Framework:** {}\n", self.framework));
        md.push_str(&format!(
            "- **State management:** {}\n\n",
            self.state_management
        ));
        md.push_str("## Pages\n\n");
        for page in &self.pages {
            md.push_str(&format!("### {} (`{}`)\n\n", page.name, page.route));
            md.push_str(&format!("{}\n\n", page.description));
            if !page.components.is_empty() {
                md.push_str(&format!("Components: {}\n\n", page.components.join(", ")));
            }
        }
        if !self.shared_components.is_empty() {
            md.push_str("## Shared Components\n\n");
            for component in &self.shared_components {
                md.push_str(&format!("- {}\n", component));
            }
            md.push('\n');
        }
        md
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColorToken {
    pub name: String,
    /// `#RGB` or `#RRGGBB`
    pub hex: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Screen {
    pub name: String,
    pub purpose: String,
    #[serde(default)]
    pub elements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UiSpec {
    #[serde(default)]
    pub design_principles: Vec<String>,
    #[serde(default)]
    pub color_palette: Vec<ColorToken>,
    #[serde(default)]
    pub typography: String,
    #[schemars(length(min = 1))]
    pub screens: Vec<Screen>,
}

impl UiSpec {
    pub fn to_markdown(&self) -> String {
        let mut md = String::from("# UI Specification\n\n");
        if !self.design_principles.is_empty() {
            md.push_str("## Design Principles\n\n");
            for principle in &self.design_principles {
                md.push_str(&format!("- {}\n", principle));
            }
            md.push('\n');
        }
        if !self.color_palette.is_empty() {
            md.push_str("## Color Palette\n\n");
            for color in &self.color_palette {
                md.push_str(&format!("- {}: `{}`\n", color.name, color.hex));
            }
            md.push('\n');
        }
        if !self.typography.is_empty() {
            md.push_str(&format!("## Typography\n\n{}\n\n", self.typography));
        }
        md.push_str("## Screens\n\n");
        for screen in &self.screens {
            md.push_str(&format!("### {}\n\n{}\n\n", screen.name, screen.purpose));
            for element in &screen.elements {
                md.push_str(&format!("- {}\n", element));
            }
            if !screen.elements.is_empty() {
                md.push('\n');
            }
        }
        md
    }
}

/// Everything a successful orchestration returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedBundle {
    pub requirements_doc: RequirementsDoc,
    pub backend_spec: BackendSpec,
    pub frontend_spec: FrontendSpec,
    pub ui_spec: UiSpec,
}
