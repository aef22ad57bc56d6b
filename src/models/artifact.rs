// Artifact and project records kept by the artifact store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Downstream AI coding tools an export pack can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportTarget {
    Cursor,
    Claude,
    Copilot,
    Windsurf,
}

impl ExportTarget {
    pub const ALL: [ExportTarget; 4] = [
        ExportTarget::Cursor,
        ExportTarget::Claude,
        ExportTarget::Copilot,
        ExportTarget::Windsurf,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ExportTarget::Cursor => "Cursor",
            ExportTarget::Claude => "Claude",
            ExportTarget::Copilot => "Copilot",
            ExportTarget::Windsurf => "Windsurf",
        }
    }

    /// File name the target tool reads the pack from
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportTarget::Cursor => ".cursorrules",
            ExportTarget::Claude => "CLAUDE.md",
            ExportTarget::Copilot => ".github/copilot-instructions.md",
            ExportTarget::Windsurf => ".windsurfrules",
        }
    }
}

impl fmt::Display for ExportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExportTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExportTarget::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown export target '{}'", s))
    }
}

/// Fixed artifact type enumeration. Wire names match `Display`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ArtifactType {
    RequirementsDoc,
    BackendSpec,
    FrontendSpec,
    UiSpec,
    FlowDiagram,
    ErDiagram,
    ExportPack(ExportTarget),
}

impl ArtifactType {
    /// Every artifact type, in the order the pipeline persists them
    pub fn all() -> Vec<ArtifactType> {
        let mut types = vec![
            ArtifactType::RequirementsDoc,
            ArtifactType::BackendSpec,
            ArtifactType::FrontendSpec,
            ArtifactType::UiSpec,
            ArtifactType::FlowDiagram,
            ArtifactType::ErDiagram,
        ];
        types.extend(ExportTarget::ALL.into_iter().map(ArtifactType::ExportPack));
        types
    }

    /// Storage file stem for this type
    pub fn file_stem(&self) -> String {
        self.to_string().to_lowercase()
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactType::RequirementsDoc => f.write_str("RequirementsDoc"),
            ArtifactType::BackendSpec => f.write_str("BackendSpec"),
            ArtifactType::FrontendSpec => f.write_str("FrontendSpec"),
            ArtifactType::UiSpec => f.write_str("UISpec"),
            ArtifactType::FlowDiagram => f.write_str("FlowDiagram"),
            ArtifactType::ErDiagram => f.write_str("ERDiagram"),
            ArtifactType::ExportPack(target) => write!(f, "ExportPack_{}", target.name()),
        }
    }
}

impl FromStr for ArtifactType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(target) = s.strip_prefix("ExportPack_") {
            return target.parse().map(ArtifactType::ExportPack);
        }
        ArtifactType::all()
            .into_iter()
            .find(|t| t.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown artifact type '{}'", s))
    }
}

impl From<ArtifactType> for String {
    fn from(value: ArtifactType) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for ArtifactType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A stored, versioned artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub project_id: String,
    pub artifact_type: ArtifactType,
    pub content: String,
    /// Store-owned counter: 1 on creation, +1 on every update
    pub version: u32,
    pub updated_at: DateTime<Utc>,
}

/// A project the artifacts belong to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl ProjectRecord {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_type_names() {
        assert_eq!(ArtifactType::UiSpec.to_string(), "UISpec");
        assert_eq!(ArtifactType::ErDiagram.to_string(), "ERDiagram");
        assert_eq!(
            ArtifactType::ExportPack(ExportTarget::Cursor).to_string(),
            "ExportPack_Cursor"
        );
    }

    #[test]
    fn test_artifact_type_parse() {
        assert_eq!(
            "exportpack_claude".parse::<ArtifactType>().unwrap(),
            ArtifactType::ExportPack(ExportTarget::Claude)
        );
        assert_eq!(
            "ExportPack_claude".parse::<ArtifactType>().unwrap(),
            ArtifactType::ExportPack(ExportTarget::Claude)
        );
        assert_eq!(
            "uispec".parse::<ArtifactType>().unwrap(),
            ArtifactType::UiSpec
        );
        assert!("Roadmap".parse::<ArtifactType>().is_err());
    }

    #[test]
    fn test_enumeration_is_fixed() {
        let all = ArtifactType::all();
        assert_eq!(all.len(), 10);
        assert_eq!(all[0], ArtifactType::RequirementsDoc);
        assert_eq!(ExportTarget::ALL.len(), 4);
    }

    #[test]
    fn test_artifact_type_serde_uses_wire_name() {
        let json = serde_json::to_string(&ArtifactType::ExportPack(ExportTarget::Windsurf)).unwrap();
        assert_eq!(json, "\"ExportPack_Windsurf\"");
        let back: ArtifactType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ArtifactType::ExportPack(ExportTarget::Windsurf));
    }
}
