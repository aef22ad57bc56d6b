// Product idea: the immutable input to a generation request

use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Target platform for the product
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Web,
    Ios,
    Android,
}

impl Platform {
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Web => "Web",
            Platform::Ios => "iOS",
            Platform::Android => "Android",
        }
    }
}

/// A free-form product idea
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    /// Product name
    pub title: String,
    /// One-line elevator pitch
    #[serde(default)]
    pub pitch: String,
    /// The problem being solved
    #[serde(default)]
    pub problem: String,
    /// The proposed solution
    #[serde(default)]
    pub solution: String,
    /// Target users, most important first
    #[serde(default)]
    pub target_users: Vec<String>,
    /// Platforms the product ships on
    #[serde(default)]
    pub platforms: BTreeSet<Platform>,
    /// Short names of the features the product must have
    #[serde(default)]
    pub core_features: Vec<String>,
    #[serde(default)]
    pub personas: Vec<String>,
    #[serde(default)]
    pub competitors: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub success_metrics: Vec<String>,
}

impl Idea {
    /// Create an idea with the three mandatory fields
    pub fn new(title: &str, problem: &str, solution: &str) -> Self {
        Self {
            title: title.to_string(),
            problem: problem.to_string(),
            solution: solution.to_string(),
            ..Default::default()
        }
    }

    pub fn with_core_features(mut self, features: &[&str]) -> Self {
        self.core_features = features.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_platforms(mut self, platforms: &[Platform]) -> Self {
        self.platforms = platforms.iter().copied().collect();
        self
    }

    /// Check that the mandatory fields are present
    pub fn validate(&self) -> PipelineResult<()> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.problem.trim().is_empty() {
            missing.push("problem");
        }
        if self.solution.trim().is_empty() {
            missing.push("solution");
        }
        if !missing.is_empty() {
            return Err(PipelineError::validation(format!(
                "idea is missing required field(s): {}",
                missing.join(", ")
            )));
        }

        if self.core_features.iter().any(|f| f.trim().is_empty()) {
            return Err(PipelineError::validation(
                "idea contains an empty core feature name",
            ));
        }

        Ok(())
    }

    /// Platforms to design for. An idea that names none targets the web.
    pub fn effective_platforms(&self) -> Vec<Platform> {
        if self.platforms.is_empty() {
            vec![Platform::Web]
        } else {
            self.platforms.iter().copied().collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_reports_all_missing_fields() {
        let idea = Idea::new("", "", "a shared kanban board");
        let err = idea.validate().unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
        assert!(err.to_string().contains("title, problem"));
    }

    #[test]
    fn test_validate_rejects_blank_feature() {
        let idea = Idea::new("TaskFlow", "p", "s").with_core_features(&["Board View", "  "]);
        assert!(idea.validate().is_err());
    }

    #[test]
    fn test_deserialize_camel_case_with_defaults() {
        let json = r#"{
            "title": "TaskFlow",
            "problem": "teams lack shared task visibility",
            "solution": "a shared kanban board",
            "coreFeatures": ["Sign Up", "Board View"],
            "platforms": ["ios", "web"]
        }"#;
        let idea: Idea = serde_json::from_str(json).unwrap();
        assert!(idea.validate().is_ok());
        assert_eq!(idea.core_features.len(), 2);
        assert!(idea.target_users.is_empty());
        // BTreeSet keeps declaration order of the enum
        assert_eq!(idea.effective_platforms(), vec![Platform::Web, Platform::Ios]);
    }

    #[test]
    fn test_effective_platforms_defaults_to_web() {
        let idea = Idea::new("A", "B", "C");
        assert_eq!(idea.effective_platforms(), vec![Platform::Web]);
    }
}
