// Configuration merging with priority

use super::loader::{
    BackendSettings, GenerationSettings, PipelineSettings, SpecforgeConfig, StorageSettings,
};
use crate::models::ExportTarget;
use crate::pipeline::RollbackPolicy;
use serde::{Deserialize, Serialize};

/// Partial configuration for merging.
/// Every field is optional so a layer only overrides what it names.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PartialConfig {
    #[serde(default)]
    pub generation: Option<PartialGenerationSettings>,
    #[serde(default)]
    pub backend: Option<PartialBackendSettings>,
    #[serde(default)]
    pub pipeline: Option<PartialPipelineSettings>,
    #[serde(default)]
    pub storage: Option<PartialStorageSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PartialGenerationSettings {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(rename = "maxOutputTokens", alias = "max_output_tokens", default)]
    pub max_output_tokens: Option<u32>,
    #[serde(rename = "timeoutSecs", alias = "timeout_secs", default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PartialBackendSettings {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Option<Vec<String>>,
    #[serde(rename = "maxAttempts", alias = "max_attempts", default)]
    pub max_attempts: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PartialPipelineSettings {
    #[serde(default)]
    pub rollback: Option<RollbackPolicy>,
    #[serde(rename = "exportTargets", alias = "export_targets", default)]
    pub export_targets: Option<Vec<ExportTarget>>,
    #[serde(rename = "templatesDir", alias = "templates_dir", default)]
    pub templates_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PartialStorageSettings {
    #[serde(default)]
    pub root: Option<String>,
}

/// Configuration merger
/// Priority order: CLI -> Project -> Global -> Defaults
pub struct ConfigMerger {
    defaults: SpecforgeConfig,
    global: Option<PartialConfig>,
    project: Option<PartialConfig>,
    cli: Option<PartialConfig>,
}

impl ConfigMerger {
    pub fn new() -> Self {
        Self {
            defaults: SpecforgeConfig::default(),
            global: None,
            project: None,
            cli: None,
        }
    }

    pub fn with_global(mut self, config: Option<PartialConfig>) -> Self {
        self.global = config;
        self
    }

    pub fn with_project(mut self, config: Option<PartialConfig>) -> Self {
        self.project = config;
        self
    }

    pub fn with_cli(mut self, config: Option<PartialConfig>) -> Self {
        self.cli = config;
        self
    }

    /// Merge all layers with priority
    pub fn merge(&self) -> SpecforgeConfig {
        let mut result = self.defaults.clone();
        for layer in [&self.global, &self.project, &self.cli].into_iter().flatten() {
            result = self.merge_partial(&result, layer);
        }
        result
    }

    fn merge_partial(&self, base: &SpecforgeConfig, partial: &PartialConfig) -> SpecforgeConfig {
        SpecforgeConfig {
            generation: partial
                .generation
                .as_ref()
                .map(|p| self.merge_generation(&base.generation, p))
                .unwrap_or_else(|| base.generation.clone()),
            backend: partial
                .backend
                .as_ref()
                .map(|p| self.merge_backend(&base.backend, p))
                .unwrap_or_else(|| base.backend.clone()),
            pipeline: partial
                .pipeline
                .as_ref()
                .map(|p| self.merge_pipeline(&base.pipeline, p))
                .unwrap_or_else(|| base.pipeline.clone()),
            storage: partial
                .storage
                .as_ref()
                .map(|p| self.merge_storage(&base.storage, p))
                .unwrap_or_else(|| base.storage.clone()),
        }
    }

    fn merge_generation(
        &self,
        base: &GenerationSettings,
        over: &PartialGenerationSettings,
    ) -> GenerationSettings {
        GenerationSettings {
            model: over.model.clone().or_else(|| base.model.clone()),
            temperature: over.temperature.unwrap_or(base.temperature),
            max_output_tokens: over.max_output_tokens.unwrap_or(base.max_output_tokens),
            timeout_secs: over.timeout_secs.unwrap_or(base.timeout_secs),
        }
    }

    fn merge_backend(&self, base: &BackendSettings, over: &PartialBackendSettings) -> BackendSettings {
        BackendSettings {
            command: over.command.clone().unwrap_or_else(|| base.command.clone()),
            args: over.args.clone().unwrap_or_else(|| base.args.clone()),
            max_attempts: over.max_attempts.unwrap_or(base.max_attempts),
        }
    }

    fn merge_pipeline(
        &self,
        base: &PipelineSettings,
        over: &PartialPipelineSettings,
    ) -> PipelineSettings {
        PipelineSettings {
            rollback: over.rollback.unwrap_or(base.rollback),
            export_targets: over
                .export_targets
                .clone()
                .unwrap_or_else(|| base.export_targets.clone()),
            templates_dir: over
                .templates_dir
                .clone()
                .or_else(|| base.templates_dir.clone()),
        }
    }

    fn merge_storage(&self, base: &StorageSettings, over: &PartialStorageSettings) -> StorageSettings {
        StorageSettings {
            root: over.root.clone().or_else(|| base.root.clone()),
        }
    }
}

impl Default for ConfigMerger {
    fn default() -> Self {
        Self::new()
    }
}
