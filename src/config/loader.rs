// Configuration file loading

use super::merger::PartialConfig;
use crate::models::ExportTarget;
use crate::pipeline::RollbackPolicy;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Fully resolved configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SpecforgeConfig {
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Settings forwarded to every generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Model name passed to the backend; backend default when unset
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(rename = "maxOutputTokens", alias = "max_output_tokens", default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Deadline for a whole generation run
    #[serde(rename = "timeoutSecs", alias = "timeout_secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_temperature() -> f32 { 0.4 }
fn default_max_output_tokens() -> u32 { 8192 }
fn default_timeout_secs() -> u64 { 600 }

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: None,
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Command-line generation backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Executable name or path; resolved through PATH
    #[serde(default = "default_command")]
    pub command: String,
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Attempts per stage, including repair attempts
    #[serde(rename = "maxAttempts", alias = "max_attempts", default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_command() -> String { "claude".to_string() }
fn default_args() -> Vec<String> { vec!["-p".to_string()] }
fn default_max_attempts() -> u32 { 3 }

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_args(),
            max_attempts: default_max_attempts(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// What happens to the project when generation fails
    #[serde(default)]
    pub rollback: RollbackPolicy,
    #[serde(rename = "exportTargets", alias = "export_targets", default = "default_export_targets")]
    pub export_targets: Vec<ExportTarget>,
    /// Directory with `<target>.md.tera` overrides for export packs
    #[serde(rename = "templatesDir", alias = "templates_dir", default)]
    pub templates_dir: Option<String>,
}

fn default_export_targets() -> Vec<ExportTarget> { ExportTarget::ALL.to_vec() }

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            rollback: RollbackPolicy::default(),
            export_targets: default_export_targets(),
            templates_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StorageSettings {
    /// Root directory of the file artifact store
    #[serde(default)]
    pub root: Option<String>,
}

impl SpecforgeConfig {
    /// Reject values no component can work with
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(anyhow!(
                "temperature must be between 0.0 and 2.0 (got {})",
                self.generation.temperature
            ));
        }
        if self.generation.max_output_tokens == 0 {
            return Err(anyhow!("maxOutputTokens must be greater than 0"));
        }
        if self.generation.timeout_secs == 0 {
            return Err(anyhow!("timeoutSecs must be greater than 0"));
        }
        if self.backend.max_attempts == 0 {
            return Err(anyhow!("maxAttempts must be at least 1"));
        }
        if self.backend.command.trim().is_empty() {
            return Err(anyhow!("backend command must not be empty"));
        }
        Ok(())
    }

    pub fn storage_root(&self) -> PathBuf {
        self.storage
            .root
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(crate::file_storage::default_storage_root)
    }
}

/// Config loader
pub struct ConfigLoader {
    global_path: Option<PathBuf>,
    project_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            global_path: Self::get_global_config_path(),
            project_path: None,
        }
    }

    /// Use `<path>/.specforge/config.toml` as the project layer
    pub fn with_project_path(mut self, path: &Path) -> Self {
        self.project_path =
            Some(crate::file_storage::get_specforge_dir(path).join("config.toml"));
        self
    }

    /// Override the global config location
    pub fn with_global_path(mut self, path: Option<PathBuf>) -> Self {
        self.global_path = path;
        self
    }

    fn get_global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("specforge").join("config.toml"))
    }

    pub fn load_global(&self) -> Result<Option<PartialConfig>> {
        match self.global_path {
            Some(ref path) => self.load_from_path(path),
            None => Ok(None),
        }
    }

    pub fn load_project(&self) -> Result<Option<PartialConfig>> {
        match self.project_path {
            Some(ref path) => self.load_from_path(path),
            None => Ok(None),
        }
    }

    /// Load one layer. Keys absent from the file stay unset.
    pub fn load_from_path(&self, path: &Path) -> Result<Option<PartialConfig>> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: PartialConfig = toml::from_str(&contents)
            .map_err(|e| anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;

        Ok(Some(config))
    }

    pub fn global_config_path(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    pub fn project_config_path(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }

    /// Write a full config to the project layer
    pub fn save_project(&self, config: &SpecforgeConfig) -> Result<PathBuf> {
        let path = self
            .project_path
            .clone()
            .ok_or_else(|| anyhow!("No project config path available"))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                anyhow!("Failed to create config directory '{}': {}", parent.display(), e)
            })?;
        }

        config.validate()?;

        let contents = toml::to_string_pretty(config)
            .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;

        fs::write(&path, contents)
            .map_err(|e| anyhow!("Failed to write config file '{}': {}", path.display(), e))?;

        log::info!("[Config] Saved config to: {}", path.display());
        Ok(path)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = SpecforgeConfig::default();
        config.validate().unwrap();
        assert_eq!(config.backend.max_attempts, 3);
        assert_eq!(config.pipeline.export_targets.len(), 4);
        assert_eq!(config.pipeline.rollback, RollbackPolicy::Keep);
    }

    #[test]
    fn test_missing_file_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::new().with_project_path(temp_dir.path());
        assert!(loader.load_project().unwrap().is_none());
    }

    #[test]
    fn test_parse_error_names_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[generation\ntemperature = ").unwrap();
        let err = ConfigLoader::new().load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = SpecforgeConfig::default();
        config.generation.temperature = 3.5;
        assert!(config.validate().is_err());

        let mut config = SpecforgeConfig::default();
        config.backend.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_project_writes_camel_case() {
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::new().with_project_path(temp_dir.path());
        let path = loader.save_project(&SpecforgeConfig::default()).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("maxAttempts = 3"));
        assert!(contents.contains("exportTargets"));
        assert!(loader.load_project().unwrap().is_some());
    }
}
