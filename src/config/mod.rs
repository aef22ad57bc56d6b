// Layered configuration system

pub mod loader;
pub mod merger;

pub use loader::{
    BackendSettings, ConfigLoader, GenerationSettings, PipelineSettings, SpecforgeConfig,
    StorageSettings,
};
pub use merger::{ConfigMerger, PartialConfig};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Load and merge configuration from all sources
/// Priority: CLI -> Project -> Global -> Defaults
pub fn load_merged_config(
    project_path: Option<&Path>,
    cli_overrides: Option<PartialConfig>,
) -> Result<SpecforgeConfig> {
    load_with_loader(loader_for(project_path), cli_overrides)
}

/// Same as [`load_merged_config`] with an explicit loader
pub fn load_with_loader(
    loader: ConfigLoader,
    cli_overrides: Option<PartialConfig>,
) -> Result<SpecforgeConfig> {
    let global = loader.load_global().context("global config")?;
    let project = loader.load_project().context("project config")?;

    let config = ConfigMerger::new()
        .with_global(global)
        .with_project(project)
        .with_cli(cli_overrides)
        .merge();

    config.validate()?;
    Ok(config)
}

/// Config file paths, for diagnostics
pub fn get_config_paths(project_path: Option<&Path>) -> (Option<PathBuf>, Option<PathBuf>) {
    let loader = loader_for(project_path);
    (
        loader.global_config_path().map(|p| p.to_path_buf()),
        loader.project_config_path().map(|p| p.to_path_buf()),
    )
}

fn loader_for(project_path: Option<&Path>) -> ConfigLoader {
    match project_path {
        Some(path) => ConfigLoader::new().with_project_path(path),
        None => ConfigLoader::new(),
    }
}
