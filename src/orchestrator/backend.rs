// Generation backend contract

use crate::config::GenerationSettings;
use crate::models::DocumentKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use thiserror::Error;

/// Sampling settings forwarded with every request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub model: Option<String>,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::from(&GenerationSettings::default())
    }
}

impl From<&GenerationSettings> for GenerationConfig {
    fn from(settings: &GenerationSettings) -> Self {
        Self {
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_output_tokens: settings.max_output_tokens,
        }
    }
}

/// One call to `generate_structured`
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub stage: DocumentKind,
    /// JSON Schema the output must satisfy
    pub schema: Value,
    pub system_prompt: String,
    pub user_prompt: String,
    pub config: GenerationConfig,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("generation backend unavailable: {0}")]
    Unavailable(String),

    /// Output still failed the schema after the backend's own repair attempts
    #[error("output did not conform after {attempts} attempt(s): {message}")]
    NonConforming { attempts: u32, message: String },

    #[error("backend I/O failed: {0}")]
    Io(String),
}

/// Capability that turns a prompt pair into a schema-shaped JSON document.
///
/// Retries and output repair live behind this trait. Callers still validate
/// whatever comes back.
pub trait GenerationBackend: Send + Sync {
    fn generate_structured(
        &self,
        request: GenerationRequest,
    ) -> impl Future<Output = Result<Value, BackendError>> + Send;
}
