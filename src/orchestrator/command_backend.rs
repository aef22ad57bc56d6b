// Subprocess-driven generation backend
//
// Pipes the prompt into a configured CLI (for example `claude -p`), pulls a
// JSON object out of its stdout and checks it against the stage schema.
// Non-conforming output is retried with the violations fed back as a repair
// hint, up to `maxAttempts` calls.

use super::backend::{BackendError, GenerationBackend, GenerationRequest};
use crate::config::BackendSettings;
use crate::schema::SchemaValidator;
use regex::Regex;
use serde_json::Value;
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::OnceLock;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

pub struct CommandBackend {
    settings: BackendSettings,
    validator: SchemaValidator,
}

impl CommandBackend {
    pub fn new(settings: BackendSettings) -> Self {
        Self {
            settings,
            validator: SchemaValidator::new(),
        }
    }

    pub fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    /// Resolve the configured command through PATH
    pub fn resolve_command(&self) -> Result<PathBuf, BackendError> {
        which::which(&self.settings.command).map_err(|e| {
            BackendError::Unavailable(format!(
                "'{}' not found. Please ensure it is installed and in PATH ({})",
                self.settings.command, e
            ))
        })
    }

    pub fn is_available(&self) -> bool {
        self.resolve_command().is_ok()
    }

    async fn run_once(&self, request: &GenerationRequest, prompt: String) -> Result<String, BackendError> {
        let program = self.resolve_command()?;

        let mut cmd = Command::new(&program);
        cmd.args(&self.settings.args);
        if let Some(model) = &request.config.model {
            cmd.arg("--model").arg(model);
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            BackendError::Io(format!("Failed to spawn {}: {}", program.display(), e))
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(prompt.as_bytes()).await {
                    log::warn!("[CommandBackend] Failed to write prompt: {}", e);
                }
            });
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| BackendError::Io(format!("Failed to wait for {}: {}", program.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(BackendError::Io(format!(
                "{} failed with exit code {:?}: {}",
                self.settings.command,
                output.status.code(),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl GenerationBackend for CommandBackend {
    fn generate_structured(
        &self,
        request: GenerationRequest,
    ) -> impl Future<Output = Result<Value, BackendError>> + Send {
        async move {
            let max_attempts = self.settings.max_attempts.max(1);
            let mut repair_hint: Option<String> = None;
            let mut last_error = String::new();

            for attempt in 1..=max_attempts {
                log::debug!(
                    "[CommandBackend] {} stage, attempt {}/{}",
                    request.stage,
                    attempt,
                    max_attempts
                );
                let prompt = render_prompt(&request, repair_hint.as_deref());
                let stdout = self.run_once(&request, prompt).await?;

                last_error = match extract_json_object(&stdout) {
                    Some(value) => match self.validator.validate(request.stage, &value) {
                        Ok(()) => return Ok(value),
                        Err(e) => e.to_string(),
                    },
                    None => "no JSON object found in the output".to_string(),
                };

                log::warn!(
                    "[CommandBackend] {} output rejected (attempt {}/{}): {}",
                    request.stage,
                    attempt,
                    max_attempts,
                    last_error
                );
                repair_hint = Some(last_error.clone());
            }

            Err(BackendError::NonConforming {
                attempts: max_attempts,
                message: last_error,
            })
        }
    }
}

/// Full text sent on stdin
pub fn render_prompt(request: &GenerationRequest, repair_hint: Option<&str>) -> String {
    let schema = serde_json::to_string_pretty(&request.schema).unwrap_or_default();
    let mut prompt = format!(
        "{}\n\n{}\n\n## Output schema\n\n```json\n{}\n```\n",
        request.system_prompt, request.user_prompt, schema
    );
    if let Some(hint) = repair_hint {
        prompt.push_str(&format!(
            "\n## Previous attempt was rejected\n\n{}\n\nReturn a corrected JSON object.\n",
            hint
        ));
    }
    prompt
}

fn json_block_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```json\s*\n([\s\S]*?)```").ok())
        .as_ref()
}

/// Extract the bodies of fenced ```json blocks
pub fn extract_json_blocks(content: &str) -> Vec<String> {
    match json_block_regex() {
        Some(re) => re
            .captures_iter(content)
            .filter_map(|cap| cap.get(1).map(|m| m.as_str().trim().to_string()))
            .collect(),
        None => Vec::new(),
    }
}

/// Find the document in raw CLI output.
///
/// Tries, in order: the last fenced json block holding an object, the whole
/// output, and the span from the first `{` to the last `}`.
pub fn extract_json_object(output: &str) -> Option<Value> {
    let parse_object = |text: &str| -> Option<Value> {
        serde_json::from_str::<Value>(text)
            .ok()
            .filter(|v| v.is_object())
    };

    if let Some(value) = extract_json_blocks(output)
        .iter()
        .rev()
        .find_map(|block| parse_object(block))
    {
        return Some(value);
    }

    let trimmed = output.trim();
    if let Some(value) = parse_object(trimmed) {
        return Some(value);
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    parse_object(&trimmed[start..=end])
}
