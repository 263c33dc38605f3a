//! Command-based artifact validation.
//!
//! Writes generated source to a scratch directory, runs the configured
//! checker command against it, and parses the output into structured
//! errors.

use std::process::Stdio;

use async_trait::async_trait;
use scaffold_core::{ActorError, ArtifactKind, ErrorInfo, Trace, Validator};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use super::parse::parse_checker_output;
use crate::config::CheckerSettings;

/// Validates artifacts by running an external checker command.
///
/// The source text is written to a temporary directory under the file
/// name the artifact would eventually be persisted as, so checker
/// diagnostics carry a recognizable path.
pub struct CommandValidator {
    command: String,
    args: Vec<String>,
    schema_file: String,
    api_file: String,
}

impl CommandValidator {
    pub fn new(
        command: impl Into<String>,
        args: Vec<String>,
        schema_file: impl Into<String>,
        api_file: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            args,
            schema_file: schema_file.into(),
            api_file: api_file.into(),
        }
    }

    pub fn from_settings(checker: &CheckerSettings, schema_file: &str, api_file: &str) -> Self {
        Self::new(&checker.command, checker.args.clone(), schema_file, api_file)
    }

    fn file_name(&self, kind: ArtifactKind) -> &str {
        match kind {
            ArtifactKind::Schema => &self.schema_file,
            ArtifactKind::Api => &self.api_file,
        }
    }
}

#[async_trait]
impl Validator for CommandValidator {
    async fn validate(
        &self,
        source_text: &str,
        kind: ArtifactKind,
        trace: &Trace,
        cancel: &CancellationToken,
    ) -> Result<Vec<ErrorInfo>, ActorError> {
        if cancel.is_cancelled() {
            return Err(ActorError::Transport("validation cancelled".to_string()));
        }

        let scratch = tempfile::tempdir()
            .map_err(|e| ActorError::Transport(format!("failed to create scratch dir: {}", e)))?;
        let source_path = scratch.path().join(self.file_name(kind));

        let mut file = tokio::fs::File::create(&source_path)
            .await
            .map_err(|e| ActorError::Transport(format!("failed to write source: {}", e)))?;
        file.write_all(source_text.as_bytes())
            .await
            .map_err(|e| ActorError::Transport(format!("failed to write source: {}", e)))?;
        file.flush()
            .await
            .map_err(|e| ActorError::Transport(format!("failed to write source: {}", e)))?;
        drop(file);

        let mut command = tokio::process::Command::new(&self.command);
        command
            .args(&self.args)
            .arg(&source_path)
            .current_dir(scratch.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        eprintln!(
            "[CHECK] {} running `{}` on {}",
            trace,
            self.command,
            source_path.display()
        );

        let output = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(ActorError::Transport("validation cancelled".to_string()));
            }
            result = command.output() => result.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ActorError::Transport(format!("checker command not found: {}", self.command))
                } else {
                    ActorError::Transport(format!("failed to run checker: {}", e))
                }
            })?,
        };

        if output.status.success() {
            return Ok(Vec::new());
        }

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.stderr.is_empty() {
            combined.push('\n');
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
        }

        let errors = parse_checker_output(&combined);
        if errors.is_empty() {
            // Non-zero exit with no recognizable diagnostics means the
            // checker itself broke, not that the artifact is clean.
            return Err(ActorError::Transport(format!(
                "checker exited with {} but produced no diagnostics: {}",
                output.status,
                combined.trim()
            )));
        }

        Ok(errors)
    }
}
