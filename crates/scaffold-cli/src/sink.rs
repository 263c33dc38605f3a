//! Artifact persistence.

use std::path::Path;

use async_trait::async_trait;
use scaffold_core::{ActorError, Sink};

/// Writes artifacts to the filesystem, creating parent directories as
/// needed.
pub struct FsSink;

#[async_trait]
impl Sink for FsSink {
    async fn persist(&self, path: &Path, source_text: &str) -> Result<(), ActorError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    ActorError::Transport(format!(
                        "failed to create directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }
        tokio::fs::write(path, source_text).await.map_err(|e| {
            ActorError::Transport(format!("failed to write {}: {}", path.display(), e))
        })
    }
}

/// Discards artifacts instead of writing them. Used for dry runs.
pub struct NoopSink;

#[async_trait]
impl Sink for NoopSink {
    async fn persist(&self, path: &Path, _source_text: &str) -> Result<(), ActorError> {
        eprintln!("[DRY-RUN] skipping write of {}", path.display());
        Ok(())
    }
}
