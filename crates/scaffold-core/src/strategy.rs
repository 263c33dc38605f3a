//! Actor contracts for the generation pipeline.
//!
//! Every step the pipeline delegates to the outside world - generating
//! source, analyzing errors, applying fixes, type-checking, persisting - goes
//! through one of the traits here. Implementations are injected into the
//! orchestrators; nothing is resolved from ambient global state.
//!
//! All strategy calls share one contract shape: `Ok(Some(output))` on
//! success, `Ok(None)` when the strategy declined to produce output (a
//! defined soft failure), and `Err(ActorError)` when the call itself could
//! not be made. The orchestrator maps the two failure forms to distinct
//! terminal reasons so callers can tell "the model could not help" from "the
//! call could not be made".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio_util::sync::CancellationToken;

use crate::artifact::{ArtifactKind, GeneratedArtifact, Specification, Trace};
use crate::diagnostics::ErrorInfo;

/// Infrastructure-level failure from an actor call.
///
/// These are transport or service problems, never semantic decisions made by
/// a strategy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActorError {
    /// The call could not reach the backing service
    #[error("transport failure: {0}")]
    Transport(String),

    /// The backing service rejected the credentials
    #[error("authentication failure: {0}")]
    Auth(String),
}

/// Result of a strategy invocation. `Ok(None)` is the soft-failure form.
pub type ActorResult<T> = Result<Option<T>, ActorError>;

/// Structured guidance returned by error analysis.
///
/// Consumed exactly once, by the fix strategy for the attempt that produced
/// it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FixPlan {
    /// The errors can be repaired; `details` guides the fix strategy
    Fixable { details: String },

    /// The errors cannot be addressed automatically
    Unfixable { reason: String },
}

impl FixPlan {
    /// Whether this plan recommends attempting a fix
    pub fn is_fixable(&self) -> bool {
        matches!(self, Self::Fixable { .. })
    }
}

/// Produces an initial artifact for a specification.
#[async_trait]
pub trait GenerationStrategy: Send + Sync {
    async fn generate(
        &self,
        specification: &Specification,
        kind: ArtifactKind,
        trace: &Trace,
        cancel: &CancellationToken,
    ) -> ActorResult<GeneratedArtifact>;
}

/// Inspects a failing artifact and its diagnostics and proposes a fix plan.
#[async_trait]
pub trait AnalysisStrategy: Send + Sync {
    async fn analyze(
        &self,
        artifact: &GeneratedArtifact,
        errors: &[ErrorInfo],
        trace: &Trace,
        cancel: &CancellationToken,
    ) -> ActorResult<FixPlan>;
}

/// Produces a corrected artifact from a failing one and a fix plan.
#[async_trait]
pub trait FixStrategy: Send + Sync {
    async fn fix(
        &self,
        artifact: &GeneratedArtifact,
        plan: &FixPlan,
        trace: &Trace,
        cancel: &CancellationToken,
    ) -> ActorResult<GeneratedArtifact>;
}

/// Runs a type-checker over generated source and returns its diagnostics.
///
/// An empty list signals validation success. Diagnostic order should follow
/// source order so results are reproducible; the pipeline itself only
/// inspects emptiness.
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(
        &self,
        source_text: &str,
        kind: ArtifactKind,
        trace: &Trace,
        cancel: &CancellationToken,
    ) -> Result<Vec<ErrorInfo>, ActorError>;
}

/// Writes finished source text to a destination path.
///
/// Only invoked after the whole session succeeds; the retry loop never
/// performs partial writes.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn persist(&self, path: &Path, source_text: &str) -> Result<(), ActorError>;
}
