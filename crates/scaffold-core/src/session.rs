//! Session orchestration: schema first, then API, then persistence.
//!
//! A [`Session`] owns one scaffold operation end to end. It runs the schema
//! codegen loop to a terminal state, threads the schema source into the API
//! specification, runs the API loop, and only then persists both artifacts.
//! Recovery is strictly local to each codegen loop; the session never retries
//! a stage.

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::artifact::{ArtifactKind, GeneratedArtifact, Specification, Trace};
use crate::orchestrator::{AttemptRecord, CodegenConfig, CodegenOrchestrator};
use crate::progress::ProgressReporter;
use crate::state::{CodegenFailure, FailureReason};
use crate::strategy::{AnalysisStrategy, FixStrategy, GenerationStrategy, Sink, Validator};

/// Which stage of the session a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Schema,
    Api,
}

impl Stage {
    /// Returns the stage name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Api => "api",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Terminal failure for a whole scaffold session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionFailure {
    /// The stage that failed
    pub stage: Stage,

    /// The codegen failure, with reason tag and last error list
    pub failure: CodegenFailure,

    /// The schema artifact, when that stage succeeded before the API stage
    /// failed. Preserved so the caller can still persist it if desired.
    pub schema: Option<GeneratedArtifact>,
}

impl std::fmt::Display for SessionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} generation failed: {}", self.stage, self.failure)
    }
}

impl std::error::Error for SessionFailure {}

/// Successful session output: both artifacts plus the attempt histories.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaffoldOutput {
    pub schema: GeneratedArtifact,
    pub api: GeneratedArtifact,
    pub schema_attempts: Vec<AttemptRecord>,
    pub api_attempts: Vec<AttemptRecord>,
}

/// Configuration for one scaffold session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Retry bound applied to each codegen loop
    pub max_attempts: u32,

    /// Log state transitions to stderr
    pub verbose: bool,

    /// Destination for the schema source
    pub schema_path: PathBuf,

    /// Destination for the API source
    pub api_path: PathBuf,
}

/// One scaffold operation. Owns its orchestrators and attempt histories;
/// nothing is shared across concurrent sessions.
pub struct Session {
    config: SessionConfig,
    generator: Arc<dyn GenerationStrategy>,
    analyzer: Arc<dyn AnalysisStrategy>,
    fixer: Arc<dyn FixStrategy>,
    validator: Arc<dyn Validator>,
    sink: Arc<dyn Sink>,
    progress: Option<ProgressReporter>,
}

impl Session {
    /// Create a session with explicitly injected strategies and sink.
    pub fn new(
        config: SessionConfig,
        generator: Arc<dyn GenerationStrategy>,
        analyzer: Arc<dyn AnalysisStrategy>,
        fixer: Arc<dyn FixStrategy>,
        validator: Arc<dyn Validator>,
        sink: Arc<dyn Sink>,
    ) -> Self {
        Self {
            config,
            generator,
            analyzer,
            fixer,
            validator,
            sink,
            progress: None,
        }
    }

    /// Attach a progress reporter shared by both codegen loops.
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Run the session to completion.
    ///
    /// Schema completion strictly precedes any API-stage actor invocation,
    /// and persistence happens only after both stages succeed.
    pub async fn run(
        &self,
        description: impl Into<String>,
        trace: &Trace,
        cancel: &CancellationToken,
    ) -> Result<ScaffoldOutput, SessionFailure> {
        let description = description.into();

        let mut schema_orch = self.orchestrator(ArtifactKind::Schema);
        let schema = schema_orch
            .run(Specification::new(&description), trace, cancel)
            .await
            .map_err(|failure| SessionFailure {
                stage: Stage::Schema,
                failure,
                schema: None,
            })?;
        let schema_attempts = schema_orch.history().to_vec();

        if cancel.is_cancelled() {
            return Err(SessionFailure {
                stage: Stage::Api,
                failure: CodegenFailure::new(FailureReason::Cancelled),
                schema: Some(schema),
            });
        }

        let mut api_orch = self.orchestrator(ArtifactKind::Api);
        let api_spec = Specification::with_schema(&description, &schema.source_text);
        let api = match api_orch.run(api_spec, trace, cancel).await {
            Ok(api) => api,
            Err(failure) => {
                return Err(SessionFailure {
                    stage: Stage::Api,
                    failure,
                    schema: Some(schema),
                });
            }
        };
        let api_attempts = api_orch.history().to_vec();

        self.persist(Stage::Schema, &self.config.schema_path, &schema)
            .await
            .map_err(|mut err| {
                err.schema = Some(schema.clone());
                err
            })?;
        self.persist(Stage::Api, &self.config.api_path, &api)
            .await
            .map_err(|mut err| {
                err.schema = Some(schema.clone());
                err
            })?;

        Ok(ScaffoldOutput {
            schema,
            api,
            schema_attempts,
            api_attempts,
        })
    }

    fn orchestrator(&self, kind: ArtifactKind) -> CodegenOrchestrator {
        let config = CodegenConfig {
            kind,
            max_attempts: self.config.max_attempts,
            verbose: self.config.verbose,
        };
        let mut orch = CodegenOrchestrator::new(
            config,
            Arc::clone(&self.generator),
            Arc::clone(&self.analyzer),
            Arc::clone(&self.fixer),
            Arc::clone(&self.validator),
        );
        if let Some(progress) = &self.progress {
            orch = orch.with_progress(progress.clone());
        }
        orch
    }

    async fn persist(
        &self,
        stage: Stage,
        path: &std::path::Path,
        artifact: &GeneratedArtifact,
    ) -> Result<(), SessionFailure> {
        self.sink
            .persist(path, &artifact.source_text)
            .await
            .map_err(|err| SessionFailure {
                stage,
                failure: CodegenFailure::new(FailureReason::Infrastructure)
                    .with_detail(format!("persist failed: {}", err)),
                schema: None,
            })
    }
}
