//! Async driver for the codegen retry loop.
//!
//! [`CodegenOrchestrator`] owns a [`CodegenMachine`] and the injected
//! strategies. It turns each action from the machine into exactly one actor
//! invocation, awaits it under the cancellation token, and feeds the
//! completion back in as the next event. Attempts are strictly sequential;
//! no two actors ever run concurrently within one orchestrator instance.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::artifact::{GeneratedArtifact, Specification, Trace};
use crate::diagnostics::ErrorInfo;
use crate::machine::CodegenMachine;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::state::{CodegenAction, CodegenEvent, CodegenFailure, CodegenState, FailureReason};
use crate::strategy::{AnalysisStrategy, FixStrategy, GenerationStrategy, Validator};

/// Configuration for one codegen run.
#[derive(Debug, Clone)]
pub struct CodegenConfig {
    /// Which artifact this orchestrator produces
    pub kind: crate::artifact::ArtifactKind,

    /// Maximum generate-or-fix cycles before giving up
    pub max_attempts: u32,

    /// Log state transitions to stderr
    pub verbose: bool,
}

/// How one attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Validation found no errors
    Passed,
    /// Validation failed and another fix cycle follows
    Retrying,
    /// Validation failed on the final allowed attempt
    GaveUp,
}

/// One generate-or-fix-then-validate cycle, kept for observability.
///
/// The history is owned by a single orchestrator instance and never shared
/// across instances.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    /// 1-indexed, monotonically increasing
    pub attempt_number: u32,

    /// The artifact version this attempt validated
    pub artifact: GeneratedArtifact,

    /// Diagnostics from this attempt's validation pass
    pub errors: Vec<ErrorInfo>,

    /// How the attempt ended
    pub outcome: AttemptOutcome,
}

/// Drives one artifact from specification to a terminal state.
pub struct CodegenOrchestrator {
    machine: CodegenMachine,
    generator: Arc<dyn GenerationStrategy>,
    analyzer: Arc<dyn AnalysisStrategy>,
    fixer: Arc<dyn FixStrategy>,
    validator: Arc<dyn Validator>,
    history: Vec<AttemptRecord>,
    progress: Option<ProgressReporter>,
}

impl CodegenOrchestrator {
    /// Create an orchestrator with explicitly injected strategies.
    pub fn new(
        config: CodegenConfig,
        generator: Arc<dyn GenerationStrategy>,
        analyzer: Arc<dyn AnalysisStrategy>,
        fixer: Arc<dyn FixStrategy>,
        validator: Arc<dyn Validator>,
    ) -> Self {
        Self {
            machine: CodegenMachine::new(config.kind, config.max_attempts)
                .with_verbose(config.verbose),
            generator,
            analyzer,
            fixer,
            validator,
            history: Vec::new(),
            progress: None,
        }
    }

    /// Attach a progress reporter.
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = Some(progress);
        self
    }

    /// The attempt history recorded so far.
    pub fn history(&self) -> &[AttemptRecord] {
        &self.history
    }

    /// Run the loop to a terminal state.
    ///
    /// Returns the validated artifact on `Done`, or the tagged failure on
    /// `Failed`. The orchestrator is single-shot: a second call fails with
    /// an infrastructure reason.
    pub async fn run(
        &mut self,
        specification: Specification,
        trace: &Trace,
        cancel: &CancellationToken,
    ) -> Result<GeneratedArtifact, CodegenFailure> {
        if !matches!(self.machine.state(), CodegenState::Idle) {
            return Err(CodegenFailure::new(FailureReason::Infrastructure)
                .with_detail("orchestrator instance already ran"));
        }

        let mut action = self
            .machine
            .handle_event(CodegenEvent::StartRequested { specification });

        loop {
            self.notify();

            let event = match action {
                CodegenAction::Generate { specification } => {
                    self.invoke_generate(&specification, trace, cancel).await
                }
                CodegenAction::Validate { artifact } => {
                    self.invoke_validate(&artifact, trace, cancel).await
                }
                CodegenAction::Analyze { artifact, errors } => {
                    self.invoke_analyze(&artifact, &errors, trace, cancel).await
                }
                CodegenAction::ApplyFix { artifact, plan } => {
                    self.invoke_fix(&artifact, &plan, trace, cancel).await
                }
                CodegenAction::Complete { artifact } => return Ok(artifact),
                CodegenAction::Abort { failure } => return Err(failure),
                CodegenAction::Wait => {
                    // The driver only feeds events the machine defined for
                    // the state it is in, so a stall is a bug.
                    return Err(CodegenFailure::new(FailureReason::Infrastructure)
                        .with_detail("state machine produced no transition"));
                }
            };

            action = self.machine.handle_event(event);
        }
    }

    async fn invoke_generate(
        &self,
        specification: &Specification,
        trace: &Trace,
        cancel: &CancellationToken,
    ) -> CodegenEvent {
        if cancel.is_cancelled() {
            return CodegenEvent::CancelRequested;
        }

        tokio::select! {
            _ = cancel.cancelled() => CodegenEvent::CancelRequested,
            result = self.generator.generate(specification, self.machine.kind(), trace, cancel) => {
                match result {
                    Ok(Some(artifact)) => CodegenEvent::GenerationSucceeded { artifact },
                    Ok(None) => CodegenEvent::GenerationFailed {
                        detail: "generation strategy declined to produce output".to_string(),
                        infrastructure: false,
                    },
                    Err(err) => CodegenEvent::GenerationFailed {
                        detail: err.to_string(),
                        infrastructure: true,
                    },
                }
            }
        }
    }

    async fn invoke_validate(
        &mut self,
        artifact: &GeneratedArtifact,
        trace: &Trace,
        cancel: &CancellationToken,
    ) -> CodegenEvent {
        if cancel.is_cancelled() {
            return CodegenEvent::CancelRequested;
        }

        let attempt = self.machine.state().attempt().unwrap_or(0);

        let result = tokio::select! {
            _ = cancel.cancelled() => return CodegenEvent::CancelRequested,
            result = self.validator.validate(&artifact.source_text, artifact.kind, trace, cancel) => result,
        };

        match result {
            Ok(errors) => {
                let outcome = if errors.is_empty() {
                    AttemptOutcome::Passed
                } else if attempt >= self.machine.max_attempts() {
                    AttemptOutcome::GaveUp
                } else {
                    AttemptOutcome::Retrying
                };
                self.history.push(AttemptRecord {
                    attempt_number: attempt,
                    artifact: artifact.clone(),
                    errors: errors.clone(),
                    outcome,
                });
                CodegenEvent::ValidationCompleted { errors }
            }
            Err(err) => CodegenEvent::ValidationFailed {
                detail: err.to_string(),
            },
        }
    }

    async fn invoke_analyze(
        &self,
        artifact: &GeneratedArtifact,
        errors: &[ErrorInfo],
        trace: &Trace,
        cancel: &CancellationToken,
    ) -> CodegenEvent {
        if cancel.is_cancelled() {
            return CodegenEvent::CancelRequested;
        }

        tokio::select! {
            _ = cancel.cancelled() => CodegenEvent::CancelRequested,
            result = self.analyzer.analyze(artifact, errors, trace, cancel) => {
                match result {
                    Ok(Some(plan)) => CodegenEvent::AnalysisCompleted { plan },
                    Ok(None) => CodegenEvent::AnalysisFailed {
                        detail: "analysis strategy declined to produce a plan".to_string(),
                        infrastructure: false,
                    },
                    Err(err) => CodegenEvent::AnalysisFailed {
                        detail: err.to_string(),
                        infrastructure: true,
                    },
                }
            }
        }
    }

    async fn invoke_fix(
        &self,
        artifact: &GeneratedArtifact,
        plan: &crate::strategy::FixPlan,
        trace: &Trace,
        cancel: &CancellationToken,
    ) -> CodegenEvent {
        if cancel.is_cancelled() {
            return CodegenEvent::CancelRequested;
        }

        tokio::select! {
            _ = cancel.cancelled() => CodegenEvent::CancelRequested,
            result = self.fixer.fix(artifact, plan, trace, cancel) => {
                match result {
                    Ok(Some(artifact)) => CodegenEvent::FixSucceeded { artifact },
                    Ok(None) => CodegenEvent::FixFailed {
                        detail: "fix strategy declined to produce output".to_string(),
                        infrastructure: false,
                    },
                    Err(err) => CodegenEvent::FixFailed {
                        detail: err.to_string(),
                        infrastructure: true,
                    },
                }
            }
        }
    }

    fn notify(&self) {
        if let Some(progress) = &self.progress {
            progress.report(ProgressEvent {
                kind: self.machine.kind(),
                state: self.machine.state().name(),
                attempt: self.machine.state().attempt().unwrap_or(0),
                max_attempts: self.machine.max_attempts(),
            });
        }
    }
}
