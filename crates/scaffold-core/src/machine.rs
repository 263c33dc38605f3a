use crate::artifact::ArtifactKind;
use crate::state::{CodegenAction, CodegenEvent, CodegenFailure, CodegenState, FailureReason};

/// The codegen retry loop as a pure transition function.
///
/// The machine never performs I/O and never awaits. The async driver invokes
/// an actor for each returned action and feeds the completion back in as the
/// next event, so exactly one actor call is in flight at a time and every
/// transition is driven by exactly one completed call.
///
/// Validation always precedes analysis: a fix attempt is only spent when
/// errors are confirmed against the current artifact, never against stale
/// state. The loop is bounded by `max_attempts` so it terminates even if the
/// analysis and fix strategies oscillate.
pub struct CodegenMachine {
    state: CodegenState,
    kind: ArtifactKind,
    max_attempts: u32,
    verbose: bool,
}

impl CodegenMachine {
    /// Create a machine for one artifact kind with the given retry bound.
    ///
    /// A bound of zero is treated as one: the initial generation pass always
    /// gets validated.
    pub fn new(kind: ArtifactKind, max_attempts: u32) -> Self {
        Self {
            state: CodegenState::Idle,
            kind,
            max_attempts: max_attempts.max(1),
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn state(&self) -> &CodegenState {
        &self.state
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Process an event and return the action the driver must perform
    pub fn handle_event(&mut self, event: CodegenEvent) -> CodegenAction {
        let old_state_name = self.state.name();

        let action = self.transition(event);

        if self.verbose {
            eprintln!(
                "[STATE] {}: {} -> {}",
                self.kind.name(),
                old_state_name,
                self.state.name()
            );
        }

        action
    }

    fn transition(&mut self, event: CodegenEvent) -> CodegenAction {
        // Terminal states accept no further events
        if self.state.is_terminal() {
            if self.verbose {
                eprintln!(
                    "[WARN] {}: event {:?} after terminal state {}",
                    self.kind.name(),
                    event,
                    self.state.name()
                );
            }
            return CodegenAction::Wait;
        }

        // Cancellation wins from any non-terminal state
        if matches!(event, CodegenEvent::CancelRequested) {
            let errors = self.state.errors().map(<[_]>::to_vec).unwrap_or_default();
            return self.fail(CodegenFailure::new(FailureReason::Cancelled).with_errors(errors));
        }

        match (&self.state, event) {
            // === Idle ===
            (CodegenState::Idle, CodegenEvent::StartRequested { specification }) => {
                self.state = CodegenState::Generating { attempt: 1 };
                CodegenAction::Generate { specification }
            }

            // === Generating ===
            (
                CodegenState::Generating { attempt },
                CodegenEvent::GenerationSucceeded { artifact },
            ) => {
                let attempt = *attempt;
                self.state = CodegenState::Validating {
                    artifact: artifact.clone(),
                    attempt,
                };
                CodegenAction::Validate { artifact }
            }

            (
                CodegenState::Generating { .. },
                CodegenEvent::GenerationFailed {
                    detail,
                    infrastructure,
                },
            ) => {
                let reason = if infrastructure {
                    FailureReason::Infrastructure
                } else {
                    FailureReason::GenerationFailed
                };
                self.fail(CodegenFailure::new(reason).with_detail(detail))
            }

            // === Validating ===
            (
                CodegenState::Validating { artifact, attempt },
                CodegenEvent::ValidationCompleted { errors },
            ) => {
                let artifact = artifact.clone();
                let attempt = *attempt;

                if errors.is_empty() {
                    self.state = CodegenState::Done {
                        artifact: artifact.clone(),
                    };
                    CodegenAction::Complete { artifact }
                } else if attempt >= self.max_attempts {
                    self.fail(
                        CodegenFailure::new(FailureReason::ExhaustedRetries).with_errors(errors),
                    )
                } else {
                    self.state = CodegenState::Analyzing {
                        artifact: artifact.clone(),
                        errors: errors.clone(),
                        attempt,
                    };
                    CodegenAction::Analyze { artifact, errors }
                }
            }

            (CodegenState::Validating { .. }, CodegenEvent::ValidationFailed { detail }) => self
                .fail(CodegenFailure::new(FailureReason::Infrastructure).with_detail(detail)),

            // === Analyzing ===
            (
                CodegenState::Analyzing {
                    artifact,
                    errors,
                    attempt,
                },
                CodegenEvent::AnalysisCompleted { plan },
            ) => match plan {
                crate::strategy::FixPlan::Fixable { .. } => {
                    let artifact = artifact.clone();
                    let attempt = *attempt;
                    self.state = CodegenState::Fixing {
                        artifact: artifact.clone(),
                        plan: plan.clone(),
                        attempt,
                    };
                    CodegenAction::ApplyFix { artifact, plan }
                }
                crate::strategy::FixPlan::Unfixable { reason } => {
                    let errors = errors.clone();
                    self.fail(
                        CodegenFailure::new(FailureReason::Unfixable)
                            .with_detail(reason)
                            .with_errors(errors),
                    )
                }
            },

            (
                CodegenState::Analyzing { errors, .. },
                CodegenEvent::AnalysisFailed {
                    detail,
                    infrastructure,
                },
            ) => {
                // An analysis decline maps to Unfixable.
                let reason = if infrastructure {
                    FailureReason::Infrastructure
                } else {
                    FailureReason::Unfixable
                };
                let errors = errors.clone();
                self.fail(
                    CodegenFailure::new(reason)
                        .with_detail(detail)
                        .with_errors(errors),
                )
            }

            // === Fixing ===
            (CodegenState::Fixing { attempt, .. }, CodegenEvent::FixSucceeded { artifact }) => {
                let attempt = *attempt + 1;
                self.state = CodegenState::Validating {
                    artifact: artifact.clone(),
                    attempt,
                };
                CodegenAction::Validate { artifact }
            }

            (
                CodegenState::Fixing { .. },
                CodegenEvent::FixFailed {
                    detail,
                    infrastructure,
                },
            ) => {
                let reason = if infrastructure {
                    FailureReason::Infrastructure
                } else {
                    FailureReason::FixFailed
                };
                self.fail(CodegenFailure::new(reason).with_detail(detail))
            }

            // === Invalid transition ===
            (state, event) => {
                if self.verbose {
                    eprintln!(
                        "[WARN] {}: invalid transition: {:?} in state {}",
                        self.kind.name(),
                        event,
                        state.name()
                    );
                }
                CodegenAction::Wait
            }
        }
    }

    fn fail(&mut self, failure: CodegenFailure) -> CodegenAction {
        self.state = CodegenState::Failed {
            failure: failure.clone(),
        };
        CodegenAction::Abort { failure }
    }

    /// For testing: set the initial state
    #[cfg(test)]
    pub fn with_state(mut self, state: CodegenState) -> Self {
        self.state = state;
        self
    }
}
