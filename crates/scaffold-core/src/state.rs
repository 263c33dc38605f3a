use serde::{Deserialize, Serialize};

use crate::artifact::{GeneratedArtifact, Specification};
use crate::diagnostics::ErrorInfo;
use crate::strategy::FixPlan;

/// Why a codegen run ended in `Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The generation strategy could not produce an artifact
    GenerationFailed,

    /// Validation kept failing after the configured number of attempts
    ExhaustedRetries,

    /// The analysis strategy determined the errors cannot be repaired
    Unfixable,

    /// The fix strategy could not produce a corrected artifact
    FixFailed,

    /// The run was aborted via the cancellation token
    Cancelled,

    /// An actor call failed at the transport or auth level
    Infrastructure,
}

impl FailureReason {
    /// Returns the reason name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::GenerationFailed => "GenerationFailed",
            Self::ExhaustedRetries => "ExhaustedRetries",
            Self::Unfixable => "Unfixable",
            Self::FixFailed => "FixFailed",
            Self::Cancelled => "Cancelled",
            Self::Infrastructure => "Infrastructure",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Terminal failure payload: a reason tag, optional detail text, and the
/// last known error list.
#[derive(Debug, Clone, PartialEq)]
pub struct CodegenFailure {
    pub reason: FailureReason,
    pub detail: Option<String>,
    pub errors: Vec<ErrorInfo>,
}

impl CodegenFailure {
    /// Create a failure with no detail and no error list
    pub fn new(reason: FailureReason) -> Self {
        Self {
            reason,
            detail: None,
            errors: Vec::new(),
        }
    }

    /// Attach detail text
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attach the last known error list
    pub fn with_errors(mut self, errors: Vec<ErrorInfo>) -> Self {
        self.errors = errors;
        self
    }
}

impl std::fmt::Display for CodegenFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {}", self.reason, detail),
            None => write!(f, "{}", self.reason),
        }
    }
}

/// The current state of one codegen run.
///
/// Exactly one asynchronous actor call is in flight per non-terminal,
/// non-idle state; the attempt counter rides along so the machine can
/// enforce the retry bound without external bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub enum CodegenState {
    /// Waiting for the caller to start the run
    Idle,

    /// Generation strategy call in flight
    Generating { attempt: u32 },

    /// Type-check in flight for the current artifact
    Validating {
        artifact: GeneratedArtifact,
        attempt: u32,
    },

    /// Analysis strategy call in flight
    Analyzing {
        artifact: GeneratedArtifact,
        errors: Vec<ErrorInfo>,
        attempt: u32,
    },

    /// Fix strategy call in flight
    Fixing {
        artifact: GeneratedArtifact,
        plan: FixPlan,
        attempt: u32,
    },

    /// Terminal state - the artifact passed validation
    Done { artifact: GeneratedArtifact },

    /// Terminal state - the run failed
    Failed { failure: CodegenFailure },
}

impl CodegenState {
    /// Returns the state name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Generating { .. } => "Generating",
            Self::Validating { .. } => "Validating",
            Self::Analyzing { .. } => "Analyzing",
            Self::Fixing { .. } => "Fixing",
            Self::Done { .. } => "Done",
            Self::Failed { .. } => "Failed",
        }
    }

    /// Returns the attempt counter if this state carries one
    pub fn attempt(&self) -> Option<u32> {
        match self {
            Self::Generating { attempt }
            | Self::Validating { attempt, .. }
            | Self::Analyzing { attempt, .. }
            | Self::Fixing { attempt, .. } => Some(*attempt),
            _ => None,
        }
    }

    /// Returns true once the run has reached `Done` or `Failed`
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Failed { .. })
    }

    /// Returns the last known error list, if this state carries one
    pub fn errors(&self) -> Option<&[ErrorInfo]> {
        match self {
            Self::Analyzing { errors, .. } => Some(errors),
            Self::Failed { failure } => Some(&failure.errors),
            _ => None,
        }
    }
}

/// Events that can be sent to the codegen machine
#[derive(Debug, Clone, PartialEq)]
pub enum CodegenEvent {
    /// Caller requested a run
    StartRequested { specification: Specification },

    /// Generation produced an artifact
    GenerationSucceeded { artifact: GeneratedArtifact },

    /// Generation declined or failed; `infrastructure` marks transport faults
    GenerationFailed { detail: String, infrastructure: bool },

    /// The type-checker finished; an empty list means the artifact passed
    ValidationCompleted { errors: Vec<ErrorInfo> },

    /// The type-checker itself could not run
    ValidationFailed { detail: String },

    /// Analysis produced a fix plan
    AnalysisCompleted { plan: FixPlan },

    /// Analysis declined or failed
    AnalysisFailed { detail: String, infrastructure: bool },

    /// The fix strategy produced a corrected artifact
    FixSucceeded { artifact: GeneratedArtifact },

    /// The fix strategy declined or failed
    FixFailed { detail: String, infrastructure: bool },

    /// The cancellation token fired
    CancelRequested,
}

/// Actions the driver must perform after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum CodegenAction {
    /// Invoke the generation strategy
    Generate { specification: Specification },

    /// Run the validator over the artifact
    Validate { artifact: GeneratedArtifact },

    /// Invoke the analysis strategy
    Analyze {
        artifact: GeneratedArtifact,
        errors: Vec<ErrorInfo>,
    },

    /// Invoke the fix strategy
    ApplyFix {
        artifact: GeneratedArtifact,
        plan: FixPlan,
    },

    /// The run finished successfully
    Complete { artifact: GeneratedArtifact },

    /// The run reached a terminal failure
    Abort { failure: CodegenFailure },

    /// No action; the event was not valid in the current state
    Wait,
}
