//! End-to-end tests for the codegen retry loop and session sequencing,
//! using deterministic stub strategies with call counting.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use scaffold_core::{
    ActorError, ActorResult, AnalysisStrategy, ArtifactKind, AttemptOutcome, CodegenConfig,
    CodegenOrchestrator, ErrorInfo, FailureReason, FixPlan, FixStrategy, GeneratedArtifact,
    GenerationStrategy, Session, SessionConfig, Sink, Specification, Stage, Trace, Validator,
};

// ============================================================================
// Stub strategies
// ============================================================================

/// What a stub should do when invoked.
#[derive(Clone)]
enum StubResponse {
    Yield(String),
    Decline,
    Fail(ActorError),
}

struct StubGenerator {
    response: StubResponse,
    calls: AtomicUsize,
    seen_specs: Mutex<Vec<Specification>>,
}

impl StubGenerator {
    fn yielding(text: &str) -> Arc<Self> {
        Arc::new(Self {
            response: StubResponse::Yield(text.to_string()),
            calls: AtomicUsize::new(0),
            seen_specs: Mutex::new(Vec::new()),
        })
    }

    fn with_response(response: StubResponse) -> Arc<Self> {
        Arc::new(Self {
            response,
            calls: AtomicUsize::new(0),
            seen_specs: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationStrategy for StubGenerator {
    async fn generate(
        &self,
        specification: &Specification,
        kind: ArtifactKind,
        _trace: &Trace,
        _cancel: &CancellationToken,
    ) -> ActorResult<GeneratedArtifact> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_specs.lock().unwrap().push(specification.clone());
        match &self.response {
            StubResponse::Yield(text) => Ok(Some(GeneratedArtifact::new(kind, text.clone()))),
            StubResponse::Decline => Ok(None),
            StubResponse::Fail(err) => Err(err.clone()),
        }
    }
}

/// Generator that never completes; used to test in-flight cancellation.
struct PendingGenerator {
    calls: AtomicUsize,
}

#[async_trait]
impl GenerationStrategy for PendingGenerator {
    async fn generate(
        &self,
        _specification: &Specification,
        _kind: ArtifactKind,
        _trace: &Trace,
        _cancel: &CancellationToken,
    ) -> ActorResult<GeneratedArtifact> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending::<()>().await;
        unreachable!()
    }
}

/// Generator whose response depends on the artifact kind.
struct KindGenerator {
    schema: StubResponse,
    api: StubResponse,
    schema_calls: AtomicUsize,
    api_calls: AtomicUsize,
}

#[async_trait]
impl GenerationStrategy for KindGenerator {
    async fn generate(
        &self,
        _specification: &Specification,
        kind: ArtifactKind,
        _trace: &Trace,
        _cancel: &CancellationToken,
    ) -> ActorResult<GeneratedArtifact> {
        let response = match kind {
            ArtifactKind::Schema => {
                self.schema_calls.fetch_add(1, Ordering::SeqCst);
                &self.schema
            }
            ArtifactKind::Api => {
                self.api_calls.fetch_add(1, Ordering::SeqCst);
                &self.api
            }
        };
        match response {
            StubResponse::Yield(text) => Ok(Some(GeneratedArtifact::new(kind, text.clone()))),
            StubResponse::Decline => Ok(None),
            StubResponse::Fail(err) => Err(err.clone()),
        }
    }
}

/// Validator that replays a scripted sequence of error lists. Once the
/// script is exhausted it keeps returning the last entry (or passes when
/// the script was empty to begin with).
struct ScriptedValidator {
    script: Mutex<VecDeque<Vec<ErrorInfo>>>,
    last: Mutex<Vec<ErrorInfo>>,
    calls: AtomicUsize,
}

impl ScriptedValidator {
    fn new(script: Vec<Vec<ErrorInfo>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    fn always_passing() -> Arc<Self> {
        Self::new(vec![])
    }

    fn always_failing() -> Arc<Self> {
        let validator = Self::new(vec![vec![sample_error()]]);
        // The single entry becomes the sticky "last" response.
        validator
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Validator for ScriptedValidator {
    async fn validate(
        &self,
        _source_text: &str,
        _kind: ArtifactKind,
        _trace: &Trace,
        _cancel: &CancellationToken,
    ) -> Result<Vec<ErrorInfo>, ActorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        match script.pop_front() {
            Some(errors) => {
                *self.last.lock().unwrap() = errors.clone();
                Ok(errors)
            }
            None => Ok(self.last.lock().unwrap().clone()),
        }
    }
}

struct StubAnalyzer {
    plan: Option<FixPlan>,
    calls: AtomicUsize,
}

impl StubAnalyzer {
    fn fixable() -> Arc<Self> {
        Arc::new(Self {
            plan: Some(FixPlan::Fixable {
                details: "rename the field".to_string(),
            }),
            calls: AtomicUsize::new(0),
        })
    }

    fn unfixable(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            plan: Some(FixPlan::Unfixable {
                reason: reason.to_string(),
            }),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisStrategy for StubAnalyzer {
    async fn analyze(
        &self,
        _artifact: &GeneratedArtifact,
        _errors: &[ErrorInfo],
        _trace: &Trace,
        _cancel: &CancellationToken,
    ) -> ActorResult<FixPlan> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.plan.clone())
    }
}

struct StubFixer {
    response: StubResponse,
    calls: AtomicUsize,
}

impl StubFixer {
    fn yielding(text: &str) -> Arc<Self> {
        Arc::new(Self {
            response: StubResponse::Yield(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FixStrategy for StubFixer {
    async fn fix(
        &self,
        artifact: &GeneratedArtifact,
        _plan: &FixPlan,
        _trace: &Trace,
        _cancel: &CancellationToken,
    ) -> ActorResult<GeneratedArtifact> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            StubResponse::Yield(text) => Ok(Some(GeneratedArtifact::new(artifact.kind, text.clone()))),
            StubResponse::Decline => Ok(None),
            StubResponse::Fail(err) => Err(err.clone()),
        }
    }
}

struct MemorySink {
    writes: Mutex<Vec<(PathBuf, String)>>,
}

impl MemorySink {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            writes: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn persist(&self, path: &Path, source_text: &str) -> Result<(), ActorError> {
        self.writes
            .lock()
            .unwrap()
            .push((path.to_path_buf(), source_text.to_string()));
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn sample_error() -> ErrorInfo {
    ErrorInfo::new("schema.prisma", 4, 9, "unknown type 'Strng'")
}

fn config(max_attempts: u32) -> CodegenConfig {
    CodegenConfig {
        kind: ArtifactKind::Schema,
        max_attempts,
        verbose: false,
    }
}

fn trace() -> Trace {
    Trace::new("test-trace")
}

fn orchestrator(
    max_attempts: u32,
    generator: Arc<StubGenerator>,
    analyzer: Arc<StubAnalyzer>,
    fixer: Arc<StubFixer>,
    validator: Arc<ScriptedValidator>,
) -> CodegenOrchestrator {
    CodegenOrchestrator::new(config(max_attempts), generator, analyzer, fixer, validator)
}

fn session_config() -> SessionConfig {
    SessionConfig {
        max_attempts: 3,
        verbose: false,
        schema_path: PathBuf::from("out/schema.prisma"),
        api_path: PathBuf::from("out/api.ts"),
    }
}

// ============================================================================
// Codegen loop
// ============================================================================

#[tokio::test]
async fn scenario_a_clean_generation_finishes_in_one_attempt() {
    let generator = StubGenerator::yielding("model Todo {}");
    let analyzer = StubAnalyzer::fixable();
    let fixer = StubFixer::yielding("unused");
    let validator = ScriptedValidator::always_passing();

    let mut orch = orchestrator(
        3,
        Arc::clone(&generator),
        Arc::clone(&analyzer),
        Arc::clone(&fixer),
        Arc::clone(&validator),
    );
    let result = orch
        .run(Specification::new("a todo app"), &trace(), &CancellationToken::new())
        .await;

    let artifact = result.expect("run should succeed");
    assert_eq!(artifact.source_text, "model Todo {}");
    assert_eq!(orch.history().len(), 1);
    assert_eq!(orch.history()[0].attempt_number, 1);
    assert_eq!(orch.history()[0].outcome, AttemptOutcome::Passed);

    assert_eq!(generator.calls(), 1);
    assert_eq!(validator.calls(), 1);
    assert_eq!(analyzer.calls(), 0);
    assert_eq!(fixer.calls(), 0);
}

#[tokio::test]
async fn scenario_b_one_fix_cycle_then_done() {
    let generator = StubGenerator::yielding("broken");
    let analyzer = StubAnalyzer::fixable();
    let fixer = StubFixer::yielding("fixed");
    let validator = ScriptedValidator::new(vec![vec![sample_error(), sample_error()], vec![]]);

    let mut orch = orchestrator(
        3,
        Arc::clone(&generator),
        Arc::clone(&analyzer),
        Arc::clone(&fixer),
        Arc::clone(&validator),
    );
    let result = orch
        .run(Specification::new("a todo app"), &trace(), &CancellationToken::new())
        .await;

    let artifact = result.expect("run should succeed after one fix");
    assert_eq!(artifact.source_text, "fixed");
    assert_eq!(orch.history().len(), 2);
    assert_eq!(orch.history()[0].outcome, AttemptOutcome::Retrying);
    assert_eq!(orch.history()[1].outcome, AttemptOutcome::Passed);
    assert_eq!(orch.history()[1].attempt_number, 2);

    assert_eq!(generator.calls(), 1);
    assert_eq!(analyzer.calls(), 1);
    assert_eq!(fixer.calls(), 1);
    assert_eq!(validator.calls(), 2);
}

#[tokio::test]
async fn scenario_c_exhausts_retries_at_the_bound() {
    let generator = StubGenerator::yielding("broken");
    let analyzer = StubAnalyzer::fixable();
    let fixer = StubFixer::yielding("still broken");
    let validator = ScriptedValidator::always_failing();

    let mut orch = orchestrator(
        2,
        Arc::clone(&generator),
        Arc::clone(&analyzer),
        Arc::clone(&fixer),
        Arc::clone(&validator),
    );
    let result = orch
        .run(Specification::new("a todo app"), &trace(), &CancellationToken::new())
        .await;

    let failure = result.expect_err("run should exhaust retries");
    assert_eq!(failure.reason, FailureReason::ExhaustedRetries);
    assert_eq!(failure.errors.len(), 1);

    // Exactly two generate-or-fix cycles: one generation, one fix.
    assert_eq!(generator.calls(), 1);
    assert_eq!(fixer.calls(), 1);
    assert_eq!(validator.calls(), 2);
    assert_eq!(orch.history().len(), 2);
    assert_eq!(orch.history()[1].outcome, AttemptOutcome::GaveUp);
}

#[tokio::test]
async fn always_failing_validator_stops_after_exactly_n_cycles() {
    let generator = StubGenerator::yielding("broken");
    let analyzer = StubAnalyzer::fixable();
    let fixer = StubFixer::yielding("still broken");
    let validator = ScriptedValidator::always_failing();

    let mut orch = orchestrator(
        4,
        Arc::clone(&generator),
        Arc::clone(&analyzer),
        Arc::clone(&fixer),
        Arc::clone(&validator),
    );
    let failure = orch
        .run(Specification::new("a todo app"), &trace(), &CancellationToken::new())
        .await
        .expect_err("run should exhaust retries");

    assert_eq!(failure.reason, FailureReason::ExhaustedRetries);
    assert_eq!(generator.calls() + fixer.calls(), 4);
    assert_eq!(validator.calls(), 4);
}

#[tokio::test]
async fn unfixable_on_first_attempt_never_invokes_fixer() {
    let generator = StubGenerator::yielding("broken");
    let analyzer = StubAnalyzer::unfixable("errors reference models the description never mentions");
    let fixer = StubFixer::yielding("unused");
    let validator = ScriptedValidator::always_failing();

    let mut orch = orchestrator(
        3,
        Arc::clone(&generator),
        Arc::clone(&analyzer),
        Arc::clone(&fixer),
        Arc::clone(&validator),
    );
    let failure = orch
        .run(Specification::new("a todo app"), &trace(), &CancellationToken::new())
        .await
        .expect_err("run should fail as unfixable");

    assert_eq!(failure.reason, FailureReason::Unfixable);
    assert_eq!(analyzer.calls(), 1);
    assert_eq!(fixer.calls(), 0);
}

#[tokio::test]
async fn generation_decline_is_a_soft_failure() {
    let generator = StubGenerator::with_response(StubResponse::Decline);
    let analyzer = StubAnalyzer::fixable();
    let fixer = StubFixer::yielding("unused");
    let validator = ScriptedValidator::always_passing();

    let mut orch = orchestrator(
        3,
        Arc::clone(&generator),
        Arc::clone(&analyzer),
        Arc::clone(&fixer),
        Arc::clone(&validator),
    );
    let failure = orch
        .run(Specification::new("a todo app"), &trace(), &CancellationToken::new())
        .await
        .expect_err("declined generation should fail the run");

    assert_eq!(failure.reason, FailureReason::GenerationFailed);
    assert_eq!(validator.calls(), 0);
}

#[tokio::test]
async fn generation_transport_error_is_infrastructure() {
    let generator = StubGenerator::with_response(StubResponse::Fail(ActorError::Transport(
        "connection reset".to_string(),
    )));
    let analyzer = StubAnalyzer::fixable();
    let fixer = StubFixer::yielding("unused");
    let validator = ScriptedValidator::always_passing();

    let mut orch = orchestrator(
        3,
        Arc::clone(&generator),
        Arc::clone(&analyzer),
        Arc::clone(&fixer),
        Arc::clone(&validator),
    );
    let failure = orch
        .run(Specification::new("a todo app"), &trace(), &CancellationToken::new())
        .await
        .expect_err("transport error should fail the run");

    assert_eq!(failure.reason, FailureReason::Infrastructure);
    assert!(failure.detail.unwrap().contains("connection reset"));
}

#[tokio::test]
async fn cancellation_during_generation_stops_the_pipeline() {
    let generator = Arc::new(PendingGenerator {
        calls: AtomicUsize::new(0),
    });
    let analyzer = StubAnalyzer::fixable();
    let fixer = StubFixer::yielding("unused");
    let validator = ScriptedValidator::always_passing();

    let mut orch = CodegenOrchestrator::new(
        config(3),
        Arc::clone(&generator) as Arc<dyn GenerationStrategy>,
        Arc::clone(&analyzer) as Arc<dyn AnalysisStrategy>,
        Arc::clone(&fixer) as Arc<dyn FixStrategy>,
        Arc::clone(&validator) as Arc<dyn Validator>,
    );

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let failure = orch
        .run(Specification::new("a todo app"), &trace(), &cancel)
        .await
        .expect_err("cancelled run must not report success");

    assert_eq!(failure.reason, FailureReason::Cancelled);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    assert_eq!(validator.calls(), 0);
    assert_eq!(analyzer.calls(), 0);
    assert_eq!(fixer.calls(), 0);
}

#[tokio::test]
async fn replaying_the_same_script_yields_the_same_terminal_state() {
    for _ in 0..2 {
        let generator = StubGenerator::yielding("broken");
        let analyzer = StubAnalyzer::fixable();
        let fixer = StubFixer::yielding("fixed");
        let validator = ScriptedValidator::new(vec![vec![sample_error()], vec![]]);

        let mut orch = orchestrator(
            3,
            Arc::clone(&generator),
            Arc::clone(&analyzer),
            Arc::clone(&fixer),
            Arc::clone(&validator),
        );
        let result = orch
            .run(Specification::new("a todo app"), &trace(), &CancellationToken::new())
            .await;

        assert_eq!(result.unwrap().source_text, "fixed");
        assert_eq!(orch.history().len(), 2);
    }
}

#[tokio::test]
async fn orchestrator_is_single_shot() {
    let generator = StubGenerator::yielding("model Todo {}");
    let analyzer = StubAnalyzer::fixable();
    let fixer = StubFixer::yielding("unused");
    let validator = ScriptedValidator::always_passing();

    let mut orch = orchestrator(3, generator, analyzer, fixer, validator);
    let cancel = CancellationToken::new();
    orch.run(Specification::new("a todo app"), &trace(), &cancel)
        .await
        .expect("first run should succeed");

    let failure = orch
        .run(Specification::new("a todo app"), &trace(), &cancel)
        .await
        .expect_err("second run on the same instance must fail");
    assert_eq!(failure.reason, FailureReason::Infrastructure);
}

// ============================================================================
// Session
// ============================================================================

#[tokio::test]
async fn session_success_threads_schema_into_api_and_persists_both() {
    let generator = StubGenerator::yielding("generated source");
    let analyzer = StubAnalyzer::fixable();
    let fixer = StubFixer::yielding("unused");
    let validator = ScriptedValidator::always_passing();
    let sink = MemorySink::new();

    let session = Session::new(
        session_config(),
        Arc::clone(&generator) as Arc<dyn GenerationStrategy>,
        analyzer,
        fixer,
        validator,
        Arc::clone(&sink) as Arc<dyn Sink>,
    );

    let output = session
        .run("a todo app", &trace(), &CancellationToken::new())
        .await
        .expect("session should succeed");

    assert_eq!(output.schema.kind, ArtifactKind::Schema);
    assert_eq!(output.api.kind, ArtifactKind::Api);
    assert_eq!(output.schema_attempts.len(), 1);
    assert_eq!(output.api_attempts.len(), 1);

    // The API specification carries the schema source.
    let specs = generator.seen_specs.lock().unwrap();
    assert_eq!(specs.len(), 2);
    assert!(specs[0].schema_source.is_none());
    assert_eq!(specs[1].schema_source.as_deref(), Some("generated source"));

    // Persistence happens once per artifact, schema first.
    let writes = sink.writes.lock().unwrap();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0].0, PathBuf::from("out/schema.prisma"));
    assert_eq!(writes[1].0, PathBuf::from("out/api.ts"));
}

#[tokio::test]
async fn session_schema_failure_never_starts_api_generation() {
    let generator = Arc::new(KindGenerator {
        schema: StubResponse::Decline,
        api: StubResponse::Yield("api source".to_string()),
        schema_calls: AtomicUsize::new(0),
        api_calls: AtomicUsize::new(0),
    });
    let sink = MemorySink::new();

    let session = Session::new(
        session_config(),
        Arc::clone(&generator) as Arc<dyn GenerationStrategy>,
        StubAnalyzer::fixable(),
        StubFixer::yielding("unused"),
        ScriptedValidator::always_passing(),
        Arc::clone(&sink) as Arc<dyn Sink>,
    );

    let failure = session
        .run("a todo app", &trace(), &CancellationToken::new())
        .await
        .expect_err("schema failure should fail the session");

    assert_eq!(failure.stage, Stage::Schema);
    assert_eq!(failure.failure.reason, FailureReason::GenerationFailed);
    assert!(failure.schema.is_none());
    assert_eq!(generator.api_calls.load(Ordering::SeqCst), 0);
    assert!(sink.writes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn session_api_failure_preserves_the_schema_artifact() {
    let generator = Arc::new(KindGenerator {
        schema: StubResponse::Yield("model Todo {}".to_string()),
        api: StubResponse::Decline,
        schema_calls: AtomicUsize::new(0),
        api_calls: AtomicUsize::new(0),
    });
    let sink = MemorySink::new();

    let session = Session::new(
        session_config(),
        Arc::clone(&generator) as Arc<dyn GenerationStrategy>,
        StubAnalyzer::fixable(),
        StubFixer::yielding("unused"),
        ScriptedValidator::always_passing(),
        Arc::clone(&sink) as Arc<dyn Sink>,
    );

    let failure = session
        .run("a todo app", &trace(), &CancellationToken::new())
        .await
        .expect_err("api failure should fail the session");

    assert_eq!(failure.stage, Stage::Api);
    assert_eq!(
        failure.schema.as_ref().map(|a| a.source_text.as_str()),
        Some("model Todo {}")
    );
    // Nothing is written when the session fails.
    assert!(sink.writes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn session_reports_progress_without_blocking_on_observers() {
    use scaffold_core::ProgressReporter;

    let (reporter, mut rx) = ProgressReporter::channel();
    let session = Session::new(
        session_config(),
        StubGenerator::yielding("source"),
        StubAnalyzer::fixable(),
        StubFixer::yielding("unused"),
        ScriptedValidator::always_passing(),
        MemorySink::new(),
    )
    .with_progress(reporter);

    session
        .run("a todo app", &trace(), &CancellationToken::new())
        .await
        .expect("session should succeed");

    let mut states = Vec::new();
    while let Ok(event) = rx.try_recv() {
        states.push((event.kind, event.state));
    }
    assert!(states.contains(&(ArtifactKind::Schema, "Generating")));
    assert!(states.contains(&(ArtifactKind::Schema, "Done")));
    assert!(states.contains(&(ArtifactKind::Api, "Generating")));
    assert!(states.contains(&(ArtifactKind::Api, "Done")));

    // Schema states all precede API states.
    let first_api = states
        .iter()
        .position(|(kind, _)| *kind == ArtifactKind::Api)
        .unwrap();
    assert!(states[..first_api]
        .iter()
        .all(|(kind, _)| *kind == ArtifactKind::Schema));
}
