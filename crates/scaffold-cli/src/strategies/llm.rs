//! LLM-backed implementations of the core generation, analysis, and fix
//! strategies.
//!
//! Each strategy is one completion call plus response shaping. An empty or
//! unusable response becomes the soft-failure form (`Ok(None)`); transport
//! and auth problems become `ActorError`s.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use scaffold_core::{
    ActorError, ActorResult, AnalysisStrategy, ArtifactKind, ErrorInfo, FixPlan, FixStrategy,
    GeneratedArtifact, GenerationStrategy, Specification, Trace,
};

use crate::llm::{LlmClient, LlmError};

const SCHEMA_SYSTEM: &str = "You are a database schema generator for backend projects. \
Given a project description, produce a complete Prisma schema. \
Reply with a single fenced code block containing only the schema.";

const API_SYSTEM: &str = "You are an API code generator for backend projects. \
Given a project description and its database schema, produce a complete \
TypeScript API module. Reply with a single fenced code block containing only \
the source.";

const ANALYSIS_SYSTEM: &str = "You are a code repair analyst. Given generated source and \
a list of type-checker errors, describe concretely how to fix them. \
If the errors cannot be fixed by editing this source alone, reply with a \
single line starting with UNFIXABLE: followed by the reason.";

const FIX_SYSTEM: &str = "You are a code repair tool. Apply the given fix plan to the \
source and reply with a single fenced code block containing the full \
corrected source.";

fn map_llm_err(err: LlmError) -> ActorError {
    match err {
        LlmError::Auth(status) => ActorError::Auth(format!("provider returned status {}", status)),
        other => ActorError::Transport(other.to_string()),
    }
}

/// Pull the source out of a model reply.
///
/// Prefers the first fenced code block; falls back to the whole reply when no
/// fence is present. Returns `None` for empty or malformed replies.
fn extract_source(text: &str) -> Option<String> {
    if let Some(start) = text.find("```") {
        let after = &text[start + 3..];
        // Skip the language tag line
        let body_start = after.find('\n')? + 1;
        let body = &after[body_start..];
        let end = body.find("```")?;
        let block = body[..end].trim_end();
        if block.is_empty() {
            return None;
        }
        return Some(block.to_string());
    }

    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse an analysis reply into a fix plan.
fn parse_plan(text: &str) -> Option<FixPlan> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(rest) = trimmed.strip_prefix("UNFIXABLE") {
        let reason = rest.trim_start_matches(':').trim();
        let reason = if reason.is_empty() {
            "analysis marked the errors unfixable".to_string()
        } else {
            reason.to_string()
        };
        return Some(FixPlan::Unfixable { reason });
    }

    Some(FixPlan::Fixable {
        details: trimmed.to_string(),
    })
}

fn format_errors(errors: &[ErrorInfo]) -> String {
    errors
        .iter()
        .map(|e| format!("- {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Generation strategy backed by one completion call.
pub struct LlmGenerator {
    client: LlmClient,
}

impl LlmGenerator {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GenerationStrategy for LlmGenerator {
    async fn generate(
        &self,
        specification: &Specification,
        kind: ArtifactKind,
        _trace: &Trace,
        cancel: &CancellationToken,
    ) -> ActorResult<GeneratedArtifact> {
        let (system, prompt) = match kind {
            ArtifactKind::Schema => (
                SCHEMA_SYSTEM,
                format!("Project description:\n{}", specification.description),
            ),
            ArtifactKind::Api => (
                API_SYSTEM,
                format!(
                    "Project description:\n{}\n\nDatabase schema:\n{}",
                    specification.description,
                    specification.schema_source.as_deref().unwrap_or("")
                ),
            ),
        };

        let text = self
            .client
            .complete(system, &prompt, cancel)
            .await
            .map_err(map_llm_err)?;

        Ok(extract_source(&text).map(|source| GeneratedArtifact::new(kind, source)))
    }
}

/// Analysis strategy backed by one completion call.
pub struct LlmAnalyzer {
    client: LlmClient,
}

impl LlmAnalyzer {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AnalysisStrategy for LlmAnalyzer {
    async fn analyze(
        &self,
        artifact: &GeneratedArtifact,
        errors: &[ErrorInfo],
        _trace: &Trace,
        cancel: &CancellationToken,
    ) -> ActorResult<FixPlan> {
        let prompt = format!(
            "Source ({}):\n```\n{}\n```\n\nType-checker errors:\n{}",
            artifact.kind,
            artifact.source_text,
            format_errors(errors)
        );

        let text = self
            .client
            .complete(ANALYSIS_SYSTEM, &prompt, cancel)
            .await
            .map_err(map_llm_err)?;

        Ok(parse_plan(&text))
    }
}

/// Fix strategy backed by one completion call.
pub struct LlmFixer {
    client: LlmClient,
}

impl LlmFixer {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FixStrategy for LlmFixer {
    async fn fix(
        &self,
        artifact: &GeneratedArtifact,
        plan: &FixPlan,
        _trace: &Trace,
        cancel: &CancellationToken,
    ) -> ActorResult<GeneratedArtifact> {
        let details = match plan {
            FixPlan::Fixable { details } => details.as_str(),
            // The orchestrator never forwards an unfixable plan here.
            FixPlan::Unfixable { .. } => return Ok(None),
        };

        let prompt = format!(
            "Source ({}):\n```\n{}\n```\n\nFix plan:\n{}",
            artifact.kind, artifact.source_text, details
        );

        let text = self
            .client
            .complete(FIX_SYSTEM, &prompt, cancel)
            .await
            .map_err(map_llm_err)?;

        Ok(extract_source(&text).map(|source| GeneratedArtifact::new(artifact.kind, source)))
    }
}
