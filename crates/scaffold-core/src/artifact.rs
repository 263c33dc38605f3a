use serde::{Deserialize, Serialize};

// ============================================================================
// Artifact Types - What the generation pipeline produces and consumes
// ============================================================================

/// The target an artifact belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Database schema for the scaffolded project
    Schema,
    /// API layer generated on top of the schema
    Api,
}

impl ArtifactKind {
    /// Returns the kind name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Api => "api",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Immutable input describing what to build.
///
/// Produced once by the caller and read-only to the generation pipeline.
/// For API generation the previously generated schema source is attached so
/// the strategy can build on top of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    /// Free-form description of the project to scaffold
    pub description: String,

    /// Source text of the generated schema, present for API generation
    pub schema_source: Option<String>,
}

impl Specification {
    /// Create a specification from a plain description
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            schema_source: None,
        }
    }

    /// Create a specification that carries a generated schema
    pub fn with_schema(description: impl Into<String>, schema_source: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            schema_source: Some(schema_source.into()),
        }
    }
}

/// Generated source text for one target.
///
/// Superseded, never mutated: each generate or fix pass produces a fresh
/// artifact value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    /// The generated source
    pub source_text: String,

    /// Which target this artifact is for
    pub kind: ArtifactKind,
}

impl GeneratedArtifact {
    /// Create a new artifact
    pub fn new(kind: ArtifactKind, source_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            kind,
        }
    }
}

/// Correlation identifier threaded through every actor invocation.
///
/// Carried by value for log correlation only; never used for control flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Trace(String);

impl Trace {
    /// Create a trace from any string-like id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Trace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
