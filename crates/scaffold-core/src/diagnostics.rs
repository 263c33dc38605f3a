//! Normalized diagnostics produced by validating a generated artifact.
//!
//! A validation pass runs a type-checker over the current artifact and
//! reduces its output to a flat list of [`ErrorInfo`] rows. The pipeline only
//! inspects whether the list is empty; the rows themselves exist for error
//! analysis and for reporting back to the caller.

use serde::{Deserialize, Serialize};

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// A type or compile error - must be fixed.
    Error,
    /// A warning - reported but does not fail validation on its own.
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// One normalized diagnostic from a validation pass.
///
/// Recomputed fresh for every attempt; never carried over from a previous
/// artifact version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// The file path the checker reported.
    pub file_path: String,

    /// The line number (1-indexed).
    pub line: u32,

    /// The column number (1-indexed).
    pub column: u32,

    /// The main error message.
    pub message: String,

    /// The severity level.
    pub severity: Severity,
}

impl ErrorInfo {
    /// Create an error-severity diagnostic.
    pub fn new(file_path: impl Into<String>, line: u32, column: u32, message: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            line,
            column,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    /// Create a diagnostic with an explicit severity.
    pub fn with_severity(
        file_path: impl Into<String>,
        line: u32,
        column: u32,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            line,
            column,
            message: message.into(),
            severity,
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}: {}",
            self.file_path, self.line, self.column, self.severity, self.message
        )
    }
}
