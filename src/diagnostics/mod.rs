//! Unified diagnostic model for the LFF pipeline
//!
//! Every stage (lexer, CST builder, lowering, validator, assembler,
//! serializer) reports problems as [`Diagnostic`] values accumulated into
//! the final result instead of aborting. A failed result is defined as one
//! containing at least one `Error`-severity diagnostic; warnings only fail
//! a run in strict mode, where they are promoted at the API boundary.

pub mod render;

use serde::{Deserialize, Serialize};

use crate::source::SourceLocation;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Hint,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Hint => "hint",
        }
    }
}

/// Surrounding source text attached to a diagnostic for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticContext {
    /// The line preceding the offending line, if any.
    pub before: Option<String>,
    /// The line following the offending line, if any.
    pub after: Option<String>,
    /// The offending line itself.
    pub line: String,
}

/// A location/message pair pointing at related source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedInfo {
    pub location: SourceLocation,
    pub message: String,
}

/// A single textual edit of a fix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    pub range: SourceLocation,
    pub new_text: String,
}

/// A suggested fix applicable by tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fix {
    pub title: String,
    pub edits: Vec<TextEdit>,
}

/// A structured message produced by any pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub message: String,
    pub location: SourceLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<DiagnosticContext>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub related: Vec<RelatedInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub fixes: Vec<Fix>,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        code: impl Into<String>,
        message: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            message: message.into(),
            location,
            context: None,
            suggestions: Vec::new(),
            related: Vec::new(),
            fixes: Vec::new(),
        }
    }

    pub fn error(
        code: impl Into<String>,
        message: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Self::new(Severity::Error, code, message, location)
    }

    pub fn warning(
        code: impl Into<String>,
        message: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Self::new(Severity::Warning, code, message, location)
    }

    pub fn info(
        code: impl Into<String>,
        message: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Self::new(Severity::Info, code, message, location)
    }

    pub fn hint(
        code: impl Into<String>,
        message: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Self::new(Severity::Hint, code, message, location)
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_related(mut self, location: SourceLocation, message: impl Into<String>) -> Self {
        self.related.push(RelatedInfo {
            location,
            message: message.into(),
        });
        self
    }

    pub fn with_fix(mut self, title: impl Into<String>, edits: Vec<TextEdit>) -> Self {
        self.fixes.push(Fix {
            title: title.into(),
            edits,
        });
        self
    }

    /// Attach the surrounding source lines for rendering.
    pub fn with_context_from(mut self, source: &str) -> Self {
        let lines: Vec<&str> = source.lines().collect();
        let idx = self.location.start_line.saturating_sub(1);
        if idx < lines.len() {
            self.context = Some(DiagnosticContext {
                before: idx
                    .checked_sub(1)
                    .and_then(|i| lines.get(i))
                    .map(|s| s.to_string()),
                after: lines.get(idx + 1).map(|s| s.to_string()),
                line: lines[idx].to_string(),
            });
        }
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

/// True if any diagnostic in the slice is an error.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

/// Promote every warning to an error. Strict mode applies this at the API
/// boundary; individual rules never change severity themselves.
pub fn promote_warnings(diagnostics: &mut [Diagnostic]) {
    for diag in diagnostics.iter_mut() {
        if diag.severity == Severity::Warning {
            diag.severity = Severity::Error;
        }
    }
}

/// Split diagnostics into (errors, everything else).
pub fn partition(diagnostics: Vec<Diagnostic>) -> (Vec<Diagnostic>, Vec<Diagnostic>) {
    diagnostics.into_iter().partition(Diagnostic::is_error)
}

/// Stable diagnostic codes, grouped by subsystem.
pub mod codes {
    // Lexical
    pub const ODD_INDENTATION: &str = "ODD_INDENTATION";
    pub const TAB_CHARACTER: &str = "TAB_CHARACTER";
    pub const TRAILING_WHITESPACE: &str = "TRAILING_WHITESPACE";
    pub const INVALID_LEVEL_ZERO: &str = "INVALID_LEVEL_ZERO";
    pub const INCOMPLETE_BIDIRECTIONAL_ARROW: &str = "INCOMPLETE_BIDIRECTIONAL_ARROW";
    pub const INVALID_ANCHOR_NAME: &str = "INVALID_ANCHOR_NAME";
    pub const INVALID_ANCHOR_START: &str = "INVALID_ANCHOR_START";
    pub const ANCHOR_NAME_TOO_LONG: &str = "ANCHOR_NAME_TOO_LONG";
    pub const UNTERMINATED_STRING: &str = "UNTERMINATED_STRING";
    pub const INVALID_ESCAPE: &str = "INVALID_ESCAPE";
    pub const INVALID_NUMBER: &str = "INVALID_NUMBER";
    pub const MAX_DEPTH_EXCEEDED: &str = "MAX_DEPTH_EXCEEDED";
    pub const UNEXPECTED_CHARACTER: &str = "UNEXPECTED_CHARACTER";

    // Structural
    pub const SYNTAX_ERROR: &str = "SYNTAX_ERROR";
    pub const LEXER_NOT_INITIALIZED: &str = "LEXER_NOT_INITIALIZED";
    pub const MISSING_EDGE_ENDPOINT: &str = "MISSING_EDGE_ENDPOINT";
    pub const NODE_NAME_EMPTY: &str = "NODE_NAME_EMPTY";
    pub const UNKNOWN_DIRECTIVE: &str = "UNKNOWN_DIRECTIVE";
    pub const UNKNOWN_ARROW: &str = "UNKNOWN_ARROW";
    pub const AMBIGUOUS_INLINE_VALUE: &str = "AMBIGUOUS_INLINE_VALUE";
    pub const UNKNOWN_OPTION: &str = "UNKNOWN_OPTION";

    // Semantic
    pub const REFERENCE_ANCHOR_UNIQUE: &str = "REFERENCE_ANCHOR_UNIQUE";
    pub const UNDEFINED_ANCHOR_REFERENCE: &str = "UNDEFINED_ANCHOR_REFERENCE";
    pub const CIRCULAR_HIERARCHY: &str = "CIRCULAR_HIERARCHY";
    pub const CIRCULAR_PARENT_REFERENCE: &str = "CIRCULAR_PARENT_REFERENCE";
    pub const INVALID_LEVEL_SPEC: &str = "INVALID_LEVEL_SPEC";
    pub const INVALID_TYPE_NAME: &str = "INVALID_TYPE_NAME";
    pub const DUPLICATE_DIRECTIVE: &str = "DUPLICATE_DIRECTIVE";
    pub const VERSION_FORMAT: &str = "VERSION_FORMAT";

    // Lowering / graph
    pub const DUPLICATE_NODE_ID: &str = "DUPLICATE_NODE_ID";
    pub const INVALID_NODE_REFERENCE: &str = "INVALID_NODE_REFERENCE";
    pub const MAX_NODES_EXCEEDED: &str = "MAX_NODES_EXCEEDED";
    pub const MAX_EDGES_EXCEEDED: &str = "MAX_EDGES_EXCEEDED";
    pub const SELF_LOOP_EDGE: &str = "SELF_LOOP_EDGE";
    pub const DUPLICATE_EDGE: &str = "DUPLICATE_EDGE";
}
