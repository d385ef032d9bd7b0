//! Public LFF processing API
//!
//! Pure functions over strings and graphs; no I/O, no process state. The
//! convenience free functions create a throwaway parser per call. Callers
//! that want the parse cache to work across calls hold an [`Lff`] session
//! and go through its methods.
//!
//! `success` on every result is defined as "the diagnostic stream
//! contains no error". Strict mode promotes warnings to errors here, at
//! the boundary, never inside the stages.

use serde::{Deserialize, Serialize};

use crate::ast::LffDocument;
use crate::cst::LffParser;
use crate::diagnostics::{has_errors, partition, promote_warnings, Diagnostic};
use crate::graph::Graph;
use crate::options::LffOptions;
use crate::pipeline::{full_pipeline, RunMetrics};
use crate::semantic::{validate_document, ValidationOutcome};
use crate::serializer::{self, SerializerOptions};

/// Result of [`parse_to_ast`].
#[derive(Debug)]
pub struct ParseResult {
    pub success: bool,
    /// The typed AST, present whenever the CST had a root.
    pub lff_ast: Option<LffDocument>,
    /// The assembled graph, present only when assembly had zero errors.
    pub core_ast: Option<Graph>,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub metrics: Option<RunMetrics>,
}

/// Result of [`Lff::round_trip`].
#[derive(Debug)]
pub struct RoundTripResult {
    pub success: bool,
    pub text: Option<String>,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

/// Placeholder verdict from [`validate_round_trip`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundTripValidation {
    pub valid: bool,
    pub errors: Vec<Diagnostic>,
}

/// A parsing session owning the parse cache and extension registry.
pub struct Lff {
    parser: LffParser,
    options: LffOptions,
}

impl Default for Lff {
    fn default() -> Self {
        Self::new(LffOptions::default())
    }
}

impl Lff {
    pub fn new(options: LffOptions) -> Self {
        Self {
            parser: LffParser::new().with_lexer_options(options.lexer.clone()),
            options,
        }
    }

    pub fn with_parser(parser: LffParser, options: LffOptions) -> Self {
        Self { parser, options }
    }

    pub fn options(&self) -> &LffOptions {
        &self.options
    }

    /// Parse to the typed AST plus the assembled graph.
    pub fn parse_to_ast(&mut self, text: &str) -> ParseResult {
        let run = full_pipeline(&mut self.parser, text, &self.options);
        let metrics = run.metrics();

        let mut diagnostics = run.diagnostics.clone();
        if self.options.strict {
            promote_warnings(&mut diagnostics);
        }
        let success = !has_errors(&diagnostics);
        let (errors, warnings) = partition(diagnostics);

        let core_ast = if success {
            run.graph_output.and_then(|output| output.graph)
        } else {
            None
        };

        ParseResult {
            success,
            lff_ast: run.document,
            core_ast,
            errors,
            warnings,
            metrics: Some(metrics),
        }
    }

    /// Parse straight to a graph; `None` when any stage errored.
    pub fn parse_to_graph(&mut self, text: &str) -> Option<Graph> {
        self.parse_to_ast(text).core_ast
    }

    /// Validate without assembling a graph; lexing, parsing and lowering
    /// problems count against validity alongside the semantic rules.
    pub fn validate(&mut self, text: &str, strict: bool) -> ValidationOutcome {
        let cst_result = self.parser.parse_to_cst(text, &self.options.parser);
        let mut diagnostics: Vec<Diagnostic> = cst_result.diagnostics;

        if let Some(cst) = &cst_result.cst {
            let document = crate::ast::lower(cst, &self.options.lowering);
            diagnostics.extend(document.errors.clone());
            let outcome = validate_document(&document, false);
            diagnostics.extend(outcome.errors);
            diagnostics.extend(outcome.warnings);
        }

        if strict {
            promote_warnings(&mut diagnostics);
        }
        let (errors, warnings) = partition(diagnostics);
        ValidationOutcome {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Parse, then serialize the resulting graph.
    pub fn round_trip(&mut self, text: &str) -> RoundTripResult {
        let serializer_options = self.options.serializer.clone();
        let result = self.parse_to_ast(text);
        RoundTripResult {
            success: result.success && result.core_ast.is_some(),
            text: result
                .core_ast
                .map(|graph| serializer::serialize(&graph, &serializer_options)),
            errors: result.errors,
            warnings: result.warnings,
        }
    }

    pub fn cache_len(&self) -> usize {
        self.parser.cache_len()
    }
}

// Free-function façade over a throwaway session.

/// Parse LFF text to its AST and graph with the given options.
pub fn parse_to_ast(text: &str, options: &LffOptions) -> ParseResult {
    Lff::new(options.clone()).parse_to_ast(text)
}

/// Parse LFF text straight to a graph; `None` when any stage errored.
pub fn parse_to_graph(text: &str, options: &LffOptions) -> Option<Graph> {
    Lff::new(options.clone()).parse_to_graph(text)
}

/// Validate LFF text. In strict mode warnings count as errors.
pub fn validate(text: &str, strict: bool) -> ValidationOutcome {
    Lff::default().validate(text, strict)
}

/// Serialize a graph under a preset or explicit options.
pub fn serialize(graph: &Graph, options: impl Into<SerializerOptions>) -> String {
    serializer::serialize(graph, &options.into())
}

/// Round-trip verification entry point. The actual comparison is future
/// work; this reports validity so the API surface is complete.
pub fn validate_round_trip(_graph: &Graph) -> RoundTripValidation {
    RoundTripValidation {
        valid: true,
        errors: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::SerializerPreset;

    #[test]
    fn parse_to_ast_success_shape() {
        let result = parse_to_ast("A [svc] -> B [svc]\n", &LffOptions::default());
        assert!(result.success);
        assert!(result.errors.is_empty());
        let ast = result.lff_ast.unwrap();
        assert_eq!(ast.nodes.len(), 2);
        assert_eq!(ast.edges.len(), 1);
        let graph = result.core_ast.unwrap();
        assert_eq!(graph.node_count(), 2);
        assert!(result.metrics.unwrap().token_count > 0);
    }

    #[test]
    fn parse_to_graph_none_on_errors() {
        assert!(parse_to_graph("A -> *missing\n", &LffOptions::default()).is_none());
        assert!(parse_to_graph("A [svc]\n", &LffOptions::default()).is_some());
    }

    #[test]
    fn failed_parse_still_exposes_partial_ast() {
        let result = parse_to_ast(
            "Frontend [web\nBackend [api]\nFrontend -> Backend\n",
            &LffOptions::default(),
        );
        assert!(!result.success);
        assert!(result.core_ast.is_none());
        let ast = result.lff_ast.unwrap();
        assert!(ast.nodes.iter().any(|n| n.name == "Backend"));
        assert_eq!(ast.edges.len(), 1);
    }

    #[test]
    fn strict_mode_promotes_at_boundary() {
        let text = "@custom: 1\nA [svc]\n";
        let relaxed = parse_to_ast(text, &LffOptions::default());
        assert!(relaxed.success);
        assert!(!relaxed.warnings.is_empty());

        let strict = parse_to_ast(text, &LffOptions::strict());
        assert!(!strict.success);
        assert!(strict.core_ast.is_none());
    }

    #[test]
    fn validate_free_function() {
        let outcome = validate("A &x [svc]\nB &x [svc]\n", false);
        assert!(!outcome.valid);

        let clean = validate("A [svc]\n", false);
        assert!(clean.valid);
    }

    #[test]
    fn session_cache_is_visible_across_calls() {
        let mut session = Lff::default();
        let text = "A [svc] -> B [svc]\n";
        let first = session.parse_to_ast(text);
        assert!(!first.metrics.unwrap().from_cache);
        let second = session.parse_to_ast(text);
        assert!(second.metrics.unwrap().from_cache);
        assert_eq!(session.cache_len(), 1);
    }

    #[test]
    fn round_trip_produces_reparsable_text() {
        let mut session = Lff::default();
        let result = session.round_trip("@title: Demo\nA [svc] -> B [svc]\n");
        assert!(result.success);
        let text = result.text.unwrap();
        let reparsed = parse_to_graph(&text, &LffOptions::default()).unwrap();
        assert_eq!(reparsed.node_count(), 2);
        assert_eq!(reparsed.edge_count(), 1);
        assert_eq!(reparsed.metadata.title.as_deref(), Some("Demo"));
    }

    #[test]
    fn serialize_accepts_presets_and_options() {
        let graph = parse_to_graph("A [svc]\n", &LffOptions::default()).unwrap();
        let preset_text = serialize(&graph, SerializerPreset::Pretty);
        let options_text = serialize(&graph, SerializerOptions::pretty());
        assert_eq!(preset_text, options_text);
    }

    #[test]
    fn validate_round_trip_placeholder() {
        let graph = parse_to_graph("A [svc]\n", &LffOptions::default()).unwrap();
        let verdict = validate_round_trip(&graph);
        assert!(verdict.valid);
        assert!(verdict.errors.is_empty());
    }
}
