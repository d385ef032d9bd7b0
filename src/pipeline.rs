//! Pipeline orchestration
//!
//! The pipeline runs five stages over a document:
//!
//! 1. Lexing (text to tokens)
//! 2. CST building (tokens to concrete tree, cached)
//! 3. AST lowering (concrete tree to typed AST)
//! 4. Semantic validation
//! 5. Graph assembly (typed AST to graph)
//!
//! Each stage appends to the shared diagnostic stream and the next stage
//! still runs, except when the CST builder produced no root, which skips
//! everything downstream. Serialization is the inverse direction and
//! lives in [`crate::serializer`].

use serde::{Deserialize, Serialize};

use crate::assembler::{self, GraphLoweringOutput};
use crate::ast::{lower, LffDocument};
use crate::cst::{CstResult, LffParser};
use crate::diagnostics::Diagnostic;
use crate::graph::Graph;
use crate::options::LffOptions;
use crate::semantic::validate_document;

/// Failure of a whole pipeline phase, as opposed to the per-construct
/// diagnostics the stages accumulate.
#[derive(Debug)]
pub enum PipelineError {
    Lexer(String),
    Parser(String),
    Assembler(String),
    Serializer(String),
    Io(std::io::Error),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Lexer(msg) => write!(f, "lexer error: {}", msg),
            PipelineError::Parser(msg) => write!(f, "parser error: {}", msg),
            PipelineError::Assembler(msg) => write!(f, "assembler error: {}", msg),
            PipelineError::Serializer(msg) => write!(f, "serializer error: {}", msg),
            PipelineError::Io(err) => write!(f, "i/o error: {}", err),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err)
    }
}

/// Everything a full pipeline run produced, stage by stage.
pub struct ParseRun {
    pub cst_result: CstResult,
    pub document: Option<LffDocument>,
    pub graph_output: Option<GraphLoweringOutput>,
    /// Diagnostics from every stage in pipeline order. Strict promotion
    /// has not been applied yet; that happens at the API boundary.
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseRun {
    pub fn graph(self) -> Option<Graph> {
        self.graph_output.and_then(|output| output.graph)
    }
}

/// Timing summary across the run. Times are milliseconds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunMetrics {
    pub lex_time: f64,
    pub parse_time: f64,
    pub assemble_time: f64,
    pub total_time: f64,
    pub from_cache: bool,
    pub token_count: usize,
}

/// Execute lexing through graph assembly on one document.
pub fn full_pipeline(parser: &mut LffParser, text: &str, options: &LffOptions) -> ParseRun {
    let cst_result = parser.parse_to_cst(text, &options.parser);
    let mut diagnostics = cst_result.diagnostics.clone();

    // No root means nothing to lower; return with what the earlier
    // stages reported.
    let cst = match &cst_result.cst {
        Some(cst) => cst,
        None => {
            return ParseRun {
                cst_result,
                document: None,
                graph_output: None,
                diagnostics,
            }
        }
    };

    let mut document = lower(cst, &options.lowering);
    diagnostics.extend(document.errors.clone());
    document.source_info = cst_result.source_info.clone();

    let validation = validate_document(&document, false);
    diagnostics.extend(validation.errors.clone());
    diagnostics.extend(validation.warnings.clone());

    let graph_output = assembler::to_graph(&document, &options.graph);
    diagnostics.extend(graph_output.errors.clone());
    diagnostics.extend(graph_output.warnings.clone());

    ParseRun {
        cst_result,
        document: Some(document),
        graph_output: Some(graph_output),
        diagnostics,
    }
}

impl ParseRun {
    /// Collapse the stage metrics into one summary.
    pub fn metrics(&self) -> RunMetrics {
        let assemble_time = self
            .graph_output
            .as_ref()
            .map(|g| g.metrics.assemble_time_ms)
            .unwrap_or(0.0);
        RunMetrics {
            lex_time: self.cst_result.metrics.lex_time,
            parse_time: self.cst_result.metrics.parse_time,
            assemble_time,
            total_time: self.cst_result.metrics.total_time + assemble_time,
            from_cache: self.cst_result.metrics.from_cache,
            token_count: self.cst_result.metrics.token_count,
        }
    }
}
