//! Concrete syntax tree for LFF
//!
//! The CST preserves every structural production of the grammar, tokens
//! included, so that later stages (and tooling) can recover the exact
//! source shape. Lowering to the typed AST happens in [`crate::ast`].

pub mod builder;
pub mod cache;
pub mod extensions;

use serde::{Deserialize, Serialize};

use crate::lexer::Token;
use crate::source::SourceLocation;

pub use builder::{CstResult, LffParser, ParseMetrics, ParserOptions};
pub use cache::ParseCache;
pub use extensions::{ExtensionError, GrammarExtensionRegistry, GrammarRule};

/// A value production: a scalar token, a run of bare words, or a
/// bracketed array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CstValue {
    Scalar(Token),
    /// Unquoted multi-token text running to the end of the line, e.g.
    /// `@title: Simple System`. Joined into one string at lowering.
    Words {
        tokens: Vec<Token>,
        location: SourceLocation,
    },
    Array {
        open: Token,
        items: Vec<CstValue>,
        close: Option<Token>,
        location: SourceLocation,
    },
}

impl CstValue {
    pub fn location(&self) -> SourceLocation {
        match self {
            CstValue::Scalar(token) => token.location,
            CstValue::Words { location, .. } => *location,
            CstValue::Array { location, .. } => *location,
        }
    }
}

/// `@name: value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CstDirective {
    pub name: Token,
    pub value: Option<CstValue>,
    pub location: SourceLocation,
}

/// `key: value` inside a node block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CstProperty {
    pub key: Token,
    pub value: CstValue,
    pub location: SourceLocation,
}

/// One entry of an indented node block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CstBlockItem {
    Property(CstProperty),
    Child(CstNodeDecl),
    Comment(Token),
    /// Directives are legal anywhere; lowering hoists them to the
    /// document level.
    Directive(CstDirective),
}

/// `Name [&anchor] [[types]] [@level] [: value | : block]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CstNodeDecl {
    /// Identifier or string literal.
    pub name: Token,
    pub anchor: Option<Token>,
    pub types: Vec<Token>,
    pub level: Option<Token>,
    /// Same-line value after the colon (`Node: value`).
    pub inline_value: Option<CstValue>,
    pub block: Vec<CstBlockItem>,
    pub location: SourceLocation,
}

/// One reference in an edge chain, with any node decorations it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CstEdgeSegment {
    /// Identifier, string literal or anchor reference.
    pub node: Token,
    pub anchor: Option<Token>,
    pub types: Vec<Token>,
    pub level: Option<Token>,
}

/// `Ref Arrow Ref (Arrow Ref)* [: label]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CstEdgeDecl {
    pub segments: Vec<CstEdgeSegment>,
    /// Arrows between segments; `arrows.len() == segments.len() - 1`.
    pub arrows: Vec<Token>,
    pub label: Option<CstValue>,
    pub location: SourceLocation,
}

/// A top-level statement of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CstStatement {
    Directive(CstDirective),
    Node(CstNodeDecl),
    Edge(CstEdgeDecl),
    Comment(Token),
    /// Tokens skipped during error recovery, kept for tooling.
    Error {
        tokens: Vec<Token>,
        location: SourceLocation,
    },
}

impl CstStatement {
    pub fn location(&self) -> SourceLocation {
        match self {
            CstStatement::Directive(d) => d.location,
            CstStatement::Node(n) => n.location,
            CstStatement::Edge(e) => e.location,
            CstStatement::Comment(t) => t.location,
            CstStatement::Error { location, .. } => *location,
        }
    }
}

/// The parsed document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cst {
    pub statements: Vec<CstStatement>,
}

impl Cst {
    /// Number of statements of each interesting kind, used by metrics and
    /// the CLI summary.
    pub fn counts(&self) -> (usize, usize, usize) {
        let mut nodes = 0;
        let mut edges = 0;
        let mut directives = 0;
        for statement in &self.statements {
            match statement {
                CstStatement::Node(_) => nodes += 1,
                CstStatement::Edge(_) => edges += 1,
                CstStatement::Directive(_) => directives += 1,
                _ => {}
            }
        }
        (nodes, edges, directives)
    }
}
