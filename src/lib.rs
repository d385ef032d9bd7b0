//! LFF Parser and Serializer
//!
//! LFF (LayerFlow Format) is an indentation-sensitive textual notation
//! for layered architecture graphs: nodes (optionally typed, nested and
//! placed at numeric layer levels) connected by typed edges, plus
//! document-level directives carrying metadata.
//!
//! The crate implements the full language pipeline:
//!
//! ```text
//! source text -> tokens -> CST -> LFF AST -> graph -> source text
//!      (lex)      (parse)   (lower) (validate + assemble) (serialize)
//! ```
//!
//! # Quick start
//!
//! ```
//! use lff::{parse_to_graph, serialize, LffOptions, SerializerPreset};
//!
//! let graph = parse_to_graph(
//!     "Frontend [web] -> Backend [api]\n",
//!     &LffOptions::default(),
//! )
//! .expect("document is valid");
//! assert_eq!(graph.node_count(), 2);
//!
//! let text = serialize(&graph, SerializerPreset::Pretty);
//! assert!(text.contains("Frontend [web]"));
//! ```
//!
//! Errors are data, not control flow: every stage accumulates
//! [`diagnostics::Diagnostic`] values and keeps going, so a single broken
//! line never hides the rest of a document.

pub mod api;
pub mod assembler;
pub mod ast;
pub mod cst;
pub mod diagnostics;
pub mod graph;
pub mod lexer;
pub mod options;
pub mod pipeline;
pub mod semantic;
pub mod serializer;
pub mod source;

pub use api::{parse_to_ast, parse_to_graph, serialize, validate, validate_round_trip, Lff};
pub use ast::{ArrowKind, DirectiveDef, EdgeDef, LffDocument, NodeDef, PropertyMap, Value};
pub use diagnostics::{Diagnostic, Severity};
pub use graph::{Edge, Graph, GraphMetadata, GraphNode, GraphOptions};
pub use lexer::{tokenize, LexerOptions, Token, TokenKind};
pub use options::LffOptions;
pub use serializer::{SerializerOptions, SerializerPreset};
pub use source::{SourceInfo, SourceLocation};
