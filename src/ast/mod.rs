//! The typed LFF AST
//!
//! The AST sits between the CST and the graph: a tree of node definitions
//! (each exclusively owning its children), edge definitions with unresolved
//! endpoint names, and document-level directives. Every construct keeps a
//! location into the original text.

pub mod lowering;
pub mod value;

use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostic;
use crate::source::{SourceInfo, SourceLocation};

pub use lowering::{lower, AstLoweringOptions};
pub use value::{PropertyMap, Value};

/// The four edge arrow kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArrowKind {
    /// `->`
    Simple,
    /// `=>`
    Multiple,
    /// `<->`
    Bidirectional,
    /// `-->`
    Dashed,
}

impl ArrowKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            ArrowKind::Simple => "->",
            ArrowKind::Multiple => "=>",
            ArrowKind::Bidirectional => "<->",
            ArrowKind::Dashed => "-->",
        }
    }

    /// The edge type this arrow lowers to. A simple arrow takes the
    /// caller's default edge type; the other arrows name themselves.
    pub fn graph_type(&self, default_edge_type: &str) -> String {
        match self {
            ArrowKind::Simple => default_edge_type.to_string(),
            ArrowKind::Multiple => "multiple".to_string(),
            ArrowKind::Bidirectional => "bidirectional".to_string(),
            ArrowKind::Dashed => "dashed".to_string(),
        }
    }

    /// Inverse of [`ArrowKind::graph_type`], used by the serializer.
    /// Unknown types fall back to the simple arrow.
    pub fn from_graph_type(edge_type: &str) -> ArrowKind {
        match edge_type {
            "multiple" => ArrowKind::Multiple,
            "bidirectional" => ArrowKind::Bidirectional,
            "dashed" => ArrowKind::Dashed,
            _ => ArrowKind::Simple,
        }
    }
}

/// A node definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_spec: Option<String>,
    #[serde(skip_serializing_if = "PropertyMap::is_empty", default)]
    pub properties: PropertyMap,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<NodeDef>,
    pub location: SourceLocation,
}

impl NodeDef {
    pub fn named(name: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            name: name.into(),
            anchor: None,
            types: Vec::new(),
            level_spec: None,
            properties: PropertyMap::new(),
            children: Vec::new(),
            location,
        }
    }

    /// Pre-order walk over this definition and its descendants.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a NodeDef)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// An edge definition. Endpoints are node names or `*anchor` references;
/// resolution to IDs happens in the assembler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDef {
    pub from: String,
    pub to: String,
    pub arrow: ArrowKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "PropertyMap::is_empty", default)]
    pub properties: PropertyMap,
    pub location: SourceLocation,
}

/// A document-level `@name: value` directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectiveDef {
    pub name: String,
    pub value: Value,
    pub location: SourceLocation,
}

/// The lowered document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LffDocument {
    pub nodes: Vec<NodeDef>,
    pub edges: Vec<EdgeDef>,
    pub directives: Vec<DirectiveDef>,
    /// Diagnostics produced during lowering.
    pub errors: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_info: Option<SourceInfo>,
}

impl LffDocument {
    /// Total number of node definitions, nested included.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        for node in &self.nodes {
            node.walk(&mut |_| count += 1);
        }
        count
    }

    /// Find a directive by name; last occurrence wins, matching the
    /// duplicate-directive policy.
    pub fn directive(&self, name: &str) -> Option<&DirectiveDef> {
        self.directives.iter().rev().find(|d| d.name == name)
    }
}
