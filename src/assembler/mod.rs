//! AST to graph assembly
//!
//! Flattens the LFF AST into a [`Graph`]: nodes get stable IDs and
//! computed levels, anchors and names resolve to IDs, directives become
//! document metadata, and LFF provenance is preserved under the `lff`
//! metadata key. The graph is returned only when assembly produced zero
//! errors; warnings never suppress it.
//!
//! Resolution policy for edge endpoints, in order: `*anchor` references
//! through the anchor map (unresolved ones are errors and drop the edge),
//! then declared node names (first declaration wins for duplicate names),
//! then auto-creation of a default-typed root node so every edge in the
//! returned graph references existing IDs.

use std::collections::HashMap;
use std::time::Instant;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ast::{LffDocument, NodeDef, PropertyMap, Value};
use crate::diagnostics::{codes, partition, promote_warnings, Diagnostic};
use crate::graph::{Edge, Graph, GraphNode, GraphOptions};
use crate::lexer::patterns::LEVEL_SPEC_RE;
use crate::source::SourceLocation;

/// Options for [`to_graph`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphLoweringOptions {
    pub default_node_type: String,
    pub default_edge_type: String,
    /// Keep `lff` provenance sub-maps and parser info in metadata.
    pub preserve_lff_metadata: bool,
    /// Generate collision-free IDs; otherwise IDs are sanitized names.
    pub generate_unique_ids: bool,
    pub strict_mode: bool,
    pub allow_self_loops: bool,
    pub max_nodes: Option<usize>,
    pub max_edges: Option<usize>,
}

impl Default for GraphLoweringOptions {
    fn default() -> Self {
        Self {
            default_node_type: "component".to_string(),
            default_edge_type: "connection".to_string(),
            preserve_lff_metadata: true,
            generate_unique_ids: true,
            strict_mode: false,
            allow_self_loops: false,
            max_nodes: None,
            max_edges: None,
        }
    }
}

/// Timing and volume metrics for an assembly call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembleMetrics {
    pub assemble_time_ms: f64,
    pub node_count: usize,
    pub edge_count: usize,
}

/// Result of lowering an AST into a graph.
#[derive(Debug)]
pub struct GraphLoweringOutput {
    /// Present only when no errors occurred.
    pub graph: Option<Graph>,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub metrics: AssembleMetrics,
}

/// Lower a validated document into a graph.
pub fn to_graph(document: &LffDocument, options: &GraphLoweringOptions) -> GraphLoweringOutput {
    let started = Instant::now();

    let mut graph = Graph::new(GraphOptions {
        allow_self_loops: options.allow_self_loops,
        max_nodes: options.max_nodes,
        max_edges: options.max_edges,
        ..Default::default()
    });
    apply_directives(&mut graph, document);
    if options.preserve_lff_metadata {
        let mut parser = PropertyMap::new();
        parser.insert("name", Value::String(env!("CARGO_PKG_NAME").to_string()));
        parser.insert(
            "version",
            Value::String(env!("CARGO_PKG_VERSION").to_string()),
        );
        parser.insert(
            "processed_at",
            Value::String(chrono::Utc::now().to_rfc3339()),
        );
        graph.metadata.parser = parser;
    }

    let mut assembler = Assembler {
        options: options.clone(),
        diagnostics: Vec::new(),
        anchor_ids: HashMap::new(),
        name_ids: HashMap::new(),
    };

    // First pass: nodes in pre-order, parents before children.
    for node in &document.nodes {
        assembler.add_node_tree(&mut graph, node, None, 0);
    }

    // Second pass: edges in source order, endpoints resolved or created.
    for edge in &document.edges {
        assembler.add_edge(&mut graph, edge);
    }

    let mut diagnostics = assembler.diagnostics;
    if options.strict_mode {
        promote_warnings(&mut diagnostics);
    }
    let (errors, warnings) = partition(diagnostics);

    let metrics = AssembleMetrics {
        assemble_time_ms: started.elapsed().as_secs_f64() * 1_000.0,
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
    };

    GraphLoweringOutput {
        graph: errors.is_empty().then_some(graph),
        errors,
        warnings,
        metrics,
    }
}

/// Fixed directive-to-metadata table. Duplicate directives last-wins; the
/// semantic validator has already warned about them.
fn apply_directives(graph: &mut Graph, document: &LffDocument) {
    for directive in &document.directives {
        let value = &directive.value;
        match directive.name.as_str() {
            "title" => graph.metadata.title = Some(value.display_string()),
            "description" => graph.metadata.description = Some(value.display_string()),
            "version" => graph.metadata.version = Some(value.display_string()),
            "author" => graph.metadata.author = Some(value.display_string()),
            "domain" => graph.metadata.domain = Some(value.display_string()),
            "tags" => {
                graph.metadata.tags = match value {
                    Value::Array(items) => items.iter().map(Value::display_string).collect(),
                    scalar => vec![scalar.display_string()],
                };
            }
            "strict" => graph.metadata.strict = Some(value.coerce_bool()),
            name => graph
                .metadata
                .directives
                .insert(name.to_string(), value.clone()),
        }
    }
}

struct Assembler {
    options: GraphLoweringOptions,
    diagnostics: Vec<Diagnostic>,
    anchor_ids: HashMap<String, String>,
    name_ids: HashMap<String, String>,
}

impl Assembler {
    fn add_node_tree(
        &mut self,
        graph: &mut Graph,
        node: &NodeDef,
        parent_id: Option<&str>,
        parent_level: u32,
    ) {
        let id = self.make_id(graph, &node.name, node.location);
        let id = match id {
            Some(id) => id,
            None => return,
        };

        let level = match node.level_spec.as_deref().and_then(level_spec_base) {
            Some(base) => base,
            None => {
                if parent_id.is_some() {
                    parent_level + 1
                } else {
                    0
                }
            }
        };

        let mut graph_node = GraphNode::new(id.clone(), node.name.clone());
        graph_node.node_type = node
            .types
            .first()
            .cloned()
            .or_else(|| Some(self.options.default_node_type.clone()));
        graph_node.level = Some(level);
        graph_node.parent_id = parent_id.map(|p| p.to_string());
        graph_node.metadata = self.compose_metadata(node);

        match graph.add_node(graph_node) {
            Ok(_) => {}
            Err(err) => {
                self.diagnostics
                    .push(Diagnostic::error(err.code(), err.to_string(), node.location));
                return;
            }
        }

        if let Some(anchor) = &node.anchor {
            // Anchor uniqueness is the validator's concern; here the
            // first definition wins so resolution stays deterministic.
            self.anchor_ids
                .entry(anchor.clone())
                .or_insert_with(|| id.clone());
        }
        self.name_ids
            .entry(node.name.clone())
            .or_insert_with(|| id.clone());

        for child in &node.children {
            self.add_node_tree(graph, child, Some(&id), level);
        }
    }

    fn add_edge(&mut self, graph: &mut Graph, edge: &crate::ast::EdgeDef) {
        let from = match self.resolve_endpoint(graph, &edge.from, edge.location) {
            Some(id) => id,
            None => return,
        };
        let to = match self.resolve_endpoint(graph, &edge.to, edge.location) {
            Some(id) => id,
            None => return,
        };

        let mut graph_edge = Edge::new(from, to);
        graph_edge.edge_type = Some(edge.arrow.graph_type(&self.options.default_edge_type));
        graph_edge.label = edge.label.clone();
        graph_edge.metadata = edge.properties.clone();

        if let Err(err) = graph.add_edge(graph_edge) {
            self.diagnostics
                .push(Diagnostic::error(err.code(), err.to_string(), edge.location));
        }
    }

    /// Resolve an endpoint to a node ID: anchors through the anchor map,
    /// names through the name map, unknown names by creating a root node.
    fn resolve_endpoint(
        &mut self,
        graph: &mut Graph,
        endpoint: &str,
        location: SourceLocation,
    ) -> Option<String> {
        if let Some(anchor) = endpoint.strip_prefix('*') {
            return match self.anchor_ids.get(anchor) {
                Some(id) => Some(id.clone()),
                None => {
                    self.diagnostics.push(
                        Diagnostic::error(
                            codes::UNDEFINED_ANCHOR_REFERENCE,
                            format!("anchor '*{}' does not resolve to any node", anchor),
                            location,
                        )
                        .with_suggestion(format!("define it with '&{}' on a node", anchor)),
                    );
                    None
                }
            };
        }

        if let Some(id) = self.name_ids.get(endpoint) {
            return Some(id.clone());
        }

        let id = self.make_id(graph, endpoint, location)?;
        let mut node = GraphNode::new(id.clone(), endpoint.to_string());
        node.node_type = Some(self.options.default_node_type.clone());
        node.level = Some(0);
        if let Err(err) = graph.add_node(node) {
            self.diagnostics
                .push(Diagnostic::error(err.code(), err.to_string(), location));
            return None;
        }
        self.name_ids.insert(endpoint.to_string(), id.clone());
        Some(id)
    }

    fn make_id(
        &mut self,
        graph: &Graph,
        name: &str,
        location: SourceLocation,
    ) -> Option<String> {
        if self.options.generate_unique_ids {
            loop {
                let id = generated_id();
                if graph.get_node(&id).is_none() {
                    return Some(id);
                }
            }
        }

        let id = sanitize_id(name);
        if id.is_empty() {
            self.diagnostics.push(Diagnostic::error(
                codes::DUPLICATE_NODE_ID,
                format!("name '{}' sanitizes to an empty id", name),
                location,
            ));
            return None;
        }
        if graph.get_node(&id).is_some() {
            self.diagnostics.push(Diagnostic::error(
                codes::DUPLICATE_NODE_ID,
                format!("node id '{}' (from '{}') collides with an existing node", id, name),
                location,
            ));
            return None;
        }
        Some(id)
    }

    /// Node metadata: the LFF properties, deep-merged with the `lff`
    /// provenance sub-map when preservation is on.
    fn compose_metadata(&self, node: &NodeDef) -> PropertyMap {
        let mut metadata = node.properties.clone();

        if self.options.preserve_lff_metadata {
            let mut lff = PropertyMap::new();
            lff.insert("original_name", Value::String(node.name.clone()));
            if let Some(anchor) = &node.anchor {
                lff.insert("anchor", Value::String(anchor.clone()));
            }
            if node.types.len() > 1 {
                lff.insert(
                    "additional_types",
                    Value::Array(
                        node.types[1..]
                            .iter()
                            .map(|t| Value::String(t.clone()))
                            .collect(),
                    ),
                );
            }
            if let Some(spec) = &node.level_spec {
                lff.insert("level_spec", Value::String(spec.clone()));
            }
            lff.insert("location", location_value(node.location));
            metadata.insert("lff", Value::Object(lff));
        }

        metadata
    }
}

fn location_value(location: SourceLocation) -> Value {
    let mut map = PropertyMap::new();
    map.insert("start_line", Value::Number(location.start_line as f64));
    map.insert("end_line", Value::Number(location.end_line as f64));
    map.insert("start_col", Value::Number(location.start_col as f64));
    map.insert("end_col", Value::Number(location.end_col as f64));
    map.insert("indent", Value::Number(location.indent as f64));
    Value::Object(map)
}

/// The base level `N` of a level spec (`@N`, `@N+`, `@N-M`).
pub fn level_spec_base(spec: &str) -> Option<u32> {
    LEVEL_SPEC_RE
        .captures(spec)
        .and_then(|caps| caps[1].parse().ok())
}

/// `node_<base36 millis>_<6 random chars>`.
fn generated_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis().max(0) as u128;
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect::<String>()
        .to_lowercase();
    format!("node_{}_{}", to_base36(millis), suffix)
}

fn to_base36(mut n: u128) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Lowercase a name and squeeze it into `[a-z0-9_-]`, collapsing runs of
/// underscores and trimming them from the ends.
pub fn sanitize_id(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_underscore = false;
    for ch in name.to_lowercase().chars() {
        let mapped = if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' {
            ch
        } else {
            '_'
        };
        if mapped == '_' {
            if last_underscore {
                continue;
            }
            last_underscore = true;
        } else {
            last_underscore = false;
        }
        out.push(mapped);
    }
    out.trim_matches('_').to_string()
}
