//! Rebuilding LFF document structure from a graph
//!
//! The serializer does not write the graph directly; it first rebuilds an
//! intermediate document mirroring the AST shape: hierarchy from parent
//! links, anchors and level specs recovered from `lff` provenance
//! metadata, directives from document metadata in their canonical order.

use crate::ast::{ArrowKind, PropertyMap, Value};
use crate::graph::{Graph, GraphNode};

use super::options::SerializerOptions;

/// How an edge endpoint is written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointRef {
    /// `*name`
    Anchor(String),
    /// Node label, quoted as needed.
    Name(String),
}

impl EndpointRef {
    /// Key used when sorting edges by `"from-to"`.
    pub fn sort_key(&self) -> &str {
        match self {
            EndpointRef::Anchor(name) => name,
            EndpointRef::Name(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocDirective {
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocNode {
    pub name: String,
    pub anchor: Option<String>,
    pub types: Vec<String>,
    pub level_spec: Option<String>,
    pub properties: Vec<(String, Value)>,
    pub children: Vec<DocNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocEdge {
    pub from: EndpointRef,
    pub to: EndpointRef,
    pub arrow: ArrowKind,
    pub label: Option<String>,
}

/// The rebuilt document, ready for the writer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentStructure {
    pub directives: Vec<DocDirective>,
    pub nodes: Vec<DocNode>,
    pub edges: Vec<DocEdge>,
}

/// Rebuild the document structure for a graph under the given options.
pub fn build(graph: &Graph, options: &SerializerOptions) -> DocumentStructure {
    let mut doc = DocumentStructure {
        directives: build_directives(graph, options),
        nodes: build_nodes(graph, options),
        edges: build_edges(graph),
    };

    if options.sorting.directives {
        doc.directives.sort_by(|a, b| a.name.cmp(&b.name));
    }
    if options.sorting.nodes {
        sort_nodes(&mut doc.nodes);
    }
    if options.sorting.edges {
        doc.edges.sort_by(|a, b| {
            let left = format!("{}-{}", a.from.sort_key(), a.to.sort_key());
            let right = format!("{}-{}", b.from.sort_key(), b.to.sort_key());
            left.cmp(&right)
        });
    }

    doc
}

fn build_directives(graph: &Graph, options: &SerializerOptions) -> Vec<DocDirective> {
    let meta = &graph.metadata;
    let mut directives = Vec::new();

    let scalar_fields = [
        ("title", &meta.title),
        ("description", &meta.description),
        ("version", &meta.version),
        ("author", &meta.author),
        ("domain", &meta.domain),
    ];
    for (name, value) in scalar_fields {
        if let Some(text) = value {
            directives.push(DocDirective {
                name: name.to_string(),
                value: Value::String(text.clone()),
            });
        }
    }
    if !meta.tags.is_empty() {
        directives.push(DocDirective {
            name: "tags".to_string(),
            value: Value::Array(meta.tags.iter().map(|t| Value::String(t.clone())).collect()),
        });
    }
    if let Some(strict) = meta.strict {
        directives.push(DocDirective {
            name: "strict".to_string(),
            value: Value::Bool(strict),
        });
    }
    for (name, value) in meta.directives.iter() {
        directives.push(DocDirective {
            name: name.clone(),
            value: value.clone(),
        });
    }
    if options.include.parser_metadata && !meta.parser.is_empty() {
        let name = meta
            .parser
            .get("name")
            .map(Value::display_string)
            .unwrap_or_default();
        let version = meta
            .parser
            .get("version")
            .map(Value::display_string)
            .unwrap_or_default();
        directives.push(DocDirective {
            name: "parser".to_string(),
            value: Value::String(format!("{} {}", name, version).trim().to_string()),
        });
    }

    directives
}

fn build_nodes(graph: &Graph, options: &SerializerOptions) -> Vec<DocNode> {
    let hierarchy = graph.hierarchy();
    graph
        .get_root_nodes()
        .into_iter()
        .map(|root| build_node(&hierarchy, root, None, options))
        .collect()
}

fn build_node(
    hierarchy: &crate::graph::HierarchyIndex<'_>,
    node: &GraphNode,
    parent_level: Option<u32>,
    options: &SerializerOptions,
) -> DocNode {
    let lff = lff_map(node);

    let anchor = lff
        .as_ref()
        .and_then(|m| m.get("anchor"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    let mut types = Vec::new();
    if let Some(primary) = &node.node_type {
        types.push(primary.clone());
    }
    if let Some(Value::Array(additional)) = lff.as_ref().and_then(|m| m.get("additional_types")) {
        types.extend(additional.iter().filter_map(|v| v.as_str().map(String::from)));
    }

    let level_spec = recover_level_spec(node, parent_level, lff.as_ref());

    let mut properties: Vec<(String, Value)> = Vec::new();
    for (key, value) in node.metadata.iter() {
        if (key == "lff" || key == "parser") && !options.include.lff_metadata {
            continue;
        }
        properties.push((key.clone(), value.clone()));
    }
    if options.sorting.properties {
        properties.sort_by(|a, b| a.0.cmp(&b.0));
    }

    let children = hierarchy
        .children(&node.id)
        .into_iter()
        .map(|child| build_node(hierarchy, child, node.level, options))
        .collect();

    DocNode {
        name: node.label.clone(),
        anchor,
        types,
        level_spec,
        properties,
        children,
    }
}

/// The explicit spec when provenance kept one; otherwise an `@N` spec is
/// synthesized only when the stored level disagrees with what hierarchy
/// placement would compute (level 0 is inexpressible and stays implicit).
fn recover_level_spec(
    node: &GraphNode,
    parent_level: Option<u32>,
    lff: Option<&PropertyMap>,
) -> Option<String> {
    if let Some(spec) = lff
        .and_then(|m| m.get("level_spec"))
        .and_then(|v| v.as_str())
    {
        return Some(spec.to_string());
    }

    let level = node.level?;
    let computed = match parent_level {
        Some(parent) => parent + 1,
        None => 0,
    };
    if level != computed && level >= 1 {
        Some(format!("@{}", level))
    } else {
        None
    }
}

fn build_edges(graph: &Graph) -> Vec<DocEdge> {
    graph
        .get_all_edges()
        .iter()
        .map(|edge| DocEdge {
            from: endpoint_ref(graph, &edge.from),
            to: endpoint_ref(graph, &edge.to),
            arrow: ArrowKind::from_graph_type(edge.edge_type.as_deref().unwrap_or("")),
            label: edge.label.clone(),
        })
        .collect()
}

/// Prefer the anchor when the endpoint node defines one: anchors survive
/// label collisions and match how the source referred to the node.
fn endpoint_ref(graph: &Graph, id: &str) -> EndpointRef {
    match graph.get_node(id) {
        Some(node) => {
            let anchor = lff_map(node)
                .as_ref()
                .and_then(|m| m.get("anchor"))
                .and_then(|v| v.as_str())
                .map(String::from);
            match anchor {
                Some(anchor) => EndpointRef::Anchor(anchor),
                None => EndpointRef::Name(node.label.clone()),
            }
        }
        None => EndpointRef::Name(id.to_string()),
    }
}

fn lff_map(node: &GraphNode) -> Option<PropertyMap> {
    match node.metadata.get("lff") {
        Some(Value::Object(map)) => Some(map.clone()),
        _ => None,
    }
}

fn sort_nodes(nodes: &mut [DocNode]) {
    nodes.sort_by(|a, b| a.name.cmp(&b.name));
    for node in nodes.iter_mut() {
        sort_nodes(&mut node.children);
    }
}
