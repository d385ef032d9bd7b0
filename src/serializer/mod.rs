//! LFF serializer
//!
//! Renders a graph back to LFF text under a formatting preset or explicit
//! options: directives first, then the node hierarchy, then edges, with
//! configurable indentation, quoting, spacing, sorting and alignment.
//!
//! The round-trip guarantee holds for the `pretty` preset: re-parsing the
//! output yields the same node and edge counts, the same directive map,
//! and the same anchor and level-spec projections. Byte equality is not
//! promised; comments and generated IDs are not preserved.

pub mod format;
pub mod options;
pub mod structure;

use crate::graph::Graph;

use format::{render_string, render_value};
pub use options::{SerializerOptions, SerializerPreset};
use structure::{DocNode, DocumentStructure, EndpointRef};

/// Serialize a graph to LFF text.
pub fn serialize(graph: &Graph, options: &SerializerOptions) -> String {
    let doc = structure::build(graph, options);
    Writer {
        options: options.clone(),
        out: String::new(),
    }
    .write(&doc)
}

struct Writer {
    options: SerializerOptions,
    out: String,
}

impl Writer {
    fn write(mut self, doc: &DocumentStructure) -> String {
        let mut sections: Vec<String> = Vec::new();

        if !doc.directives.is_empty() {
            sections.push(self.render_directives(doc));
        }
        if !doc.nodes.is_empty() {
            sections.push(self.render_nodes(doc));
        }
        if !doc.edges.is_empty() {
            sections.push(self.render_edges(doc));
        }

        let eol = self.options.line_endings.as_str();
        let gap = eol.repeat(self.options.spacing.between_sections + 1);
        self.out = sections.join(&gap);
        if !self.out.is_empty() {
            self.out.push_str(eol);
        }
        self.out
    }

    fn render_directives(&self, doc: &DocumentStructure) -> String {
        let eol = self.options.line_endings.as_str();
        let colon = self.colon();
        doc.directives
            .iter()
            .map(|directive| {
                let prefix = format!("@{}{}", directive.name, colon);
                let value = render_value(
                    &directive.value,
                    &self.options,
                    0,
                    prefix.chars().count(),
                );
                format!("{}{}", prefix, value)
            })
            .collect::<Vec<_>>()
            .join(eol)
    }

    fn render_nodes(&self, doc: &DocumentStructure) -> String {
        let eol = self.options.line_endings.as_str();
        let mut lines: Vec<String> = Vec::new();
        for node in &doc.nodes {
            self.render_node(node, 0, &mut lines);
        }
        lines.join(eol)
    }

    fn render_node(&self, node: &DocNode, depth: usize, lines: &mut Vec<String>) {
        let mut line = self.options.indent(depth);
        line.push_str(&render_string(&node.name, &self.options));

        if let Some(anchor) = &node.anchor {
            line.push_str(" &");
            line.push_str(anchor);
        }
        if !node.types.is_empty() {
            let separator = if self.options.spacing.around_colons {
                ", "
            } else {
                ","
            };
            line.push_str(" [");
            line.push_str(&node.types.join(separator));
            line.push(']');
        }
        if let Some(spec) = &node.level_spec {
            line.push(' ');
            line.push_str(spec);
        }

        let has_block = !node.properties.is_empty() || !node.children.is_empty();
        if has_block {
            line.push(':');
        }
        lines.push(line);

        if has_block {
            self.render_properties(&node.properties, depth + 1, lines);
            for child in &node.children {
                self.render_node(child, depth + 1, lines);
            }
        }
    }

    fn render_properties(
        &self,
        properties: &[(String, crate::ast::Value)],
        depth: usize,
        lines: &mut Vec<String>,
    ) {
        // Alignment pads every value in the sibling group out to the
        // rightmost colon.
        let value_col = if self.options.formatting.align_values {
            properties
                .iter()
                .map(|(key, _)| key.chars().count())
                .max()
                .unwrap_or(0)
        } else {
            0
        };

        for (key, value) in properties {
            let mut line = self.options.indent(depth);
            line.push_str(key);
            line.push(':');
            if self.options.formatting.align_values {
                let pad = value_col.saturating_sub(key.chars().count());
                line.push_str(&" ".repeat(pad));
            }
            if self.options.spacing.around_colons {
                line.push(' ');
            }
            let rendered = render_value(value, &self.options, depth, line.chars().count());
            line.push_str(&rendered);
            lines.push(line);
        }
    }

    fn render_edges(&self, doc: &DocumentStructure) -> String {
        let eol = self.options.line_endings.as_str();
        let arrow_pad = if self.options.spacing.around_arrows {
            " "
        } else {
            ""
        };
        doc.edges
            .iter()
            .map(|edge| {
                let mut line = String::new();
                line.push_str(&self.endpoint(&edge.from));
                line.push_str(arrow_pad);
                line.push_str(edge.arrow.symbol());
                line.push_str(arrow_pad);
                line.push_str(&self.endpoint(&edge.to));
                if let Some(label) = &edge.label {
                    line.push_str(&self.colon());
                    line.push_str(&render_string(label, &self.options));
                }
                line
            })
            .collect::<Vec<_>>()
            .join(eol)
    }

    fn endpoint(&self, endpoint: &EndpointRef) -> String {
        match endpoint {
            EndpointRef::Anchor(name) => format!("*{}", name),
            EndpointRef::Name(name) => render_string(name, &self.options),
        }
    }

    fn colon(&self) -> String {
        if self.options.spacing.around_colons {
            ": ".to_string()
        } else {
            ":".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Value;
    use crate::graph::{Edge, GraphNode, GraphOptions};

    fn demo_graph() -> Graph {
        let mut graph = Graph::new(GraphOptions::default());
        graph.metadata.title = Some("Demo".into());
        graph.metadata.tags = vec!["a".into(), "b".into()];

        let mut service = GraphNode::new("svc", "Service");
        service.node_type = Some("microservice".into());
        service.level = Some(0);
        service.metadata.insert("replicas", Value::Number(3.0));
        graph.add_node(service).unwrap();

        let mut db = GraphNode::new("db", "Database");
        db.node_type = Some("postgres".into());
        db.level = Some(0);
        graph.add_node(db).unwrap();

        let mut edge = Edge::new("svc", "db");
        edge.edge_type = Some("connection".into());
        edge.label = Some("reads".into());
        graph.add_edge(edge).unwrap();
        graph
    }

    #[test]
    fn pretty_output_shape() {
        let text = serialize(&demo_graph(), &SerializerOptions::pretty());
        let expected = "@title: Demo\n@tags: [a, b]\n\nService [microservice]:\n  replicas: 3\nDatabase [postgres]\n\nService -> Database: reads\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn minimal_output_drops_optional_spacing() {
        let text = serialize(&demo_graph(), &SerializerOptions::minimal());
        assert!(text.contains("@title:Demo"));
        assert!(text.contains("Service->Database:reads"));
        assert!(!text.contains("\n\n"));
    }

    #[test]
    fn strict_output_quotes_and_sorts() {
        let mut graph = demo_graph();
        graph.metadata.directives.insert("aaa", Value::Number(1.0));
        let text = serialize(&graph, &SerializerOptions::strict());
        // Directives sorted: aaa before tags before title.
        let aaa = text.find("@aaa").unwrap();
        let tags = text.find("@tags").unwrap();
        let title = text.find("@title").unwrap();
        assert!(aaa < tags && tags < title);
        assert!(text.contains("\"Service\""));
        assert!(text.contains("\"reads\""));
    }

    #[test]
    fn hierarchy_indented_as_blocks() {
        let mut graph = Graph::new(GraphOptions::default());
        let mut root = GraphNode::new("sys", "System");
        root.level = Some(0);
        graph.add_node(root).unwrap();
        let mut child = GraphNode::new("web", "Frontend");
        child.node_type = Some("web".into());
        child.level = Some(1);
        child.parent_id = Some("sys".into());
        child.metadata.insert("port", Value::Number(3000.0));
        graph.add_node(child).unwrap();

        let text = serialize(&graph, &SerializerOptions::pretty());
        assert_eq!(text, "System:\n  Frontend [web]:\n    port: 3000\n");
    }

    #[test]
    fn empty_graph_serializes_to_empty_text() {
        let graph = Graph::new(GraphOptions::default());
        assert_eq!(serialize(&graph, &SerializerOptions::pretty()), "");
    }

    #[test]
    fn aligned_values_share_a_column() {
        let mut graph = Graph::new(GraphOptions::default());
        let mut node = GraphNode::new("a", "A");
        node.level = Some(0);
        node.metadata.insert("port", Value::Number(80.0));
        node.metadata.insert("replica_count", Value::Number(2.0));
        graph.add_node(node).unwrap();

        let mut options = SerializerOptions::pretty();
        options.formatting.align_values = true;
        let text = serialize(&graph, &options);
        assert!(text.contains("port:          80"));
        assert!(text.contains("replica_count: 2"));
    }

    #[test]
    fn quoted_labels_when_needed() {
        let mut graph = Graph::new(GraphOptions::default());
        let mut node = GraphNode::new("lb", "Load Balancer");
        node.level = Some(0);
        graph.add_node(node).unwrap();
        let text = serialize(&graph, &SerializerOptions::pretty());
        assert_eq!(text, "\"Load Balancer\"\n");
    }
}
