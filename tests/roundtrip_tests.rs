//! Round-trip laws
//!
//! For any input that parses cleanly, serializing the graph with the
//! `pretty` preset and re-parsing must preserve node and edge counts, the
//! per-node (label, type, effective level) projection, the edge multiset
//! keyed by labels, and the directive-derived metadata. Byte equality is
//! not required.

use std::collections::HashSet;

use proptest::prelude::*;

use lff::graph::Graph;
use lff::{parse_to_graph, serialize, LffOptions, SerializerPreset};

fn node_projection(graph: &Graph) -> Vec<(String, Option<String>, Option<u32>)> {
    let mut projection: Vec<_> = graph
        .get_all_nodes()
        .iter()
        .map(|n| (n.label.clone(), n.node_type.clone(), n.level))
        .collect();
    projection.sort();
    projection
}

fn edge_projection(graph: &Graph) -> Vec<(String, String, Option<String>, Option<String>)> {
    let label_of = |id: &str| graph.get_node(id).map(|n| n.label.clone()).unwrap_or_default();
    let mut projection: Vec<_> = graph
        .get_all_edges()
        .iter()
        .map(|e| {
            (
                label_of(&e.from),
                label_of(&e.to),
                e.edge_type.clone(),
                e.label.clone(),
            )
        })
        .collect();
    projection.sort();
    projection
}

fn assert_round_trip(source: &str) {
    let first = parse_to_graph(source, &LffOptions::default())
        .unwrap_or_else(|| panic!("source should parse:\n{}", source));
    let text = serialize(&first, SerializerPreset::Pretty);
    let second = parse_to_graph(&text, &LffOptions::default())
        .unwrap_or_else(|| panic!("serialized output should reparse:\n{}", text));

    assert_eq!(first.node_count(), second.node_count(), "node count\n{}", text);
    assert_eq!(first.edge_count(), second.edge_count(), "edge count\n{}", text);
    assert_eq!(node_projection(&first), node_projection(&second), "{}", text);
    assert_eq!(edge_projection(&first), edge_projection(&second), "{}", text);
    assert_eq!(first.metadata.title, second.metadata.title);
    assert_eq!(first.metadata.description, second.metadata.description);
    assert_eq!(first.metadata.version, second.metadata.version);
    assert_eq!(first.metadata.domain, second.metadata.domain);
    assert_eq!(first.metadata.tags, second.metadata.tags);
}

#[test]
fn fixed_documents_round_trip() {
    let documents = [
        "Frontend [web] -> Backend [api] -> Database [postgres]\n",
        "@title: Simple System\nGateway [gateway] @1\nApp [service] @2\nGateway -> App: request\n",
        "System:\n  Frontend [web]:\n    port: 3000\n  Backend [api]:\n    port: 8080\n",
        "UserService &user [service]\nPaymentService &payment [service]\nAPI -> *user: calls\n*user <-> *payment\n",
        "@title: Metadata Test\n@tags: [a, b, c]\nService [microservice]:\n  replicas: 3\n",
        "@domain: payments\n@version: \"2.1\"\nCore [infra] @2+\nEdge [gateway]\nEdge --> Core\n",
        "\"Load Balancer\" [lb] => \"App Server\" [app]\n",
    ];
    for document in documents {
        assert_round_trip(document);
    }
}

#[test]
fn idempotence_after_first_serialization() {
    let source = "@title: Demo\nA &a [svc] @1:\n  weight: 2.5\nB [svc]\n*a -> B: calls\n";
    let g1 = parse_to_graph(source, &LffOptions::default()).unwrap();
    let t2 = serialize(&g1, SerializerPreset::Pretty);
    let g2 = parse_to_graph(&t2, &LffOptions::default()).unwrap();
    let t3 = serialize(&g2, SerializerPreset::Pretty);
    let g3 = parse_to_graph(&t3, &LffOptions::default()).unwrap();

    assert_eq!(node_projection(&g2), node_projection(&g3));
    assert_eq!(edge_projection(&g2), edge_projection(&g3));
    assert_eq!(g2.directive_view(), g3.directive_view());
}

// Property-based round trips over generated documents.

#[derive(Debug, Clone)]
struct DocSpec {
    nodes: Vec<(&'static str, Option<u32>)>,
    edges: Vec<(usize, usize, &'static str, Option<&'static str>)>,
}

impl DocSpec {
    fn render(&self) -> String {
        let mut out = String::from("@title: Generated Doc\n");
        for (idx, (ty, level)) in self.nodes.iter().enumerate() {
            out.push_str(&format!("Node{} [{}]", idx, ty));
            if let Some(level) = level {
                out.push_str(&format!(" @{}", level));
            }
            out.push('\n');
        }
        for (from, to, arrow, label) in &self.edges {
            out.push_str(&format!("Node{} {} Node{}", from, arrow, to));
            if let Some(label) = label {
                out.push_str(&format!(": {}", label));
            }
            out.push('\n');
        }
        out
    }
}

const TYPES: &[&str] = &["web", "api", "db", "queue", "cache"];
const ARROWS: &[&str] = &["->", "=>", "<->", "-->"];
const LABELS: &[&str] = &["calls", "reads", "writes", "syncs"];

fn doc_strategy() -> impl Strategy<Value = DocSpec> {
    let node = (
        prop::sample::select(TYPES.to_vec()),
        prop::option::of(1u32..5),
    );
    prop::collection::vec(node, 1..6).prop_flat_map(|nodes| {
        let count = nodes.len();
        let edge = (
            0..count,
            0..count,
            prop::sample::select(ARROWS.to_vec()),
            prop::option::of(prop::sample::select(LABELS.to_vec())),
        );
        (Just(nodes), prop::collection::vec(edge, 0..8))
    })
    .prop_map(|(nodes, raw_edges)| {
        let mut seen = HashSet::new();
        let edges = raw_edges
            .into_iter()
            .filter(|(from, to, _, _)| from != to && seen.insert((*from, *to)))
            .collect();
        DocSpec { nodes, edges }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn generated_documents_round_trip(spec in doc_strategy()) {
        assert_round_trip(&spec.render());
    }

    #[test]
    fn generated_documents_have_unique_node_ids(spec in doc_strategy()) {
        let graph = parse_to_graph(&spec.render(), &LffOptions::default()).unwrap();
        let mut ids = HashSet::new();
        for node in graph.get_all_nodes() {
            prop_assert!(ids.insert(node.id.clone()), "duplicate id {}", node.id);
        }
        prop_assert!(graph.validate().is_empty());
    }
}
