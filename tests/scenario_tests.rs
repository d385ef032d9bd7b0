//! End-to-end scenarios over the public API
//!
//! Each test feeds a small literal document through the full pipeline and
//! checks the resulting graph (or failure shape) in detail.

use lff::ast::Value;
use lff::diagnostics::codes;
use lff::graph::Graph;
use lff::{parse_to_ast, parse_to_graph, serialize, LffOptions, SerializerPreset};

fn graph(text: &str) -> Graph {
    parse_to_graph(text, &LffOptions::default()).expect("document should produce a graph")
}

fn labels(graph: &Graph) -> Vec<&str> {
    graph
        .get_all_nodes()
        .iter()
        .map(|n| n.label.as_str())
        .collect()
}

#[test]
fn basic_three_layer_pipeline() {
    let g = graph("Frontend [web] -> Backend [api] -> Database [postgres]\n");

    assert_eq!(g.node_count(), 3);
    assert_eq!(labels(&g), vec!["Frontend", "Backend", "Database"]);
    let types: Vec<&str> = g
        .get_all_nodes()
        .iter()
        .map(|n| n.node_type.as_deref().unwrap())
        .collect();
    assert_eq!(types, vec!["web", "api", "postgres"]);
    assert!(g.get_all_nodes().iter().all(|n| n.level == Some(0)));

    assert_eq!(g.edge_count(), 2);
    assert!(g
        .get_all_edges()
        .iter()
        .all(|e| e.edge_type.as_deref() == Some("connection")));

    let result = parse_to_ast(
        "Frontend [web] -> Backend [api] -> Database [postgres]\n",
        &LffOptions::default(),
    );
    assert!(result.errors.is_empty());
    assert!(result.warnings.is_empty());
}

#[test]
fn directives_and_typed_nodes() {
    let g = graph(
        "@title: Simple System\n@levels: 2\nGateway [gateway] @1\nApp [service] @2\nGateway -> App: request\n",
    );

    assert_eq!(g.metadata.title.as_deref(), Some("Simple System"));
    assert_eq!(g.metadata.directives.get("levels"), Some(&Value::Number(2.0)));

    let gateway = g.find_nodes(|n| n.label == "Gateway")[0];
    assert_eq!(gateway.level, Some(1));
    let app = g.find_nodes(|n| n.label == "App")[0];
    assert_eq!(app.level, Some(2));

    assert_eq!(g.edge_count(), 1);
    let edge = &g.get_all_edges()[0];
    assert_eq!(edge.label.as_deref(), Some("request"));
    assert_eq!(edge.edge_type.as_deref(), Some("connection"));
}

#[test]
fn hierarchy_with_properties() {
    let g = graph(
        "System:\n  Frontend [web]:\n    port: 3000\n  Backend [api]:\n    port: 8080\n",
    );

    assert_eq!(g.node_count(), 3);
    let system = g.find_nodes(|n| n.label == "System")[0];
    assert_eq!(system.level, Some(0));

    for (label, port) in [("Frontend", 3000.0), ("Backend", 8080.0)] {
        let node = g.find_nodes(|n| n.label == label)[0];
        assert_eq!(node.parent_id.as_deref(), Some(system.id.as_str()));
        assert_eq!(node.level, Some(1));
        assert_eq!(node.metadata.get("port"), Some(&Value::Number(port)));
    }
}

#[test]
fn anchors_and_arrows() {
    let g = graph(
        "UserService &user [service]\nPaymentService &payment [service]\nAPI -> *user: calls\n*user <-> *payment\n",
    );

    let user = g.find_nodes(|n| n.label == "UserService")[0];
    let payment = g.find_nodes(|n| n.label == "PaymentService")[0];

    assert_eq!(g.edge_count(), 2);
    let first = &g.get_all_edges()[0];
    assert_eq!(first.label.as_deref(), Some("calls"));
    assert_eq!(first.edge_type.as_deref(), Some("connection"));
    assert_eq!(first.to, user.id);

    let second = &g.get_all_edges()[1];
    assert_eq!(second.edge_type.as_deref(), Some("bidirectional"));
    assert_eq!(second.from, user.id);
    assert_eq!(second.to, payment.id);
}

#[test]
fn error_recovery_keeps_later_statements() {
    let result = parse_to_ast(
        "Frontend [web\nBackend [api]\nFrontend -> Backend\n",
        &LffOptions::default(),
    );

    assert!(!result.success);
    let syntax = result
        .errors
        .iter()
        .find(|d| d.code == codes::SYNTAX_ERROR)
        .expect("a SYNTAX_ERROR for the unterminated bracket");
    assert_eq!(syntax.location.start_line, 1);

    let ast = result.lff_ast.expect("partial AST survives");
    assert!(ast.nodes.iter().any(|n| n.name == "Backend"));
    assert_eq!(ast.edges.len(), 1);
    assert_eq!(ast.edges[0].from, "Frontend");
    assert_eq!(ast.edges[0].to, "Backend");
}

#[test]
fn round_trip_with_metadata() {
    let source =
        "@title: Metadata Test\n@tags: [a, b, c]\nService [microservice]:\n  replicas: 3\n";
    let first = graph(source);

    let text = serialize(&first, SerializerPreset::Pretty);
    let second = parse_to_graph(&text, &LffOptions::default())
        .expect("serialized output should reparse");

    assert_eq!(second.metadata.title.as_deref(), Some("Metadata Test"));
    assert_eq!(second.metadata.tags, vec!["a", "b", "c"]);

    let service = second.find_nodes(|n| n.label == "Service")[0];
    assert_eq!(service.node_type.as_deref(), Some("microservice"));
    assert_eq!(service.metadata.get("replicas"), Some(&Value::Number(3.0)));
}
