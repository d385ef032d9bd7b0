//! Boundary behaviors of the pipeline
//!
//! Empty and degenerate inputs, indentation edge cases, level-spec
//! rejections, and anchor misuse, checked through the public API.

use lff::diagnostics::codes;
use lff::{parse_to_ast, parse_to_graph, validate, LffOptions};

#[test]
fn empty_input_succeeds_with_nothing() {
    let result = parse_to_ast("", &LffOptions::default());
    assert!(result.success);
    assert!(result.errors.is_empty());
    assert!(result.warnings.is_empty());
    let graph = result.core_ast.unwrap();
    assert_eq!(graph.node_count(), 0);
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn whitespace_only_input_behaves_like_empty() {
    let result = parse_to_ast("\n   \n\n", &LffOptions::default());
    assert!(result.success);
    assert_eq!(result.core_ast.unwrap().node_count(), 0);
}

#[test]
fn comment_only_input_behaves_like_empty() {
    let result = parse_to_ast("# just a note\n# another\n", &LffOptions::default());
    assert!(result.success);
    assert_eq!(result.core_ast.unwrap().node_count(), 0);
}

#[test]
fn odd_indentation_reported_and_parsing_continues() {
    let result = parse_to_ast("Parent:\n   child: 1\n", &LffOptions::default());
    assert!(result
        .errors
        .iter()
        .any(|d| d.code == codes::ODD_INDENTATION));
    // The even-rounded depth still nests the property under Parent.
    let ast = result.lff_ast.unwrap();
    assert_eq!(ast.nodes.len(), 1);
    assert!(ast.nodes[0].properties.contains_key("child"));
}

#[test]
fn tab_in_indentation_reported_line_still_tokenizes() {
    let result = parse_to_ast("A [svc]\n\tB [svc]\n", &LffOptions::default());
    assert!(result.errors.iter().any(|d| d.code == codes::TAB_CHARACTER));
    let ast = result.lff_ast.unwrap();
    assert!(ast.nodes.iter().any(|n| n.name == "B"));
}

#[test]
fn level_zero_rejected_node_kept() {
    let result = parse_to_ast("Node [svc] @0\n", &LffOptions::default());
    assert!(result
        .errors
        .iter()
        .any(|d| d.code == codes::INVALID_LEVEL_ZERO));
    let ast = result.lff_ast.unwrap();
    assert_eq!(ast.nodes.len(), 1);
    assert!(ast.nodes[0].level_spec.is_none());
}

#[test]
fn descending_level_range_rejected_node_kept() {
    let result = parse_to_ast("Node [svc] @3-1\n", &LffOptions::default());
    assert!(result
        .warnings
        .iter()
        .any(|d| d.code == codes::INVALID_LEVEL_SPEC));
    let ast = result.lff_ast.unwrap();
    assert_eq!(ast.nodes.len(), 1);
    assert!(ast.nodes[0].level_spec.is_none());
}

#[test]
fn duplicate_anchor_definition_rejected() {
    let outcome = validate("A &x [svc]\nB &x [svc]\n", false);
    assert!(!outcome.valid);
    assert!(outcome
        .errors
        .iter()
        .any(|d| d.code == codes::REFERENCE_ANCHOR_UNIQUE));
}

#[test]
fn undefined_anchor_reference_rejects_document() {
    assert!(parse_to_graph("A [svc]\nA -> *ghost\n", &LffOptions::default()).is_none());

    let result = parse_to_ast("A [svc]\nA -> *ghost\n", &LffOptions::default());
    assert!(!result.success);
    assert!(result
        .errors
        .iter()
        .any(|d| d.code == codes::UNDEFINED_ANCHOR_REFERENCE));
}

#[test]
fn trailing_whitespace_is_only_a_warning() {
    let result = parse_to_ast("A [svc]   \n", &LffOptions::default());
    assert!(result.success);
    assert!(result
        .warnings
        .iter()
        .any(|d| d.code == codes::TRAILING_WHITESPACE));
}

#[test]
fn deep_nesting_beyond_sixteen_units_is_an_error() {
    let mut text = String::new();
    let mut names = Vec::new();
    for depth in 0..18 {
        names.push(format!("L{}", depth));
        text.push_str(&" ".repeat(depth * 2));
        text.push_str(&format!("L{}:\n", depth));
    }
    let result = parse_to_ast(&text, &LffOptions::default());
    assert!(result
        .errors
        .iter()
        .any(|d| d.code == codes::MAX_DEPTH_EXCEEDED));
}

#[test]
fn diagnostics_always_have_positive_lines_and_known_severity() {
    let noisy = "A [svc\n\tB @0\nC -> *nope   \n";
    let result = parse_to_ast(noisy, &LffOptions::default());
    for diag in result.errors.iter().chain(result.warnings.iter()) {
        assert!(diag.location.start_line >= 1, "diag {:?}", diag.code);
    }
}
