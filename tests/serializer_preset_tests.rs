//! Serializer presets through the full loop
//!
//! Every preset must produce text that re-parses to an equivalent graph;
//! the presets differ only in surface formatting.

use lff::{parse_to_graph, serialize, LffOptions, SerializerOptions, SerializerPreset};

const SOURCE: &str = "@title: Preset Check\n@tags: [alpha, beta]\nCore &core [infra] @1:\n  replicas: 3\nEdge [gateway]\nEdge -> *core: routes\n";

fn counts(text: &str) -> (usize, usize) {
    let graph = parse_to_graph(text, &LffOptions::default())
        .unwrap_or_else(|| panic!("preset output should reparse:\n{}", text));
    (graph.node_count(), graph.edge_count())
}

#[test]
fn all_presets_reparse_equivalently() {
    let graph = parse_to_graph(SOURCE, &LffOptions::default()).unwrap();
    let expected = (graph.node_count(), graph.edge_count());

    for preset in [
        SerializerPreset::Compact,
        SerializerPreset::Pretty,
        SerializerPreset::Strict,
        SerializerPreset::Minimal,
    ] {
        let text = serialize(&graph, preset);
        assert_eq!(counts(&text), expected, "preset {:?}:\n{}", preset, text);
    }
}

#[test]
fn pretty_separates_sections_with_blank_lines() {
    let graph = parse_to_graph(SOURCE, &LffOptions::default()).unwrap();
    let text = serialize(&graph, SerializerPreset::Pretty);
    assert!(text.contains("\n\n"));
}

#[test]
fn compact_and_minimal_have_no_blank_lines() {
    let graph = parse_to_graph(SOURCE, &LffOptions::default()).unwrap();
    for preset in [SerializerPreset::Compact, SerializerPreset::Minimal] {
        let text = serialize(&graph, preset);
        assert!(!text.contains("\n\n"), "{:?}:\n{}", preset, text);
    }
}

#[test]
fn strict_serialization_is_deterministic() {
    let graph = parse_to_graph(SOURCE, &LffOptions::default()).unwrap();
    let first = serialize(&graph, SerializerPreset::Strict);
    let second = serialize(&graph, SerializerPreset::Strict);
    assert_eq!(first, second);
}

#[test]
fn anchors_and_level_specs_survive_every_preset() {
    let graph = parse_to_graph(SOURCE, &LffOptions::default()).unwrap();
    for preset in [
        SerializerPreset::Compact,
        SerializerPreset::Pretty,
        SerializerPreset::Strict,
        SerializerPreset::Minimal,
    ] {
        let text = serialize(&graph, preset);
        assert!(text.contains("&core"), "{:?}:\n{}", preset, text);
        assert!(text.contains("@1"), "{:?}:\n{}", preset, text);
        assert!(text.contains("*core"), "{:?}:\n{}", preset, text);
    }
}

#[test]
fn wrapped_arrays_reparse() {
    let mut options = SerializerOptions::pretty();
    options.formatting.max_line_length = 20;

    let source = "@tags: [alpha, beta, gamma, delta, epsilon]\nA [svc]\n";
    let graph = parse_to_graph(source, &LffOptions::default()).unwrap();
    let text = serialize(&graph, options);
    // The tags array must have wrapped.
    assert!(text.contains("[\n"), "{}", text);

    let reparsed = parse_to_graph(&text, &LffOptions::default())
        .unwrap_or_else(|| panic!("wrapped output should reparse:\n{}", text));
    assert_eq!(reparsed.metadata.tags.len(), 5);
}

#[test]
fn crlf_line_endings_reparse() {
    let mut options = SerializerOptions::pretty();
    options.line_endings = lff::serializer::options::LineEnding::Crlf;

    let graph = parse_to_graph(SOURCE, &LffOptions::default()).unwrap();
    let text = serialize(&graph, options);
    assert!(text.contains("\r\n"));
    assert_eq!(counts(&text), (graph.node_count(), graph.edge_count()));
}
