//! CST to AST lowering
//!
//! Every CST production translates to exactly one AST construct.
//! Unrecognized or malformed pieces turn into diagnostics scoped to the
//! enclosing construct and are skipped; lowering itself never fails.
//!
//! Edge chains are expanded here: `A -> B -> C` yields two [`EdgeDef`]s,
//! and a decorated chain segment (`Frontend [web]`) declares the node the
//! first time its name is seen.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::cst::{Cst, CstBlockItem, CstEdgeDecl, CstNodeDecl, CstStatement, CstValue};
use crate::diagnostics::{codes, Diagnostic};
use crate::lexer::patterns::{ANCHOR_NAME_RE, LEVEL_SPEC_RE};
use crate::lexer::{Token, TokenKind};

use super::{ArrowKind, DirectiveDef, EdgeDef, LffDocument, NodeDef, PropertyMap, Value};

/// Options for the lowering stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AstLoweringOptions {
    /// Collect comment text into `LffDocument::comments`.
    pub collect_comments: bool,
}

/// Lower a CST into the typed AST.
pub fn lower(cst: &Cst, options: &AstLoweringOptions) -> LffDocument {
    let mut ctx = Lowering {
        options: options.clone(),
        document: LffDocument::default(),
        comments: Vec::new(),
        declared_names: declared_node_names(cst),
        implicit_names: HashSet::new(),
    };

    for statement in &cst.statements {
        match statement {
            CstStatement::Directive(directive) => {
                let value = directive
                    .value
                    .as_ref()
                    .map(|v| ctx.lower_value(v))
                    .unwrap_or(Value::Null);
                ctx.document.directives.push(DirectiveDef {
                    name: directive.name.sigil_name().to_string(),
                    value,
                    location: directive.location,
                });
            }
            CstStatement::Node(node) => {
                if let Some(lowered) = ctx.lower_node(node) {
                    ctx.document.nodes.push(lowered);
                }
            }
            CstStatement::Edge(edge) => ctx.lower_edge(edge),
            CstStatement::Comment(token) => ctx.collect_comment(token),
            // Recovery already reported these; nothing to lower.
            CstStatement::Error { .. } => {}
        }
    }

    if ctx.options.collect_comments {
        ctx.document.comments = Some(ctx.comments);
    }
    ctx.document
}

/// Strip surrounding double quotes and unescape `\\ \" \n \t \r` exactly
/// once. Non-quoted input is returned verbatim.
pub fn clean_string(image: &str) -> String {
    let inner = image
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or_else(|| image.strip_prefix('"').unwrap_or(image));

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Bare word runs join with single spaces: `Simple System`.
fn join_words(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.image.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// All node names declared by explicit node statements, nested included.
fn declared_node_names(cst: &Cst) -> HashSet<String> {
    fn visit(node: &CstNodeDecl, names: &mut HashSet<String>) {
        names.insert(clean_string(&node.name.image));
        for item in &node.block {
            if let CstBlockItem::Child(child) = item {
                visit(child, names);
            }
        }
    }

    let mut names = HashSet::new();
    for statement in &cst.statements {
        if let CstStatement::Node(node) = statement {
            visit(node, &mut names);
        }
    }
    names
}

struct Lowering {
    options: AstLoweringOptions,
    document: LffDocument,
    comments: Vec<String>,
    declared_names: HashSet<String>,
    implicit_names: HashSet<String>,
}

impl Lowering {
    fn lower_node(&mut self, decl: &CstNodeDecl) -> Option<NodeDef> {
        let name = clean_string(&decl.name.image);
        if name.is_empty() {
            self.error(
                codes::NODE_NAME_EMPTY,
                "node name is empty after quote removal",
                decl.location,
            );
            return None;
        }

        let mut node = NodeDef::named(name, decl.location);
        node.anchor = decl
            .anchor
            .as_ref()
            .and_then(|token| self.lower_anchor_name(token));
        node.types = decl.types.iter().map(|t| t.image.clone()).collect();
        node.level_spec = decl
            .level
            .as_ref()
            .and_then(|token| self.lower_level_spec(token));

        if let Some(inline) = &decl.inline_value {
            let value = self.lower_value(inline);
            self.document.errors.push(
                Diagnostic::warning(
                    codes::AMBIGUOUS_INLINE_VALUE,
                    format!(
                        "inline value after ':' on node '{}' is stored as its 'value' property",
                        node.name
                    ),
                    inline.location(),
                )
                .with_suggestion("move the value into an indented block: 'value: ...'"),
            );
            node.properties.insert("value", value);
        }

        for item in &decl.block {
            match item {
                CstBlockItem::Property(property) => {
                    let value = self.lower_value(&property.value);
                    node.properties.insert(property.key.image.clone(), value);
                }
                CstBlockItem::Child(child) => {
                    if let Some(lowered) = self.lower_node(child) {
                        node.children.push(lowered);
                    }
                }
                CstBlockItem::Comment(token) => self.collect_comment(token),
                // Directives belong to the document no matter where they
                // were written.
                CstBlockItem::Directive(directive) => {
                    let value = directive
                        .value
                        .as_ref()
                        .map(|v| self.lower_value(v))
                        .unwrap_or(Value::Null);
                    self.document.directives.push(DirectiveDef {
                        name: directive.name.sigil_name().to_string(),
                        value,
                        location: directive.location,
                    });
                }
            }
        }

        Some(node)
    }

    /// Expand an edge chain into pairwise edges, declaring decorated
    /// segments as implicit nodes on first sight.
    fn lower_edge(&mut self, decl: &CstEdgeDecl) {
        // First pass: implicit node definitions from decorated segments.
        for segment in &decl.segments {
            if segment.node.kind == TokenKind::AnchorRef {
                continue;
            }
            let decorated = segment.anchor.is_some()
                || !segment.types.is_empty()
                || segment.level.is_some();
            if !decorated {
                continue;
            }
            let name = clean_string(&segment.node.image);
            if name.is_empty() || self.declared_names.contains(&name) {
                continue;
            }
            if !self.implicit_names.insert(name.clone()) {
                continue;
            }
            let mut node = NodeDef::named(name, segment.node.location);
            node.anchor = segment
                .anchor
                .as_ref()
                .and_then(|token| self.lower_anchor_name(token));
            node.types = segment.types.iter().map(|t| t.image.clone()).collect();
            node.level_spec = segment
                .level
                .as_ref()
                .and_then(|token| self.lower_level_spec(token));
            self.document.nodes.push(node);
        }

        let label = decl.label.as_ref().map(|value| match value {
            CstValue::Scalar(token) if token.kind == TokenKind::StringLiteral => {
                clean_string(&token.image)
            }
            CstValue::Scalar(token) => token.image.clone(),
            CstValue::Words { tokens, .. } => join_words(tokens),
            array @ CstValue::Array { .. } => {
                let lowered = self.lower_value(array);
                lowered.display_string()
            }
        });

        // Second pass: one edge per consecutive segment pair. The chain's
        // label applies to every edge it produces.
        for (index, window) in decl.segments.windows(2).enumerate() {
            let from = match self.lower_endpoint(&window[0].node) {
                Some(endpoint) => endpoint,
                None => continue,
            };
            let to = match self.lower_endpoint(&window[1].node) {
                Some(endpoint) => endpoint,
                None => continue,
            };

            let arrow = match decl.arrows.get(index) {
                Some(token) => self.lower_arrow(token),
                None => {
                    self.error(
                        codes::UNKNOWN_ARROW,
                        "edge chain is missing an arrow between segments",
                        decl.location,
                    );
                    ArrowKind::Simple
                }
            };

            self.document.edges.push(EdgeDef {
                from: from.clone(),
                to,
                arrow,
                label: label.clone(),
                properties: PropertyMap::new(),
                location: decl.location,
            });
        }
    }

    fn lower_endpoint(&mut self, token: &Token) -> Option<String> {
        if token.kind == TokenKind::AnchorRef {
            let name = token.sigil_name();
            if !ANCHOR_NAME_RE.is_match(name) {
                self.error(
                    codes::INVALID_ANCHOR_NAME,
                    format!("invalid anchor reference '{}'", token.image),
                    token.location,
                );
                return None;
            }
            return Some(token.image.clone());
        }

        let name = clean_string(&token.image);
        if name.is_empty() {
            self.error(
                codes::MISSING_EDGE_ENDPOINT,
                "edge endpoint is empty",
                token.location,
            );
            return None;
        }
        Some(name)
    }

    fn lower_arrow(&mut self, token: &Token) -> ArrowKind {
        match token.kind {
            TokenKind::ArrowSimple => ArrowKind::Simple,
            TokenKind::ArrowMultiple => ArrowKind::Multiple,
            TokenKind::ArrowBidirectional => ArrowKind::Bidirectional,
            TokenKind::ArrowDashed => ArrowKind::Dashed,
            // Unreachable when the CST builder did its job.
            _ => {
                self.document.errors.push(Diagnostic::warning(
                    codes::UNKNOWN_ARROW,
                    format!("unknown arrow '{}'", token.image),
                    token.location,
                ));
                ArrowKind::Simple
            }
        }
    }

    fn lower_anchor_name(&mut self, token: &Token) -> Option<String> {
        let name = token.sigil_name();
        if ANCHOR_NAME_RE.is_match(name) {
            Some(name.to_string())
        } else {
            self.error(
                codes::INVALID_ANCHOR_NAME,
                format!(
                    "invalid anchor name '{}'; anchors match [A-Za-z][A-Za-z0-9_-]{{0,31}}",
                    token.image
                ),
                token.location,
            );
            None
        }
    }

    fn lower_level_spec(&mut self, token: &Token) -> Option<String> {
        let image = token.image.as_str();
        if let Some(caps) = LEVEL_SPEC_RE.captures(image) {
            // Bounded ranges must ascend.
            if let Some(end) = caps.get(3) {
                let start: u64 = caps[1].parse().unwrap_or(0);
                let end: u64 = end.as_str().parse().unwrap_or(0);
                if start >= end {
                    self.document.errors.push(
                        Diagnostic::warning(
                            codes::INVALID_LEVEL_SPEC,
                            format!(
                                "level range '{}' must ascend; {} is not below {}",
                                image, start, end
                            ),
                            token.location,
                        )
                        .with_suggestion(format!("did you mean '@{}-{}'?", end, start)),
                    );
                    return None;
                }
            }
            Some(image.to_string())
        } else {
            self.document.errors.push(Diagnostic::warning(
                codes::INVALID_LEVEL_SPEC,
                format!("invalid level spec '{}'", image),
                token.location,
            ));
            None
        }
    }

    fn lower_value(&mut self, value: &CstValue) -> Value {
        match value {
            CstValue::Scalar(token) => match token.kind {
                TokenKind::StringLiteral => Value::String(clean_string(&token.image)),
                TokenKind::NumberLiteral => {
                    let parsed = token.image.parse::<f64>().unwrap_or(f64::NAN);
                    if parsed.is_nan() {
                        self.document.errors.push(Diagnostic::warning(
                            codes::INVALID_NUMBER,
                            format!("number '{}' could not be parsed; using 0", token.image),
                            token.location,
                        ));
                        Value::Number(0.0)
                    } else {
                        Value::Number(parsed)
                    }
                }
                TokenKind::BooleanTrue => Value::Bool(true),
                TokenKind::BooleanFalse => Value::Bool(false),
                // Bare identifiers are string values.
                _ => Value::String(token.image.clone()),
            },
            CstValue::Words { tokens, .. } => Value::String(join_words(tokens)),
            CstValue::Array { items, .. } => {
                Value::Array(items.iter().map(|item| self.lower_value(item)).collect())
            }
        }
    }

    fn collect_comment(&mut self, token: &Token) {
        if self.options.collect_comments {
            let text = token
                .image
                .strip_prefix('#')
                .map(|s| s.strip_prefix(' ').unwrap_or(s))
                .unwrap_or(&token.image);
            self.comments.push(text.to_string());
        }
    }

    fn error(
        &mut self,
        code: &str,
        message: impl Into<String>,
        location: crate::source::SourceLocation,
    ) {
        self.document
            .errors
            .push(Diagnostic::error(code, message, location));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::{LffParser, ParserOptions};
    use crate::lexer::LexerOptions;

    fn lower_text(text: &str) -> LffDocument {
        let mut parser = LffParser::new();
        let result = parser.parse_to_cst(text, &ParserOptions::default());
        lower(&result.cst.expect("cst"), &AstLoweringOptions::default())
    }

    #[test]
    fn clean_string_unescapes_once() {
        assert_eq!(clean_string(r#""a\nb""#), "a\nb");
        assert_eq!(clean_string(r#""say \"hi\"""#), "say \"hi\"");
        assert_eq!(clean_string(r#""back\\slash""#), "back\\slash");
        assert_eq!(clean_string("bare"), "bare");
    }

    #[test]
    fn lowers_nodes_edges_directives() {
        let doc = lower_text("@title: Demo\nGateway [api] @1\nGateway -> App: request\n");
        assert_eq!(doc.directives.len(), 1);
        assert_eq!(doc.directives[0].name, "title");
        assert_eq!(doc.nodes.len(), 1);
        assert_eq!(doc.nodes[0].level_spec.as_deref(), Some("@1"));
        assert_eq!(doc.edges.len(), 1);
        assert_eq!(doc.edges[0].label.as_deref(), Some("request"));
    }

    #[test]
    fn edge_chain_expands_pairwise_with_implicit_nodes() {
        let doc = lower_text("Frontend [web] -> Backend [api] -> Database [postgres]\n");
        assert_eq!(doc.nodes.len(), 3);
        assert_eq!(doc.edges.len(), 2);
        assert_eq!(doc.nodes[0].name, "Frontend");
        assert_eq!(doc.nodes[0].types, vec!["web"]);
        assert_eq!(doc.edges[0].from, "Frontend");
        assert_eq!(doc.edges[0].to, "Backend");
        assert_eq!(doc.edges[1].from, "Backend");
        assert_eq!(doc.edges[1].to, "Database");
    }

    #[test]
    fn implicit_node_skipped_when_declared_explicitly() {
        let doc = lower_text("Frontend [web]\nFrontend [web] -> Backend [api]\n");
        let frontends = doc.nodes.iter().filter(|n| n.name == "Frontend").count();
        assert_eq!(frontends, 1);
    }

    #[test]
    fn undecorated_endpoints_do_not_declare_nodes() {
        let doc = lower_text("A -> B\n");
        assert!(doc.nodes.is_empty());
        assert_eq!(doc.edges.len(), 1);
    }

    #[test]
    fn hierarchy_and_properties() {
        let doc = lower_text("System:\n  Frontend [web]:\n    port: 3000\n");
        assert_eq!(doc.nodes.len(), 1);
        let system = &doc.nodes[0];
        assert_eq!(system.children.len(), 1);
        let frontend = &system.children[0];
        assert_eq!(
            frontend.properties.get("port"),
            Some(&Value::Number(3000.0))
        );
    }

    #[test]
    fn inline_value_becomes_value_property_with_warning() {
        let doc = lower_text("Threshold: 42\n");
        assert_eq!(
            doc.nodes[0].properties.get("value"),
            Some(&Value::Number(42.0))
        );
        assert!(doc
            .errors
            .iter()
            .any(|d| d.code == codes::AMBIGUOUS_INLINE_VALUE && d.is_warning()));
    }

    #[test]
    fn invalid_level_range_dropped_node_kept() {
        let doc = lower_text("Node @3-1\n");
        assert_eq!(doc.nodes.len(), 1);
        assert!(doc.nodes[0].level_spec.is_none());
        assert!(doc
            .errors
            .iter()
            .any(|d| d.code == codes::INVALID_LEVEL_SPEC));
    }

    #[test]
    fn invalid_anchor_dropped_node_kept() {
        // The lexer splits '&1' into a bare sigil and a number, which the
        // parser rejects at the header; use an overlong name instead so
        // lowering sees the anchor token.
        let long = "a".repeat(40);
        let doc = lower_text(&format!("Node &{}\n", long));
        assert_eq!(doc.nodes.len(), 1);
        assert!(doc.nodes[0].anchor.is_none());
        assert!(doc
            .errors
            .iter()
            .any(|d| d.code == codes::INVALID_ANCHOR_NAME));
    }

    #[test]
    fn empty_quoted_name_skips_node() {
        let doc = lower_text("\"\"\n");
        assert!(doc.nodes.is_empty());
        assert!(doc.errors.iter().any(|d| d.code == codes::NODE_NAME_EMPTY));
    }

    #[test]
    fn values_typed_by_token_kind() {
        let doc = lower_text(
            "Config:\n  name: \"svc\"\n  port: 8080\n  debug: true\n  tags: [a, 2, false]\n",
        );
        let props = &doc.nodes[0].properties;
        assert_eq!(props.get("name"), Some(&Value::String("svc".into())));
        assert_eq!(props.get("port"), Some(&Value::Number(8080.0)));
        assert_eq!(props.get("debug"), Some(&Value::Bool(true)));
        assert_eq!(
            props.get("tags"),
            Some(&Value::Array(vec![
                Value::String("a".into()),
                Value::Number(2.0),
                Value::Bool(false)
            ]))
        );
    }

    #[test]
    fn comments_collected_only_on_request() {
        let mut parser =
            LffParser::new().with_lexer_options(LexerOptions {
                include_comments: true,
                ..Default::default()
            });
        let result = parser.parse_to_cst("# overview\nA [svc]\n", &ParserOptions::default());
        let cst = result.cst.unwrap();

        let without = lower(&cst, &AstLoweringOptions::default());
        assert!(without.comments.is_none());

        let with = lower(
            &cst,
            &AstLoweringOptions {
                collect_comments: true,
            },
        );
        assert_eq!(with.comments.unwrap(), vec!["overview".to_string()]);
    }

    #[test]
    fn nested_directives_hoist_to_document_level() {
        let doc = lower_text("System:\n  @domain: payments\n  port: 80\n");
        assert_eq!(doc.directives.len(), 1);
        assert_eq!(doc.directives[0].name, "domain");
        assert!(doc.nodes[0].properties.contains_key("port"));
    }

    #[test]
    fn quoted_node_names_and_endpoints() {
        let doc = lower_text("\"Load Balancer\" [lb]\n\"Load Balancer\" -> App\n");
        assert_eq!(doc.nodes[0].name, "Load Balancer");
        assert_eq!(doc.edges[0].from, "Load Balancer");
    }
}
