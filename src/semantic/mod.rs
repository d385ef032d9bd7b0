//! Semantic validation of the LFF AST
//!
//! Runs in three phases. Each phase accumulates diagnostics and later
//! phases run even when earlier ones flagged issues:
//!
//! 1. **Structural** — node names, anchor uniqueness, type-name shape,
//!    level-spec legality, edge endpoints, directive well-formedness.
//! 2. **Semantic** — hierarchy acyclicity (by name, since IDs are assigned
//!    later), reserved-directive multiplicity.
//! 3. **Cross-reference** — every `*anchor` reference resolves to a
//!    defined `&anchor`.
//!
//! In strict mode warnings are promoted to errors at the boundary of the
//! returned outcome; individual rules never change severity themselves.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::ast::{EdgeDef, LffDocument, NodeDef};
use crate::diagnostics::{codes, partition, promote_warnings, Diagnostic, TextEdit};
use crate::lexer::patterns::{KNOWN_DIRECTIVES, LEVEL_SPEC_RE, TYPE_NAME_RE, VERSION_RE};
use crate::source::SourceLocation;

/// Result of validating a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl ValidationOutcome {
    fn from_diagnostics(mut diagnostics: Vec<Diagnostic>, strict: bool) -> Self {
        if strict {
            promote_warnings(&mut diagnostics);
        }
        let (errors, warnings) = partition(diagnostics);
        ValidationOutcome {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Validate a lowered document.
pub fn validate_document(document: &LffDocument, strict: bool) -> ValidationOutcome {
    let mut validator = Validator::default();
    validator.phase_structural(document);
    validator.phase_semantic(document);
    validator.phase_cross_reference();
    ValidationOutcome::from_diagnostics(validator.diagnostics, strict)
}

#[derive(Default)]
struct Validator {
    diagnostics: Vec<Diagnostic>,
    /// anchor name -> location of its first definition
    defined_anchors: HashMap<String, SourceLocation>,
    /// `*name` references seen on edges: (name, location)
    anchor_refs: Vec<(String, SourceLocation)>,
}

impl Validator {
    // Phase 1

    fn phase_structural(&mut self, document: &LffDocument) {
        for node in &document.nodes {
            node.walk(&mut |n| self.check_node(n));
        }
        for edge in &document.edges {
            self.check_edge(edge);
        }
        self.check_directives(document);
    }

    fn check_node(&mut self, node: &NodeDef) {
        if node.name.is_empty() {
            self.diagnostics.push(Diagnostic::error(
                codes::NODE_NAME_EMPTY,
                "node name must not be empty",
                node.location,
            ));
        }

        if let Some(anchor) = &node.anchor {
            if let Some(&first) = self.defined_anchors.get(anchor) {
                self.diagnostics.push(
                    Diagnostic::error(
                        codes::REFERENCE_ANCHOR_UNIQUE,
                        format!("anchor '&{}' is defined more than once", anchor),
                        node.location,
                    )
                    .with_related(first, format!("'&{}' first defined here", anchor)),
                );
            } else {
                self.defined_anchors.insert(anchor.clone(), node.location);
            }
        }

        for type_name in &node.types {
            if !TYPE_NAME_RE.is_match(type_name) {
                self.diagnostics.push(Diagnostic::warning(
                    codes::INVALID_TYPE_NAME,
                    format!("type name '{}' is not a valid identifier", type_name),
                    node.location,
                ));
            }
        }

        if let Some(spec) = &node.level_spec {
            if !level_spec_is_legal(spec) {
                self.diagnostics.push(
                    Diagnostic::warning(
                        codes::INVALID_LEVEL_SPEC,
                        format!("level spec '{}' is not legal", spec),
                        node.location,
                    )
                    .with_fix(
                        "remove the level spec",
                        vec![TextEdit {
                            range: node.location,
                            new_text: String::new(),
                        }],
                    ),
                );
            }
        }
    }

    fn check_edge(&mut self, edge: &EdgeDef) {
        for (endpoint, side) in [(&edge.from, "source"), (&edge.to, "target")] {
            if endpoint.is_empty() {
                self.diagnostics.push(Diagnostic::error(
                    codes::MISSING_EDGE_ENDPOINT,
                    format!("edge {} is empty", side),
                    edge.location,
                ));
            } else if let Some(anchor) = endpoint.strip_prefix('*') {
                self.anchor_refs.push((anchor.to_string(), edge.location));
            }
        }
    }

    fn check_directives(&mut self, document: &LffDocument) {
        let mut seen: HashMap<&str, SourceLocation> = HashMap::new();

        for directive in &document.directives {
            if directive.name.is_empty() {
                self.diagnostics.push(Diagnostic::error(
                    codes::SYNTAX_ERROR,
                    "directive name must not be empty",
                    directive.location,
                ));
                continue;
            }

            if !KNOWN_DIRECTIVES.contains(&directive.name.as_str()) {
                self.diagnostics.push(
                    Diagnostic::warning(
                        codes::UNKNOWN_DIRECTIVE,
                        format!("unknown directive '@{}'", directive.name),
                        directive.location,
                    )
                    .with_suggestion(format!(
                        "recognized directives are: {}",
                        KNOWN_DIRECTIVES.join(", ")
                    )),
                );
            }

            if let Some(first) = seen.get(directive.name.as_str()) {
                self.diagnostics.push(
                    Diagnostic::warning(
                        codes::DUPLICATE_DIRECTIVE,
                        format!("duplicate directive '@{}'; the last value wins", directive.name),
                        directive.location,
                    )
                    .with_related(*first, "first occurrence here")
                    .with_fix(
                        "remove the duplicate directive",
                        vec![TextEdit {
                            range: directive.location,
                            new_text: String::new(),
                        }],
                    ),
                );
            } else {
                seen.insert(directive.name.as_str(), directive.location);
            }

            if directive.name == "version" {
                let text = directive.value.display_string();
                if !VERSION_RE.is_match(&text) {
                    self.diagnostics.push(Diagnostic::warning(
                        codes::VERSION_FORMAT,
                        format!(
                            "version '{}' does not match MAJOR.MINOR or MAJOR.MINOR.PATCH",
                            text
                        ),
                        directive.location,
                    ));
                }
            }
        }
    }

    // Phase 2

    fn phase_semantic(&mut self, document: &LffDocument) {
        for node in &document.nodes {
            let mut path: Vec<String> = Vec::new();
            self.check_hierarchy(node, &mut path);
        }

        // Reserved directives are expected at most once.
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for directive in &document.directives {
            if KNOWN_DIRECTIVES.contains(&directive.name.as_str()) {
                *counts.entry(directive.name.as_str()).or_insert(0) += 1;
            }
        }
        for (name, count) in counts {
            if count > 1 {
                let location = document
                    .directive(name)
                    .map(|d| d.location)
                    .unwrap_or_default();
                self.diagnostics.push(Diagnostic::warning(
                    codes::DUPLICATE_DIRECTIVE,
                    format!(
                        "reserved directive '@{}' appears {} times; expected at most once",
                        name, count
                    ),
                    location,
                ));
            }
        }
    }

    /// Depth-first walk flagging any node whose name already appears on
    /// the active path. Name equality is the criterion at this stage
    /// because IDs are assigned later.
    fn check_hierarchy(&mut self, node: &NodeDef, path: &mut Vec<String>) {
        if path.contains(&node.name) {
            let mut chain = path.clone();
            chain.push(node.name.clone());
            self.diagnostics.push(Diagnostic::error(
                codes::CIRCULAR_HIERARCHY,
                format!("circular hierarchy: {}", chain.join(" > ")),
                node.location,
            ));
            return;
        }

        path.push(node.name.clone());
        for child in &node.children {
            self.check_hierarchy(child, path);
        }
        path.pop();
    }

    // Phase 3

    fn phase_cross_reference(&mut self) {
        let defined: HashSet<&String> = self.defined_anchors.keys().collect();
        let mut reported: HashSet<&String> = HashSet::new();

        let mut diags = Vec::new();
        for (name, location) in &self.anchor_refs {
            if !defined.contains(name) && reported.insert(name) {
                diags.push(
                    Diagnostic::error(
                        codes::UNDEFINED_ANCHOR_REFERENCE,
                        format!("anchor '*{}' is not defined anywhere in the document", name),
                        *location,
                    )
                    .with_suggestion(format!("define it with '&{}' on a node", name)),
                );
            }
        }
        self.diagnostics.extend(diags);
    }
}

fn level_spec_is_legal(spec: &str) -> bool {
    match LEVEL_SPEC_RE.captures(spec) {
        Some(caps) => match caps.get(3) {
            Some(end) => {
                let start: u64 = caps[1].parse().unwrap_or(0);
                let end: u64 = end.as_str().parse().unwrap_or(0);
                start < end
            }
            None => true,
        },
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{lower, AstLoweringOptions};
    use crate::cst::{LffParser, ParserOptions};
    use crate::diagnostics::Severity;

    fn validate_text(text: &str, strict: bool) -> ValidationOutcome {
        let mut parser = LffParser::new();
        let result = parser.parse_to_cst(text, &ParserOptions::default());
        let doc = lower(&result.cst.expect("cst"), &AstLoweringOptions::default());
        validate_document(&doc, strict)
    }

    #[test]
    fn valid_document_passes() {
        let outcome = validate_text(
            "@title: Demo\nUserService &user [service]\nAPI -> *user\n",
            false,
        );
        assert!(outcome.valid, "errors: {:?}", outcome.errors);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn duplicate_anchor_is_error() {
        let outcome = validate_text("A &x [svc]\nB &x [svc]\n", false);
        assert!(!outcome.valid);
        let dup = outcome
            .errors
            .iter()
            .find(|d| d.code == codes::REFERENCE_ANCHOR_UNIQUE)
            .unwrap();
        assert!(!dup.related.is_empty());
    }

    #[test]
    fn undefined_anchor_reference_is_error() {
        let outcome = validate_text("A -> *ghost\n", false);
        assert!(!outcome.valid);
        assert!(outcome
            .errors
            .iter()
            .any(|d| d.code == codes::UNDEFINED_ANCHOR_REFERENCE));
    }

    #[test]
    fn undefined_reference_reported_once_per_name() {
        let outcome = validate_text("A -> *ghost\nB -> *ghost\n", false);
        let count = outcome
            .errors
            .iter()
            .filter(|d| d.code == codes::UNDEFINED_ANCHOR_REFERENCE)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn unknown_directive_warns() {
        let outcome = validate_text("@custom: 1\n", false);
        assert!(outcome.valid);
        assert!(outcome
            .warnings
            .iter()
            .any(|d| d.code == codes::UNKNOWN_DIRECTIVE));
    }

    #[test]
    fn duplicate_directive_warns_with_fix() {
        let outcome = validate_text("@title: One\n@title: Two\n", false);
        assert!(outcome.valid);
        let dup = outcome
            .warnings
            .iter()
            .find(|d| d.code == codes::DUPLICATE_DIRECTIVE)
            .unwrap();
        assert!(!dup.fixes.is_empty());
    }

    #[test]
    fn version_format_checked() {
        let outcome = validate_text("@version: abc\n", false);
        assert!(outcome
            .warnings
            .iter()
            .any(|d| d.code == codes::VERSION_FORMAT));

        let ok = validate_text("@version: \"1.2.3\"\n", false);
        assert!(!ok
            .warnings
            .iter()
            .any(|d| d.code == codes::VERSION_FORMAT));
    }

    #[test]
    fn circular_hierarchy_by_name() {
        let outcome = validate_text("App:\n  Core:\n    App [svc]\n", false);
        assert!(!outcome.valid);
        let circular = outcome
            .errors
            .iter()
            .find(|d| d.code == codes::CIRCULAR_HIERARCHY)
            .unwrap();
        assert!(circular.message.contains("App > Core > App"));
    }

    #[test]
    fn strict_mode_promotes_warnings_at_boundary() {
        let relaxed = validate_text("@custom: 1\n", false);
        assert!(relaxed.valid);

        let strict = validate_text("@custom: 1\n", true);
        assert!(!strict.valid);
        assert!(strict
            .errors
            .iter()
            .any(|d| d.code == codes::UNKNOWN_DIRECTIVE && d.severity == Severity::Error));
    }

    #[test]
    fn empty_document_is_valid() {
        let outcome = validate_text("", false);
        assert!(outcome.valid);
        assert!(outcome.errors.is_empty());
        assert!(outcome.warnings.is_empty());
    }
}
