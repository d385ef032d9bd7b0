//! Recursive-descent CST builder
//!
//! Parses the token stream into a [`Cst`]. Recovery happens at the
//! document-alternation level: any parse error records a `SYNTAX_ERROR`
//! diagnostic pointing at the offending token and synchronizes to the next
//! newline, so one malformed line never poisons the rest of the document.
//! Token-level lookahead never exceeds 3.
//!
//! [`LffParser`] wraps the builder with the per-instance parse cache and
//! the grammar-extension registry; the registry is validated once when the
//! parser is constructed.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::diagnostics::{codes, has_errors, Diagnostic};
use crate::lexer::{tokenize, LexerOptions, Token, TokenKind};
use crate::source::{SourceInfo, SourceLocation};

use super::cache::{content_hash, ParseCache};
use super::extensions::{ExtensionError, GrammarExtensionRegistry};
use super::{
    Cst, CstBlockItem, CstDirective, CstEdgeDecl, CstEdgeSegment, CstNodeDecl, CstProperty,
    CstStatement, CstValue,
};

/// Options for a single `parse_to_cst` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParserOptions {
    /// File name used in rendered diagnostics.
    pub file_path: Option<String>,
    /// Include `source_info` in the result.
    pub enable_source_info: bool,
    /// Skip the cache lookup; the result is still inserted.
    pub bypass_cache: bool,
}

/// Timing metrics for a parse call. Times are milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseMetrics {
    pub lex_time: f64,
    pub parse_time: f64,
    pub total_time: f64,
    pub from_cache: bool,
    pub token_count: usize,
}

/// Result of building a CST.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CstResult {
    pub success: bool,
    pub cst: Option<Cst>,
    pub diagnostics: Vec<Diagnostic>,
    pub metrics: ParseMetrics,
    pub source_info: Option<SourceInfo>,
}

/// Parser instance owning the parse cache and extension registry.
pub struct LffParser {
    cache: ParseCache,
    extensions: GrammarExtensionRegistry,
    lexer_options: LexerOptions,
}

impl Default for LffParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LffParser {
    pub fn new() -> Self {
        Self {
            cache: ParseCache::default(),
            extensions: GrammarExtensionRegistry::new(),
            lexer_options: LexerOptions::default(),
        }
    }

    pub fn with_lexer_options(mut self, options: LexerOptions) -> Self {
        self.lexer_options = options;
        self
    }

    pub fn with_cache(mut self, cache: ParseCache) -> Self {
        self.cache = cache;
        self
    }

    /// Construct a parser with a set of grammar extensions. The registry
    /// is resolved here; later registration requires a rebuild.
    pub fn with_extensions(
        mut self,
        extensions: GrammarExtensionRegistry,
    ) -> Result<Self, ExtensionError> {
        extensions.rules_in_order()?;
        self.extensions = extensions;
        Ok(self)
    }

    pub fn extensions(&self) -> &GrammarExtensionRegistry {
        &self.extensions
    }

    /// Parse source text into a CST, consulting the cache first.
    pub fn parse_to_cst(&mut self, text: &str, options: &ParserOptions) -> CstResult {
        let total_start = Instant::now();
        let hash = content_hash(text);

        if !options.bypass_cache {
            if let Some(entry) = self.cache.get(hash) {
                let success = !has_errors(&entry.diagnostics);
                return CstResult {
                    success,
                    cst: Some(entry.cst),
                    diagnostics: entry.diagnostics,
                    metrics: ParseMetrics {
                        lex_time: 0.0,
                        parse_time: entry.parse_time_ms,
                        total_time: total_start.elapsed().as_secs_f64() * 1_000.0,
                        from_cache: true,
                        token_count: entry.token_count,
                    },
                    source_info: options
                        .enable_source_info
                        .then(|| SourceInfo::of(text)),
                };
            }
        }

        let lex_start = Instant::now();
        let lexed = tokenize(text, &self.lexer_options);
        let lex_time = lex_start.elapsed().as_secs_f64() * 1_000.0;
        let token_count = lexed.tokens.len();

        let parse_start = Instant::now();
        let mut builder = CstBuilder::new(lexed.tokens);
        let cst = builder.parse_document();
        let parse_time = parse_start.elapsed().as_secs_f64() * 1_000.0;

        let mut diagnostics = lexed.diagnostics;
        diagnostics.extend(builder.diagnostics);

        let success = cst.is_some() && !has_errors(&diagnostics);
        if success {
            if let Some(cst) = &cst {
                self.cache.insert(
                    hash,
                    cst.clone(),
                    diagnostics.clone(),
                    parse_time,
                    token_count,
                );
            }
        }

        CstResult {
            success,
            cst,
            diagnostics,
            metrics: ParseMetrics {
                lex_time,
                parse_time,
                total_time: total_start.elapsed().as_secs_f64() * 1_000.0,
                from_cache: false,
                token_count,
            },
            source_info: options.enable_source_info.then(|| lexed.source_info),
        }
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

/// Marker for an already-reported parse failure; the catcher synchronizes
/// to the next newline.
struct ParseAbort;

type Parse<T> = Result<T, ParseAbort>;

struct CstBuilder {
    tokens: Vec<Token>,
    pos: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl CstBuilder {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Parse the whole document. Returns `None` only when the builder was
    /// handed no tokens at all.
    fn parse_document(&mut self) -> Option<Cst> {
        if self.tokens.is_empty() {
            self.diagnostics.push(Diagnostic::error(
                codes::LEXER_NOT_INITIALIZED,
                "no token stream available; the lexer was not run",
                SourceLocation::default(),
            ));
            return None;
        }

        let mut statements = Vec::new();

        loop {
            match self.peek_kind() {
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    self.advance();
                }
                TokenKind::Indent => {
                    // Indentation outside any node block.
                    let token = self.advance().clone();
                    self.error_at(
                        &token,
                        "unexpected indentation outside a node block",
                    );
                    statements.push(self.recover_from(self.pos.saturating_sub(1)));
                }
                TokenKind::Comment => {
                    let token = self.advance().clone();
                    statements.push(CstStatement::Comment(token));
                }
                TokenKind::Directive => {
                    let start = self.pos;
                    match self.parse_directive() {
                        Ok(directive) => statements.push(CstStatement::Directive(directive)),
                        Err(ParseAbort) => statements.push(self.recover_from(start)),
                    }
                }
                TokenKind::Identifier | TokenKind::StringLiteral => {
                    let start = self.pos;
                    match self.parse_node_or_edge(0) {
                        Ok(statement) => statements.push(statement),
                        Err(ParseAbort) => statements.push(self.recover_from(start)),
                    }
                }
                TokenKind::AnchorRef => {
                    let start = self.pos;
                    match self.parse_edge_from_anchor() {
                        Ok(edge) => statements.push(CstStatement::Edge(edge)),
                        Err(ParseAbort) => statements.push(self.recover_from(start)),
                    }
                }
                _ => {
                    let token = self.advance().clone();
                    self.error_at(&token, "expected a directive, node or edge");
                    statements.push(self.recover_from(self.pos.saturating_sub(1)));
                }
            }
        }

        Some(Cst { statements })
    }

    // Statement parsers

    fn parse_directive(&mut self) -> Parse<CstDirective> {
        let name = self.advance().clone();
        self.expect(TokenKind::Colon, "expected ':' after directive name")?;
        let value = self.parse_value()?;
        self.end_of_line()?;
        let location = name.location.merge(&value.location());
        Ok(CstDirective {
            name,
            value: Some(value),
            location,
        })
    }

    /// Parse a statement opening with a node identifier. The decision
    /// between node and edge is made after the header: an arrow makes the
    /// header the first segment of an edge chain.
    fn parse_node_or_edge(&mut self, indent: usize) -> Parse<CstStatement> {
        let header = self.parse_node_header()?;

        if self.peek_kind().is_arrow() {
            let edge = self.parse_edge_chain(CstEdgeSegment {
                node: header.0,
                anchor: header.1,
                types: header.2,
                level: header.3,
            })?;
            return Ok(CstStatement::Edge(edge));
        }

        let (name, anchor, types, level) = header;
        let mut location = name.location;
        let mut inline_value = None;
        let mut block = Vec::new();

        if self.peek_kind() == TokenKind::Colon {
            self.advance();
            if matches!(
                self.peek_kind(),
                TokenKind::Newline | TokenKind::Comment | TokenKind::Eof
            ) {
                self.end_of_line()?;
                block = self.parse_block(indent)?;
                if let Some(last) = block.last() {
                    location = location.merge(&block_item_location(last));
                }
            } else {
                let value = self.parse_value()?;
                location = location.merge(&value.location());
                inline_value = Some(value);
                self.end_of_line()?;
            }
        } else {
            self.end_of_line()?;
        }

        Ok(CstStatement::Node(CstNodeDecl {
            name,
            anchor,
            types,
            level,
            inline_value,
            block,
            location,
        }))
    }

    /// `Name [&anchor] [[types]] [@level]`.
    #[allow(clippy::type_complexity)]
    fn parse_node_header(
        &mut self,
    ) -> Parse<(Token, Option<Token>, Vec<Token>, Option<Token>)> {
        let name = self.advance().clone();

        let anchor = if self.peek_kind() == TokenKind::AnchorDef {
            Some(self.advance().clone())
        } else {
            None
        };

        let types = if self.peek_kind() == TokenKind::BracketOpen {
            self.parse_type_list()?
        } else {
            Vec::new()
        };

        let level = if self.peek_kind() == TokenKind::LevelSpec {
            Some(self.advance().clone())
        } else {
            None
        };

        Ok((name, anchor, types, level))
    }

    fn parse_type_list(&mut self) -> Parse<Vec<Token>> {
        self.advance(); // '['
        let mut types = Vec::new();

        loop {
            match self.peek_kind() {
                TokenKind::Identifier => types.push(self.advance().clone()),
                TokenKind::BracketClose => {
                    self.advance();
                    return Ok(types);
                }
                _ => {
                    let token = self.peek().clone();
                    self.error_at(&token, "expected a type name or ']' in type list");
                    return Err(ParseAbort);
                }
            }

            match self.peek_kind() {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::BracketClose => {
                    self.advance();
                    return Ok(types);
                }
                _ => {
                    let token = self.peek().clone();
                    self.error_at(&token, "expected ',' or ']' in type list");
                    return Err(ParseAbort);
                }
            }
        }
    }

    fn parse_edge_from_anchor(&mut self) -> Parse<CstEdgeDecl> {
        let node = self.advance().clone();
        let segment = CstEdgeSegment {
            node,
            anchor: None,
            types: Vec::new(),
            level: None,
        };
        if !self.peek_kind().is_arrow() {
            let token = self.peek().clone();
            self.error_at(&token, "expected an arrow after anchor reference");
            return Err(ParseAbort);
        }
        self.parse_edge_chain(segment)
    }

    /// Continue an edge chain after its first segment. Each arrow must be
    /// followed by another node reference; a chain of k references yields
    /// k-1 edges downstream.
    fn parse_edge_chain(&mut self, first: CstEdgeSegment) -> Parse<CstEdgeDecl> {
        let mut location = first.node.location;
        let mut segments = vec![first];
        let mut arrows = Vec::new();

        while self.peek_kind().is_arrow() {
            arrows.push(self.advance().clone());

            match self.peek_kind() {
                TokenKind::Identifier | TokenKind::StringLiteral => {
                    let (node, anchor, types, level) = self.parse_node_header()?;
                    location = location.merge(&node.location);
                    segments.push(CstEdgeSegment {
                        node,
                        anchor,
                        types,
                        level,
                    });
                }
                TokenKind::AnchorRef => {
                    let node = self.advance().clone();
                    location = location.merge(&node.location);
                    segments.push(CstEdgeSegment {
                        node,
                        anchor: None,
                        types: Vec::new(),
                        level: None,
                    });
                }
                _ => {
                    let token = self.peek().clone();
                    self.error_at(&token, "expected a node reference after arrow");
                    return Err(ParseAbort);
                }
            }
        }

        let label = if self.peek_kind() == TokenKind::Colon {
            self.advance();
            let value = self.parse_value()?;
            location = location.merge(&value.location());
            Some(value)
        } else {
            None
        };

        self.end_of_line()?;

        Ok(CstEdgeDecl {
            segments,
            arrows,
            label,
            location,
        })
    }

    /// Parse the indented block of a node whose own lines sit at
    /// `parent_indent` units. Entries are properties, child nodes or
    /// comments; a line at or below the parent's indentation ends the
    /// block without being consumed.
    fn parse_block(&mut self, parent_indent: usize) -> Parse<Vec<CstBlockItem>> {
        let mut items = Vec::new();

        loop {
            match self.peek_kind() {
                TokenKind::Newline => {
                    self.advance();
                    continue;
                }
                TokenKind::Indent => {
                    let units = self.peek().indent_units();
                    if units <= parent_indent {
                        break;
                    }
                    self.advance();

                    let start = self.pos;
                    match self.parse_block_item(units) {
                        Ok(Some(item)) => items.push(item),
                        Ok(None) => {}
                        Err(ParseAbort) => {
                            // Keep the surrounding block alive; only the
                            // broken line is skipped.
                            self.recover_from(start);
                        }
                    }
                }
                _ => break,
            }
        }

        Ok(items)
    }

    /// Parse one block line. `Ok(None)` means the line was consumed but
    /// produced no item (an edge, which is illegal inside blocks).
    fn parse_block_item(&mut self, indent: usize) -> Parse<Option<CstBlockItem>> {
        match self.peek_kind() {
            TokenKind::Comment => {
                let token = self.advance().clone();
                self.end_of_line()?;
                Ok(Some(CstBlockItem::Comment(token)))
            }
            TokenKind::Directive => {
                let directive = self.parse_directive()?;
                Ok(Some(CstBlockItem::Directive(directive)))
            }
            TokenKind::StringLiteral => self.parse_child_statement(indent),
            TokenKind::Identifier => {
                // `key: value` on one line is a property; everything else
                // (anchor, type list, level spec, a block-opening colon)
                // is a child node. Lookahead of 3 decides.
                let is_property = self.peek_kind_at(1) == TokenKind::Colon
                    && !matches!(
                        self.peek_kind_at(2),
                        TokenKind::Newline | TokenKind::Comment | TokenKind::Eof
                    );
                if is_property {
                    let property = self.parse_property()?;
                    Ok(Some(CstBlockItem::Property(property)))
                } else {
                    self.parse_child_statement(indent)
                }
            }
            _ => {
                let token = self.peek().clone();
                self.error_at(&token, "expected a property, child node or comment");
                Err(ParseAbort)
            }
        }
    }

    fn parse_child_statement(&mut self, indent: usize) -> Parse<Option<CstBlockItem>> {
        match self.parse_node_or_edge(indent)? {
            CstStatement::Node(node) => Ok(Some(CstBlockItem::Child(node))),
            statement => {
                // The edge line was already consumed, newline included, so
                // no further recovery is needed.
                self.diagnostics.push(Diagnostic::error(
                    codes::SYNTAX_ERROR,
                    "edges are not allowed inside node blocks",
                    statement.location(),
                ));
                Ok(None)
            }
        }
    }

    fn parse_property(&mut self) -> Parse<CstProperty> {
        let key = self.advance().clone();
        self.expect(TokenKind::Colon, "expected ':' after property name")?;
        let value = self.parse_value()?;
        self.end_of_line()?;
        let location = key.location.merge(&value.location());
        Ok(CstProperty {
            key,
            value,
            location,
        })
    }

    fn parse_value(&mut self) -> Parse<CstValue> {
        match self.peek_kind() {
            TokenKind::StringLiteral
            | TokenKind::NumberLiteral
            | TokenKind::BooleanTrue
            | TokenKind::BooleanFalse => Ok(CstValue::Scalar(self.advance().clone())),
            // A value opening with a bare word may continue as unquoted
            // text to the end of the line: `@title: Simple System`.
            TokenKind::Identifier => {
                let first = self.advance().clone();
                let mut tokens = vec![first];
                while matches!(
                    self.peek_kind(),
                    TokenKind::Identifier
                        | TokenKind::NumberLiteral
                        | TokenKind::BooleanTrue
                        | TokenKind::BooleanFalse
                ) {
                    tokens.push(self.advance().clone());
                }
                if tokens.len() == 1 {
                    Ok(CstValue::Scalar(tokens.pop().unwrap()))
                } else {
                    let location = tokens
                        .iter()
                        .skip(1)
                        .fold(tokens[0].location, |acc, t| acc.merge(&t.location));
                    Ok(CstValue::Words { tokens, location })
                }
            }
            TokenKind::BracketOpen => self.parse_array(),
            _ => {
                let token = self.peek().clone();
                self.error_at(&token, "expected a value");
                Err(ParseAbort)
            }
        }
    }

    fn parse_array(&mut self) -> Parse<CstValue> {
        let open = self.advance().clone();
        let mut items = Vec::new();
        let mut location = open.location;

        loop {
            // Arrays may wrap one element per line; line structure is not
            // significant inside the brackets.
            self.skip_line_structure();

            if self.peek_kind() == TokenKind::BracketClose {
                let close = self.advance().clone();
                location = location.merge(&close.location);
                return Ok(CstValue::Array {
                    open,
                    items,
                    close: Some(close),
                    location,
                });
            }

            let item = self.parse_value()?;
            location = location.merge(&item.location());
            items.push(item);

            self.skip_line_structure();
            match self.peek_kind() {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::BracketClose => {}
                _ => {
                    let token = self.peek().clone();
                    self.error_at(&token, "expected ',' or ']' in array");
                    return Err(ParseAbort);
                }
            }
        }
    }

    fn skip_line_structure(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Indent) {
            self.advance();
        }
    }

    /// Consume an optional trailing comment and the line terminator.
    fn end_of_line(&mut self) -> Parse<()> {
        if self.peek_kind() == TokenKind::Comment {
            self.advance();
        }
        match self.peek_kind() {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            _ => {
                let token = self.peek().clone();
                self.error_at(&token, "expected end of line");
                Err(ParseAbort)
            }
        }
    }

    // Recovery and cursor plumbing

    /// Skip to just past the next newline and wrap the skipped tokens in
    /// an `Error` statement.
    fn recover_from(&mut self, start: usize) -> CstStatement {
        while !matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Eof) {
            self.advance();
        }
        if self.peek_kind() == TokenKind::Newline {
            self.advance();
        }
        let tokens: Vec<Token> = self.tokens[start..self.pos].to_vec();
        let location = tokens
            .first()
            .map(|t| t.location)
            .unwrap_or_default();
        let location = tokens
            .iter()
            .fold(location, |acc, t| acc.merge(&t.location));
        CstStatement::Error { tokens, location }
    }

    fn error_at(&mut self, token: &Token, message: &str) {
        let shown = if token.kind == TokenKind::Eof {
            "end of input".to_string()
        } else if token.kind == TokenKind::Newline {
            "end of line".to_string()
        } else {
            format!("'{}'", token.image)
        };
        self.diagnostics.push(Diagnostic::error(
            codes::SYNTAX_ERROR,
            format!("{}, found {}", message, shown),
            token.location,
        ));
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Parse<Token> {
        if self.peek_kind() == kind {
            Ok(self.advance().clone())
        } else {
            let token = self.peek().clone();
            self.error_at(&token, message);
            Err(ParseAbort)
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn peek_kind_at(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> &Token {
        let idx = self.pos.min(self.tokens.len() - 1);
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        } else {
            self.pos = self.tokens.len() - 1;
        }
        &self.tokens[idx]
    }
}

fn block_item_location(item: &CstBlockItem) -> SourceLocation {
    match item {
        CstBlockItem::Property(p) => p.location,
        CstBlockItem::Child(c) => c.location,
        CstBlockItem::Comment(t) => t.location,
        CstBlockItem::Directive(d) => d.location,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn parse(text: &str) -> CstResult {
        LffParser::new().parse_to_cst(text, &ParserOptions::default())
    }

    fn statements(text: &str) -> Vec<CstStatement> {
        parse(text).cst.expect("cst").statements
    }

    #[test]
    fn empty_input_succeeds_with_no_statements() {
        let result = parse("");
        assert!(result.success);
        assert!(result.diagnostics.is_empty());
        assert!(result.cst.unwrap().statements.is_empty());
    }

    #[test]
    fn parses_directive_node_edge() {
        let stmts = statements("@title: Demo\nGateway [api] @1\nGateway -> App\n");
        assert_eq!(stmts.len(), 3);
        assert!(matches!(stmts[0], CstStatement::Directive(_)));
        assert!(matches!(stmts[1], CstStatement::Node(_)));
        assert!(matches!(stmts[2], CstStatement::Edge(_)));
    }

    #[test]
    fn node_header_decorations() {
        let stmts = statements("UserService &user [service, backend] @2\n");
        match &stmts[0] {
            CstStatement::Node(node) => {
                assert_eq!(node.name.image, "UserService");
                assert_eq!(node.anchor.as_ref().unwrap().image, "&user");
                assert_eq!(node.types.len(), 2);
                assert_eq!(node.level.as_ref().unwrap().image, "@2");
            }
            other => panic!("expected node, got {:?}", other),
        }
    }

    #[test]
    fn edge_chain_collects_segments() {
        let stmts = statements("Frontend [web] -> Backend [api] -> Database [postgres]\n");
        match &stmts[0] {
            CstStatement::Edge(edge) => {
                assert_eq!(edge.segments.len(), 3);
                assert_eq!(edge.arrows.len(), 2);
                assert_eq!(edge.segments[1].types.len(), 1);
            }
            other => panic!("expected edge, got {:?}", other),
        }
    }

    #[rstest]
    #[case("Gateway -> App: request\n")]
    #[case("Gateway -> App: \"request flow\"\n")]
    #[case("Gateway => App: 42\n")]
    fn edge_label_after_colon(#[case] input: &str) {
        let stmts = statements(input);
        match &stmts[0] {
            CstStatement::Edge(edge) => {
                assert!(edge.label.is_some());
            }
            other => panic!("expected edge, got {:?}", other),
        }
    }

    #[test]
    fn block_distinguishes_properties_and_children() {
        let text = "System:\n  Frontend [web]:\n    port: 3000\n  replicas: 2\n";
        let stmts = statements(text);
        match &stmts[0] {
            CstStatement::Node(node) => {
                assert_eq!(node.block.len(), 2);
                assert!(matches!(node.block[0], CstBlockItem::Child(_)));
                assert!(matches!(node.block[1], CstBlockItem::Property(_)));
                match &node.block[0] {
                    CstBlockItem::Child(child) => {
                        assert_eq!(child.block.len(), 1);
                        assert!(matches!(child.block[0], CstBlockItem::Property(_)));
                    }
                    _ => unreachable!(),
                }
            }
            other => panic!("expected node, got {:?}", other),
        }
    }

    #[test]
    fn child_without_colon_is_child_node() {
        let text = "Cluster:\n  web-1 [vm]\n  web-2 [vm]\n";
        let stmts = statements(text);
        match &stmts[0] {
            CstStatement::Node(node) => {
                assert_eq!(node.block.len(), 2);
                assert!(node
                    .block
                    .iter()
                    .all(|item| matches!(item, CstBlockItem::Child(_))));
            }
            other => panic!("expected node, got {:?}", other),
        }
    }

    #[rstest]
    #[case("Threshold: 42\n")]
    #[case("Mode: fast\n")]
    #[case("Enabled: true\n")]
    fn inline_value_is_recorded(#[case] input: &str) {
        let stmts = statements(input);
        match &stmts[0] {
            CstStatement::Node(node) => {
                assert!(node.inline_value.is_some());
            }
            other => panic!("expected node, got {:?}", other),
        }
    }

    #[test]
    fn recovery_keeps_following_lines() {
        let result = parse("Frontend [web\nBackend [api]\nFrontend -> Backend\n");
        assert!(!result.success);
        let syntax_errors: Vec<&Diagnostic> = result
            .diagnostics
            .iter()
            .filter(|d| d.code == codes::SYNTAX_ERROR)
            .collect();
        assert!(!syntax_errors.is_empty());
        assert_eq!(syntax_errors[0].location.start_line, 1);

        let stmts = result.cst.unwrap().statements;
        assert!(stmts
            .iter()
            .any(|s| matches!(s, CstStatement::Error { .. })));
        assert!(stmts.iter().any(
            |s| matches!(s, CstStatement::Node(n) if n.name.image == "Backend")
        ));
        assert!(stmts.iter().any(|s| matches!(s, CstStatement::Edge(_))));
    }

    #[test]
    fn cache_serves_second_parse() {
        let mut parser = LffParser::new();
        let text = "A -> B\n";
        let first = parser.parse_to_cst(text, &ParserOptions::default());
        assert!(!first.metrics.from_cache);
        let second = parser.parse_to_cst(text, &ParserOptions::default());
        assert!(second.metrics.from_cache);
        assert_eq!(second.metrics.lex_time, 0.0);
        assert_eq!(first.cst, second.cst);
    }

    #[test]
    fn bypass_cache_still_populates() {
        let mut parser = LffParser::new();
        let text = "A -> B\n";
        let first = parser.parse_to_cst(
            text,
            &ParserOptions {
                bypass_cache: true,
                ..Default::default()
            },
        );
        assert!(!first.metrics.from_cache);
        assert_eq!(parser.cache_len(), 1);
        let second = parser.parse_to_cst(text, &ParserOptions::default());
        assert!(second.metrics.from_cache);
    }

    #[test]
    fn failed_parses_are_not_cached() {
        let mut parser = LffParser::new();
        let text = "Frontend [web\n";
        parser.parse_to_cst(text, &ParserOptions::default());
        assert_eq!(parser.cache_len(), 0);
    }

    #[test]
    fn empty_token_stream_reports_lexer_not_initialized() {
        let mut builder = CstBuilder::new(Vec::new());
        assert!(builder.parse_document().is_none());
        assert_eq!(
            builder.diagnostics[0].code,
            codes::LEXER_NOT_INITIALIZED
        );
    }

    #[test]
    fn comment_only_input_succeeds() {
        let result = parse("# nothing here\n");
        assert!(result.success);
        // Comments are dropped by the default lexer options.
        assert!(result.cst.unwrap().statements.is_empty());
    }

    #[test]
    fn source_info_on_request() {
        let mut parser = LffParser::new();
        let result = parser.parse_to_cst(
            "A\n",
            &ParserOptions {
                enable_source_info: true,
                ..Default::default()
            },
        );
        assert_eq!(result.source_info.unwrap().line_count, 1);
    }
}
