//! LFF Lexer
//!
//! Converts LFF source text into a flat stream of positioned tokens.
//!
//! The lexer is line-oriented: leading indentation is scanned once per
//! line (see [`indentation`]), newlines are significant, and all other
//! whitespace is discarded. Ambiguity between token classes is resolved by
//! longest match with a fixed priority order:
//!
//! - the three-character arrows `<->` and `-->` before `->`,
//! - `LevelSpec` (`@N`) before `Directive` (`@name`),
//! - the booleans `true`/`false` only as complete words, so `trueish`
//!   lexes as a single identifier.
//!
//! Lexer errors never abort: the lexer always produces a best-effort token
//! list and the stages after it tolerate missing tokens.

pub mod indentation;
pub mod patterns;
pub mod tokens;

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::diagnostics::{codes, Diagnostic};
use crate::source::{SourceInfo, SourceLocation};

use indentation::{scan_indentation, INDENT_UNIT};
use patterns::{classify_error, MAX_ANCHOR_NAME_LEN, MAX_DIRECTIVE_NAME_LEN};
pub use tokens::{Token, TokenKind};

/// Options accepted by [`tokenize`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LexerOptions {
    /// Keep `Comment` tokens in the output (dropped by default).
    pub include_comments: bool,
    /// Measure lex time and throughput.
    pub collect_metrics: bool,
    /// Attach context snippets and suggestions to lexer diagnostics.
    pub enhanced_errors: bool,
}

/// Timing and volume metrics for a single tokenize call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexMetrics {
    pub lex_time_ms: f64,
    pub token_count: usize,
    pub throughput_chars_per_sec: f64,
}

/// Result of tokenizing a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<Diagnostic>,
    pub metrics: Option<LexMetrics>,
    pub source_info: SourceInfo,
}

/// Tokenize LFF source text into a stream of positioned tokens.
pub fn tokenize(text: &str, options: &LexerOptions) -> LexOutput {
    let started = Instant::now();
    let source_info = SourceInfo::of(text);

    let mut lexer = Lexer::new(text, options.clone());
    let tokens = lexer.run();
    let diagnostics = lexer.into_diagnostics();

    let metrics = options.collect_metrics.then(|| {
        let secs = started.elapsed().as_secs_f64();
        LexMetrics {
            lex_time_ms: secs * 1_000.0,
            token_count: tokens.len(),
            throughput_chars_per_sec: if secs > 0.0 {
                source_info.length as f64 / secs
            } else {
                0.0
            },
        }
    });

    LexOutput {
        tokens,
        diagnostics,
        metrics,
        source_info,
    }
}

/// Character-cursor lexer over the input text.
struct Lexer<'a> {
    source: &'a str,
    input: Vec<char>,
    position: usize,
    line: usize,
    col: usize,
    at_line_start: bool,
    line_has_content: bool,
    current_indent: usize,
    options: LexerOptions,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str, options: LexerOptions) -> Self {
        Self {
            source,
            input: source.chars().collect(),
            position: 0,
            line: 1,
            col: 1,
            at_line_start: true,
            line_has_content: false,
            current_indent: 0,
            options,
            diagnostics: Vec::new(),
        }
    }

    fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    fn run(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        while !self.is_at_end() {
            if self.at_line_start {
                self.lex_line_start(&mut tokens);
                continue;
            }

            let ch = match self.peek() {
                Some(ch) => ch,
                None => break,
            };

            match ch {
                '\n' | '\r' => {
                    tokens.push(self.read_newline());
                }
                ' ' | '\t' => {
                    self.skip_inline_whitespace();
                }
                '#' => {
                    let comment = self.read_comment();
                    if self.options.include_comments {
                        tokens.push(comment);
                    }
                }
                '"' => tokens.push(self.read_string()),
                '0'..='9' => tokens.push(self.read_number()),
                'A'..='Z' | 'a'..='z' => tokens.push(self.read_word()),
                ':' => tokens.push(self.read_punct(TokenKind::Colon)),
                ',' => tokens.push(self.read_punct(TokenKind::Comma)),
                '[' => tokens.push(self.read_punct(TokenKind::BracketOpen)),
                ']' => tokens.push(self.read_punct(TokenKind::BracketClose)),
                '@' => {
                    if let Some(token) = self.read_at_sign() {
                        tokens.push(token);
                    }
                }
                '&' => tokens.push(self.read_sigil(TokenKind::AnchorDef, '&')),
                '*' => tokens.push(self.read_sigil(TokenKind::AnchorRef, '*')),
                '-' | '<' | '=' => {
                    if let Some(token) = self.read_arrow() {
                        tokens.push(token);
                    }
                }
                other => {
                    self.report_unexpected(other);
                    self.advance();
                }
            }
        }

        tokens.push(Token::new(
            TokenKind::Eof,
            "",
            SourceLocation::point(self.line, self.col, self.current_indent),
        ));
        tokens
    }

    /// Scan indentation at the start of a line and emit the `Indent` token.
    fn lex_line_start(&mut self, tokens: &mut Vec<Token>) {
        self.at_line_start = false;
        self.line_has_content = false;
        self.current_indent = 0;

        let scan = scan_indentation(&self.input, self.position);

        for tab_col in &scan.tab_columns {
            self.push_diag(Diagnostic::error(
                codes::TAB_CHARACTER,
                "tab character in indentation; LFF indentation uses two-space units",
                SourceLocation::point(self.line, *tab_col, 0),
            ));
        }

        // A whitespace-only line carries no structure; consume it and let
        // the newline handler take over.
        let after = self.input.get(self.position + scan.consumed).copied();
        let blank = matches!(after, Some('\n') | Some('\r') | None);

        if scan.consumed > 0 {
            let start_col = self.col;
            for _ in 0..scan.consumed {
                self.advance();
            }

            if !blank {
                if scan.too_deep {
                    self.push_diag(Diagnostic::error(
                        codes::MAX_DEPTH_EXCEEDED,
                        format!(
                            "indentation of {} spaces exceeds the maximum nesting depth of {} levels",
                            scan.spaces,
                            indentation::MAX_INDENT_UNITS
                        ),
                        SourceLocation::new(self.line, self.line, start_col, self.col, 0),
                    ));
                }
                if scan.odd {
                    self.push_diag(
                        Diagnostic::error(
                            codes::ODD_INDENTATION,
                            format!(
                                "odd indentation of {} spaces; indentation uses two-space units",
                                scan.spaces
                            ),
                            SourceLocation::new(self.line, self.line, start_col, self.col, 0),
                        )
                        .with_suggestion(format!(
                            "use {} or {} spaces",
                            scan.units * INDENT_UNIT,
                            (scan.units + 1) * INDENT_UNIT
                        )),
                    );
                }
                if scan.units > 0 {
                    self.current_indent = scan.units;
                    tokens.push(Token::new(
                        TokenKind::Indent,
                        " ".repeat(scan.units * INDENT_UNIT),
                        SourceLocation::new(
                            self.line,
                            self.line,
                            start_col,
                            start_col + scan.units * INDENT_UNIT,
                            scan.units,
                        ),
                    ));
                }
            }
        }
    }

    fn read_newline(&mut self) -> Token {
        let loc = SourceLocation::point(self.line, self.col, self.current_indent);
        let mut image = String::new();

        if self.peek() == Some('\r') {
            image.push('\r');
            self.advance_raw();
            if self.peek() == Some('\n') {
                image.push('\n');
                self.advance_raw();
            }
        } else if self.peek() == Some('\n') {
            image.push('\n');
            self.advance_raw();
        }

        self.line += 1;
        self.col = 1;
        self.at_line_start = true;
        Token::new(TokenKind::Newline, image, loc)
    }

    /// Skip spaces and tabs inside a line, reporting tabs and trailing
    /// whitespace.
    fn skip_inline_whitespace(&mut self) {
        let start_col = self.col;
        while let Some(ch) = self.peek() {
            match ch {
                ' ' => {
                    self.advance();
                }
                '\t' => {
                    self.push_diag(Diagnostic::error(
                        codes::TAB_CHARACTER,
                        "tab character; LFF uses spaces only",
                        SourceLocation::point(self.line, self.col, self.current_indent),
                    ));
                    self.advance();
                }
                _ => break,
            }
        }

        let at_eol = matches!(self.peek(), Some('\n') | Some('\r') | None);
        if at_eol && self.line_has_content {
            self.push_diag(Diagnostic::warning(
                codes::TRAILING_WHITESPACE,
                "trailing whitespace",
                SourceLocation::new(
                    self.line,
                    self.line,
                    start_col,
                    self.col,
                    self.current_indent,
                ),
            ));
        }
    }

    fn read_comment(&mut self) -> Token {
        let start_col = self.col;
        let mut image = String::new();
        while let Some(ch) = self.peek() {
            if ch == '\n' || ch == '\r' {
                break;
            }
            image.push(ch);
            self.advance();
        }
        self.line_has_content = true;
        Token::new(
            TokenKind::Comment,
            image,
            SourceLocation::new(self.line, self.line, start_col, self.col, self.current_indent),
        )
    }

    fn read_string(&mut self) -> Token {
        let start_col = self.col;
        let mut image = String::new();
        image.push('"');
        self.advance();
        self.line_has_content = true;

        let mut terminated = false;
        while let Some(ch) = self.peek() {
            if ch == '\n' || ch == '\r' {
                break;
            }
            if ch == '"' {
                image.push('"');
                self.advance();
                terminated = true;
                break;
            }
            if ch == '\\' {
                image.push('\\');
                self.advance();
                match self.peek() {
                    Some(esc @ ('n' | 't' | 'r' | '\\' | '"')) => {
                        image.push(esc);
                        self.advance();
                    }
                    Some(other) => {
                        self.push_diag(Diagnostic::warning(
                            codes::INVALID_ESCAPE,
                            format!("unknown escape sequence '\\{}'", other),
                            SourceLocation::new(
                                self.line,
                                self.line,
                                self.col - 1,
                                self.col + 1,
                                self.current_indent,
                            ),
                        ));
                        image.push(other);
                        self.advance();
                    }
                    None => break,
                }
                continue;
            }
            image.push(ch);
            self.advance();
        }

        let loc =
            SourceLocation::new(self.line, self.line, start_col, self.col, self.current_indent);
        if !terminated {
            self.push_diag(Diagnostic::error(
                codes::UNTERMINATED_STRING,
                "unterminated string literal",
                loc,
            ));
        }
        Token::new(TokenKind::StringLiteral, image, loc)
    }

    fn read_number(&mut self) -> Token {
        let start_col = self.col;
        let mut image = String::new();
        self.line_has_content = true;

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                image.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        // Fractional part only when the dot is followed by a digit, so a
        // stray trailing dot is left for the error path.
        if self.peek() == Some('.')
            && self.peek_at(1).map(|c| c.is_ascii_digit()).unwrap_or(false)
        {
            image.push('.');
            self.advance();
            while let Some(ch) = self.peek() {
                if ch.is_ascii_digit() {
                    image.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
        }

        let loc =
            SourceLocation::new(self.line, self.line, start_col, self.col, self.current_indent);
        if image.len() > 1 && image.starts_with('0') && !image.starts_with("0.") {
            self.push_diag(Diagnostic::error(
                codes::INVALID_NUMBER,
                format!("number '{}' has a leading zero", image),
                loc,
            ));
        }
        Token::new(TokenKind::NumberLiteral, image, loc)
    }

    /// Read an identifier, resolving the boolean keywords only when they
    /// form the complete word.
    fn read_word(&mut self) -> Token {
        let start_col = self.col;
        let mut image = String::new();
        self.line_has_content = true;

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
                // '-' belongs to the word unless it opens an arrow.
                if ch == '-' && matches!(self.peek_at(1), Some('>') | Some('-')) {
                    break;
                }
                image.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let loc =
            SourceLocation::new(self.line, self.line, start_col, self.col, self.current_indent);
        let kind = match image.as_str() {
            "true" => TokenKind::BooleanTrue,
            "false" => TokenKind::BooleanFalse,
            _ => TokenKind::Identifier,
        };
        Token::new(kind, image, loc)
    }

    /// Read `@N...` level specs or `@name` directives. Level specs take
    /// priority over directives.
    fn read_at_sign(&mut self) -> Option<Token> {
        let start_col = self.col;
        self.line_has_content = true;

        match self.peek_at(1) {
            Some(ch) if ch.is_ascii_digit() => {
                let mut image = String::from("@");
                self.advance();
                while let Some(d) = self.peek() {
                    if d.is_ascii_digit() {
                        image.push(d);
                        self.advance();
                    } else {
                        break;
                    }
                }
                if image[1..].starts_with('0') {
                    let loc = SourceLocation::new(
                        self.line,
                        self.line,
                        start_col,
                        self.col,
                        self.current_indent,
                    );
                    let mut diag = Diagnostic::error(
                        codes::INVALID_LEVEL_ZERO,
                        format!("invalid level spec '{}'; levels start at 1", image),
                        loc,
                    );
                    if let Some((_, suggestion)) = classify_error(None, "@0") {
                        diag = diag.with_suggestion(suggestion);
                    }
                    self.push_diag(diag);
                    return None;
                }
                // Optional open range '+' or bounded range '-M'.
                if self.peek() == Some('+') {
                    image.push('+');
                    self.advance();
                } else if self.peek() == Some('-')
                    && self.peek_at(1).map(|c| c.is_ascii_digit()).unwrap_or(false)
                {
                    image.push('-');
                    self.advance();
                    while let Some(d) = self.peek() {
                        if d.is_ascii_digit() {
                            image.push(d);
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                let loc = SourceLocation::new(
                    self.line,
                    self.line,
                    start_col,
                    self.col,
                    self.current_indent,
                );
                Some(Token::new(TokenKind::LevelSpec, image, loc))
            }
            Some(ch) if ch.is_ascii_alphabetic() => {
                let mut image = String::from("@");
                self.advance();
                while let Some(c) = self.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                        image.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
                let loc = SourceLocation::new(
                    self.line,
                    self.line,
                    start_col,
                    self.col,
                    self.current_indent,
                );
                if image.len() - 1 > MAX_DIRECTIVE_NAME_LEN {
                    self.push_diag(Diagnostic::warning(
                        codes::UNKNOWN_DIRECTIVE,
                        format!(
                            "directive name '{}' exceeds {} characters",
                            &image[1..],
                            MAX_DIRECTIVE_NAME_LEN
                        ),
                        loc,
                    ));
                }
                Some(Token::new(TokenKind::Directive, image, loc))
            }
            _ => {
                self.report_unexpected('@');
                self.advance();
                None
            }
        }
    }

    /// Read `&name` / `*name`. An invalid start such as `&1` produces a
    /// bare sigil token so the following characters lex on their own; the
    /// AST lowering turns that into a structural error.
    fn read_sigil(&mut self, kind: TokenKind, sigil: char) -> Token {
        let start_col = self.col;
        self.line_has_content = true;
        let mut image = String::new();
        image.push(sigil);
        self.advance();

        if self.peek().map(|c| c.is_ascii_alphabetic()).unwrap_or(false) {
            while let Some(c) = self.peek() {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    image.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            let loc = SourceLocation::new(
                self.line,
                self.line,
                start_col,
                self.col,
                self.current_indent,
            );
            if image.len() - 1 > MAX_ANCHOR_NAME_LEN {
                self.push_diag(Diagnostic::error(
                    codes::ANCHOR_NAME_TOO_LONG,
                    format!(
                        "anchor name '{}' exceeds {} characters",
                        &image[1..],
                        MAX_ANCHOR_NAME_LEN
                    ),
                    loc,
                ));
            }
            Token::new(kind, image, loc)
        } else {
            let loc = SourceLocation::new(
                self.line,
                self.line,
                start_col,
                self.col,
                self.current_indent,
            );
            let rest = self.remaining_prefix(2);
            if let Some((code, suggestion)) = classify_error(None, &format!("{}{}", sigil, rest)) {
                self.push_diag(
                    Diagnostic::error(
                        code,
                        format!("invalid anchor start after '{}'", sigil),
                        loc,
                    )
                    .with_suggestion(suggestion),
                );
            }
            Token::new(kind, image, loc)
        }
    }

    fn read_arrow(&mut self) -> Option<Token> {
        let start_col = self.col;
        self.line_has_content = true;

        // Three-character arrows resolve before '->'.
        for (text, kind) in [
            ("<->", TokenKind::ArrowBidirectional),
            ("-->", TokenKind::ArrowDashed),
            ("=>", TokenKind::ArrowMultiple),
            ("->", TokenKind::ArrowSimple),
        ] {
            if self.matches(text) {
                for _ in 0..text.len() {
                    self.advance();
                }
                return Some(Token::new(
                    kind,
                    text,
                    SourceLocation::new(
                        self.line,
                        self.line,
                        start_col,
                        self.col,
                        self.current_indent,
                    ),
                ));
            }
        }

        // '<-' without the closing '>' is a common slip worth naming.
        if self.matches("<-") {
            let loc = SourceLocation::new(
                self.line,
                self.line,
                start_col,
                start_col + 2,
                self.current_indent,
            );
            let mut diag = Diagnostic::error(
                codes::INCOMPLETE_BIDIRECTIONAL_ARROW,
                "incomplete arrow '<-'",
                loc,
            );
            if let Some((_, suggestion)) = classify_error(self.lookbehind(), "<-") {
                diag = diag.with_suggestion(suggestion);
            }
            self.push_diag(diag);
            self.advance();
            self.advance();
            return None;
        }

        let ch = self.peek()?;
        self.report_unexpected(ch);
        self.advance();
        None
    }

    fn read_punct(&mut self, kind: TokenKind) -> Token {
        let start_col = self.col;
        let ch = self.peek().unwrap_or_default();
        self.line_has_content = true;
        self.advance();
        Token::new(
            kind,
            ch.to_string(),
            SourceLocation::new(self.line, self.line, start_col, self.col, self.current_indent),
        )
    }

    fn report_unexpected(&mut self, ch: char) {
        self.line_has_content = true;
        let loc = SourceLocation::point(self.line, self.col, self.current_indent);
        let ahead = self.remaining_prefix(2);
        let mut diag = Diagnostic::error(
            codes::UNEXPECTED_CHARACTER,
            format!("unexpected character '{}'", ch),
            loc,
        );
        if let Some((_, suggestion)) = classify_error(self.lookbehind(), &ahead) {
            diag = diag.with_suggestion(suggestion);
        }
        self.push_diag(diag);
    }

    fn push_diag(&mut self, diag: Diagnostic) {
        let diag = if self.options.enhanced_errors {
            diag.with_context_from(self.source)
        } else {
            diag
        };
        self.diagnostics.push(diag);
    }

    // Cursor primitives

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn lookbehind(&self) -> Option<char> {
        self.position
            .checked_sub(1)
            .and_then(|i| self.input.get(i))
            .copied()
    }

    fn remaining_prefix(&self, len: usize) -> String {
        self.input[self.position..self.input.len().min(self.position + len)]
            .iter()
            .collect()
    }

    fn matches(&self, text: &str) -> bool {
        text.chars().enumerate().all(|(i, ch)| self.peek_at(i) == Some(ch))
    }

    fn advance(&mut self) {
        if self.position < self.input.len() {
            self.position += 1;
            self.col += 1;
        }
    }

    /// Advance without bumping the column; the newline reader resets
    /// position bookkeeping itself.
    fn advance_raw(&mut self) {
        if self.position < self.input.len() {
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }
}
