//! Token definitions for the LFF lexer
//!
//! Tokens carry their verbatim source slice (`image`) and a
//! [`SourceLocation`]. Whitespace never reaches the token stream; newlines
//! do, because the grammar is line-oriented.

use serde::{Deserialize, Serialize};

use crate::source::SourceLocation;

/// Kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    /// Line terminator (`\n`, `\r` or `\r\n`).
    Newline,
    /// Leading run of two-space indentation units.
    Indent,
    /// `# ...` to end of line. Only emitted when comments are retained.
    Comment,
    /// `[A-Za-z][A-Za-z0-9_-]*`.
    Identifier,
    /// Double-quoted string with escapes.
    StringLiteral,
    /// Base-10 integer or decimal.
    NumberLiteral,
    /// The bare word `true`.
    BooleanTrue,
    /// The bare word `false`.
    BooleanFalse,
    Colon,
    Comma,
    BracketOpen,
    BracketClose,
    /// `->`
    ArrowSimple,
    /// `=>`
    ArrowMultiple,
    /// `<->`
    ArrowBidirectional,
    /// `-->`
    ArrowDashed,
    /// `@name` document directive.
    Directive,
    /// `@N`, `@N+` or `@N-M` layer placement.
    LevelSpec,
    /// `&name` anchor definition.
    AnchorDef,
    /// `*name` anchor reference.
    AnchorRef,
    /// End of input marker.
    Eof,
}

impl TokenKind {
    /// True for the four arrow kinds.
    pub fn is_arrow(&self) -> bool {
        matches!(
            self,
            TokenKind::ArrowSimple
                | TokenKind::ArrowMultiple
                | TokenKind::ArrowBidirectional
                | TokenKind::ArrowDashed
        )
    }

    /// True for tokens that can open a node reference in an edge.
    pub fn is_node_ref(&self) -> bool {
        matches!(
            self,
            TokenKind::Identifier | TokenKind::StringLiteral | TokenKind::AnchorRef
        )
    }
}

/// A single lexical token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Verbatim source slice, including sigils and quotes.
    pub image: String,
    pub location: SourceLocation,
}

impl Token {
    pub fn new(kind: TokenKind, image: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            kind,
            image: image.into(),
            location,
        }
    }

    /// Indentation depth in units for `Indent` tokens (two spaces per unit).
    pub fn indent_units(&self) -> usize {
        self.image.len() / 2
    }

    /// The name carried by sigil tokens (`@name`, `&name`, `*name`),
    /// without the sigil.
    pub fn sigil_name(&self) -> &str {
        self.image
            .strip_prefix(['@', '&', '*'])
            .unwrap_or(&self.image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indent_units_counts_two_space_units() {
        let tok = Token::new(TokenKind::Indent, "    ", SourceLocation::default());
        assert_eq!(tok.indent_units(), 2);
    }

    #[test]
    fn sigil_name_strips_single_sigil() {
        let tok = Token::new(TokenKind::AnchorDef, "&auth", SourceLocation::default());
        assert_eq!(tok.sigil_name(), "auth");
        let tok = Token::new(TokenKind::Directive, "@title", SourceLocation::default());
        assert_eq!(tok.sigil_name(), "title");
    }
}
