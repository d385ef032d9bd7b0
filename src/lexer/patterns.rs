//! Shared validation patterns and the lexer's error-pattern table
//!
//! The regexes here are compiled once and reused by the lexer, the AST
//! lowering, and the semantic validator, so the three stages cannot drift
//! apart on what counts as a legal name.

use once_cell::sync::Lazy;
use regex::Regex;

/// Anchor names: `[A-Za-z][A-Za-z0-9_-]{0,31}`.
pub static ANCHOR_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]{0,31}$").unwrap());

/// Level specs: `@N`, `@N+` or `@N-M` with `N >= 1`. Range ordering
/// (`N < M`) is checked during lowering, not here.
pub static LEVEL_SPEC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@([1-9]\d*)(\+|-([1-9]\d*))?$").unwrap());

/// Node type names as validated in phase 1 of the semantic pass.
pub static TYPE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").unwrap());

/// `@version` directive values: `MAJOR.MINOR` or `MAJOR.MINOR.PATCH`.
pub static VERSION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\d+(\.\d+)?$").unwrap());

/// Identifiers: `[A-Za-z][A-Za-z0-9_-]{0,63}`.
pub static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]{0,63}$").unwrap());

/// Directive names with dedicated handling. Other names are legal but
/// trigger an `UNKNOWN_DIRECTIVE` warning during validation.
pub const KNOWN_DIRECTIVES: &[&str] = &[
    "title",
    "version",
    "description",
    "author",
    "domain",
    "tags",
    "strict",
    "encoding",
];

/// Maximum length of an anchor name (`&name` / `*name`).
pub const MAX_ANCHOR_NAME_LEN: usize = 32;

/// Maximum length of a directive name (`@name`).
pub const MAX_DIRECTIVE_NAME_LEN: usize = 32;

/// Classification of a common erroneous prefix: `(code, suggestion)`.
pub type PatternHint = (&'static str, &'static str);

/// Static table mapping erroneous prefixes to a diagnostic code and a
/// suggestion. The lexer consults it with one character of context on each
/// side of the failure point.
static ERROR_PATTERNS: Lazy<Vec<(&'static str, PatternHint)>> = Lazy::new(|| {
    use crate::diagnostics::codes;
    vec![
        (
            "@0",
            (
                codes::INVALID_LEVEL_ZERO,
                "layer levels start at 1; use '@1' for the first layer",
            ),
        ),
        (
            "<-",
            (
                codes::INCOMPLETE_BIDIRECTIONAL_ARROW,
                "use '<->' for a bidirectional edge",
            ),
        ),
        (
            "&-",
            (
                codes::INVALID_ANCHOR_START,
                "anchor names must start with a letter",
            ),
        ),
        (
            "&_",
            (
                codes::INVALID_ANCHOR_START,
                "anchor names must start with a letter",
            ),
        ),
        (
            "*-",
            (
                codes::INVALID_ANCHOR_START,
                "anchor names must start with a letter",
            ),
        ),
        (
            "=",
            (codes::UNEXPECTED_CHARACTER, "use '=>' for a multiple edge"),
        ),
    ]
});

/// Look up the hint for the text at the failure point. `lookbehind` is the
/// character immediately before it, used to avoid re-classifying the tail
/// of a longer token.
pub fn classify_error(lookbehind: Option<char>, at: &str) -> Option<PatternHint> {
    // Inside an identifier the failure is a split token, not a fresh error.
    if lookbehind.is_some_and(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    ERROR_PATTERNS
        .iter()
        .find(|(prefix, _)| at.starts_with(prefix))
        .map(|(_, hint)| *hint)
}
