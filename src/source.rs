//! Core source-position primitives shared by every pipeline stage
//!
//! Unlike byte-offset spans, LFF locations carry 1-indexed line and column
//! boundaries plus the indentation depth of the construct's first line,
//! because indentation is structural in the language.

use serde::{Deserialize, Serialize};

/// Location of a construct in the original source text.
///
/// Lines and columns are 1-indexed. `end_col` is exclusive. `indent` is the
/// number of two-space indentation units on the first line of the construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub start_line: usize,
    pub end_line: usize,
    pub start_col: usize,
    pub end_col: usize,
    pub indent: usize,
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self {
            start_line: 1,
            end_line: 1,
            start_col: 1,
            end_col: 1,
            indent: 0,
        }
    }
}

impl SourceLocation {
    pub fn new(
        start_line: usize,
        end_line: usize,
        start_col: usize,
        end_col: usize,
        indent: usize,
    ) -> Self {
        Self {
            start_line,
            end_line,
            start_col,
            end_col,
            indent,
        }
    }

    /// A zero-width location at a single point.
    pub fn point(line: usize, col: usize, indent: usize) -> Self {
        Self {
            start_line: line,
            end_line: line,
            start_col: col,
            end_col: col,
            indent,
        }
    }

    /// Smallest location covering both `self` and `other`.
    ///
    /// The indent of the merged location is the indent of whichever operand
    /// starts first, since indent describes the construct's opening line.
    pub fn merge(&self, other: &SourceLocation) -> SourceLocation {
        let first = if (self.start_line, self.start_col) <= (other.start_line, other.start_col) {
            self
        } else {
            other
        };

        SourceLocation {
            start_line: self.start_line.min(other.start_line),
            end_line: self.end_line.max(other.end_line),
            start_col: if self.start_line == other.start_line {
                self.start_col.min(other.start_col)
            } else {
                first.start_col
            },
            end_col: if self.end_line == other.end_line {
                self.end_col.max(other.end_col)
            } else if self.end_line > other.end_line {
                self.end_col
            } else {
                other.end_col
            },
            indent: first.indent,
        }
    }
}

/// Summary information about the source text handed to the lexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Length of the input in characters.
    pub length: usize,
    /// Number of lines (a trailing newline does not open a new line).
    pub line_count: usize,
    /// Always `"utf-8"`; inputs are Rust strings.
    pub encoding: String,
}

impl SourceInfo {
    pub fn of(text: &str) -> Self {
        let line_count = if text.is_empty() {
            0
        } else {
            text.lines().count()
        };
        Self {
            length: text.chars().count(),
            line_count,
            encoding: "utf-8".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_spans_across_lines() {
        let a = SourceLocation::new(1, 1, 3, 10, 0);
        let b = SourceLocation::new(2, 3, 1, 5, 1);
        let merged = a.merge(&b);
        assert_eq!(merged.start_line, 1);
        assert_eq!(merged.end_line, 3);
        assert_eq!(merged.start_col, 3);
        assert_eq!(merged.end_col, 5);
        assert_eq!(merged.indent, 0);
    }

    #[test]
    fn merge_same_line_takes_widest_cols() {
        let a = SourceLocation::new(4, 4, 5, 9, 2);
        let b = SourceLocation::new(4, 4, 2, 7, 1);
        let merged = a.merge(&b);
        assert_eq!(merged.start_col, 2);
        assert_eq!(merged.end_col, 9);
        assert_eq!(merged.indent, 1);
    }

    #[test]
    fn source_info_counts_lines_and_chars() {
        let info = SourceInfo::of("a\nbb\n");
        assert_eq!(info.length, 5);
        assert_eq!(info.line_count, 2);
        assert_eq!(info.encoding, "utf-8");

        let empty = SourceInfo::of("");
        assert_eq!(empty.length, 0);
        assert_eq!(empty.line_count, 0);
    }
}
