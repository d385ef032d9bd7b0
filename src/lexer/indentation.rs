//! Indentation scanning
//!
//! One indentation level is exactly two spaces; tabs are rejected and never
//! converted. Odd leading-space counts are rounded down to the even prefix
//! so parsing can continue, and depth is capped at [`MAX_INDENT_UNITS`].

/// Spaces per indentation unit.
pub const INDENT_UNIT: usize = 2;

/// Maximum nesting depth in units (32 spaces).
pub const MAX_INDENT_UNITS: usize = 16;

/// Result of scanning the leading whitespace of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentScan {
    /// Structural depth in units, after rounding down odd space counts.
    pub units: usize,
    /// Number of leading spaces actually present.
    pub spaces: usize,
    /// Characters consumed, including any tabs.
    pub consumed: usize,
    /// True when the space count was odd.
    pub odd: bool,
    /// 1-indexed columns of tab characters found in the leading run.
    pub tab_columns: Vec<usize>,
    /// True when the depth exceeds [`MAX_INDENT_UNITS`].
    pub too_deep: bool,
}

/// Scan the leading whitespace of the line starting at `chars[start..]`.
///
/// Tabs do not contribute to the indentation depth; they are recorded so
/// the lexer can emit one `TAB_CHARACTER` diagnostic per tab.
pub fn scan_indentation(chars: &[char], start: usize) -> IndentScan {
    let mut spaces = 0usize;
    let mut consumed = 0usize;
    let mut tab_columns = Vec::new();

    while let Some(&ch) = chars.get(start + consumed) {
        match ch {
            ' ' => {
                spaces += 1;
                consumed += 1;
            }
            '\t' => {
                tab_columns.push(consumed + 1);
                consumed += 1;
            }
            _ => break,
        }
    }

    let odd = spaces % 2 == 1;
    let units = spaces / INDENT_UNIT;
    let too_deep = units > MAX_INDENT_UNITS;

    IndentScan {
        units: units.min(MAX_INDENT_UNITS),
        spaces,
        consumed,
        odd,
        tab_columns,
        too_deep,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[rstest]
    #[case("x", 0, false)]
    #[case("  x", 1, false)]
    #[case("    x", 2, false)]
    #[case(" x", 0, true)]
    #[case("   x", 1, true)]
    #[case("     x", 2, true)]
    fn leading_space_runs(#[case] line: &str, #[case] units: usize, #[case] odd: bool) {
        let scan = scan_indentation(&chars(line), 0);
        assert_eq!(scan.units, units);
        assert_eq!(scan.odd, odd);
        assert!(scan.tab_columns.is_empty());
    }

    #[test]
    fn tabs_are_recorded_not_counted() {
        let scan = scan_indentation(&chars("  \t  x"), 0);
        assert_eq!(scan.units, 2);
        assert_eq!(scan.spaces, 4);
        assert_eq!(scan.tab_columns, vec![3]);
        assert_eq!(scan.consumed, 5);
    }

    #[test]
    fn depth_is_capped() {
        let deep = " ".repeat((MAX_INDENT_UNITS + 1) * INDENT_UNIT) + "x";
        let scan = scan_indentation(&chars(&deep), 0);
        assert!(scan.too_deep);
        assert_eq!(scan.units, MAX_INDENT_UNITS);
    }
}
