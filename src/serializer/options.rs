//! Serializer options and presets
//!
//! The option surface is grouped the way callers think about formatting:
//! indentation, line endings, quoting, spacing, sorting, wrapping and
//! inclusion. The four presets are fixed bundles; `pretty` is the default
//! and the one the round-trip guarantee is stated against.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndentType {
    Spaces,
    Tabs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    Lf,
    Crlf,
    Cr,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
            LineEnding::Cr => "\r",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStyle {
    Single,
    Double,
    /// Prefer single quotes unless the string contains one.
    Smart,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndentationOptions {
    #[serde(rename = "type")]
    pub indent_type: IndentType,
    /// Units per level, 1..=8.
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteOptions {
    pub style: QuoteStyle,
    pub force_quotes: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpacingOptions {
    /// Emit a space after the colon of directives, properties and labels.
    pub around_colons: bool,
    /// Emit spaces around edge arrows.
    pub around_arrows: bool,
    /// Blank lines between the directive, node and edge sections.
    pub between_sections: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortingOptions {
    pub nodes: bool,
    pub edges: bool,
    pub directives: bool,
    pub properties: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattingOptions {
    pub max_line_length: usize,
    /// Break arrays longer than `max_line_length` one element per line.
    pub wrap_arrays: bool,
    /// Pad property values so they start in the same column per block.
    pub align_values: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncludeOptions {
    pub comments: bool,
    /// Emit the raw `lff` provenance map as node properties.
    pub lff_metadata: bool,
    /// Emit a `@parser` directive with provenance.
    pub parser_metadata: bool,
}

/// The merged serializer option surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializerOptions {
    pub indentation: IndentationOptions,
    pub line_endings: LineEnding,
    pub quotes: QuoteOptions,
    pub spacing: SpacingOptions,
    pub sorting: SortingOptions,
    pub formatting: FormattingOptions,
    pub include: IncludeOptions,
}

impl Default for SerializerOptions {
    fn default() -> Self {
        Self::pretty()
    }
}

impl SerializerOptions {
    /// The default preset: readable spacing, no sorting, double quotes.
    pub fn pretty() -> Self {
        Self {
            indentation: IndentationOptions {
                indent_type: IndentType::Spaces,
                size: 2,
            },
            line_endings: LineEnding::Lf,
            quotes: QuoteOptions {
                style: QuoteStyle::Double,
                force_quotes: false,
            },
            spacing: SpacingOptions {
                around_colons: true,
                around_arrows: true,
                between_sections: 1,
            },
            sorting: SortingOptions {
                nodes: false,
                edges: false,
                directives: false,
                properties: false,
            },
            formatting: FormattingOptions {
                max_line_length: 100,
                wrap_arrays: true,
                align_values: false,
            },
            include: IncludeOptions {
                comments: false,
                lff_metadata: false,
                parser_metadata: false,
            },
        }
    }

    /// Tight output: no blank lines between sections, no array wrapping.
    pub fn compact() -> Self {
        Self {
            spacing: SpacingOptions {
                around_colons: true,
                around_arrows: true,
                between_sections: 0,
            },
            formatting: FormattingOptions {
                max_line_length: usize::MAX,
                wrap_arrays: false,
                align_values: false,
            },
            ..Self::pretty()
        }
    }

    /// Canonical output: everything quoted, everything sorted, values
    /// aligned. Two serializations of equal graphs are byte-identical.
    pub fn strict() -> Self {
        Self {
            quotes: QuoteOptions {
                style: QuoteStyle::Double,
                force_quotes: true,
            },
            sorting: SortingOptions {
                nodes: true,
                edges: true,
                directives: true,
                properties: true,
            },
            formatting: FormattingOptions {
                max_line_length: 100,
                wrap_arrays: true,
                align_values: true,
            },
            ..Self::pretty()
        }
    }

    /// Fewest bytes that still reparse: no optional spacing at all.
    pub fn minimal() -> Self {
        Self {
            spacing: SpacingOptions {
                around_colons: false,
                around_arrows: false,
                between_sections: 0,
            },
            formatting: FormattingOptions {
                max_line_length: usize::MAX,
                wrap_arrays: false,
                align_values: false,
            },
            ..Self::pretty()
        }
    }

    /// One indentation level at the given depth.
    pub fn indent(&self, depth: usize) -> String {
        let unit = match self.indentation.indent_type {
            IndentType::Spaces => " ".repeat(self.indentation.size.clamp(1, 8)),
            IndentType::Tabs => "\t".repeat(self.indentation.size.clamp(1, 8)),
        };
        unit.repeat(depth)
    }
}

/// A named preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerializerPreset {
    Compact,
    Pretty,
    Strict,
    Minimal,
}

impl SerializerPreset {
    pub fn options(&self) -> SerializerOptions {
        match self {
            SerializerPreset::Compact => SerializerOptions::compact(),
            SerializerPreset::Pretty => SerializerOptions::pretty(),
            SerializerPreset::Strict => SerializerOptions::strict(),
            SerializerPreset::Minimal => SerializerOptions::minimal(),
        }
    }
}

impl std::str::FromStr for SerializerPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compact" => Ok(SerializerPreset::Compact),
            "pretty" => Ok(SerializerPreset::Pretty),
            "strict" => Ok(SerializerPreset::Strict),
            "minimal" => Ok(SerializerPreset::Minimal),
            other => Err(format!("unknown preset: {}", other)),
        }
    }
}

impl From<SerializerPreset> for SerializerOptions {
    fn from(preset: SerializerPreset) -> Self {
        preset.options()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_names_parse() {
        assert_eq!(
            "pretty".parse::<SerializerPreset>().unwrap(),
            SerializerPreset::Pretty
        );
        assert!("fancy".parse::<SerializerPreset>().is_err());
    }

    #[test]
    fn default_is_pretty() {
        assert_eq!(SerializerOptions::default(), SerializerOptions::pretty());
    }

    #[test]
    fn indent_respects_type_and_size() {
        let pretty = SerializerOptions::pretty();
        assert_eq!(pretty.indent(2), "    ");

        let mut tabs = SerializerOptions::pretty();
        tabs.indentation = IndentationOptions {
            indent_type: IndentType::Tabs,
            size: 1,
        };
        assert_eq!(tabs.indent(3), "\t\t\t");
    }
}
