//! Unified option surface for the public API
//!
//! [`LffOptions`] merges the per-stage option structs. Callers that hold a
//! loose map (CLI flags, FFI) go through [`LffOptions::from_map`], which
//! fills the typed fields and warns about unknown keys instead of failing.

use serde::{Deserialize, Serialize};

use crate::assembler::GraphLoweringOptions;
use crate::ast::AstLoweringOptions;
use crate::cst::ParserOptions;
use crate::diagnostics::{codes, Diagnostic};
use crate::lexer::LexerOptions;
use crate::serializer::{SerializerOptions, SerializerPreset};
use crate::source::SourceLocation;

/// Options accepted by every public entry point.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LffOptions {
    pub lexer: LexerOptions,
    pub parser: ParserOptions,
    pub lowering: AstLoweringOptions,
    pub graph: GraphLoweringOptions,
    pub serializer: SerializerOptions,
    /// Promote warnings to errors at the API boundary.
    pub strict: bool,
}

impl LffOptions {
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Default::default()
        }
    }

    /// Build options from a loose key/value map. Unknown keys are ignored
    /// with an `UNKNOWN_OPTION` warning.
    pub fn from_map(map: &serde_json::Map<String, serde_json::Value>) -> (Self, Vec<Diagnostic>) {
        let mut options = LffOptions::default();
        let mut warnings = Vec::new();

        for (key, value) in map {
            let recognized = match key.as_str() {
                "include_comments" => {
                    options.lexer.include_comments = value.as_bool().unwrap_or(false);
                    options.lowering.collect_comments = options.lexer.include_comments;
                    true
                }
                "collect_metrics" => {
                    options.lexer.collect_metrics = value.as_bool().unwrap_or(false);
                    true
                }
                "enhanced_errors" => {
                    options.lexer.enhanced_errors = value.as_bool().unwrap_or(false);
                    true
                }
                "file_path" => {
                    options.parser.file_path = value.as_str().map(String::from);
                    true
                }
                "enable_source_info" => {
                    options.parser.enable_source_info = value.as_bool().unwrap_or(false);
                    true
                }
                "bypass_cache" => {
                    options.parser.bypass_cache = value.as_bool().unwrap_or(false);
                    true
                }
                "default_node_type" => {
                    if let Some(text) = value.as_str() {
                        options.graph.default_node_type = text.to_string();
                    }
                    true
                }
                "default_edge_type" => {
                    if let Some(text) = value.as_str() {
                        options.graph.default_edge_type = text.to_string();
                    }
                    true
                }
                "preserve_lff_metadata" => {
                    options.graph.preserve_lff_metadata = value.as_bool().unwrap_or(true);
                    true
                }
                "generate_unique_ids" => {
                    options.graph.generate_unique_ids = value.as_bool().unwrap_or(true);
                    true
                }
                "allow_self_loops" => {
                    options.graph.allow_self_loops = value.as_bool().unwrap_or(false);
                    true
                }
                "strict" | "strict_mode" => {
                    options.strict = value.as_bool().unwrap_or(false);
                    options.graph.strict_mode = options.strict;
                    true
                }
                "preset" => {
                    match value
                        .as_str()
                        .unwrap_or_default()
                        .parse::<SerializerPreset>()
                    {
                        Ok(preset) => options.serializer = preset.options(),
                        Err(_) => {
                            warnings.push(Diagnostic::warning(
                                codes::UNKNOWN_OPTION,
                                format!("unknown serializer preset '{}'", value),
                                SourceLocation::default(),
                            ));
                        }
                    }
                    true
                }
                _ => false,
            };

            if !recognized {
                warnings.push(Diagnostic::warning(
                    codes::UNKNOWN_OPTION,
                    format!("unknown option '{}' was ignored", key),
                    SourceLocation::default(),
                ));
            }
        }

        (options, warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(json: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        json.as_object().unwrap().clone()
    }

    #[test]
    fn known_keys_fill_typed_fields() {
        let (options, warnings) = LffOptions::from_map(&map(serde_json::json!({
            "include_comments": true,
            "strict": true,
            "default_node_type": "block",
            "preset": "compact"
        })));
        assert!(warnings.is_empty());
        assert!(options.lexer.include_comments);
        assert!(options.lowering.collect_comments);
        assert!(options.strict);
        assert!(options.graph.strict_mode);
        assert_eq!(options.graph.default_node_type, "block");
        assert_eq!(options.serializer, SerializerOptions::compact());
    }

    #[test]
    fn unknown_keys_warn_and_are_ignored() {
        let (_, warnings) = LffOptions::from_map(&map(serde_json::json!({
            "made_up_option": 1
        })));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, codes::UNKNOWN_OPTION);
        assert!(warnings[0].message.contains("made_up_option"));
    }
}
