//! Quoting and value formatting
//!
//! A string stays bare only when it would lex back as a single identifier
//! and not as a boolean; everything else is quoted so the round trip
//! preserves value types exactly.

use crate::ast::{value::format_number, Value};
use crate::lexer::patterns::IDENTIFIER_RE;

use super::options::{QuoteStyle, SerializerOptions};

/// Whether `text` must be quoted to survive re-parsing as a string.
pub fn needs_quotes(text: &str) -> bool {
    if text.is_empty() {
        return true;
    }
    if text == "true" || text == "false" {
        return true;
    }
    // A double dash opens the dashed arrow token when lexed bare.
    if text.contains("--") {
        return true;
    }
    // Identifiers reparse as bare string values; anything else (spaces,
    // punctuation, sigils, leading digits) needs quotes.
    !IDENTIFIER_RE.is_match(text)
}

/// Quote `text` with the configured style, escaping as needed.
pub fn quote(text: &str, style: QuoteStyle) -> String {
    let quote_char = match style {
        QuoteStyle::Double => '"',
        QuoteStyle::Single => '\'',
        QuoteStyle::Smart => {
            if text.contains('\'') {
                '"'
            } else {
                '\''
            }
        }
    };

    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote_char);
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == quote_char => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote_char);
    out
}

/// Render a string, quoting when the heuristic or `force_quotes` says so.
pub fn render_string(text: &str, options: &SerializerOptions) -> String {
    if options.quotes.force_quotes || needs_quotes(text) {
        quote(text, options.quotes.style)
    } else {
        text.to_string()
    }
}

/// Render a value inline. Arrays that exceed the line budget are wrapped
/// by [`render_value`] instead.
pub fn render_value_inline(value: &Value, options: &SerializerOptions) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::String(s) => render_string(s, options),
        Value::Array(items) => {
            let separator = if options.spacing.around_colons { ", " } else { "," };
            let inner: Vec<String> = items
                .iter()
                .map(|item| render_value_inline(item, options))
                .collect();
            format!("[{}]", inner.join(separator))
        }
        // Objects have no surface syntax; render their JSON as a string.
        Value::Object(_) => quote(&value.to_json().to_string(), options.quotes.style),
    }
}

/// Render a value at `depth`, wrapping arrays one element per line when
/// the inline form would push the line past `max_line_length`.
pub fn render_value(
    value: &Value,
    options: &SerializerOptions,
    depth: usize,
    prefix_width: usize,
) -> String {
    let inline = render_value_inline(value, options);
    let wrappable = matches!(value, Value::Array(items) if !items.is_empty());

    if !options.formatting.wrap_arrays
        || !wrappable
        || prefix_width + inline.chars().count() <= options.formatting.max_line_length
    {
        return inline;
    }

    let items = match value {
        Value::Array(items) => items,
        _ => unreachable!(),
    };
    let eol = options.line_endings.as_str();
    let item_indent = options.indent(depth + 1);
    let close_indent = options.indent(depth);
    let mut out = String::from("[");
    for (idx, item) in items.iter().enumerate() {
        out.push_str(eol);
        out.push_str(&item_indent);
        out.push_str(&render_value_inline(item, options));
        if idx + 1 < items.len() {
            out.push(',');
        }
    }
    out.push_str(eol);
    out.push_str(&close_indent);
    out.push(']');
    out
}
