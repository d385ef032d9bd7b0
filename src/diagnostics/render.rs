//! Carat-style rendering of diagnostics
//!
//! Shared by the CLI and tests so both agree on the message layout:
//!
//! ```text
//! system.lff:3:5: error[UNDEFINED_ANCHOR_REFERENCE]: anchor '*auth' is not defined
//!    |
//!  3 | Gateway -> *auth
//!    |            ^^^^^
//!    -> define the anchor with '&auth' on a node
//! ```

use std::io;

use termcolor::{Color, ColorSpec, WriteColor};

use super::{Diagnostic, Severity};

/// Render a diagnostic to a plain string without color.
pub fn render(diag: &Diagnostic, file: Option<&str>) -> String {
    let mut out = String::new();
    let file = file.unwrap_or("<input>");
    out.push_str(&format!(
        "{}:{}:{}: {}[{}]: {}\n",
        file,
        diag.location.start_line,
        diag.location.start_col,
        diag.severity.label(),
        diag.code,
        diag.message
    ));

    if let Some(ctx) = &diag.context {
        let gutter = diag.location.start_line.to_string().len().max(2);
        let width = terminal_width().unwrap_or(120);
        out.push_str(&format!("{:>gutter$} |\n", "", gutter = gutter));
        out.push_str(&format!(
            "{:>gutter$} | {}\n",
            diag.location.start_line,
            clamp(&ctx.line, width.saturating_sub(gutter + 3)),
            gutter = gutter
        ));
        let carat_pad = diag.location.start_col.saturating_sub(1);
        let carat_len = if diag.location.end_line == diag.location.start_line {
            diag.location
                .end_col
                .saturating_sub(diag.location.start_col)
                .max(1)
        } else {
            1
        };
        out.push_str(&format!(
            "{:>gutter$} | {}{}\n",
            "",
            " ".repeat(carat_pad),
            "^".repeat(carat_len),
            gutter = gutter
        ));
    }

    for suggestion in &diag.suggestions {
        out.push_str(&format!("   -> {}\n", suggestion));
    }
    for related in &diag.related {
        out.push_str(&format!(
            "   note: {} (line {})\n",
            related.message, related.location.start_line
        ));
    }
    out
}

/// Render a diagnostic to a [`WriteColor`] sink, coloring the severity label.
pub fn write_colored<W: WriteColor>(
    writer: &mut W,
    diag: &Diagnostic,
    file: Option<&str>,
) -> io::Result<()> {
    let file = file.unwrap_or("<input>");
    write!(
        writer,
        "{}:{}:{}: ",
        file, diag.location.start_line, diag.location.start_col
    )?;

    writer.set_color(
        ColorSpec::new()
            .set_fg(Some(severity_color(diag.severity)))
            .set_bold(true),
    )?;
    write!(writer, "{}[{}]", diag.severity.label(), diag.code)?;
    writer.reset()?;
    writeln!(writer, ": {}", diag.message)?;

    if let Some(ctx) = &diag.context {
        let gutter = diag.location.start_line.to_string().len().max(2);
        writeln!(writer, "{:>gutter$} |", "", gutter = gutter)?;
        writeln!(
            writer,
            "{:>gutter$} | {}",
            diag.location.start_line,
            ctx.line,
            gutter = gutter
        )?;
        let carat_pad = diag.location.start_col.saturating_sub(1);
        writer.set_color(ColorSpec::new().set_fg(Some(severity_color(diag.severity))))?;
        writeln!(
            writer,
            "{:>gutter$} | {}^",
            "",
            " ".repeat(carat_pad),
            gutter = gutter
        )?;
        writer.reset()?;
    }

    for suggestion in &diag.suggestions {
        writeln!(writer, "   -> {}", suggestion)?;
    }
    Ok(())
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Error => Color::Red,
        Severity::Warning => Color::Yellow,
        Severity::Info => Color::Blue,
        Severity::Hint => Color::Cyan,
    }
}

fn terminal_width() -> Option<usize> {
    terminal_size::terminal_size().map(|(w, _)| w.0 as usize)
}

fn clamp(line: &str, max: usize) -> String {
    if max == 0 || line.chars().count() <= max {
        return line.to_string();
    }
    let truncated: String = line.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::codes;
    use crate::source::SourceLocation;

    #[test]
    fn render_includes_position_code_and_message() {
        let diag = Diagnostic::error(
            codes::SYNTAX_ERROR,
            "unexpected token",
            SourceLocation::new(3, 3, 5, 8, 0),
        );
        let text = render(&diag, Some("system.lff"));
        assert!(text.starts_with("system.lff:3:5: error[SYNTAX_ERROR]: unexpected token"));
    }

    #[test]
    fn render_draws_carat_under_context() {
        let source = "abc\nGateway -> *auth\nxyz";
        let diag = Diagnostic::error(
            codes::UNDEFINED_ANCHOR_REFERENCE,
            "anchor '*auth' is not defined",
            SourceLocation::new(2, 2, 12, 17, 0),
        )
        .with_context_from(source)
        .with_suggestion("define the anchor with '&auth' on a node");

        let text = render(&diag, None);
        assert!(text.contains("Gateway -> *auth"));
        assert!(text.contains("^^^^^"));
        assert!(text.contains("-> define the anchor"));
    }
}
