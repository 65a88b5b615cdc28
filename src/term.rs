/*============================================================
  Synavera Project: Syn-Syu
  Module: sysup_core::term
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Terminal geometry and text helpers: width detection,
    paragraph wrapping and count-aware message selection.

  Security / Safety Notes:
    Queries the stdout terminal size only.

  Dependencies:
    console for terminal size, textwrap for wrapping.

  Operational Scope:
    Consulted once per render call by the listing formatter.

  Revision History:
    2025-11-12 COD  Authored terminal helpers.
    2025-11-19 COD  Terminal size and wrapping via console/textwrap.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Safe fallbacks when stdout is not a terminal
============================================================*/

use console::Term;
use textwrap::Options;

const FALLBACK_WIDTH: usize = 80;
const PARAGRAPH_INDENT: &str = "    ";
const MIN_PARAGRAPH_WIDTH: usize = 20;

/// Width of the controlling terminal, `$COLUMNS`, or 80.
pub fn terminal_width() -> usize {
    Term::stdout()
        .size_checked()
        .map(|(_, cols)| usize::from(cols))
        .filter(|width| *width > 0)
        .or_else(|| {
            std::env::var("COLUMNS")
                .ok()
                .and_then(|value| value.trim().parse::<usize>().ok())
                .filter(|width| *width > 0)
        })
        .unwrap_or(FALLBACK_WIDTH)
}

/// Pick the singular or plural template for `count`.
pub fn pluralize<'t>(singular: &'t str, plural: &'t str, count: usize) -> &'t str {
    if count == 1 {
        singular
    } else {
        plural
    }
}

/// Indent and word-wrap `text` to fit `width` columns.
pub fn format_paragraph(text: &str, width: usize) -> String {
    if text.trim().is_empty() {
        return PARAGRAPH_INDENT.to_string();
    }
    let budget = width
        .saturating_sub(PARAGRAPH_INDENT.len() * 2)
        .max(MIN_PARAGRAPH_WIDTH);
    let options = Options::new(budget + PARAGRAPH_INDENT.len())
        .initial_indent(PARAGRAPH_INDENT)
        .subsequent_indent(PARAGRAPH_INDENT);
    textwrap::fill(text.trim(), options)
}
