//! Text cleanup passes for table cells and rendered rows.
//!
//! Each pass is a function `&str -> String` applied in sequence.

use std::sync::LazyLock;

use regex::Regex;

/// Prepare free text (title, abstract, summary) for a single table cell.
pub(crate) fn clean_cell(text: &str) -> String {
    let mut result = collapse_whitespace(text);
    result = strip_bold_markers(&result);
    result = escape_pipes(&result);
    result
}

// ---------------------------------------------------------------------------
// Pass 1: Collapse whitespace
// ---------------------------------------------------------------------------

/// Table rows must stay on one line.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Pass 2: Strip bold markers
// ---------------------------------------------------------------------------

/// Cells are wrapped in `**...**`; embedded markers would end the bold span.
fn strip_bold_markers(text: &str) -> String {
    text.replace("**", "")
}

// ---------------------------------------------------------------------------
// Pass 3: Escape column separators
// ---------------------------------------------------------------------------

fn escape_pipes(text: &str) -> String {
    static PIPE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(^|[^\\])\|").expect("valid regex"));

    // Run twice: adjacent pipes share the boundary character.
    let once = PIPE_RE.replace_all(text, r"$1\|");
    PIPE_RE.replace_all(&once, r"$1\|").to_string()
}

// ---------------------------------------------------------------------------
// Inline math spacing
// ---------------------------------------------------------------------------

/// Tidy the first inline `$...$` span of a rendered line.
///
/// The math body is trimmed, and a space is inserted on either side unless
/// the neighbouring character is already a space or `*` (bold marker).
/// Lines without a math span are returned unchanged.
pub fn pretty_math(line: &str) -> String {
    static MATH_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\$.*\$").expect("valid regex"));

    let Some(m) = MATH_RE.find(line) else {
        return line.to_string();
    };

    let before = &line[..m.start()];
    let after = &line[m.end()..];
    let body = line[m.start() + 1..m.end() - 1].trim();

    let lead = match before.chars().last() {
        Some(c) if c != ' ' && c != '*' => " ",
        _ => "",
    };
    let trail = match after.chars().next() {
        Some(c) if c != ' ' && c != '*' => " ",
        _ => "",
    };

    format!("{before}{lead}${body}${trail}{after}")
}
