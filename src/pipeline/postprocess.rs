//! Post-processing: whitespace and encoding cleanup of page content.
//!
//! The service owns the markdown itself; these rules only fix transport
//! artefacts so the assembled file is stable across runs and platforms.
//! Only the markdown artifact is normalised, never the JSON.
//!
//! Rules (applied in order):
//! 1. Normalise line endings (CRLF / CR → LF)
//! 2. Trim trailing whitespace per line
//! 3. Collapse 3+ consecutive blank lines down to 2
//! 4. Strip invisible Unicode (zero-width space, BOM, soft hyphen).
//!    Joiners (U+200C, U+200D) are text and stay.
//! 5. Trim leading and trailing blank lines

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all rules to one page's content.
pub fn normalise_page(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = remove_invisible_chars(&s);
    trim_blank_edges(&s)
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 3: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").to_string()
}

// ── Rule 4: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(['\u{200B}', '\u{FEFF}', '\u{00AD}'], "")
}

// ── Rule 5: Trim blank edges ─────────────────────────────────────────────────

fn trim_blank_edges(input: &str) -> String {
    input.trim_matches('\n').to_string()
}
