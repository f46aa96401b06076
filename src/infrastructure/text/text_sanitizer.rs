use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static EXCESS_BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Normalizes extracted resume text before it is embedded in a prompt:
/// NFKC normalization, per-line whitespace collapsing, and at most one
/// blank line between paragraphs.
pub fn normalize_resume_text(raw: &str) -> String {
    let normalized: String = raw.nfkc().collect();

    let collapsed = normalized
        .lines()
        .map(collapse_spaces)
        .collect::<Vec<_>>()
        .join("\n");

    EXCESS_BLANK_LINES
        .replace_all(&collapsed, "\n\n")
        .trim()
        .to_string()
}

fn collapse_spaces(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut prev_was_space = false;

    for ch in line.trim().chars() {
        if ch.is_whitespace() {
            if !prev_was_space {
                out.push(' ');
                prev_was_space = true;
            }
        } else {
            out.push(ch);
            prev_was_space = false;
        }
    }

    out
}
