//! Naming rules shared by candidate selection, group lookup and the cleanup scan.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Items whose name starts with this prefix (case-insensitive) are migrated.
pub const CANDIDATE_PREFIX: &str = "xxx";

const SEPARATORS: &[char] = &['_', '-', '/', '(', ')', '[', ']', '.', ',', ':', ';'];

/// Lookup key for group names: trimmed and lower-cased.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

pub fn is_candidate(name: &str) -> bool {
    normalize_name(name).starts_with(CANDIDATE_PREFIX)
}

/// Leading token of a display name, used to infer the group it naturally belongs to.
///
/// Accents are stripped, the name is cut at the first run of separators, and any remaining
/// non-alphanumeric runs collapse to a single space. `"Obuoliai/Žali"` yields `"obuoliai"`.
pub fn base_word(name: &str) -> String {
    let lowered = normalize_name(name);
    let stripped: String = lowered.nfkd().filter(|c| !is_combining_mark(*c)).collect();

    let first = stripped
        .split(SEPARATORS)
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(&stripped);

    collapse_non_alphanumeric(first)
}

fn collapse_non_alphanumeric(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut pending_space = false;

    for c in segment.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }

    out
}
