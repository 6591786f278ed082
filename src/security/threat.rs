//! Heuristic screens for injection and script payloads in free-text input.
//!
//! These are deliberately crude deterrents, not a security boundary: all
//! persistence goes through parameterized statements regardless. Checks never
//! fail; input that matches nothing passes through untouched.

const SQL_KEYWORDS: &[&str] = &[
    "select", "insert", "update", "delete", "drop", "create", "alter", "exec", "union",
];

const SQL_ARTIFACTS: &[&str] = &["'", ";", "/*", "*/", "xp_", "sp_"];

const SCRIPT_TOKENS: &[&str] = &[
    "script",
    "javascript",
    "vbscript",
    "onload",
    "onerror",
    "onclick",
];

pub fn looks_like_sql_injection(text: &str) -> bool {
    let lower = text.to_lowercase();

    if SQL_KEYWORDS.iter().any(|kw| contains_word(&lower, kw)) {
        return true;
    }
    if SQL_ARTIFACTS.iter().any(|a| lower.contains(a)) {
        return true;
    }
    SCRIPT_TOKENS.iter().any(|t| lower.contains(t))
}

pub fn looks_like_xss(text: &str) -> bool {
    let lower = text.to_lowercase();

    has_tag(&lower, "script")
        || has_tag(&lower, "iframe")
        || lower.contains("javascript:")
        || has_event_attribute(&lower)
}

/// Removes every `<...>` segment from the input. A `<` with no closing `>`
/// is left alone.
pub fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('<') {
        match rest[open..].find('>') {
            Some(close) => {
                out.push_str(&rest[..open]);
                rest = &rest[open + close + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

/// Word-bounded match: the keyword must not be embedded in a longer
/// alphanumeric run, so "updated_at" does not trip on "update".
fn contains_word(haystack: &str, word: &str) -> bool {
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(word) {
        let idx = start + pos;
        let before_ok = idx == 0
            || !haystack[..idx]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric() || c == '_');
        let after = idx + word.len();
        let after_ok = after >= haystack.len()
            || !haystack[after..]
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric() || c == '_');
        if before_ok && after_ok {
            return true;
        }
        start = idx + word.len();
    }
    false
}

fn has_tag(haystack: &str, tag: &str) -> bool {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    match haystack.find(&open) {
        Some(pos) => haystack[pos..].contains(&close),
        None => false,
    }
}

/// Matches inline handler attributes of the shape `on<letters>=`.
fn has_event_attribute(haystack: &str) -> bool {
    let bytes = haystack.as_bytes();
    for (i, window) in bytes.windows(2).enumerate() {
        if window != b"on" {
            continue;
        }
        if i > 0 && (bytes[i - 1].is_ascii_alphanumeric() || bytes[i - 1] == b'_') {
            continue;
        }
        let mut j = i + 2;
        while j < bytes.len() && bytes[j].is_ascii_alphabetic() {
            j += 1;
        }
        if j > i + 2 && j < bytes.len() && bytes[j] == b'=' {
            return true;
        }
    }
    false
}
