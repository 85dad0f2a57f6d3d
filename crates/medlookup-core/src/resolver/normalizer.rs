//! Medicine name normalization.
//!
//! Handles:
//! - Stop-phrase removal ("what is", "price of", "tell me about", ...)
//! - Quantity/unit removal ("500mg", "5 ml", "10 tablets")
//! - Whitespace/hyphen collapsing and punctuation stripping

use once_cell::sync::Lazy;
use regex::Regex;

/// Conversational phrases that never belong to a medicine name.
/// Longer phrases first; alternation is leftmost-first.
static STOP_PHRASES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:what\s+is|what\s+are|tell\s+me\s+about|tell\s+me|show\s+me|show|about|the|content\s+in|content\s+of|composition\s+of|ingredients\s+of|price\s+of|cost\s+of|side\s+effects\s+of|side\s+effect\s+of|alternatives\s+to|alternatives\s+for|alternative\s+to|alternative\s+for|substitutes\s+for|substitute\s+for|details\s+of|information\s+on|info\s+on|give\s+me|please)\b",
    )
    .unwrap()
});

/// Dose and pack quantities: "500mg", "2.5 ml", "10 tablets".
static QUANTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b\d+(?:\.\d+)?\s*(?:mg|mcg|µg|ml|gm|g|iu|tablets|tablet|tabs|tab|capsules|capsule|caps|strips|strip)\b",
    )
    .unwrap()
});

static SEPARATOR_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").unwrap());

static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9+\- ]").unwrap());

static SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Characters with meaning in a regex pattern.
const PATTERN_METACHARACTERS: &[char] = &[
    '.', '*', '+', '?', '^', '$', '{', '}', '(', ')', '|', '[', ']', '\\',
];

/// Reduce a captured medicine name to a search key.
///
/// May return an empty string, meaning "no medicine".
pub fn normalize_medicine_name(raw: &str) -> String {
    let s = STOP_PHRASES.replace_all(raw.trim(), " ");
    let s = QUANTITY.replace_all(&s, " ");
    let s = SEPARATOR_RUN.replace_all(&s, " ");
    let s = DISALLOWED.replace_all(&s, "");
    let s = SPACE_RUN.replace_all(&s, " ");
    s.trim().to_string()
}

/// Backslash-escape regex metacharacters so `literal` matches itself.
pub fn escape_for_pattern_match(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len() + 8);
    for c in literal.chars() {
        if PATTERN_METACHARACTERS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Cache key text for a raw message: lowercased and trimmed.
pub fn cache_key_text(message: &str) -> String {
    message.trim().to_lowercase()
}
