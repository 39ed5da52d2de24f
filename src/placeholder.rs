//! Placeholder extraction and substitution.
//!
//! Templates mark substitution points as `{{key}}`, where the key matches
//! `[A-Za-z0-9_]+` and may be surrounded by whitespace inside the braces.
//! Malformed tokens (unbalanced braces, invalid key characters) are not
//! matched and pass through untouched.

use std::collections::HashMap;

/// A `{{key}}` token found while scanning, with the byte range of the
/// whole token in the source text.
struct Token<'a> {
    key: &'a str,
    start: usize,
    end: usize,
}

/// Scan for the next well-formed token at or after `from`.
///
/// On a malformed candidate (`{{` not followed by a valid key and `}}`)
/// the scan resumes one byte later, so overlapping candidates such as
/// `{{{name}}` still find the inner token.
fn next_token(text: &str, from: usize) -> Option<Token<'_>> {
    let mut pos = from;
    while let Some(rel) = text[pos..].find("{{") {
        let start = pos + rel;
        let inner_start = start + 2;
        if let Some(rel_close) = text[inner_start..].find("}}") {
            let inner = &text[inner_start..inner_start + rel_close];
            let key = inner.trim();
            if !key.is_empty() && key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
                return Some(Token {
                    key,
                    start,
                    end: inner_start + rel_close + 2,
                });
            }
        }
        pos = start + 1;
    }
    None
}

/// Extract placeholder keys in first-occurrence order, deduplicated.
///
/// Keys are case-sensitive; a key appearing multiple times contributes a
/// single entry. Empty input yields an empty list.
pub fn extract_placeholders(text: &str) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    let mut pos = 0;
    while let Some(tok) = next_token(text, pos) {
        if !order.iter().any(|k| k == tok.key) {
            order.push(tok.key.to_string());
        }
        pos = tok.end;
    }
    order
}

/// Replace every `{{key}}` token whose key is present in `values`.
///
/// Tokens without a value are left byte-for-byte unchanged, so unresolved
/// placeholders stay visibly marked. Exactly one pass is made over the
/// original text: a substituted value containing `{{other}}` is NOT
/// substituted further.
pub fn apply_placeholders(text: &str, values: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    while let Some(tok) = next_token(text, pos) {
        out.push_str(&text[pos..tok.start]);
        match values.get(tok.key) {
            Some(value) => out.push_str(value),
            None => out.push_str(&text[tok.start..tok.end]),
        }
        pos = tok.end;
    }
    out.push_str(&text[pos..]);
    out
}
