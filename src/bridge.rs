//! Plain-text ↔ HTML body synchronization.
//!
//! The two directions are deliberately asymmetric. `text_to_html` is a
//! lossy one-way rendering: one `<p>` per line, escaped. `html_to_text`
//! extracts textual content only and goes through the [`HtmlTextExtractor`]
//! seam so the session logic stays testable without a browser runtime.
//! A round trip preserves the logical line structure, not exact bytes.

/// Escape HTML-significant characters (`& < > " '`).
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Render plain text as simple paragraph HTML.
///
/// The input is trimmed; empty input yields `""`. Each non-empty trimmed
/// line becomes `<p>escaped</p>`; each empty line becomes `<p><br/></p>`
/// so blank-line spacing survives visually.
pub fn text_to_html(text: &str) -> String {
    let t = text.trim();
    if t.is_empty() {
        return String::new();
    }

    let mut html = String::with_capacity(t.len() + t.len() / 4);
    for line in t.split('\n') {
        let line = line.trim();
        if line.is_empty() {
            html.push_str("<p><br/></p>");
        } else {
            html.push_str("<p>");
            html.push_str(&escape_html(line));
            html.push_str("</p>");
        }
    }
    html
}

/// Capability seam for turning HTML into plain text.
///
/// Implementations may use any HTML parser; errors are recovered by the
/// caller, which substitutes an empty string.
pub trait HtmlTextExtractor {
    /// Extract the textual content of `html`, discarding all markup.
    fn extract_text(&self, html: &str) -> crate::error::Result<String>;
}

/// Flatten HTML to plain text through the given extractor.
///
/// The input is trimmed; empty input yields `""`. Runs of 3-or-more
/// consecutive newlines in the extracted text are collapsed to exactly 2
/// and the result is trimmed. Extraction failure degrades to `""` — it is
/// logged, never propagated.
pub fn html_to_text(extractor: &dyn HtmlTextExtractor, html: &str) -> String {
    let h = html.trim();
    if h.is_empty() {
        return String::new();
    }

    match extractor.extract_text(h) {
        Ok(text) => collapse_blank_runs(&text).trim().to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "HTML text extraction failed, substituting empty body");
            String::new()
        }
    }
}

/// Collapse runs of 3+ newlines down to exactly 2.
fn collapse_blank_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newline_run = 0usize;
    for ch in text.chars() {
        if ch == '\n' {
            newline_run += 1;
            if newline_run <= 2 {
                out.push('\n');
            }
        } else {
            newline_run = 0;
            out.push(ch);
        }
    }
    out
}

/// Default extractor: a hand-rolled tag stripper.
///
/// - Converts `<br>`, `<p>`, `<div>`, `<li>`, headings and table rows to newlines
/// - Removes `<script>` and `<style>` blocks entirely
/// - Strips all remaining tags and attributes
/// - Decodes common HTML entities
#[derive(Debug, Clone, Copy, Default)]
pub struct TagStripper;

impl HtmlTextExtractor for TagStripper {
    fn extract_text(&self, html: &str) -> crate::error::Result<String> {
        let mut text = remove_tag_block(html, "script");
        text = remove_tag_block(&text, "style");

        // Convert line-break and block elements to newlines
        for tag in &["<br>", "<br/>", "<br />", "<BR>", "<BR/>"] {
            text = text.replace(tag, "\n");
        }
        for tag in &["p", "div", "tr", "li", "h1", "h2", "h3", "h4", "h5", "h6"] {
            text = text.replace(&format!("<{tag}>"), "\n");
            text = text.replace(&format!("<{tag} "), "\n<");
            text = text.replace(&format!("</{tag}>"), "\n");
            let upper = tag.to_uppercase();
            text = text.replace(&format!("<{upper}>"), "\n");
            text = text.replace(&format!("</{upper}>"), "\n");
        }

        // Strip all remaining tags
        let mut result = String::with_capacity(text.len());
        let mut in_tag = false;
        for ch in text.chars() {
            match ch {
                '<' => in_tag = true,
                '>' => in_tag = false,
                _ if !in_tag => result.push(ch),
                _ => {}
            }
        }

        // Decode HTML entities. `&amp;` goes last: decoding it first would
        // turn `&amp;lt;` into `&lt;` and then into `<`, double-decoding
        // body text that legitimately spells out an entity.
        result = result.replace("&lt;", "<");
        result = result.replace("&gt;", ">");
        result = result.replace("&quot;", "\"");
        result = result.replace("&#39;", "'");
        result = result.replace("&#039;", "'");
        result = result.replace("&apos;", "'");
        result = result.replace("&nbsp;", " ");
        result = result.replace("&#160;", " ");
        result = result.replace("&amp;", "&");

        Ok(result)
    }
}

/// Remove an entire tag block (e.g. `<script>…</script>`).
///
/// Tag matching is ASCII-case-insensitive on the original string. Byte
/// offsets must come from the string being sliced: lowercasing a copy can
/// change byte lengths (`İ` is 2 bytes, its lowercase form 3) and offsets
/// found there drift on the original.
fn remove_tag_block(html: &str, tag: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut remaining = html;
    let open = format!("<{tag}");
    let close = format!("</{tag}>");

    while let Some(start) = find_ascii_case_insensitive(remaining, &open) {
        result.push_str(&remaining[..start]);
        let after = &remaining[start..];
        if let Some(end) = find_ascii_case_insensitive(after, &close) {
            remaining = &after[end + close.len()..];
        } else {
            // No closing tag — remove rest
            remaining = "";
            break;
        }
    }
    result.push_str(remaining);
    result
}

/// First byte offset of `needle` in `haystack`, ignoring ASCII case.
///
/// The needle is ASCII (a tag name), so a match position is always a char
/// boundary of the haystack.
fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || h.len() < n.len() {
        return None;
    }
    (0..=h.len() - n.len()).find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_text(html: &str) -> String {
        html_to_text(&TagStripper, html)
    }

    #[test]
    fn test_empty_both_directions() {
        assert_eq!(text_to_html(""), "");
        assert_eq!(text_to_html("   \n  "), "");
        assert_eq!(to_text(""), "");
        assert_eq!(to_text("   "), "");
    }

    #[test]
    fn test_text_to_html_paragraphs() {
        assert_eq!(
            text_to_html("line1\n\nline2"),
            "<p>line1</p><p><br/></p><p>line2</p>"
        );
    }

    #[test]
    fn test_text_to_html_escapes() {
        assert_eq!(
            text_to_html("Tom & Jerry <3> \"quoted\""),
            "<p>Tom &amp; Jerry &lt;3&gt; &quot;quoted&quot;</p>"
        );
    }

    #[test]
    fn test_html_to_text_basic() {
        let text = to_text("<p>Hello <b>world</b></p><p>Second paragraph</p>");
        assert!(text.contains("Hello world"));
        assert!(text.contains("Second paragraph"));
    }

    #[test]
    fn test_html_to_text_entities() {
        assert_eq!(to_text("Tom &amp; Jerry &lt;3&gt;"), "Tom & Jerry <3>");
    }

    #[test]
    fn test_html_to_text_removes_scripts() {
        assert_eq!(to_text("Before<script>alert('x')</script>After"), "BeforeAfter");
    }

    #[test]
    fn test_unclosed_script_after_multibyte_text() {
        // Characters whose lowercase form is longer than the original
        // (İ: 2 bytes → 3) must not shift the block offsets.
        let html = format!("{}<script>", "İ".repeat(10));
        assert_eq!(to_text(&html), "İ".repeat(10));
    }

    #[test]
    fn test_script_block_after_multibyte_text_keeps_tail() {
        assert_eq!(to_text("İ<script>x</script>tail"), "İtail");
    }

    #[test]
    fn test_mixed_case_style_block_removed() {
        assert_eq!(to_text("a<STYLE>p{color:red}</StYlE>b"), "ab");
    }

    #[test]
    fn test_entity_decode_is_single_pass() {
        // Body text spelling out an entity must not be decoded twice.
        assert_eq!(to_text("&amp;lt; stays escaped"), "&lt; stays escaped");
    }

    #[test]
    fn test_round_trip_text_containing_entity_spelling() {
        let round = to_text(&text_to_html("use &lt; for less-than"));
        assert_eq!(round, "use &lt; for less-than");
    }

    #[test]
    fn test_html_to_text_collapses_blank_runs() {
        let text = to_text("a\n\n\n\n\nb");
        assert_eq!(text, "a\n\nb");
    }

    #[test]
    fn test_round_trip_preserves_nonblank_lines() {
        let original = "first line\n\nsecond line\nthird line";
        let round = to_text(&text_to_html(original));

        let orig_lines: Vec<&str> = original
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let round_lines: Vec<&str> = round
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        assert_eq!(orig_lines, round_lines);
    }

    #[test]
    fn test_round_trip_preserves_blank_line() {
        let round = to_text(&text_to_html("a\n\nb"));
        // The blank line survives as a paragraph break.
        assert!(round.contains("\n\n"), "expected a blank line in {round:?}");
        assert!(round.starts_with('a') && round.ends_with('b'));
    }

    #[test]
    fn test_round_trip_decodes_escapes() {
        let round = to_text(&text_to_html("a & b"));
        assert_eq!(round, "a & b");
    }

    #[test]
    fn test_failing_extractor_degrades_to_empty() {
        struct Failing;
        impl HtmlTextExtractor for Failing {
            fn extract_text(&self, _html: &str) -> crate::error::Result<String> {
                Err(crate::error::ComposeError::Decode("boom".into()))
            }
        }
        assert_eq!(html_to_text(&Failing, "<p>x</p>"), "");
    }
}
