use crate::regexes::{ANY_TAG_RE, REPEATED_SPACE_RE, SCRIPT_STYLE_RE};

/// Equivalent of a "strict allow-nothing" sanitizer policy: strips
/// `<script>`/`<style>` blocks (content included) and every remaining tag,
/// leaving raw text behind. Grounded on the original implementation's
/// pooled `bluemonday.StrictPolicy()` sanitizer, reimplemented with the
/// same regex-based approach the rest of this crate's HTML scanning uses.
fn strict_sanitize(raw: &str) -> String {
    let without_script_style = SCRIPT_STYLE_RE.replace_all(raw, "");
    ANY_TAG_RE.replace_all(&without_script_style, " ").into_owned()
}

/// Decodes HTML entities (`&amp;`, `&#39;`, ...). Falls back to the input
/// unchanged if decoding fails on malformed input rather than dropping the
/// text.
fn unescape_entities(s: &str) -> String {
    htmlescape::decode_html(s).unwrap_or_else(|_| s.to_string())
}

/// Drops any literal U+FFFD replacement characters. `RawContent` is decoded
/// lossily (`String::from_utf8_lossy`), which substitutes U+FFFD for any
/// invalid byte sequence — this is the Rust equivalent of the original's
/// `cleanText`, which strips the same rune when ranging over invalid UTF-8
/// byte sequences in Go.
fn strip_replacement_chars(s: &str) -> String {
    s.chars().filter(|&c| c != '\u{FFFD}').collect()
}

/// The full sanitize → collapse-whitespace → unescape → trim → strip
/// pipeline (§4.6 steps 3-4), applied identically to the title capture and
/// to the whole raw content.
pub fn sanitize_and_normalize(raw: &str) -> String {
    let sanitized = strict_sanitize(raw);
    let collapsed = REPEATED_SPACE_RE.replace_all(&sanitized, " ").into_owned();
    let unescaped = unescape_entities(&collapsed);
    let trimmed = unescaped.trim();
    strip_replacement_chars(trimmed)
}
