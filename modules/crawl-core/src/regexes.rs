use std::sync::LazyLock;

use regex::Regex;

/// File extensions that cannot contain HTML — checked against a candidate
/// URL before it is ever fetched or retained as a discovered link (§4.4
/// step 1, §4.5 step 3d). Not an exhaustive MIME registry; just enough to
/// avoid wasting a round trip on obviously non-HTML resources.
pub static EXCLUSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\.(jpe?g|png|gif|bmp|webp|svg|ico|tiff?|heic|avif",
        r"|zip|tar|gz|tgz|rar|7z|bz2|xz",
        r"|woff2?|ttf|eot|otf",
        r"|mp3|mp4|m4a|avi|mov|wmv|flv|mkv|webm|wav|ogg|ogv",
        r"|css|js|mjs|map",
        r"|exe|dll|so|bin|dmg|apk|deb|rpm|iso|msi",
        r"|pdf|docx?|xlsx?|pptx?|csv|rtf|odt",
        r"|json|xml)(?:[?#]|$)",
    ))
    .expect("EXCLUSION_RE is a valid pattern")
});

/// Matches the first `<base href="...">` tag (§4.5 step 2).
pub static BASE_HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<base\s+[^>]*?href\s*=\s*["']([^"']*)["']"#)
        .expect("BASE_HREF_RE is a valid pattern")
});

/// Matches a full `<a ...>` opening tag (§4.5 step 3). The href value and
/// the nofollow relation are extracted from the matched text separately, so
/// the nofollow check runs "over the full matched tag" as specified.
pub static ANCHOR_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b[^>]*>").expect("ANCHOR_TAG_RE is a valid pattern"));

/// Extracts the `href` attribute value from a matched anchor tag.
pub static HREF_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)href\s*=\s*["']([^"']*)["']"#).expect("HREF_ATTR_RE is a valid pattern")
});

/// Detects `rel=nofollow` anywhere inside a matched anchor tag.
pub static NOFOLLOW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)rel\s*=\s*["']?[^"'>]*\bnofollow\b"#)
        .expect("NOFOLLOW_RE is a valid pattern")
});

/// Matches the first `<title>...</title>` (§4.6 step 3).
pub static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("TITLE_RE is a valid pattern")
});

/// Strips `<script>...</script>` and `<style>...</style>` blocks entirely —
/// their content is never meaningful page text.
pub static SCRIPT_STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</\1>").expect("SCRIPT_STYLE_RE is a valid pattern")
});

/// Strips any remaining tag, leaving raw text — the "strict allow-nothing"
/// sanitizer policy (§4.6 step 2).
pub static ANY_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("ANY_TAG_RE is a valid pattern"));

/// Collapses consecutive whitespace to a single space (§4.6 steps 3-4).
pub static REPEATED_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("REPEATED_SPACE_RE is a valid pattern"));
