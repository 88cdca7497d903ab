//! HTML to plain text, good enough for regex extraction.

use regex::Regex;
use std::sync::LazyLock;

static SCRIPT_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|noscript)\b[^>]*>.*?</(script|style|noscript)>").unwrap()
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Strip scripts, styles and tags; decode the common entities; collapse
/// whitespace.
pub(crate) fn visible_text(html: &str) -> String {
    let without_code = SCRIPT_STYLE.replace_all(html, " ");
    let without_tags = TAG.replace_all(&without_code, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&#37;", "%")
        .replace("&percnt;", "%")
        .replace("&amp;", "&");
    SPACE.replace_all(&decoded, " ").trim().to_string()
}
