//! Minimal HTML text helpers shared by the table parser and the file-backed
//! browser. This is not a general HTML parser; test tables and fixture
//! pages are regular enough that tag stripping and entity decoding suffice.

use regex::Regex;

/// Remove all tags from an HTML fragment.
pub(crate) fn strip_tags(html: &str) -> String {
    let tag_re = Regex::new(r"(?s)<[^>]*>").expect("tag regex");
    tag_re.replace_all(html, "").into_owned()
}

/// Decode the handful of entities that appear in test tables.
pub(crate) fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

/// Collapse runs of whitespace to single spaces and trim.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible text of an HTML fragment: tags stripped, entities decoded,
/// whitespace collapsed.
pub(crate) fn clean_text(html: &str) -> String {
    collapse_whitespace(&decode_entities(&strip_tags(html)))
}
