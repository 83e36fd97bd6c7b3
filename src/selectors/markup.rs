//! Text-pattern scanning over raw, un-parsed markup.
//!
//! Nothing here builds a tree. Tags are located with regular expressions and their
//! attribute strings are split into name/value pairs, which keeps the scanner tolerant
//! of unclosed elements, stray quotes and other markup a strict parser would reject.

use once_cell::sync::Lazy;
use regex::Regex;

static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment regex"));

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .expect("attribute regex")
});

/// Remove every `<!-- ... -->` comment so scans cannot match inside one.
pub fn strip_comments(html: &str) -> String {
    COMMENT.replace_all(html, "").into_owned()
}

/// Attributes of one start tag, names lowercased, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn parse(raw: &str) -> Self {
        let pairs = ATTRIBUTE
            .captures_iter(raw)
            .map(|caps| {
                let name = caps[1].to_ascii_lowercase();
                let value = caps
                    .get(2)
                    .or_else(|| caps.get(3))
                    .or_else(|| caps.get(4))
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default();
                (name, value)
            })
            .collect();
        Self(pairs)
    }

    /// First value of `name` (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// True when `name` is present and its value equals `expected` exactly.
    pub fn is(&self, name: &str, expected: &str) -> bool {
        self.get(name) == Some(expected)
    }
}

/// A start tag found in a scan buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    /// Lowercased element name.
    pub name: String,
    pub attrs: Attributes,
    /// Byte offset of `<`.
    pub start: usize,
    /// Byte offset just past `>`.
    pub end: usize,
}

/// Compile a case-insensitive start-tag pattern for the given element names.
pub fn start_tag_regex(names: &[&str]) -> Regex {
    let alternation = names.join("|");
    let pattern = format!(r"(?is)<({})\b([^>]*)>", alternation);
    Regex::new(&pattern).expect("start tag regex")
}

/// All start tags matched by `pattern` (built by [`start_tag_regex`]) in document order.
pub fn find_tags(html: &str, pattern: &Regex) -> Vec<Tag> {
    pattern
        .captures_iter(html)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(Tag {
                name: caps[1].to_ascii_lowercase(),
                attrs: Attributes::parse(&caps[2]),
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// Offset of the case-insensitive closing tag `</name` at or after `from`.
pub fn find_close_tag(html: &str, name: &str, from: usize) -> Option<usize> {
    let needle = format!("</{}", name.to_ascii_lowercase());
    let haystack = html.get(from..)?;
    let lower = haystack.to_ascii_lowercase();
    lower.find(&needle).map(|pos| from + pos)
}

/// Drop tags from a fragment, leaving roughly what a browser would render as text.
pub fn strip_tags(fragment: &str) -> String {
    static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag regex"));
    TAG.replace_all(fragment, "").into_owned()
}
