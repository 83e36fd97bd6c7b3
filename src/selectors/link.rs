use once_cell::sync::Lazy;
use regex::Regex;

use super::markup::{self, Attributes};
use super::LinkRef;
use crate::error::{ReplayError, Result};

static ANCHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a\s*>").expect("anchor regex"));

/// Recorders write this in place of the label of image-only links.
const NULL_LABEL: &str = "null";

/// An `<a>` element found in the page.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub attrs: Attributes,
    /// Raw markup between `<a ...>` and `</a>`.
    pub inner: String,
}

impl Anchor {
    pub fn href(&self) -> Option<&str> {
        self.attrs.get("href")
    }

    fn text_contains(&self, needle: &str) -> bool {
        self.inner.contains(needle) || markup::strip_tags(&self.inner).contains(needle)
    }
}

pub fn find_anchors(html: &str) -> Vec<Anchor> {
    let html = markup::strip_comments(html);
    ANCHOR
        .captures_iter(&html)
        .map(|caps| Anchor {
            attrs: Attributes::parse(&caps[1]),
            inner: caps[2].to_string(),
        })
        .collect()
}

/// The `href` of the first anchor the reference matches, as written in the markup.
pub fn find_link(html: &str, link_ref: &LinkRef) -> Result<String> {
    let anchors = find_anchors(html);
    let found = match link_ref {
        LinkRef::Text(text) => {
            let needle = text.replace(NULL_LABEL, "");
            let needle = needle.trim();
            anchors
                .iter()
                .find(|a| a.href().is_some() && a.text_contains(needle))
        }
        LinkRef::Href(fragment) => anchors
            .iter()
            .find(|a| a.href().is_some_and(|href| href.contains(fragment.as_str()))),
    };
    match found.and_then(Anchor::href) {
        Some(href) => Ok(href.to_string()),
        None => Err(ReplayError::selector(match link_ref {
            LinkRef::Text(text) => format!("no link with text '{}'", text),
            LinkRef::Href(href) => format!("no link with href containing '{}'", href),
        })),
    }
}
