use once_cell::sync::Lazy;
use regex::Regex;

use super::markup;
use crate::error::{ReplayError, Result};

static FRAME_TAG: Lazy<Regex> = Lazy::new(|| markup::start_tag_regex(&["frame", "iframe"]));

/// The `src` of the first `<frame>`/`<iframe>` named `name`.
pub fn find_frame_source(html: &str, name: &str) -> Result<String> {
    let html = markup::strip_comments(html);
    markup::find_tags(&html, &FRAME_TAG)
        .into_iter()
        .find(|tag| tag.attrs.is("name", name))
        .ok_or_else(|| ReplayError::selector(format!("no frame named '{}'", name)))?
        .attrs
        .get("src")
        .map(str::to_string)
        .ok_or_else(|| ReplayError::selector(format!("frame '{}' has no src", name)))
}
