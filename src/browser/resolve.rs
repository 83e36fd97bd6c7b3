use url::Url;

use crate::error::{ReplayError, Result};

/// Resolve a possibly-relative reference against the current page URL.
///
/// Values lifted out of markup may still carry quotes, surrounding whitespace, or
/// `&amp;` entities; those are cleaned before joining.
pub fn resolve_url(base: Option<&Url>, target: &str) -> Result<Url> {
    let cleaned = clean_reference(target);
    match base {
        Some(base) => base
            .join(&cleaned)
            .map_err(|e| ReplayError::invalid_url(&cleaned, e)),
        None => Url::parse(&cleaned).map_err(|e| ReplayError::invalid_url(&cleaned, e)),
    }
}

fn clean_reference(target: &str) -> String {
    target
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .replace("&amp;", "&")
}
