use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Method;

use super::resolve::resolve_url;
use super::session::{FetchScope, HttpSession, PageState};
use crate::error::Result;
use crate::selectors::markup;

static META_TAG: Lazy<Regex> = Lazy::new(|| markup::start_tag_regex(&["meta"]));

static REFRESH_CONTENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\s*\d+(?:\.\d*)?\s*[;,]\s*URL\s*=\s*(.+?)\s*$").expect("refresh regex")
});

/// Where a response says to go next, as written (possibly relative).
///
/// Checked in order: `Location` header, `Refresh` header, `<meta http-equiv="refresh">`.
pub fn find_redirect(page: &PageState) -> Option<String> {
    if let Some(location) = page.header("location").map(str::trim) {
        if !location.is_empty() {
            return Some(location.to_string());
        }
    }
    if let Some(target) = page.header("refresh").and_then(refresh_target) {
        return Some(target);
    }
    let body = markup::strip_comments(&page.body);
    markup::find_tags(&body, &META_TAG)
        .into_iter()
        .filter(|tag| {
            tag.attrs
                .get("http-equiv")
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("refresh"))
        })
        .find_map(|tag| tag.attrs.get("content").and_then(refresh_target))
}

/// Target of a `<seconds>;URL=<target>` refresh value.
fn refresh_target(value: &str) -> Option<String> {
    let caps = REFRESH_CONTENT.captures(value)?;
    let target = caps[1].trim_matches(|c| c == '"' || c == '\'').trim();
    (!target.is_empty()).then(|| target.to_string())
}

/// Follow redirects from the current page until a page without one is reached.
///
/// Every hop is a GET in `scope`. Returns the number of hops taken. Following stops
/// after `max_hops` so a page that refreshes to itself cannot stall the run.
pub async fn follow_redirects(
    session: &mut HttpSession,
    scope: &FetchScope,
    max_hops: usize,
) -> Result<usize> {
    let mut hops = 0;
    loop {
        let Some(page) = session.page() else {
            return Ok(hops);
        };
        let Some(target) = find_redirect(page) else {
            return Ok(hops);
        };
        if hops >= max_hops {
            tracing::warn!(
                "Stopped following redirects after {} hops (next: {})",
                hops,
                target
            );
            return Ok(hops);
        }
        let next = resolve_url(Some(&page.url), &target)?;
        tracing::debug!("Redirect {} -> {}", page.url, next);
        session.fetch(Method::GET, next, None, scope.clone()).await?;
        hops += 1;
    }
}

/// Fetch a URL and follow whatever redirect chain it starts.
pub async fn fetch_and_follow(
    session: &mut HttpSession,
    url: url::Url,
    scope: FetchScope,
    max_hops: usize,
) -> Result<usize> {
    session.fetch(Method::GET, url, None, scope.clone()).await?;
    follow_redirects(session, &scope, max_hops).await
}
