use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::context::SessionContext;
use crate::error::{ReplayError, Result};

static TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").expect("title regex"));
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W").expect("non-word regex"));

/// Check the current page title against a pattern.
///
/// Both the title and the pattern lose every non-word character before matching, so
/// punctuation and spacing differences between recording and replay do not matter.
#[derive(Debug, Clone, PartialEq)]
pub struct AssertTitleStep {
    pub pattern: String,
}

/// Check that a pattern occurs somewhere in the raw body of the current page.
#[derive(Debug, Clone, PartialEq)]
pub struct AssertTextStep {
    pub pattern: String,
}

impl AssertTitleStep {
    pub async fn execute(&self, ctx: &mut SessionContext) -> Result<()> {
        ctx.matches.clear();
        if !ctx.verify_titles {
            tracing::debug!("Title verification disabled, skipping");
            return Ok(());
        }
        let Some(page) = ctx.session.page() else {
            tracing::warn!("No page loaded yet, skipping title check");
            return Ok(());
        };

        let title = extract_title(&page.body).unwrap_or_default();
        let title = NON_WORD.replace_all(&title, "");
        let pattern = NON_WORD.replace_all(&self.pattern, "");
        let re = compile(&pattern)?;
        let caps = re.captures(&title).ok_or_else(|| {
            ReplayError::Assertion(format!("title '{}' does not match '{}'", title, pattern))
        })?;
        ctx.matches = capture_groups(&caps);
        tracing::debug!("Title matched: {:?}", ctx.matches);
        Ok(())
    }
}

impl AssertTextStep {
    pub async fn execute(&self, ctx: &mut SessionContext) -> Result<()> {
        ctx.matches.clear();
        let Some(page) = ctx.session.page() else {
            tracing::warn!("No page loaded yet, skipping text check");
            return Ok(());
        };

        let re = compile(&self.pattern)?;
        let caps = re.captures(&page.body).ok_or_else(|| {
            ReplayError::Assertion(format!("'{}' not found in {}", self.pattern, page.url))
        })?;
        ctx.matches = capture_groups(&caps);
        tracing::debug!("Text matched: {:?}", ctx.matches);
        Ok(())
    }
}

/// Inner text of the first `<title>` element.
pub fn extract_title(html: &str) -> Option<String> {
    TITLE
        .captures(html)
        .map(|caps| caps[1].trim().to_string())
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| ReplayError::Pattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// The whole match followed by every capture group; groups that did not take part
/// in the match are empty strings.
fn capture_groups(caps: &Captures<'_>) -> Vec<String> {
    caps.iter()
        .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
        .collect()
}
