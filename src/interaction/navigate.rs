use reqwest::Method;

use super::context::SessionContext;
use crate::browser::redirect::follow_redirects;
use crate::browser::{resolve_url, FetchScope};
use crate::error::Result;

/// Load a URL as a new top-level page.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigateStep {
    pub url: String,
}

impl NavigateStep {
    pub async fn execute(&self, ctx: &mut SessionContext) -> Result<()> {
        let url = resolve_url(ctx.session.current_url(), &self.url)?;
        tracing::info!("Navigating to: {}", url);
        ctx.session
            .fetch(Method::GET, url, None, FetchScope::TopLevel)
            .await?;

        // Two resolution passes, kept for compatibility with recorded multi-hop
        // refresh chains.
        for _ in 0..2 {
            follow_redirects(&mut ctx.session, &FetchScope::TopLevel, ctx.max_redirects).await?;
        }

        if let Some(page) = ctx.session.page() {
            tracing::debug!("Landed on {} ({})", page.url, page.status);
        }
        Ok(())
    }
}
