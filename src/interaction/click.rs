use reqwest::Method;

use super::context::SessionContext;
use crate::browser::redirect::{fetch_and_follow, follow_redirects};
use crate::browser::{resolve_url, FetchScope};
use crate::error::{ReplayError, Result};
use crate::selectors::form::find_form;
use crate::selectors::frame::find_frame_source;
use crate::selectors::link::find_link;
use crate::selectors::{FormRef, LinkRef, Selector, Target};

/// Follow a link or submit a form, optionally inside a named frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickStep {
    pub selector: Selector,
    pub frame: Option<String>,
    /// Run one more redirect pass once the click's own redirects are resolved.
    pub triggers_refresh: bool,
}

impl ClickStep {
    pub async fn execute(&self, ctx: &mut SessionContext) -> Result<()> {
        if let Some(frame) = self.frame.as_deref().filter(|f| !f.is_empty()) {
            if frame != ctx.session.active_frame() {
                enter_frame(ctx, frame).await?;
            }
        }

        match (&self.selector.target, &self.selector.form) {
            (Target::Link(link_ref), _) => follow_link(ctx, link_ref).await?,
            (Target::Form | Target::Field(_), Some(form_ref)) => submit_form(ctx, form_ref).await?,
            (_, None) => {
                return Err(ReplayError::selector(
                    "click needs a link (A[...]) or form (FORM[...]) selector",
                ))
            }
        }

        if self.triggers_refresh {
            follow_redirects(&mut ctx.session, &FetchScope::TopLevel, ctx.max_redirects).await?;
        }
        Ok(())
    }
}

/// Load the document of a named frame of the current page.
async fn enter_frame(ctx: &mut SessionContext, name: &str) -> Result<()> {
    let page = ctx.current_page()?;
    let src = find_frame_source(&page.body, name)?;
    let url = resolve_url(Some(&page.url), &src)?;
    tracing::info!("Entering frame '{}': {}", name, url);
    fetch_and_follow(
        &mut ctx.session,
        url,
        FetchScope::Frame(name.to_string()),
        ctx.max_redirects,
    )
    .await?;
    Ok(())
}

async fn follow_link(ctx: &mut SessionContext, link_ref: &LinkRef) -> Result<()> {
    let page = ctx.current_page()?;
    let href = find_link(&page.body, link_ref)?;
    let url = resolve_url(Some(&page.url), &href)?;
    tracing::info!("Following link: {}", url);
    fetch_and_follow(&mut ctx.session, url, FetchScope::TopLevel, ctx.max_redirects).await?;
    Ok(())
}

/// The request a form submission turns into.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub method: Method,
    pub url: url::Url,
    /// Urlencoded payload for POST.
    pub body: Option<String>,
}

/// Build the request for submitting `form_ref` from the current page.
///
/// Every named `<input>`/`<textarea>` is sent in document order, with the fill buffer's
/// pending value taking precedence over the markup default.
pub fn build_submission(ctx: &SessionContext, form_ref: &FormRef) -> Result<Submission> {
    let page = ctx.current_page()?;
    let form = find_form(&page.body, form_ref)?;

    let mut payload = url::form_urlencoded::Serializer::new(String::new());
    for field in form.fields().iter().filter(|f| !f.name.is_empty()) {
        let value = ctx
            .fill_buffer
            .get(form.index, &field.name)
            .unwrap_or(field.value.as_str());
        payload.append_pair(&field.name, value);
    }
    let payload = payload.finish();

    let mut url = resolve_url(Some(&page.url), form.action())?;
    match form.method().as_str() {
        "GET" => {
            url.set_query((!payload.is_empty()).then_some(payload.as_str()));
            Ok(Submission {
                method: Method::GET,
                url,
                body: None,
            })
        }
        "POST" => Ok(Submission {
            method: Method::POST,
            url,
            body: Some(payload),
        }),
        other => Err(ReplayError::UnsupportedAction(format!(
            "form {} method {}",
            form.index, other
        ))),
    }
}

async fn submit_form(ctx: &mut SessionContext, form_ref: &FormRef) -> Result<()> {
    let submission = build_submission(ctx, form_ref)?;
    tracing::info!("Submitting {} via {} {}", form_ref, submission.method, submission.url);
    ctx.session
        .fetch(
            submission.method,
            submission.url,
            submission.body,
            FetchScope::TopLevel,
        )
        .await?;
    ctx.fill_buffer.clear();
    follow_redirects(&mut ctx.session, &FetchScope::TopLevel, ctx.max_redirects).await?;
    Ok(())
}
