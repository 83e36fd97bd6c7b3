pub mod assert;
pub mod click;
pub mod context;
pub mod fill;
pub mod fill_buffer;
pub mod navigate;
pub mod wait;

use std::fmt;

use crate::error::{ReplayError, Result};
use crate::script::ActionStep;
use crate::selectors::Selector;

pub use assert::{AssertTextStep, AssertTitleStep};
pub use click::ClickStep;
pub use context::SessionContext;
pub use fill::FillStep;
pub use fill_buffer::FormFillBuffer;
pub use navigate::NavigateStep;
pub use wait::WaitStep;

/// The recognized step types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Navigate,
    Fill,
    Click,
    Wait,
    AssertTitle,
    AssertText,
}

impl ActionKind {
    /// Map a script `type` to a kind, accepting the older `verify-*` spellings.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "navigate" | "goto" => Some(Self::Navigate),
            "fill" => Some(Self::Fill),
            "click" => Some(Self::Click),
            "wait" => Some(Self::Wait),
            "assert-title" | "verify-title" => Some(Self::AssertTitle),
            "assert-text" | "assert-text-exists" | "verify-text" => Some(Self::AssertText),
            _ => None,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Navigate => "navigate",
            Self::Fill => "fill",
            Self::Click => "click",
            Self::Wait => "wait",
            Self::AssertTitle => "assert-title",
            Self::AssertText => "assert-text",
        })
    }
}

/// One executable step, built from an [`ActionStep`] after placeholder substitution.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Navigate(NavigateStep),
    Fill(FillStep),
    Click(ClickStep),
    Wait(WaitStep),
    AssertTitle(AssertTitleStep),
    AssertText(AssertTextStep),
}

fn required_selector(step: &ActionStep) -> Result<Selector> {
    step.selector
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ReplayError::selector(format!("{} step has no selector", step.action)))?
        .parse()
}

impl Action {
    /// Build the executable form of `step`, with `value` already substituted.
    pub fn from_step(step: &ActionStep, value: String) -> Result<Self> {
        let kind = ActionKind::from_name(&step.action)
            .ok_or_else(|| ReplayError::UnsupportedAction(step.action.clone()))?;
        Ok(match kind {
            ActionKind::Navigate => Self::Navigate(NavigateStep { url: value }),
            ActionKind::Fill => Self::Fill(FillStep {
                selector: required_selector(step)?,
                value,
            }),
            ActionKind::Click => Self::Click(ClickStep {
                selector: required_selector(step)?,
                frame: step.frame.clone(),
                triggers_refresh: step.triggers_refresh,
            }),
            ActionKind::Wait => Self::Wait(WaitStep::parse(&value)?),
            ActionKind::AssertTitle => Self::AssertTitle(AssertTitleStep { pattern: value }),
            ActionKind::AssertText => Self::AssertText(AssertTextStep { pattern: value }),
        })
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Navigate(_) => ActionKind::Navigate,
            Self::Fill(_) => ActionKind::Fill,
            Self::Click(_) => ActionKind::Click,
            Self::Wait(_) => ActionKind::Wait,
            Self::AssertTitle(_) => ActionKind::AssertTitle,
            Self::AssertText(_) => ActionKind::AssertText,
        }
    }

    pub async fn execute(&self, ctx: &mut SessionContext) -> Result<()> {
        match self {
            Self::Navigate(step) => step.execute(ctx).await,
            Self::Fill(step) => step.execute(ctx).await,
            Self::Click(step) => step.execute(ctx).await,
            Self::Wait(step) => step.execute(ctx).await,
            Self::AssertTitle(step) => step.execute(ctx).await,
            Self::AssertText(step) => step.execute(ctx).await,
        }
    }
}
