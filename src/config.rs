use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ReplayError, Result};

/// Options a host hands to [`crate::Replayer::new`].
///
/// Deserializes from a camelCase option mapping; every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReplayConfig {
    /// Run `assert-title` steps. When false they succeed without looking at the page.
    pub verify_titles: bool,
    /// 0 = normal, 1 = step detail, 2+ = also dump every response.
    pub debug: u8,
    pub quiet: bool,
    /// First step to execute. Negative means 0.
    pub start_step: i64,
    /// Last step to execute, inclusive.
    pub end_step: i64,
    /// Durable cookie store, loaded before and saved after every run.
    pub cookie_path: Option<PathBuf>,
    /// Upper bound on redirect hops followed in one chain.
    pub max_redirects: usize,
    pub user_agent: String,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            verify_titles: true,
            debug: 0,
            quiet: false,
            start_step: -1,
            end_step: i64::MAX,
            cookie_path: None,
            max_redirects: 20,
            user_agent: concat!("webreplay/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ReplayConfig {
    /// Build a config from a host option mapping such as `{"verifyTitles": false}`.
    pub fn from_options(options: serde_json::Value) -> Result<Self> {
        serde_json::from_value(options)
            .map_err(|e| ReplayError::Script(format!("invalid configuration: {}", e)))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ReplayError::Script(format!("cannot read config {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            ReplayError::Script(format!("invalid config {}: {}", path.display(), e))
        })
    }

    /// The effective inclusive step range.
    pub fn step_range(&self) -> (usize, usize) {
        clamp_range(self.start_step, self.end_step)
    }
}

/// Turn a signed `[start, end]` pair into usable step indices.
///
/// Returns an empty range (`start > end`) when `end` is negative.
pub(crate) fn clamp_range(start: i64, end: i64) -> (usize, usize) {
    let start = usize::try_from(start.max(0)).unwrap_or(usize::MAX);
    if end < 0 {
        return (1, 0);
    }
    let end = usize::try_from(end).unwrap_or(usize::MAX);
    (start, end)
}
