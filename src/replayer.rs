use std::collections::HashMap;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::browser::{CookieJar, HttpSession};
use crate::config::{clamp_range, ReplayConfig};
use crate::error::{ReplayError, Result};
use crate::interaction::{Action, SessionContext};
use crate::script::ActionScript;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_]\w*)\}").expect("placeholder regex"));

/// Result of the most recent run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunOutcome {
    #[default]
    NotRun,
    Success,
    Failure,
}

/// Replace every `{name}` with its value from `table`; unknown names become empty.
pub fn substitute(value: &str, table: &HashMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(value, |caps: &Captures<'_>| {
            table.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}

/// Replays a loaded action script against a live site.
///
/// One `Replayer` owns one session: cookies and the current page persist across runs
/// until [`Replayer::reset_session`] is called.
pub struct Replayer {
    config: ReplayConfig,
    script: Option<ActionScript>,
    replacements: HashMap<String, String>,
    ctx: SessionContext,
    outcome: RunOutcome,
    error: String,
}

impl Replayer {
    pub fn new(config: ReplayConfig) -> Result<Self> {
        let mut session = HttpSession::new(&config.user_agent)?;
        session.set_dump_responses(config.debug >= 2);
        let mut ctx = SessionContext::new(session);
        ctx.verify_titles = config.verify_titles;
        ctx.max_redirects = config.max_redirects;
        Ok(Self {
            config,
            script: None,
            replacements: HashMap::new(),
            ctx,
            outcome: RunOutcome::NotRun,
            error: String::new(),
        })
    }

    /// Load an action script from disk. On failure the reason is in [`Replayer::error`]
    /// and no script stays loaded.
    pub fn load(&mut self, path: impl AsRef<Path>) -> bool {
        match ActionScript::load(path.as_ref()) {
            Ok(script) => {
                tracing::info!(
                    "Loaded {} steps from {}",
                    script.len(),
                    path.as_ref().display()
                );
                self.load_script(script);
                true
            }
            Err(e) => {
                tracing::error!("{}", e);
                self.script = None;
                self.error = e.to_string();
                false
            }
        }
    }

    /// Use an already-built script.
    pub fn load_script(&mut self, script: ActionScript) {
        self.script = Some(script);
        self.error.clear();
    }

    /// Execute the loaded script over the inclusive step range `[start, end]`.
    ///
    /// `None` bounds fall back to the configured start/end step. Returns false on the
    /// first failing step; the message is then available from [`Replayer::error`].
    pub async fn run(&mut self, start: Option<i64>, end: Option<i64>) -> bool {
        let range = clamp_range(
            start.unwrap_or(self.config.start_step),
            end.unwrap_or(self.config.end_step),
        );

        // An unreadable cookie store is left untouched on disk.
        let result = match self.load_cookies() {
            Ok(()) => {
                let result = self.run_steps(range).await;
                self.save_cookies();
                result
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(executed) => {
                tracing::info!("Run succeeded ({} steps executed)", executed);
                self.outcome = RunOutcome::Success;
                self.error.clear();
                true
            }
            Err(message) => {
                tracing::error!("Run failed: {}", message);
                self.outcome = RunOutcome::Failure;
                self.error = message;
                false
            }
        }
    }

    async fn run_steps(&mut self, (start, end): (usize, usize)) -> Result<usize, String> {
        let Some(script) = self.script.as_ref() else {
            return Err(ReplayError::Script("no script loaded".into()).to_string());
        };

        let mut executed = 0;
        let mut index = 0;
        while let Some(step) = script.get(index) {
            if index < start || index > end {
                index += 1;
                continue;
            }

            let value = substitute(&step.value, &self.replacements);
            tracing::info!("Step {}: {} {}", index, step.action, value);
            let outcome = match Action::from_step(step, value) {
                Ok(action) => action.execute(&mut self.ctx).await,
                Err(e) => Err(e),
            };
            if let Err(e) = outcome {
                return Err(format!("step {} ({}): {}", index, step.action, e));
            }
            executed += 1;
            index += 1;
        }
        Ok(executed)
    }

    fn load_cookies(&mut self) -> std::result::Result<(), String> {
        let Some(path) = self.config.cookie_path.as_deref() else {
            return Ok(());
        };
        let jar = CookieJar::load(path).map_err(|e| e.to_string())?;
        tracing::debug!("Loaded {} cookies from {}", jar.len(), path.display());
        self.ctx.session.set_cookies(jar);
        Ok(())
    }

    fn save_cookies(&self) {
        let Some(path) = self.config.cookie_path.as_deref() else {
            return;
        };
        if let Err(e) = self.ctx.session.cookies().save(path) {
            tracing::warn!("{}", e);
        }
    }

    /// Outcome of the last run.
    pub fn outcome(&self) -> RunOutcome {
        self.outcome
    }

    /// True when the last run succeeded.
    pub fn result(&self) -> bool {
        self.outcome == RunOutcome::Success
    }

    /// Message of the last failure; empty after a successful run or load.
    pub fn error(&self) -> &str {
        &self.error
    }

    /// Capture groups of the last assertion step.
    pub fn matches(&self) -> &[String] {
        &self.ctx.matches
    }

    pub fn set_replacement(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.replacements.insert(key.into(), value.into());
    }

    pub fn clear_replacements(&mut self) {
        self.replacements.clear();
    }

    /// Forget cookies, the current page and pending field values.
    pub fn reset_session(&mut self) {
        self.ctx.session.reset();
        self.ctx.fill_buffer.clear();
        self.ctx.matches.clear();
        self.outcome = RunOutcome::NotRun;
        self.error.clear();
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut SessionContext {
        &mut self.ctx
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    pub fn verify_titles(&self) -> bool {
        self.config.verify_titles
    }

    pub fn set_verify_titles(&mut self, on: bool) {
        self.config.verify_titles = on;
        self.ctx.verify_titles = on;
    }

    pub fn start_step(&self) -> i64 {
        self.config.start_step
    }

    pub fn set_start_step(&mut self, step: i64) {
        self.config.start_step = step;
    }

    pub fn end_step(&self) -> i64 {
        self.config.end_step
    }

    pub fn set_end_step(&mut self, step: i64) {
        self.config.end_step = step;
    }

    pub fn debug(&self) -> u8 {
        self.config.debug
    }

    pub fn set_debug(&mut self, level: u8) {
        self.config.debug = level;
        self.ctx.session.set_dump_responses(level >= 2);
    }

    pub fn quiet(&self) -> bool {
        self.config.quiet
    }

    /// Recorded for hosts that install their own subscriber. The library only emits
    /// `tracing` events; the level filter (and so quietness) belongs to the subscriber,
    /// which the `webreplay` binary derives from this flag.
    pub fn set_quiet(&mut self, quiet: bool) {
        self.config.quiet = quiet;
    }

    pub fn cookie_path(&self) -> Option<&Path> {
        self.config.cookie_path.as_deref()
    }

    pub fn set_cookie_path(&mut self, path: Option<PathBuf>) {
        self.config.cookie_path = path;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::ActionStep;

    fn replayer_with(steps: Vec<ActionStep>) -> Replayer {
        let mut replayer = Replayer::new(ReplayConfig::default()).unwrap();
        replayer.load_script(ActionScript::from_steps(steps).unwrap());
        replayer
    }

    #[test]
    fn test_substitute_known_and_unknown() {
        let mut table = HashMap::new();
        table.insert("u".to_string(), "alice".to_string());
        assert_eq!(substitute("{u}:{missing}!", &table), "alice:!");
    }

    #[test]
    fn test_substitute_leaves_regex_quantifiers() {
        let table = HashMap::new();
        assert_eq!(substitute(r"\d{3}-\d{2,4}", &table), r"\d{3}-\d{2,4}");
    }

    #[tokio::test]
    async fn test_run_without_script_fails() {
        let mut replayer = Replayer::new(ReplayConfig::default()).unwrap();
        assert!(!replayer.run(None, None).await);
        assert_eq!(replayer.outcome(), RunOutcome::Failure);
        assert!(replayer.error().contains("no script loaded"));
    }

    #[tokio::test]
    async fn test_range_outside_steps_runs_nothing() {
        let mut replayer = replayer_with(vec![
            ActionStep::new("navigate", "http://127.0.0.1:9/never"),
            ActionStep::new("hover", ""),
        ]);
        assert!(replayer.run(Some(5), Some(10)).await);
        assert_eq!(replayer.outcome(), RunOutcome::Success);
        assert_eq!(replayer.error(), "");
    }

    #[tokio::test]
    async fn test_unsupported_action_stops_run() {
        let mut replayer = replayer_with(vec![
            ActionStep::new("assert-text", "x"),
            ActionStep::new("hover", ""),
            ActionStep::new("navigate", "http://127.0.0.1:9/never"),
        ]);
        assert!(!replayer.run(None, None).await);
        assert_eq!(replayer.error(), "step 1 (hover): unsupported action 'hover'");
    }

    #[tokio::test]
    async fn test_gap_ends_run() {
        let mut hover = ActionStep::new("hover", "");
        hover.index = Some(2);
        let mut replayer = replayer_with(vec![ActionStep::new("assert-text", "x"), hover]);
        assert!(replayer.run(None, None).await);
    }

    #[tokio::test]
    async fn test_assertions_before_navigation_soft_skip() {
        let mut replayer = replayer_with(vec![
            ActionStep::new("assert-title", "Home"),
            ActionStep::new("assert-text", "Welcome"),
        ]);
        assert!(replayer.run(None, None).await);
        assert!(replayer.matches().is_empty());
    }

    #[tokio::test]
    async fn test_failed_load_drops_previous_script() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        std::fs::write(&good, r#"[{"type": "assert-text", "value": "x"}]"#).unwrap();

        let mut replayer = Replayer::new(ReplayConfig::default()).unwrap();
        assert!(replayer.load(&good));
        assert!(!replayer.load(dir.path().join("missing.json")));
        assert!(!replayer.run(None, None).await);
        assert!(replayer.error().contains("no script loaded"));
    }

    #[tokio::test]
    async fn test_setters_flow_into_context() {
        let mut replayer = Replayer::new(ReplayConfig::default()).unwrap();
        replayer.set_verify_titles(false);
        replayer.set_start_step(3);
        replayer.set_end_step(7);
        assert!(!replayer.context().verify_titles);
        assert_eq!((replayer.start_step(), replayer.end_step()), (3, 7));
        replayer.set_cookie_path(Some(PathBuf::from("/tmp/jar.json")));
        assert_eq!(replayer.cookie_path(), Some(Path::new("/tmp/jar.json")));
    }
}
