use std::collections::BTreeMap;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ReplayError, Result};

/// One recorded instruction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionStep {
    /// Explicit 0-based position; defaults to the step's position in the list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    /// navigate, fill, click, wait, assert-title or assert-text
    #[serde(rename = "type")]
    pub action: String,
    /// Selector dialect string, e.g. `/HTML/BODY/FORM[1]/INPUT[@NAME="user"]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    /// Step argument; may contain `{name}` placeholders
    #[serde(default)]
    pub value: String,
    /// Follow redirects and refreshes after a click
    #[serde(default, alias = "refresh")]
    pub triggers_refresh: bool,
    /// Frame to enter before clicking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<String>,
}

impl ActionStep {
    pub fn new(action: &str, value: &str) -> Self {
        Self {
            action: action.to_string(),
            value: value.to_string(),
            ..Default::default()
        }
    }

    pub fn with_selector(mut self, selector: &str) -> Self {
        self.selector = Some(selector.to_string());
        self
    }

    pub fn with_frame(mut self, frame: &str) -> Self {
        self.frame = Some(frame.to_string());
        self
    }

    pub fn with_refresh(mut self) -> Self {
        self.triggers_refresh = true;
        self
    }
}

/// On-disk script shape: `{"actions": [...]}` or a bare array.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ScriptFile {
    Wrapped { actions: Vec<ActionStep> },
    Bare(Vec<ActionStep>),
}

/// The immutable step list of one run, keyed by step index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionScript {
    steps: BTreeMap<usize, ActionStep>,
}

impl ActionScript {
    pub fn from_steps(steps: Vec<ActionStep>) -> Result<Self> {
        if steps.is_empty() {
            return Err(ReplayError::Script("script contains no actions".into()));
        }
        let mut map = BTreeMap::new();
        for (position, step) in steps.into_iter().enumerate() {
            let index = step.index.unwrap_or(position);
            if map.insert(index, step).is_some() {
                return Err(ReplayError::Script(format!("duplicate step index {}", index)));
            }
        }
        Ok(Self { steps: map })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let file: ScriptFile = serde_json::from_str(text)
            .map_err(|e| ReplayError::Script(format!("malformed script: {}", e)))?;
        match file {
            ScriptFile::Wrapped { actions } | ScriptFile::Bare(actions) => Self::from_steps(actions),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ReplayError::Script(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    pub fn get(&self, index: usize) -> Option<&ActionStep> {
        self.steps.get(&index)
    }

    /// Number of steps reachable from index 0 without hitting a gap.
    pub fn contiguous_len(&self) -> usize {
        (0..).take_while(|i| self.steps.contains_key(i)).count()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// JSON Schema of the script file format.
pub fn script_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(ScriptFile)
}
