use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What happens to the state of descendants when an ancestor collapses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollapsePolicy {
    /// Keep descendant records, so re-expanding restores nested expansion.
    #[default]
    Retain,
    /// Destroy descendant records; re-expanding queries the data source
    /// again and starts from [`TreeOptions::initially_expanded`].
    Discard,
}

/// Configuration knobs that influence how the engine tracks node state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeOptions {
    /// Initial state of freshly created node records.
    pub initially_expanded: bool,
    pub collapse_policy: CollapsePolicy,
}

impl TreeOptions {
    pub fn with_initially_expanded(mut self, expanded: bool) -> Self {
        self.initially_expanded = expanded;
        self
    }

    pub fn with_collapse_policy(mut self, policy: CollapsePolicy) -> Self {
        self.collapse_policy = policy;
        self
    }

    /// Parse options from a JSON document; missing fields use defaults.
    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Serialize options to a pretty-printed JSON document.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
