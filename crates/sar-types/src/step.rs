use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The fixed vocabulary of step actions (spec §6). Adding one is a code
/// change, not a data change — the dispatcher in `sar-executor` is a closed
/// exhaustive match over this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepActionKind {
    Open,
    Click,
    Fill,
    Type,
    Press,
    Wait,
    Snapshot,
    Find,
    Eval,
    Run,
    Fail,
}

/// What happens after retry and fallback are exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OnError {
    #[default]
    Abort,
    Continue,
    Fallback,
}

/// One executable unit within an action's step list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub action: StepActionKind,
    #[serde(default)]
    pub args: IndexMap<String, Value>,
    #[serde(default)]
    pub when: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub retry: u32,
    #[serde(default)]
    pub retry_delay: Option<u64>,
    #[serde(default)]
    pub on_error: OnError,
    #[serde(default)]
    pub fallback: Option<Vec<Step>>,
}
