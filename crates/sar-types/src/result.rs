use chrono::{DateTime, Utc};
use sar_error::ErrorRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-step debug trace entry, populated only when `debugMode` is on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEntry {
    pub index: usize,
    pub step_action: String,
    /// Wall-clock moment the attempt started, so a trace can be correlated
    /// against external logs (browser console, host process log) rather
    /// than only against its own siblings' relative ordering.
    pub timestamp: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    /// Input args with any `secret:true`-sourced value replaced by `***`.
    pub args: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One planned (not executed) step, produced by a dry run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedStep {
    pub index: usize,
    pub step_action: String,
    pub resolved_args: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<bool>,
}

/// The externally visible outcome of one action invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<TraceEntry>>,
}

impl ActionResult {
    pub fn success(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            trace: None,
        }
    }

    pub fn failure(error: ErrorRecord) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            trace: None,
        }
    }

    pub fn with_trace(mut self, trace: Vec<TraceEntry>) -> Self {
        self.trace = Some(trace);
        self
    }
}

/// The result of a dry run: a planned-step list plus overall success.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DryRunResult {
    pub success: bool,
    pub planned: Vec<PlannedStep>,
}
