//! The host-supplied capability the executor drives (spec §6's "browser
//! adapter itself" is explicitly out of scope — this is only the seam it
//! plugs into). One method per step-action that touches the page; `run`
//! and `fail` never reach the adapter, they're handled by the executor
//! directly.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::locator::Locator;

/// What a browser-adapter call can fail with. Deliberately coarser than
/// [`sar_error::ActionError`] — the executor is the place that knows which
/// step/selector/retry context to wrap an `AdapterError` in.
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    #[error("element not found")]
    ElementNotFound,
    #[error("element not interactable")]
    NotInteractable,
    #[error("timed out waiting for condition")]
    Timeout,
    #[error("{0}")]
    Other(String),
}

/// The single condition a `wait` step blocks on (spec §6: "one of
/// `{selector, url, state, time}`").
#[derive(Debug, Clone)]
pub enum WaitCondition {
    Selector { locator: Locator, hidden: bool },
    Url(String),
    State(String),
    TimeMs(u64),
}

#[derive(Debug, Clone)]
pub struct WaitSpec {
    pub condition: WaitCondition,
    pub timeout_ms: Option<u64>,
}

/// The semantic query kind a `find` step's `type` selects (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindQueryType {
    Role,
    Text,
    Label,
    Placeholder,
    TestId,
}

#[derive(Debug, Clone)]
pub struct FindQuery {
    pub query_type: FindQueryType,
    pub value: String,
    pub subaction: Option<String>,
}

/// One browser call per non-control step action. Every element-targeting
/// method takes an already-prefix-parsed [`Locator`]; the executor's
/// selector resolver is what walks a selector's fallback chain, retrying
/// each candidate against these methods in turn.
#[async_trait]
pub trait BrowserAdapter: Send + Sync {
    async fn open(&self, url: &str) -> Result<Value, AdapterError>;
    async fn click(&self, locator: &Locator) -> Result<Value, AdapterError>;
    async fn fill(&self, locator: &Locator, value: &Value) -> Result<Value, AdapterError>;
    async fn type_text(&self, locator: &Locator, text: &str) -> Result<Value, AdapterError>;
    async fn press(&self, key: &str) -> Result<Value, AdapterError>;
    async fn wait(&self, spec: &WaitSpec) -> Result<Value, AdapterError>;
    async fn snapshot(&self, locator: Option<&Locator>, interactive: bool) -> Result<Value, AdapterError>;
    async fn find(&self, query: &FindQuery) -> Result<Value, AdapterError>;
    async fn eval(&self, expression: &str) -> Result<Value, AdapterError>;
}
