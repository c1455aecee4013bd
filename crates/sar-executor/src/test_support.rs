//! A recording, scriptable [`BrowserAdapter`] used only by this crate's own
//! tests (spec §8's end-to-end scenarios exercise the executor against a
//! fake adapter rather than a real browser).

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::adapter::{AdapterError, BrowserAdapter, FindQuery, WaitCondition, WaitSpec};
use crate::locator::Locator;

/// Records every call it receives (as a short display string) and can be
/// configured to fail for specific selectors, either permanently or for a
/// fixed number of attempts (to exercise retry-then-succeed).
pub struct MockAdapter {
    calls: Mutex<Vec<String>>,
    failing_always: HashSet<String>,
    fail_until: Mutex<HashMap<String, u32>>,
    eval_results: HashMap<String, Value>,
}

impl MockAdapter {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing_always: HashSet::new(),
            fail_until: Mutex::new(HashMap::new()),
            eval_results: HashMap::new(),
        }
    }

    /// Any call whose recorded key contains `pattern` fails with
    /// `ElementNotFound` forever.
    #[must_use]
    pub fn failing_selector(mut self, pattern: &str) -> Self {
        self.failing_always.insert(pattern.to_string());
        self
    }

    /// Any call whose recorded key contains `pattern` fails with `Timeout`
    /// for the first `n` matching attempts, then succeeds.
    #[must_use]
    pub fn fail_n_times(self, pattern: &str, n: u32) -> Self {
        self.fail_until.lock().unwrap().insert(pattern.to_string(), n);
        self
    }

    #[must_use]
    pub fn with_eval_result(mut self, expression: &str, value: Value) -> Self {
        self.eval_results.insert(expression.to_string(), value);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record_and_maybe_fail(&self, key: &str) -> Result<(), AdapterError> {
        self.calls.lock().unwrap().push(key.to_string());

        let mut fail_until = self.fail_until.lock().unwrap();
        for (pattern, remaining) in fail_until.iter_mut() {
            if key.contains(pattern.as_str()) && *remaining > 0 {
                *remaining -= 1;
                return Err(AdapterError::Timeout);
            }
        }
        drop(fail_until);

        if self.failing_always.iter().any(|pattern| key.contains(pattern.as_str())) {
            return Err(AdapterError::ElementNotFound);
        }
        Ok(())
    }
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserAdapter for MockAdapter {
    async fn open(&self, url: &str) -> Result<Value, AdapterError> {
        self.record_and_maybe_fail(&format!("open {url}"))?;
        Ok(json!({}))
    }

    async fn click(&self, locator: &Locator) -> Result<Value, AdapterError> {
        self.record_and_maybe_fail(&format!("click {locator}"))?;
        Ok(json!({}))
    }

    async fn fill(&self, locator: &Locator, value: &Value) -> Result<Value, AdapterError> {
        let value_str = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
        self.record_and_maybe_fail(&format!("fill {locator} {value_str}"))?;
        Ok(json!({}))
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> Result<Value, AdapterError> {
        self.record_and_maybe_fail(&format!("type {locator} {text}"))?;
        Ok(json!({}))
    }

    async fn press(&self, key: &str) -> Result<Value, AdapterError> {
        self.record_and_maybe_fail(&format!("press {key}"))?;
        Ok(json!({}))
    }

    async fn wait(&self, spec: &WaitSpec) -> Result<Value, AdapterError> {
        let key = match &spec.condition {
            WaitCondition::Selector { locator, .. } => format!("wait selector {locator}"),
            WaitCondition::Url(url) => format!("wait url {url}"),
            WaitCondition::State(state) => format!("wait state {state}"),
            WaitCondition::TimeMs(ms) => format!("wait time {ms}"),
        };
        self.record_and_maybe_fail(&key)?;
        Ok(json!({}))
    }

    async fn snapshot(&self, locator: Option<&Locator>, interactive: bool) -> Result<Value, AdapterError> {
        let key = match locator {
            Some(l) => format!("snapshot {l} interactive={interactive}"),
            None => format!("snapshot interactive={interactive}"),
        };
        self.record_and_maybe_fail(&key)?;
        Ok(json!({}))
    }

    async fn find(&self, query: &FindQuery) -> Result<Value, AdapterError> {
        self.record_and_maybe_fail(&format!("find {:?} {}", query.query_type, query.value))?;
        Ok(json!({}))
    }

    async fn eval(&self, expression: &str) -> Result<Value, AdapterError> {
        self.record_and_maybe_fail(&format!("eval {expression}"))?;
        Ok(self.eval_results.get(expression).cloned().unwrap_or(Value::Null))
    }
}
