//! End-to-end coverage of [`sar_daemon::DaemonHandler`] against the fixture
//! namespace under `tests/fixtures/`, exercising every §6 RPC row (spec
//! §10.5) through a fake adapter rather than a real browser.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use sar_daemon::{DaemonHandler, Handler, RegistryConfig};
use sar_executor::test_support::MockAdapter;
use sar_executor::{AdapterError, BrowserAdapter, FindQuery, Locator, WaitSpec};
use sar_version::VersionDetector;
use serde_json::{json, Value};

/// Combines the recording [`MockAdapter`] (so assertions can be made on
/// which calls landed) with a no-op [`VersionDetector`] — `MockAdapter`
/// alone implements only `BrowserAdapter`, but `DaemonHandler` needs a
/// single type implementing both.
struct TestAdapter(MockAdapter);

#[async_trait]
impl BrowserAdapter for TestAdapter {
    async fn open(&self, url: &str) -> Result<Value, AdapterError> {
        self.0.open(url).await
    }
    async fn click(&self, locator: &Locator) -> Result<Value, AdapterError> {
        self.0.click(locator).await
    }
    async fn fill(&self, locator: &Locator, value: &Value) -> Result<Value, AdapterError> {
        self.0.fill(locator, value).await
    }
    async fn type_text(&self, locator: &Locator, text: &str) -> Result<Value, AdapterError> {
        self.0.type_text(locator, text).await
    }
    async fn press(&self, key: &str) -> Result<Value, AdapterError> {
        self.0.press(key).await
    }
    async fn wait(&self, spec: &WaitSpec) -> Result<Value, AdapterError> {
        self.0.wait(spec).await
    }
    async fn snapshot(&self, locator: Option<&Locator>, interactive: bool) -> Result<Value, AdapterError> {
        self.0.snapshot(locator, interactive).await
    }
    async fn find(&self, query: &FindQuery) -> Result<Value, AdapterError> {
        self.0.find(query).await
    }
    async fn eval(&self, expression: &str) -> Result<Value, AdapterError> {
        self.0.eval(expression).await
    }
}

#[async_trait]
impl VersionDetector for TestAdapter {
    async fn detect_global_var(&self, _name: &str) -> Option<String> {
        None
    }
    async fn detect_meta_tag(&self, _name: &str) -> Option<String> {
        None
    }
    async fn detect_expression(&self, _expression: &str) -> Option<String> {
        None
    }
}

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn handler_with(mock: MockAdapter) -> (Arc<TestAdapter>, DaemonHandler<TestAdapter>) {
    let adapter = Arc::new(TestAdapter(mock));
    let config = RegistryConfig {
        paths: vec![fixtures_dir()],
        ..RegistryConfig::default()
    };
    let handler = DaemonHandler::new(adapter.clone(), config).unwrap();
    (adapter, handler)
}

fn handler() -> (Arc<TestAdapter>, DaemonHandler<TestAdapter>) {
    handler_with(MockAdapter::new())
}

#[tokio::test]
async fn list_without_namespace_returns_namespace_summaries() {
    let (_adapter, handler) = handler();
    let result = handler.list(json!({})).await;
    let summaries = result.as_array().unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0]["namespace"], "forms");
    assert_eq!(summaries[0]["actionCount"], 2);
}

#[tokio::test]
async fn list_with_namespace_returns_action_summaries() {
    let (_adapter, handler) = handler();
    let result = handler.list(json!({ "namespace": "forms" })).await;
    let actions = result.as_array().unwrap();
    let names: Vec<&str> = actions.iter().map(|a| a["fullName"].as_str().unwrap()).collect();
    assert!(names.contains(&"forms:simple_login"));
    assert!(names.contains(&"forms:broken_step"));
}

#[tokio::test]
async fn list_with_unknown_namespace_is_a_bad_request() {
    let (_adapter, handler) = handler();
    let result = handler.list(json!({ "namespace": "nope" })).await;
    assert_eq!(result["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn describe_returns_full_action_definition() {
    let (_adapter, handler) = handler();
    let result = handler.describe(json!({ "action": "forms:simple_login" })).await;
    assert_eq!(result["description"], "log in with a username and password");
    assert_eq!(result["steps"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn describe_unknown_action_reports_action_not_found() {
    let (_adapter, handler) = handler();
    let result = handler.describe(json!({ "action": "forms:does_not_exist" })).await;
    assert_eq!(result["success"], false);
    assert_eq!(result["error"]["code"], "ACTION_NOT_FOUND");
}

#[tokio::test]
async fn run_dispatches_steps_and_redacts_nothing_outside_debug_mode() {
    let (adapter, handler) = handler();
    let result = handler
        .run(json!({
            "action": "forms:simple_login",
            "params": { "username": "alice", "password": "hunter2" }
        }))
        .await;
    assert_eq!(result["success"], true);
    assert_eq!(
        adapter.0.calls(),
        vec![
            "open /login".to_string(),
            "fill css:#u alice".to_string(),
            "fill css:#p hunter2".to_string(),
            "click css:#submit".to_string(),
        ]
    );
}

#[tokio::test]
async fn run_failure_is_folded_into_the_action_result() {
    let (_adapter, handler) = handler_with(MockAdapter::new().failing_selector(".missing"));
    let result = handler.run(json!({ "action": "forms:broken_step", "params": {} })).await;
    assert_eq!(result["success"], false);
    assert_eq!(result["error"]["code"], "ELEMENT_NOT_FOUND");
}

#[tokio::test]
async fn dry_run_plans_without_touching_the_adapter() {
    let (adapter, handler) = handler();
    let result = handler
        .dry_run(json!({
            "action": "forms:simple_login",
            "params": { "username": "alice", "password": "hunter2" }
        }))
        .await;
    assert_eq!(result["success"], true);
    assert_eq!(result["planned"].as_array().unwrap().len(), 4);
    assert!(adapter.0.calls().is_empty());
}

#[tokio::test]
async fn debug_populates_a_trace_with_secret_params_redacted() {
    let (_adapter, handler) = handler();
    let result = handler
        .debug(json!({
            "action": "forms:simple_login",
            "params": { "username": "alice", "password": "hunter2" }
        }))
        .await;
    assert_eq!(result["success"], true);
    let trace = result["trace"].as_array().unwrap();
    assert_eq!(trace.len(), 4);
    let rendered = serde_json::to_string(trace).unwrap();
    assert!(!rendered.contains("hunter2"));
}

#[tokio::test]
async fn validate_reports_no_errors_for_the_fixture_file() {
    let (_adapter, handler) = handler();
    let path = fixtures_dir().join("forms.yaml");
    let result = handler.validate(json!({ "path": path.to_str().unwrap() })).await;
    assert_eq!(result["success"], true);
}

#[tokio::test]
async fn validate_reports_structural_errors_for_a_broken_file() {
    let (_adapter, handler) = handler();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    std::fs::write(&path, "schema_version: 1\nnamespace: \"\"\nversion: \"1.0.0\"\nactions: {}\n").unwrap();
    let result = handler.validate(json!({ "path": path.to_str().unwrap() })).await;
    assert_eq!(result["success"], false);
    assert!(!result["errors"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn search_ranks_prefix_matches_first_with_a_higher_score() {
    let (_adapter, handler) = handler();
    let result = handler.search(json!({ "query": "forms:simple" })).await;
    let hits = result.as_array().unwrap();
    assert_eq!(hits[0]["fullName"], "forms:simple_login");
    assert_eq!(hits[0]["score"], 1.0);
}

#[tokio::test]
async fn reload_reports_the_current_action_and_issue_counts() {
    let (_adapter, handler) = handler();
    let result = handler.reload(json!({})).await;
    assert_eq!(result["success"], true);
    assert_eq!(result["loaded"], 2);
    assert_eq!(result["failed"], 0);
}
