//! The in-process RPC surface (spec §6, spec §10.4): one async method per
//! `action.*` row, taking and returning `serde_json::Value` so an eventual
//! transport layer can marshal freely without this crate knowing anything
//! about sockets or framing.

use std::sync::Arc;

use async_trait::async_trait;
use sar_executor::{BrowserAdapter, Executor, Limits};
use sar_registry::Registry;
use sar_version::VersionDetector;
use serde_json::{json, Value};

use crate::config::RegistryConfig;

/// One async method per §6 RPC row. Every method takes its request payload
/// and returns its response payload as a bare `serde_json::Value` — error
/// conditions are folded into the response shape each row already
/// documents (an `ActionResult`'s `error` field, `action.validate`'s
/// `errors` array, or a `{"error": {...}}` envelope for malformed
/// requests) rather than surfaced as a `Result::Err`, since there is no
/// transport here to carry one.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn list(&self, params: Value) -> Value;
    async fn describe(&self, params: Value) -> Value;
    async fn run(&self, params: Value) -> Value;
    async fn dry_run(&self, params: Value) -> Value;
    async fn debug(&self, params: Value) -> Value;
    async fn validate(&self, params: Value) -> Value;
    async fn search(&self, params: Value) -> Value;
    async fn reload(&self, params: Value) -> Value;
}

fn bad_request(message: impl Into<String>) -> Value {
    json!({ "error": { "code": "BAD_REQUEST", "message": message.into() } })
}

fn action_not_found(name: &str) -> Value {
    json!({
        "success": false,
        "error": { "code": "ACTION_NOT_FOUND", "message": format!("action not found: {name}") }
    })
}

/// The concrete `Handler`: owns the registry, the version-detecting
/// adapter, an `Executor` built from it, and the resolved configuration.
///
/// `A` plays both roles the executor's two separate parameters need — the
/// `BrowserAdapter` the executor dispatches steps against, and the
/// `VersionDetector` it probes for `compatibility` blocks — so a host's
/// adapter type is expected to implement both.
pub struct DaemonHandler<A: ?Sized> {
    registry: Arc<Registry>,
    executor: Executor<A>,
    adapter: Arc<A>,
    config: RegistryConfig,
}

impl<A> DaemonHandler<A>
where
    A: BrowserAdapter + VersionDetector + 'static,
{
    /// Build a handler from a resolved `config`: loads the registry from
    /// `config.paths` and wires an `Executor` with limits derived from the
    /// config's timeout/depth/step budgets.
    pub fn new(adapter: Arc<A>, config: RegistryConfig) -> Result<Self, sar_registry::RegistryError> {
        let registry = Arc::new(Registry::load(config.paths.clone())?);
        let limits = Limits {
            max_depth: config.max_depth,
            max_steps: config.max_steps,
            step_timeout_ms: config.default_timeout_ms,
            action_timeout_ms: config.action_timeout_ms(),
        };
        let executor = Executor::with_limits(adapter.clone(), registry.clone(), limits);
        Ok(Self {
            registry,
            executor,
            adapter,
            config,
        })
    }

    fn detector(&self) -> &dyn VersionDetector {
        self.adapter.as_ref()
    }

    /// The resolved configuration this handler was built from.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

#[async_trait]
impl<A> Handler for DaemonHandler<A>
where
    A: BrowserAdapter + VersionDetector + 'static,
{
    async fn list(&self, params: Value) -> Value {
        let namespace = params.get("namespace").and_then(Value::as_str);
        let snapshot = self.registry.snapshot();

        match namespace {
            Some(ns) => {
                if !snapshot.namespaces.contains_key(ns) {
                    return bad_request(format!("unknown namespace: {ns}"));
                }
                let actions: Vec<Value> = self
                    .registry
                    .list_actions_in(ns)
                    .into_iter()
                    .filter_map(|full_name| {
                        snapshot.actions.get(&full_name).map(|action| {
                            json!({ "fullName": full_name, "description": action.description })
                        })
                    })
                    .collect();
                json!(actions)
            }
            None => {
                let summaries: Vec<Value> = snapshot
                    .namespaces
                    .values()
                    .map(|namespace| {
                        let action_count = self.registry.list_actions_in(&namespace.name).len();
                        json!({
                            "namespace": namespace.name,
                            "version": namespace.version,
                            "description": namespace.description,
                            "actionCount": action_count,
                        })
                    })
                    .collect();
                json!(summaries)
            }
        }
    }

    async fn describe(&self, params: Value) -> Value {
        let Some(name) = params.get("action").and_then(Value::as_str) else {
            return bad_request("`action` is required");
        };
        match self.registry.get_action(name) {
            Some(action) => serde_json::to_value(action).unwrap_or_else(|e| bad_request(e.to_string())),
            None => action_not_found(name),
        }
    }

    async fn run(&self, params: Value) -> Value {
        let Some(name) = params.get("action").and_then(Value::as_str) else {
            return bad_request("`action` is required");
        };
        let action_params = params.get("params").cloned().unwrap_or_else(|| json!({}));
        let env = params.get("env").cloned().unwrap_or_else(|| json!({}));
        let result = self.executor.run(name, action_params, env, self.detector(), false, None).await;
        serde_json::to_value(result).unwrap_or_else(|e| bad_request(e.to_string()))
    }

    async fn dry_run(&self, params: Value) -> Value {
        let Some(name) = params.get("action").and_then(Value::as_str) else {
            return bad_request("`action` is required");
        };
        let action_params = params.get("params").cloned().unwrap_or_else(|| json!({}));
        let env = params.get("env").cloned().unwrap_or_else(|| json!({}));
        match self.executor.dry_run(name, action_params, env, self.detector(), None).await {
            Ok(result) => serde_json::to_value(result).unwrap_or_else(|e| bad_request(e.to_string())),
            Err(err) => json!({ "success": false, "error": err.to_record() }),
        }
    }

    async fn debug(&self, params: Value) -> Value {
        let Some(name) = params.get("action").and_then(Value::as_str) else {
            return bad_request("`action` is required");
        };
        let action_params = params.get("params").cloned().unwrap_or_else(|| json!({}));
        let env = params.get("env").cloned().unwrap_or_else(|| json!({}));
        let result = self.executor.run(name, action_params, env, self.detector(), true, None).await;
        serde_json::to_value(result).unwrap_or_else(|e| bad_request(e.to_string()))
    }

    async fn validate(&self, params: Value) -> Value {
        let Some(path) = params.get("path").and_then(Value::as_str) else {
            return bad_request("`path` is required");
        };
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(source) => return bad_request(format!("failed to read `{path}`: {source}")),
        };
        match sar_schema::validate_file(&text) {
            Ok(_) => json!({ "success": true }),
            Err(err) => json!({ "success": false, "errors": err.issues() }),
        }
    }

    async fn search(&self, params: Value) -> Value {
        let Some(query) = params.get("query").and_then(Value::as_str) else {
            return bad_request("`query` is required");
        };
        let lower_query = query.to_lowercase();
        let hits: Vec<Value> = self
            .registry
            .search(query)
            .into_iter()
            .map(|hit| {
                let score = if hit.full_name.to_lowercase().starts_with(&lower_query) {
                    1.0
                } else {
                    0.5
                };
                json!({ "fullName": hit.full_name, "description": hit.description, "score": score })
            })
            .collect();
        json!(hits)
    }

    async fn reload(&self, _params: Value) -> Value {
        match self.registry.reload() {
            Ok(()) => {
                let snapshot = self.registry.snapshot();
                json!({ "success": true, "loaded": snapshot.actions.len(), "failed": snapshot.issues.len() })
            }
            Err(err) => json!({ "success": false, "loaded": 0, "failed": 0, "error": err.to_string() }),
        }
    }
}
