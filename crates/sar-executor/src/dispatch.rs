//! Mapping one [`Step`] to exactly one browser-adapter operation (spec
//! §4.6 "step dispatch"): a closed exhaustive match over
//! [`StepActionKind`], per the design note in spec §9 — adding a step
//! action is a code change, not a data change. `run` and `fail` are
//! handled by the executor itself rather than here, since they don't touch
//! the adapter.

use serde_json::Value;
use thiserror::Error;

use sar_types::StepActionKind;

use crate::adapter::{AdapterError, BrowserAdapter, FindQuery, FindQueryType, WaitCondition, WaitSpec};
use crate::locator::Locator;
use crate::resolver::{self, ResolvedCall};

/// The outcome of dispatching one non-control step, before it is wrapped
/// into an [`sar_error::ActionError`] by the caller.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub value: Value,
    pub selector_used: Option<String>,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("missing required argument `{0}`")]
    MissingArg(&'static str),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// Dispatch `kind` against `adapter` using `args` (already interpolated).
/// `selector_def` is `Some` only for the steps that take a `selector`
/// argument and only once the caller has resolved it via
/// [`crate::resolver::selector_def_for_arg`] or a literal fallback.
pub async fn dispatch<A: BrowserAdapter + ?Sized>(
    adapter: &A,
    kind: StepActionKind,
    args: &Value,
    selector_def: Option<&sar_types::SelectorDef>,
) -> Result<DispatchOutcome, DispatchError> {
    match kind {
        StepActionKind::Open => {
            let url = require_str(args, "url")?;
            let value = adapter.open(url).await?;
            Ok(DispatchOutcome { value, selector_used: None })
        }
        StepActionKind::Click => {
            let def = selector_def.ok_or(DispatchError::MissingArg("selector"))?;
            let ResolvedCall { value, selector_used } =
                resolver::resolve_and_call(def, |locator| async move { adapter.click(&locator).await }).await?;
            Ok(DispatchOutcome { value, selector_used: Some(selector_used) })
        }
        StepActionKind::Fill => {
            let def = selector_def.ok_or(DispatchError::MissingArg("selector"))?;
            let fill_value = args.get("value").cloned().unwrap_or(Value::Null);
            let ResolvedCall { value, selector_used } = resolver::resolve_and_call(def, |locator| {
                let fill_value = fill_value.clone();
                async move { adapter.fill(&locator, &fill_value).await }
            })
            .await?;
            Ok(DispatchOutcome { value, selector_used: Some(selector_used) })
        }
        StepActionKind::Type => {
            let def = selector_def.ok_or(DispatchError::MissingArg("selector"))?;
            let text = require_str(args, "text")?.to_string();
            let ResolvedCall { value, selector_used } = resolver::resolve_and_call(def, |locator| {
                let text = text.clone();
                async move { adapter.type_text(&locator, &text).await }
            })
            .await?;
            Ok(DispatchOutcome { value, selector_used: Some(selector_used) })
        }
        StepActionKind::Press => {
            let key = require_str(args, "key")?;
            let value = adapter.press(key).await?;
            Ok(DispatchOutcome { value, selector_used: None })
        }
        StepActionKind::Wait => {
            let spec = wait_spec(args, selector_def)?;
            let value = adapter.wait(&spec).await?;
            Ok(DispatchOutcome { value, selector_used: None })
        }
        StepActionKind::Snapshot => {
            let interactive = args.get("interactive").and_then(Value::as_bool).unwrap_or(false);
            let locator = match selector_def {
                Some(def) => Some(Locator::parse(def.primary())),
                None => None,
            };
            let value = adapter.snapshot(locator.as_ref(), interactive).await?;
            Ok(DispatchOutcome { value, selector_used: locator.as_ref().map(Locator::to_string) })
        }
        StepActionKind::Find => {
            let query = find_query(args)?;
            let value = adapter.find(&query).await?;
            Ok(DispatchOutcome { value, selector_used: None })
        }
        StepActionKind::Eval => {
            let expression = require_str(args, "expression")?;
            let value = adapter.eval(expression).await?;
            Ok(DispatchOutcome { value, selector_used: None })
        }
        StepActionKind::Run | StepActionKind::Fail => {
            unreachable!("run/fail are handled by the executor, never dispatched to the adapter")
        }
    }
}

fn require_str<'a>(args: &'a Value, key: &'static str) -> Result<&'a str, DispatchError> {
    args.get(key).and_then(Value::as_str).ok_or(DispatchError::MissingArg(key))
}

fn wait_spec(args: &Value, selector_def: Option<&sar_types::SelectorDef>) -> Result<WaitSpec, DispatchError> {
    let timeout_ms = args.get("timeout").and_then(Value::as_u64);
    let hidden = args.get("hidden").and_then(Value::as_bool).unwrap_or(false);

    let condition = if let Some(def) = selector_def {
        WaitCondition::Selector {
            locator: Locator::parse(def.primary()),
            hidden,
        }
    } else if let Some(url) = args.get("url").and_then(Value::as_str) {
        WaitCondition::Url(url.to_string())
    } else if let Some(state) = args.get("state").and_then(Value::as_str) {
        WaitCondition::State(state.to_string())
    } else if let Some(time) = args.get("time").and_then(Value::as_u64) {
        WaitCondition::TimeMs(time)
    } else {
        return Err(DispatchError::MissingArg("selector|url|state|time"));
    };

    Ok(WaitSpec { condition, timeout_ms })
}

fn find_query(args: &Value) -> Result<FindQuery, DispatchError> {
    let type_str = require_str(args, "type")?;
    let query_type = match type_str {
        "role" => FindQueryType::Role,
        "text" => FindQueryType::Text,
        "label" => FindQueryType::Label,
        "placeholder" => FindQueryType::Placeholder,
        "testid" => FindQueryType::TestId,
        _ => return Err(DispatchError::MissingArg("type")),
    };
    let value = args
        .get("value")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default();
    let subaction = args.get("subaction").and_then(Value::as_str).map(str::to_string);
    Ok(FindQuery { query_type, value, subaction })
}

/// The snake_case name a [`StepActionKind`] is traced and reported under,
/// matching its YAML/wire spelling (spec §6).
pub fn step_action_name(kind: StepActionKind) -> &'static str {
    match kind {
        StepActionKind::Open => "open",
        StepActionKind::Click => "click",
        StepActionKind::Fill => "fill",
        StepActionKind::Type => "type",
        StepActionKind::Press => "press",
        StepActionKind::Wait => "wait",
        StepActionKind::Snapshot => "snapshot",
        StepActionKind::Find => "find",
        StepActionKind::Eval => "eval",
        StepActionKind::Run => "run",
        StepActionKind::Fail => "fail",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockAdapter;
    use pretty_assertions::assert_eq;
    use sar_types::SelectorDef;
    use serde_json::json;

    #[tokio::test]
    async fn open_dispatches_to_adapter() {
        let adapter = MockAdapter::new();
        let out = dispatch(&adapter, StepActionKind::Open, &json!({ "url": "/login" }), None)
            .await
            .unwrap();
        assert_eq!(out.value, json!({}));
        assert_eq!(adapter.calls(), vec!["open /login".to_string()]);
    }

    #[tokio::test]
    async fn click_uses_selector_fallback_chain() {
        let adapter = MockAdapter::new().failing_selector("css:[data-v3='btn']");
        let def = SelectorDef::WithFallback {
            primary: "[data-v3='btn']".to_string(),
            fallback: vec![".btn".to_string()],
        };
        let out = dispatch(&adapter, StepActionKind::Click, &json!({}), Some(&def)).await.unwrap();
        assert_eq!(out.selector_used.as_deref(), Some("css:.btn"));
    }

    #[tokio::test]
    async fn fill_passes_value_argument() {
        let adapter = MockAdapter::new();
        let def = SelectorDef::Bare("#user".to_string());
        dispatch(&adapter, StepActionKind::Fill, &json!({ "value": "alice" }), Some(&def))
            .await
            .unwrap();
        assert_eq!(adapter.calls(), vec!["fill css:#user alice".to_string()]);
    }

    #[tokio::test]
    async fn wait_without_selector_uses_time_condition() {
        let adapter = MockAdapter::new();
        dispatch(&adapter, StepActionKind::Wait, &json!({ "time": 50 }), None).await.unwrap();
        assert_eq!(adapter.calls(), vec!["wait time 50".to_string()]);
    }

    #[tokio::test]
    async fn missing_required_argument_is_an_error() {
        let adapter = MockAdapter::new();
        let err = dispatch(&adapter, StepActionKind::Open, &json!({}), None).await.unwrap_err();
        assert!(matches!(err, DispatchError::MissingArg("url")));
    }
}
