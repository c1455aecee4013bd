//! The selector resolver (spec §4.5): given a selector reference, try the
//! primary locator first and fall back through the ordered chain on
//! failure, reporting which candidate ultimately succeeded. Each step
//! resolves afresh — the chosen fallback is never cached across steps (the
//! spec's own answer to the open question in §9).

use indexmap::IndexMap;
use sar_error::ActionError;
use sar_types::SelectorDef;
use std::future::Future;

use crate::adapter::AdapterError;
use crate::locator::Locator;

/// One resolved selector call: the value the adapter returned, and the
/// concrete locator string that produced it (for trace output and health
/// statistics, spec §4.5 "bookkeeping").
pub struct ResolvedCall<T> {
    pub value: T,
    pub selector_used: String,
}

/// Determine the [`SelectorDef`] a step's `selector` argument names.
///
/// A step argument that is *exactly* one `${selectors.<name>}` placeholder
/// (no surrounding text) is resolved against the full alias table so its
/// fallback chain survives into selector resolution — `resolve()`'s own
/// path traversal for the `selectors` root only ever returns the primary
/// string (spec §4.1's generic contract has no notion of a fallback chain;
/// that's this module's job, not the expression engine's). Any other shape
/// — a literal selector string, or a template with surrounding text — is
/// treated as a bare selector with no fallback.
pub fn selector_def_for_arg(raw_template: &str, selectors: &IndexMap<String, SelectorDef>) -> Option<SelectorDef> {
    let spans = sar_expression::placeholder_spans(raw_template).ok()?;
    if spans.len() != 1 {
        return None;
    }
    let (start, end) = spans[0];
    if start != 0 || end != raw_template.len() {
        return None;
    }
    let body = &raw_template[start + 2..end - 1];
    let path = sar_expression::path::parse_path(body, start + 2).ok()?;
    if path.root != "selectors" || path.segments.len() != 1 {
        return None;
    }
    selectors.get(&path.segments[0]).cloned()
}

/// Try `def`'s primary selector, then each fallback in order, invoking
/// `call` for each candidate [`Locator`] until one succeeds. Returns the
/// final attempt's error (per spec §4.5, "the final attempt's error is
/// reported") if every candidate fails.
pub async fn resolve_and_call<F, Fut>(def: &SelectorDef, mut call: F) -> Result<ResolvedCall<serde_json::Value>, AdapterError>
where
    F: FnMut(Locator) -> Fut,
    Fut: Future<Output = Result<serde_json::Value, AdapterError>>,
{
    let mut last_err = AdapterError::ElementNotFound;
    for candidate in def.chain() {
        let locator = Locator::parse(candidate);
        match call(locator.clone()).await {
            Ok(value) => {
                return Ok(ResolvedCall {
                    value,
                    selector_used: locator.to_string(),
                })
            }
            Err(err) => last_err = err,
        }
    }
    Err(last_err)
}

/// Convert an [`AdapterError`] into the `ELEMENT_NOT_FOUND`/`TIMEOUT`/
/// `STEP_FAILED` [`ActionError`] the executor surfaces, attributing it to
/// `step_index` and the concrete selector chain that was tried.
pub fn adapter_error_to_action_error(err: &AdapterError, selector: &str, step_index: Option<usize>) -> ActionError {
    match err {
        AdapterError::ElementNotFound | AdapterError::NotInteractable => {
            ActionError::element_not_found(selector, step_index)
        }
        AdapterError::Timeout => ActionError::timeout(0, step_index),
        AdapterError::Other(message) => ActionError::step_failed(message.clone(), step_index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    fn fallback_def() -> SelectorDef {
        SelectorDef::WithFallback {
            primary: "[data-v3='btn']".to_string(),
            fallback: vec![".btn".to_string()],
        }
    }

    #[tokio::test]
    async fn primary_success_never_tries_fallback() {
        let result = resolve_and_call(&fallback_def(), |locator| async move {
            assert_eq!(locator, Locator::parse("[data-v3='btn']"));
            Ok(serde_json::json!({ "ok": true }))
        })
        .await
        .unwrap();
        assert_eq!(result.selector_used, "css:[data-v3='btn']");
    }

    #[tokio::test]
    async fn primary_failure_advances_to_fallback() {
        let attempts = RefCell::new(Vec::new());
        let result = resolve_and_call(&fallback_def(), |locator| {
            attempts.borrow_mut().push(locator.to_string());
            async move {
                if locator == Locator::parse("[data-v3='btn']") {
                    Err(AdapterError::ElementNotFound)
                } else {
                    Ok(serde_json::json!({ "ok": true }))
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(result.selector_used, "css:.btn");
        assert_eq!(*attempts.borrow(), vec!["css:[data-v3='btn']".to_string(), "css:.btn".to_string()]);
    }

    #[tokio::test]
    async fn all_candidates_failing_reports_final_error() {
        let err = resolve_and_call(&fallback_def(), |_locator| async move { Err(AdapterError::NotInteractable) })
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::NotInteractable));
    }

    #[test]
    fn whole_template_selector_alias_resolves_full_chain() {
        let mut selectors = IndexMap::new();
        selectors.insert(
            "submit".to_string(),
            SelectorDef::WithFallback {
                primary: "[data-v3='btn']".to_string(),
                fallback: vec![".btn".to_string()],
            },
        );
        let def = selector_def_for_arg("${selectors.submit}", &selectors).unwrap();
        assert_eq!(def.fallback(), &[".btn".to_string()]);
    }

    #[test]
    fn literal_selector_string_is_not_treated_as_alias() {
        let selectors = IndexMap::new();
        assert!(selector_def_for_arg("#submit", &selectors).is_none());
    }

    #[test]
    fn mixed_text_around_placeholder_is_not_treated_as_alias() {
        let mut selectors = IndexMap::new();
        selectors.insert("submit".to_string(), SelectorDef::Bare("#submit".to_string()));
        assert!(selector_def_for_arg("prefix-${selectors.submit}", &selectors).is_none());
    }
}
