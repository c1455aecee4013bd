use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::param::ParameterSpec;
use crate::selector::SelectorDef;
use crate::step::Step;

/// A post-condition checked once after all steps have run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEntry {
    pub condition: String,
    pub message: String,
}

/// One invokable unit, as declared in YAML and later enriched by the loader
/// with its owning namespace and fully qualified name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    /// Short name as written under the namespace's `actions` map. Filled in
    /// by the loader, not read from the per-action YAML body.
    #[serde(skip, default)]
    pub name: String,
    /// Owning namespace name. Filled in by the loader.
    #[serde(skip, default)]
    pub namespace: String,
    /// `namespace:[component:]action`. Filled in by the loader.
    #[serde(skip, default)]
    pub full_name: String,
    /// Path of the file this action's definition last came from, after
    /// `extends` merge. Used only for diagnostics.
    #[serde(skip, default)]
    pub source_path: Option<String>,

    pub description: String,
    #[serde(default)]
    pub since: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub alias_of: Option<String>,

    #[serde(default)]
    pub params: IndexMap<String, ParameterSpec>,
    #[serde(default)]
    pub selectors: IndexMap<String, SelectorDef>,
    pub steps: Vec<Step>,
    #[serde(default)]
    pub returns: IndexMap<String, String>,
    #[serde(default)]
    pub verify: Vec<VerifyEntry>,
}

impl Action {
    /// `namespace:component:action` or `namespace:action` parsed into its
    /// segments. The middle `component` segment is optional.
    pub fn parse_full_name(full_name: &str) -> Option<(&str, Option<&str>, &str)> {
        let mut parts = full_name.split(':');
        let namespace = parts.next()?;
        let rest: Vec<&str> = parts.collect();
        match rest.len() {
            1 => Some((namespace, None, rest[0])),
            2 => Some((namespace, Some(rest[0]), rest[1])),
            _ => None,
        }
    }
}
