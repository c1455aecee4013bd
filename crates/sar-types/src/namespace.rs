use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::compatibility::CompatibilityBlock;
use crate::selector::SelectorDef;

/// The raw, pre-merge shape of one YAML source file — schema_version = 1
/// (spec §6). `extends` is resolved and merged away by the loader; the
/// merged [`Namespace`] below has no trace of it left.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceFile {
    pub schema_version: u32,
    pub namespace: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub extends: Vec<String>,
    #[serde(default)]
    pub compatibility: Option<CompatibilityBlock>,
    #[serde(default)]
    pub selectors: IndexMap<String, SelectorDef>,
    #[serde(default)]
    pub actions: IndexMap<String, Action>,
}

/// A grouping owned by one author, immutable once registered. Produced by
/// the loader after `extends` resolution and deep-merge; never mutated
/// in-place afterward — `reload()` builds a whole new generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    pub version: String,
    pub description: String,
    pub compatibility: Option<CompatibilityBlock>,
    pub selectors: IndexMap<String, SelectorDef>,
    pub actions: IndexMap<String, Action>,
    pub source_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserializes_minimal_namespace_file() {
        let yaml = r#"
schema_version: 1
namespace: test
version: "1.0.0"
description: "test fixtures"
actions:
  simple_login:
    description: "log in"
    steps:
      - action: open
        args:
          url: "/login"
"#;
        let file: NamespaceFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.schema_version, 1);
        assert_eq!(file.namespace, "test");
        assert_eq!(file.actions.len(), 1);
        assert!(file.extends.is_empty());
    }

    #[test]
    fn extends_list_deserializes() {
        let yaml = r#"
schema_version: 1
namespace: child
version: "1.0.0"
extends: ["base"]
actions: {}
"#;
        let file: NamespaceFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.extends, vec!["base".to_string()]);
    }
}
