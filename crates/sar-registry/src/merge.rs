//! `extends` deep-merge rules (spec §4.3 step 4): selectors and actions
//! merge key-wise with the child overriding the parent; compatibility
//! merges field-wise; everything else is simply taken from the child.

use indexmap::IndexMap;
use sar_types::{Action, CompatibilityBlock, Namespace, NamespaceFile};

/// Merge one parent (already-merged) namespace into `file`, producing the
/// fully merged [`Namespace`]. `parent` is `None` for a namespace with no
/// (or not-yet-resolved) `extends` entry; when `file.extends` names several
/// parents, call this repeatedly, folding left to right in declaration
/// order so the last-named parent's conflicting keys win — matching "later
/// wins" elsewhere in the loader.
pub fn merge_one(parent: Option<&Namespace>, file: &NamespaceFile, source_path: &str) -> Namespace {
    let mut selectors = parent.map(|p| p.selectors.clone()).unwrap_or_default();
    selectors.extend(file.selectors.clone());

    let mut actions: IndexMap<String, Action> = parent.map(|p| p.actions.clone()).unwrap_or_default();
    for (name, action) in &file.actions {
        let mut action = action.clone();
        action.name = name.clone();
        action.namespace = file.namespace.clone();
        action.full_name = format!("{}:{name}", file.namespace);
        action.source_path = Some(source_path.to_string());
        actions.insert(action.full_name.clone(), action);
    }

    let compatibility = merge_compatibility(
        parent.and_then(|p| p.compatibility.as_ref()),
        file.compatibility.as_ref(),
    );

    Namespace {
        name: file.namespace.clone(),
        version: file.version.clone(),
        description: file.description.clone(),
        compatibility,
        selectors,
        actions,
        source_path: source_path.to_string(),
    }
}

/// Fold a second (or later) parent [`Namespace`] into an already-accumulated
/// one, using the same key-wise override rules as [`merge_one`]. Used when a
/// namespace declares more than one `extends` parent: the loader folds them
/// left to right before merging the child file on top, so a later-named
/// parent's keys win over an earlier one's, matching the "later wins"
/// convention used everywhere else in the loader.
pub fn merge_namespace_into(acc: Option<&Namespace>, next: &Namespace) -> Namespace {
    let Some(acc) = acc else { return next.clone() };

    let mut selectors = acc.selectors.clone();
    selectors.extend(next.selectors.clone());

    let mut actions = acc.actions.clone();
    actions.extend(next.actions.clone());

    let compatibility = merge_compatibility(acc.compatibility.as_ref(), next.compatibility.as_ref());

    Namespace {
        name: next.name.clone(),
        version: next.version.clone(),
        description: next.description.clone(),
        compatibility,
        selectors,
        actions,
        source_path: next.source_path.clone(),
    }
}

fn merge_compatibility(
    parent: Option<&CompatibilityBlock>,
    child: Option<&CompatibilityBlock>,
) -> Option<CompatibilityBlock> {
    match (parent, child) {
        (None, None) => None,
        (Some(p), None) => Some(p.clone()),
        (None, Some(c)) => Some(c.clone()),
        (Some(p), Some(c)) => {
            let mut version_overrides = p.version_overrides.clone();
            version_overrides.extend(c.version_overrides.clone());
            Some(CompatibilityBlock {
                min_version: c.min_version.clone().or_else(|| p.min_version.clone()),
                max_version: c.max_version.clone().or_else(|| p.max_version.clone()),
                version_overrides,
                detect: if c.detect.is_empty() {
                    p.detect.clone()
                } else {
                    c.detect.clone()
                },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sar_types::SelectorDef;

    fn file(yaml: &str) -> NamespaceFile {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn child_selector_overrides_parent_key_wise() {
        let parent_file = file(
            r#"
schema_version: 1
namespace: base
version: "1.0.0"
selectors:
  submit: ".old-submit"
  cancel: ".cancel"
actions: {}
"#,
        );
        let parent = merge_one(None, &parent_file, "base.yaml");

        let child_file = file(
            r#"
schema_version: 1
namespace: child
version: "1.0.0"
extends: ["base"]
selectors:
  submit: ".new-submit"
actions: {}
"#,
        );
        let merged = merge_one(Some(&parent), &child_file, "child.yaml");

        assert_eq!(merged.selectors.get("submit"), Some(&SelectorDef::Bare(".new-submit".to_string())));
        assert_eq!(merged.selectors.get("cancel"), Some(&SelectorDef::Bare(".cancel".to_string())));
    }

    #[test]
    fn child_action_replaces_parent_action_of_same_name() {
        let parent_file = file(
            r#"
schema_version: 1
namespace: base
version: "1.0.0"
actions:
  login:
    description: "base login"
    steps:
      - action: open
        args:
          url: "/login"
"#,
        );
        let parent = merge_one(None, &parent_file, "base.yaml");

        let child_file = file(
            r#"
schema_version: 1
namespace: child
version: "1.0.0"
extends: ["base"]
actions:
  login:
    description: "child login"
    steps:
      - action: open
        args:
          url: "/v2/login"
  extra:
    description: "child only"
    steps:
      - action: open
        args:
          url: "/extra"
"#,
        );
        let merged = merge_one(Some(&parent), &child_file, "child.yaml");

        assert_eq!(merged.actions.len(), 2);
        assert_eq!(merged.actions["child:login"].description, "child login");
        assert_eq!(merged.actions["child:extra"].description, "child only");
    }

    #[test]
    fn compatibility_merges_field_wise() {
        let parent_file = file(
            r#"
schema_version: 1
namespace: base
version: "1.0.0"
compatibility:
  minVersion: "1.0.0"
  maxVersion: "5.0.0"
actions: {}
"#,
        );
        let parent = merge_one(None, &parent_file, "base.yaml");

        let child_file = file(
            r#"
schema_version: 1
namespace: child
version: "1.0.0"
extends: ["base"]
compatibility:
  maxVersion: "3.0.0"
actions: {}
"#,
        );
        let merged = merge_one(Some(&parent), &child_file, "child.yaml");
        let compat = merged.compatibility.unwrap();
        assert_eq!(compat.min_version.as_deref(), Some("1.0.0"));
        assert_eq!(compat.max_version.as_deref(), Some("3.0.0"));
    }
}
