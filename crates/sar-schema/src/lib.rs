//! Validation of action definition files (spec §4.2): structural shape
//! checks first (against the raw YAML so a malformed file reports every
//! problem at once), then local semantic checks (variable reference
//! scoping, step ordering, condition-expression grammar) against the typed
//! model.
//!
//! Checks that need the whole merged registry — `aliasOf` target
//! existence, fallback/`run` cycle detection — are not here; they live in
//! [`mod@graph`] and are run by the registry loader once namespaces are
//! merged and every action's fully-qualified name is known.

pub mod graph;
pub mod issue;
pub mod params;
pub mod semantic;
pub mod structural;

pub use issue::{IssueCode, ValidationError, ValidationIssue};
pub use params::validate_params;

use sar_types::NamespaceFile;

/// Parse and validate one source file's text, returning the typed
/// [`NamespaceFile`] on success or the full list of issues found.
///
/// When the file declares `extends`, the selector-reference check is
/// skipped here (a child namespace's selectors aren't known until the
/// registry merges it with its parents) — the registry re-runs
/// [`semantic::check_action`] with the merged selector table as the
/// authoritative pass.
pub fn validate_file(text: &str) -> Result<NamespaceFile, ValidationError> {
    let raw: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(|e| single_issue(issue_for_parse_error(&e)))?;

    let mut issues = structural::check(&raw);
    if !issues.is_empty() {
        return Err(ValidationError(issues));
    }

    let file: NamespaceFile =
        serde_yaml::from_str(text).map_err(|e| single_issue(issue_for_parse_error(&e)))?;

    issues.extend(check_file_semantics(&file));
    if issues.is_empty() {
        Ok(file)
    } else {
        Err(ValidationError(issues))
    }
}

/// Run the local semantic pass over every action in `file`, scoped to the
/// selectors declared in this file alone.
pub fn check_file_semantics(file: &sar_types::NamespaceFile) -> Vec<ValidationIssue> {
    if !file.extends.is_empty() {
        // Selector inheritance from parents isn't resolved yet; the
        // registry re-checks this namespace's actions after merge.
        return Vec::new();
    }
    let mut issues = Vec::new();
    for (name, action) in &file.actions {
        let mut action = action.clone();
        action.name = name.clone();
        let available = semantic::visible_selectors(&file.selectors, &action);
        issues.extend(semantic::check_action(&action, &available));
    }
    issues
}

/// The authoritative semantic pass, run by the registry loader once
/// `extends` has been resolved and merged: every action is checked against
/// the namespace's full (post-merge) selector table, closing the gap
/// [`check_file_semantics`] deliberately leaves open for namespaces that
/// extend another.
pub fn check_namespace_semantics(namespace: &sar_types::Namespace) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for action in namespace.actions.values() {
        let available = semantic::visible_selectors(&namespace.selectors, action);
        issues.extend(semantic::check_action(action, &available));
    }
    issues
}

fn issue_for_parse_error(err: &serde_yaml::Error) -> ValidationIssue {
    ValidationIssue::new("$", IssueCode::MissingField, err.to_string())
}

fn single_issue(issue: ValidationIssue) -> ValidationError {
    ValidationError(vec![issue])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn validates_well_formed_file() {
        let yaml = r#"
schema_version: 1
namespace: test
version: "1.0.0"
selectors:
  login_button:
    primary: "#login"
actions:
  login:
    description: "log in"
    params:
      username:
        type: string
        required: true
    steps:
      - action: fill
        args:
          selector: "${selectors.login_button}"
          value: "${params.username}"
"#;
        let file = validate_file(yaml).unwrap();
        assert_eq!(file.namespace, "test");
    }

    #[test]
    fn collects_structural_and_semantic_issues_together() {
        let yaml = r#"
schema_version: 1
namespace: test
version: "1.0.0"
actions:
  login:
    description: "log in"
    steps:
      - action: fill
        args:
          selector: "${selectors.missing}"
          value: "x"
"#;
        let err = validate_file(yaml).unwrap_err();
        assert!(err
            .issues()
            .iter()
            .any(|i| i.code == IssueCode::UnknownSelectorReference));
    }

    #[test]
    fn skips_selector_check_when_file_extends_another() {
        let yaml = r#"
schema_version: 1
namespace: child
version: "1.0.0"
extends: ["base"]
actions:
  login:
    description: "log in"
    steps:
      - action: click
        args:
          selector: "${selectors.inherited}"
"#;
        let file = validate_file(yaml).unwrap();
        assert_eq!(file.namespace, "child");
    }

    #[test]
    fn malformed_yaml_produces_one_issue() {
        let err = validate_file("not: valid: yaml: : :").unwrap_err();
        assert_eq!(err.issues().len(), 1);
    }

    #[test]
    fn namespace_semantics_catch_inherited_selector_after_merge() {
        use indexmap::IndexMap;
        use sar_types::{Namespace, SelectorDef};

        let child_yaml = r#"
schema_version: 1
namespace: child
version: "1.0.0"
extends: ["base"]
actions:
  login:
    description: "log in"
    steps:
      - action: click
        args:
          selector: "${selectors.inherited}"
"#;
        let file = validate_file(child_yaml).unwrap();

        // Simulate the registry's merge: fold the parent's selector into
        // the child's own table.
        let mut selectors: IndexMap<String, SelectorDef> = file.selectors.clone();
        selectors.insert("inherited".to_string(), SelectorDef::Bare("#x".to_string()));
        let namespace = Namespace {
            name: file.namespace.clone(),
            version: file.version.clone(),
            description: file.description.clone(),
            compatibility: file.compatibility.clone(),
            selectors,
            actions: file.actions.clone(),
            source_path: "child.yaml".to_string(),
        };
        assert_eq!(check_namespace_semantics(&namespace), vec![]);
    }
}
