//! Multi-source discovery and loading of action namespace files (spec
//! §4.3 steps 1-5): walk every configured source directory, parse and
//! validate each file independently, resolve `extends` in dependency
//! order, merge, then run the authoritative post-merge semantic checks.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use sar_types::{Action, Namespace, NamespaceFile};

use crate::error::RegistryError;
use crate::merge::{merge_namespace_into, merge_one};
use crate::topo::topo_sort;

/// Result of a full load pass: the merged namespaces and their flattened
/// action index, plus every non-fatal issue collected along the way.
///
/// A source file that fails structural/semantic validation, or a namespace
/// that loses the post-merge `aliasOf`/fallback-cycle checks, is logged and
/// skipped rather than failing the whole load — one bad file should not
/// take down a registry built from many good ones.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub namespaces: IndexMap<String, Namespace>,
    pub actions: IndexMap<String, Action>,
    pub issues: Vec<String>,
}

/// Load and merge every namespace file found under `roots`, in order.
/// Later roots take precedence: if two roots define a namespace of the
/// same name, the one discovered later wins outright (its file replaces
/// the earlier one rather than merging with it) — this is how a project
/// or user override replaces a built-in namespace of the same name.
pub fn load_sources(roots: &[PathBuf]) -> Result<LoadReport, RegistryError> {
    let mut files: IndexMap<String, NamespaceFile> = IndexMap::new();
    let mut file_sources: IndexMap<String, String> = IndexMap::new();
    let mut issues = Vec::new();

    for root in roots {
        for path in discover_files(root)? {
            let text = fs::read_to_string(&path).map_err(|source| RegistryError::Io {
                path: path.display().to_string(),
                source,
            })?;
            match sar_schema::validate_file(&text) {
                Ok(file) => {
                    let name = file.namespace.clone();
                    files.insert(name.clone(), file);
                    file_sources.insert(name, path.display().to_string());
                }
                Err(err) => {
                    for issue in err.issues() {
                        issues.push(format!("{}: {} ({:?})", path.display(), issue.message, issue.code));
                    }
                }
            }
        }
    }

    let order = topo_sort(&files)?;

    let mut namespaces: IndexMap<String, Namespace> = IndexMap::new();
    for name in &order {
        let file = &files[name];
        let parent: Option<Namespace> = file.extends.iter().fold(None, |acc, parent_name| {
            let parent_ns = namespaces.get(parent_name).expect("parents are merged before children");
            Some(merge_namespace_into(acc.as_ref(), parent_ns))
        });
        let source = file_sources[name].clone();
        let merged = merge_one(parent.as_ref(), file, &source);
        namespaces.insert(name.clone(), merged);
    }

    for namespace in namespaces.values() {
        for issue in sar_schema::check_namespace_semantics(namespace) {
            issues.push(format!("{}: {} ({:?})", namespace.source_path, issue.message, issue.code));
        }
    }

    let mut actions: IndexMap<String, Action> = IndexMap::new();
    for namespace in namespaces.values() {
        for (full_name, action) in &namespace.actions {
            actions.insert(full_name.clone(), action.clone());
        }
    }

    for issue in sar_schema::graph::check_alias_targets(&actions) {
        issues.push(format!("{} ({:?})", issue.message, issue.code));
    }
    for issue in sar_schema::graph::check_fallback_cycles(&actions) {
        issues.push(format!("{} ({:?})", issue.message, issue.code));
    }

    for issue in &issues {
        tracing::warn!(issue = %issue, "registry load issue");
    }

    Ok(LoadReport { namespaces, actions, issues })
}

/// Recursively list every `.yaml`/`.yml` file under `root`, sorted by path
/// for deterministic load order within a single source root.
fn discover_files(root: &Path) -> Result<Vec<PathBuf>, RegistryError> {
    let mut out = Vec::new();
    if !root.exists() {
        return Ok(out);
    }
    visit(root, &mut out)?;
    out.sort();
    Ok(out)
}

fn visit(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), RegistryError> {
    let entries = fs::read_dir(dir).map_err(|source| RegistryError::Io {
        path: dir.display().to_string(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| RegistryError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            visit(&path, out)?;
        } else if matches!(path.extension().and_then(|e| e.to_str()), Some("yaml" | "yml")) {
            out.push(path);
        }
    }
    Ok(())
}
