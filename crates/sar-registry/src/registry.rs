//! The in-memory registry (spec §4.3's implementation note): a
//! [`parking_lot::RwLock`] guarding an `Arc<RegistrySnapshot>`, so a
//! `reload()` swaps in a whole new snapshot atomically while executions
//! already holding an `Arc` clone keep running against the one they started
//! with — a reload never invalidates an action mid-execution.

use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use sar_types::{Action, Namespace};

use crate::error::RegistryError;
use crate::loader::load_sources;

/// A fully loaded and merged set of namespaces, immutable once built.
#[derive(Debug, Default)]
pub struct RegistrySnapshot {
    pub namespaces: IndexMap<String, Namespace>,
    pub actions: IndexMap<String, Action>,
    pub issues: Vec<String>,
}

impl RegistrySnapshot {
    fn empty() -> Self {
        Self::default()
    }
}

/// A single search hit, ranked by how the query matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub full_name: String,
    pub description: String,
}

/// The live registry: source roots plus the current snapshot.
///
/// Source roots are given in ascending precedence — a namespace defined in
/// a later root replaces one of the same name from an earlier root whole,
/// not merged with it (see [`crate::loader::load_sources`]).
pub struct Registry {
    roots: Vec<PathBuf>,
    snapshot: RwLock<Arc<RegistrySnapshot>>,
}

impl Registry {
    /// Load from `roots` immediately, returning an error only when loading
    /// fails outright (an unresolvable `extends` cycle or unreadable
    /// directory) — per-file validation problems are recorded as issues on
    /// the snapshot instead of failing construction.
    pub fn load(roots: Vec<PathBuf>) -> Result<Self, RegistryError> {
        let report = load_sources(&roots)?;
        Ok(Self {
            roots,
            snapshot: RwLock::new(Arc::new(RegistrySnapshot {
                namespaces: report.namespaces,
                actions: report.actions,
                issues: report.issues,
            })),
        })
    }

    /// An empty registry with no configured source roots, useful for tests
    /// that build up a snapshot by hand.
    pub fn empty() -> Self {
        Self {
            roots: Vec::new(),
            snapshot: RwLock::new(Arc::new(RegistrySnapshot::empty())),
        }
    }

    /// Clone the current snapshot `Arc`. Callers (executions) should grab
    /// this once at the start of a run and use it throughout, rather than
    /// re-reading the lock per step, so a concurrent `reload` can't change
    /// which action definition a running action sees partway through.
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.snapshot.read().clone()
    }

    /// Re-walk the configured source roots and atomically replace the
    /// snapshot. In-flight executions holding an older `Arc` are
    /// unaffected; they finish against the snapshot they started with.
    pub fn reload(&self) -> Result<(), RegistryError> {
        let report = load_sources(&self.roots)?;
        let next = Arc::new(RegistrySnapshot {
            namespaces: report.namespaces,
            actions: report.actions,
            issues: report.issues,
        });
        *self.snapshot.write() = next;
        Ok(())
    }

    pub fn get_namespace(&self, name: &str) -> Option<Namespace> {
        self.snapshot().namespaces.get(name).cloned()
    }

    pub fn get_action(&self, full_name: &str) -> Option<Action> {
        self.snapshot().actions.get(full_name).cloned()
    }

    pub fn list_namespaces(&self) -> Vec<String> {
        self.snapshot().namespaces.keys().cloned().collect()
    }

    pub fn list_actions_in(&self, namespace: &str) -> Vec<String> {
        self.snapshot()
            .actions
            .keys()
            .filter(|full_name| full_name.starts_with(&format!("{namespace}:")))
            .cloned()
            .collect()
    }

    /// Free-text search over action full names, descriptions and param
    /// names, ranked name-prefix matches first, then description/param
    /// matches, preserving registry order within each rank.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let query = query.to_lowercase();
        let snapshot = self.snapshot();
        let mut prefix_hits = Vec::new();
        let mut other_hits = Vec::new();

        for (full_name, action) in &snapshot.actions {
            let lower_name = full_name.to_lowercase();
            let hit = SearchHit {
                full_name: full_name.clone(),
                description: action.description.clone(),
            };
            if lower_name.starts_with(&query) {
                prefix_hits.push(hit);
            } else if lower_name.contains(&query)
                || action.description.to_lowercase().contains(&query)
                || action.params.keys().any(|p| p.to_lowercase().contains(&query))
            {
                other_hits.push(hit);
            }
        }

        prefix_hits.extend(other_hits);
        prefix_hits
    }
}
