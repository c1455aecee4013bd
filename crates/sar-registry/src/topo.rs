//! Topological ordering of `extends` relationships (spec §4.3 step 3), via
//! a plain iterative Kahn's algorithm — no graph crate, matching the
//! teacher's preference for a hand-rolled `DependencyGraph` over pulling in
//! a dependency for something this small.

use std::collections::{HashMap, VecDeque};

use indexmap::IndexMap;
use sar_types::NamespaceFile;

use crate::error::RegistryError;

/// Order `files` (keyed by namespace name) so every namespace appears after
/// all of its `extends` parents. Deterministic given the same input map,
/// since ties are broken by the map's own iteration (insertion) order.
pub fn topo_sort(files: &IndexMap<String, NamespaceFile>) -> Result<Vec<String>, RegistryError> {
    let mut in_degree: HashMap<&str, usize> = files.keys().map(|n| (n.as_str(), 0)).collect();
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();

    for (name, file) in files {
        for parent in &file.extends {
            if !files.contains_key(parent) {
                return Err(RegistryError::UnknownParent {
                    namespace: name.clone(),
                    parent: parent.clone(),
                });
            }
            *in_degree.get_mut(name.as_str()).expect("name is a key of files") += 1;
            children.entry(parent.as_str()).or_default().push(name.as_str());
        }
    }

    let mut queue: VecDeque<&str> = files
        .keys()
        .map(String::as_str)
        .filter(|n| in_degree[n] == 0)
        .collect();

    let mut order = Vec::with_capacity(files.len());
    while let Some(name) = queue.pop_front() {
        order.push(name.to_string());
        if let Some(kids) = children.get(name) {
            for &kid in kids {
                let degree = in_degree.get_mut(kid).expect("kid is a key of files");
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(kid);
                }
            }
        }
    }

    if order.len() != files.len() {
        let remaining: Vec<String> = files
            .keys()
            .filter(|n| !order.contains(n))
            .cloned()
            .collect();
        return Err(RegistryError::ExtendsCycle(remaining));
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file(namespace: &str, extends: &[&str]) -> NamespaceFile {
        NamespaceFile {
            schema_version: 1,
            namespace: namespace.to_string(),
            version: "1.0.0".to_string(),
            description: String::new(),
            extends: extends.iter().map(|s| (*s).to_string()).collect(),
            compatibility: None,
            selectors: Default::default(),
            actions: Default::default(),
        }
    }

    #[test]
    fn orders_parent_before_child() {
        let mut files = IndexMap::new();
        files.insert("child".to_string(), file("child", &["base"]));
        files.insert("base".to_string(), file("base", &[]));
        let order = topo_sort(&files).unwrap();
        assert_eq!(order, vec!["base".to_string(), "child".to_string()]);
    }

    #[test]
    fn orders_diamond_dependency() {
        let mut files = IndexMap::new();
        files.insert("d".to_string(), file("d", &["b", "c"]));
        files.insert("b".to_string(), file("b", &["a"]));
        files.insert("c".to_string(), file("c", &["a"]));
        files.insert("a".to_string(), file("a", &[]));
        let order = topo_sort(&files).unwrap();
        let pos = |n: &str| order.iter().position(|x| x == n).unwrap();
        assert!(pos("a") < pos("b"));
        assert!(pos("a") < pos("c"));
        assert!(pos("b") < pos("d"));
        assert!(pos("c") < pos("d"));
    }

    #[test]
    fn detects_direct_cycle() {
        let mut files = IndexMap::new();
        files.insert("a".to_string(), file("a", &["b"]));
        files.insert("b".to_string(), file("b", &["a"]));
        let err = topo_sort(&files).unwrap_err();
        assert!(matches!(err, RegistryError::ExtendsCycle(_)));
    }

    #[test]
    fn detects_unknown_parent() {
        let mut files = IndexMap::new();
        files.insert("a".to_string(), file("a", &["missing"]));
        let err = topo_sort(&files).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownParent { .. }));
    }
}
