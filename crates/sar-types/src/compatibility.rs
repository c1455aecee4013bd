use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::selector::SelectorDef;

/// One of the three strategies the host may use to detect a namespace's
/// target component library version (spec §4.4).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum VersionDetectionStrategy {
    /// Read a page-global variable, e.g. `__NAMESPACE_VERSION__`.
    GlobalVar { name: String },
    /// Read a `<meta name="...">` tag's content attribute.
    MetaTag { name: String },
    /// Evaluate a custom read-only expression in the page.
    Expression { expression: String },
}

/// Selector overrides applied when the detected version matches a range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionOverride {
    #[serde(default)]
    pub selectors: IndexMap<String, SelectorDef>,
}

/// Optional version constraints and version-indexed selector overrides for
/// a namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityBlock {
    #[serde(default)]
    pub min_version: Option<String>,
    #[serde(default)]
    pub max_version: Option<String>,
    /// Keyed by a semver range string (`2.x`, `>=4.2`, `^3.0`, ...).
    #[serde(default)]
    pub version_overrides: IndexMap<String, VersionOverride>,
    #[serde(default)]
    pub detect: Vec<VersionDetectionStrategy>,
}
